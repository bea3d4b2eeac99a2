//! Dropgate Capability Tokens
//!
//! Compact, signed, expiring bearer tokens that authorize fetching a single
//! resource until a deadline:
//! - Wire form: `base64url(payload_json) + "." + hex(hmac_sha256)`
//! - Issued once after a payment is confirmed, verified at delivery time
//! - Fully stateless: validity is determined by content, shared secret and
//!   the clock alone, with no server-side record of issued tokens
//!
//! The flip side of statelessness: a valid token can be redeemed any number
//! of times until it expires. Callers that need single-use semantics must
//! layer an external consumed-token store on top.

pub mod encode;
pub mod error;
pub mod issuer;
pub mod payload;
pub mod sign;
pub mod verifier;

pub use encode::{decode, encode};
pub use error::{TokenError, TokenResult};
pub use issuer::TokenIssuer;
pub use payload::TokenPayload;
pub use sign::{sign, verify_signature};
pub use verifier::TokenVerifier;

/// Separator between the encoded payload and the signature
pub const TOKEN_SEPARATOR: char = '.';

/// Default token lifetime (10 minutes)
pub const DEFAULT_TTL_SECS: i64 = 600;
