//! Token error types

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Input does not split into exactly two non-empty parts
    #[error("malformed token")]
    MalformedToken,

    /// Signature does not match the encoded payload
    #[error("invalid token signature")]
    InvalidSignature,

    /// Signature valid but the payload does not decode to the expected schema
    #[error("malformed token payload")]
    MalformedPayload,

    /// Signature and structure valid but the deadline has passed
    #[error("token expired")]
    Expired,

    /// Caller error: resource id must not be empty
    #[error("resource id must not be empty")]
    EmptyResourceId,

    /// Caller error: token lifetime must be positive
    #[error("ttl must be positive, got {0}")]
    InvalidTtl(i64),

    /// Caller error: shared secret must not be empty
    #[error("shared secret must not be empty")]
    EmptySecret,
}

pub type TokenResult<T> = Result<T, TokenError>;
