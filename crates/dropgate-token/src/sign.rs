//! HMAC-SHA256 signing
//!
//! Deterministic keyed authentication over the encoded payload text. The
//! signature travels as lowercase hex, and verification always compares in
//! constant time.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Compute the HMAC-SHA256 of `text` under `secret`, as lowercase hex
pub fn sign(secret: &[u8], text: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret).expect("HMAC accepts keys of any length");
    mac.update(text.as_bytes());
    hex::encode(&mac.finalize().into_bytes())
}

/// Check `candidate` against the expected signature of `text`.
///
/// The comparison is constant time over equal-length buffers; a length
/// mismatch rejects up front without inspecting content.
pub fn verify_signature(secret: &[u8], text: &str, candidate: &str) -> bool {
    let expected = sign(secret, text);
    let expected = expected.as_bytes();
    let candidate = candidate.as_bytes();

    if expected.len() != candidate.len() {
        return false;
    }

    expected.ct_eq(candidate).into()
}

/// Hex encoding helper
mod hex {
    pub fn encode(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }
}
