//! Token payload (the signed claim set)

use serde::{Deserialize, Serialize};

use crate::error::{TokenError, TokenResult};

/// The claims carried by a capability token.
///
/// The canonical wire form is JSON with fields in declaration order:
/// `{"resource_id":…,"issued_at":…,"expires_at":…}`. Independent
/// implementations must serialize in this order so signatures interoperate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPayload {
    /// Identifier of the asset or transaction being authorized
    pub resource_id: String,
    /// Unix timestamp (seconds) when the token was minted
    pub issued_at: i64,
    /// Unix timestamp (seconds) after which the token is invalid
    pub expires_at: i64,
}

impl TokenPayload {
    /// Serialize to the canonical JSON byte form
    pub fn to_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).expect("payload serialization cannot fail")
    }

    /// Parse and structurally validate a payload from its canonical bytes
    pub fn from_bytes(bytes: &[u8]) -> TokenResult<Self> {
        let payload: Self =
            serde_json::from_slice(bytes).map_err(|_| TokenError::MalformedPayload)?;
        payload.validate()?;
        Ok(payload)
    }

    /// Check the structural invariants
    pub fn validate(&self) -> TokenResult<()> {
        if self.resource_id.is_empty() {
            return Err(TokenError::MalformedPayload);
        }
        if self.expires_at <= self.issued_at {
            return Err(TokenError::MalformedPayload);
        }
        Ok(())
    }
}
