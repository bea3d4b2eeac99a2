//! Token issuance

use chrono::Utc;

use crate::encode::encode;
use crate::error::{TokenError, TokenResult};
use crate::payload::TokenPayload;
use crate::sign::sign;
use crate::TOKEN_SEPARATOR;

/// Mints signed, expiring capability tokens.
///
/// Holds the shared secret by value; the secret is injected at construction
/// and never read from ambient state, so issuance is a pure function of its
/// arguments plus the clock.
#[derive(Clone)]
pub struct TokenIssuer {
    secret: Vec<u8>,
}

impl TokenIssuer {
    /// Create an issuer for the given shared secret.
    ///
    /// Fails fast on an empty secret rather than minting forgeable tokens.
    pub fn new(secret: impl Into<Vec<u8>>) -> TokenResult<Self> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(TokenError::EmptySecret);
        }
        Ok(Self { secret })
    }

    /// Issue a token for `resource_id`, valid for `ttl_seconds` from now
    pub fn issue(&self, resource_id: &str, ttl_seconds: i64) -> TokenResult<String> {
        self.issue_at(resource_id, ttl_seconds, Utc::now().timestamp())
    }

    /// Issue a token with an explicit clock reading.
    ///
    /// This is the deterministic form; `issue` delegates here.
    pub fn issue_at(
        &self,
        resource_id: &str,
        ttl_seconds: i64,
        now: i64,
    ) -> TokenResult<String> {
        if resource_id.is_empty() {
            return Err(TokenError::EmptyResourceId);
        }
        if ttl_seconds <= 0 {
            return Err(TokenError::InvalidTtl(ttl_seconds));
        }

        let payload = TokenPayload {
            resource_id: resource_id.to_string(),
            issued_at: now,
            expires_at: now + ttl_seconds,
        };

        let encoded = encode(&payload.to_bytes());
        let signature = sign(&self.secret, &encoded);

        Ok(format!("{}{}{}", encoded, TOKEN_SEPARATOR, signature))
    }
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never reveal the secret
        f.debug_struct("TokenIssuer").finish_non_exhaustive()
    }
}
