//! Token verification
//!
//! A pure function of (token, secret, clock): no I/O, no shared mutable
//! state, safe to call from any number of concurrent delivery requests.

use chrono::Utc;

use crate::encode::decode;
use crate::error::{TokenError, TokenResult};
use crate::payload::TokenPayload;
use crate::sign::verify_signature;
use crate::TOKEN_SEPARATOR;

/// Verifies capability tokens against the injected shared secret.
#[derive(Clone)]
pub struct TokenVerifier {
    secret: Vec<u8>,
}

impl TokenVerifier {
    /// Create a verifier for the given shared secret.
    ///
    /// Fails fast on an empty secret rather than accepting forgeable tokens.
    pub fn new(secret: impl Into<Vec<u8>>) -> TokenResult<Self> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(TokenError::EmptySecret);
        }
        Ok(Self { secret })
    }

    /// Verify `token` at the given clock reading.
    ///
    /// Checks run in strict order, each failure short-circuiting:
    /// structure, then signature (before the payload is parsed or its
    /// expiry examined, so unauthenticated content never influences a
    /// decision), then payload schema, then expiry. The expiry comparison
    /// is strict: a token with `expires_at == now` is already expired.
    pub fn verify(&self, token: &str, now: i64) -> TokenResult<TokenPayload> {
        let parts: Vec<&str> = token.split(TOKEN_SEPARATOR).collect();
        if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
            return Err(TokenError::MalformedToken);
        }
        let (encoded, signature) = (parts[0], parts[1]);

        if !verify_signature(&self.secret, encoded, signature) {
            return Err(TokenError::InvalidSignature);
        }

        let payload = TokenPayload::from_bytes(&decode(encoded)?)?;

        if now >= payload.expires_at {
            return Err(TokenError::Expired);
        }

        Ok(payload)
    }

    /// Verify `token` against the system clock
    pub fn verify_now(&self, token: &str) -> TokenResult<TokenPayload> {
        self.verify(token, Utc::now().timestamp())
    }
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never reveal the secret
        f.debug_struct("TokenVerifier").finish_non_exhaustive()
    }
}
