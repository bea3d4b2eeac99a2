//! URL-safe payload encoding
//!
//! Tokens travel as query parameters, so the payload uses the URL- and
//! filename-safe base64 alphabet without padding.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use crate::error::{TokenError, TokenResult};

/// Encode bytes as unpadded URL-safe base64
pub fn encode(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode unpadded URL-safe base64 back into bytes
pub fn decode(text: &str) -> TokenResult<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(text)
        .map_err(|_| TokenError::MalformedPayload)
}
