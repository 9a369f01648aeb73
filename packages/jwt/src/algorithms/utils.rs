//! JWT Algorithm Utilities - Base64 encoding/decoding and key format helpers

use crate::error::SignerError;
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};

/// Base64 URL-safe encoding without padding (RFC 7515)
#[inline]
pub(crate) fn base64_url_encode(input: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(input)
}

/// Base64 URL-safe decoding without padding (RFC 7515)
#[inline]
pub(crate) fn base64_url_decode(input: &str) -> Result<Vec<u8>, base64::DecodeError> {
    URL_SAFE_NO_PAD.decode(input)
}

/// Encoded key as handed to a key parser
pub(crate) enum KeyEncoding<'a> {
    /// PEM text
    Pem(&'a str),
    /// Binary DER (or raw bytes)
    Der(&'a [u8]),
}

/// Detect PEM text, falling back to binary DER
pub(crate) fn key_encoding<'a>(
    key: &'a [u8],
    algorithm: &'static str,
) -> Result<KeyEncoding<'a>, SignerError> {
    let trimmed = key.trim_ascii_start();
    if trimmed.starts_with(b"-----BEGIN") {
        let pem = std::str::from_utf8(trimmed)
            .map_err(|_| SignerError::invalid_key(algorithm, "PEM key is not valid UTF-8"))?;
        Ok(KeyEncoding::Pem(pem))
    } else {
        Ok(KeyEncoding::Der(key))
    }
}
