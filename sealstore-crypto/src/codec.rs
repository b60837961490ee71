//! Byte/string codecs shared across the wire formats.
//!
//! Every binary segment in the dotted-quad field format, the EAK pair format,
//! and the file envelope header is base64url without padding. The upload
//! checksum is the one place standard base64 appears.

use crate::error::{CryptoError, CryptoResult};
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;

/// Encodes bytes as base64url without padding.
pub fn b64url_encode(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decodes a base64url string (padding optional on input).
pub fn b64url_decode(encoded: &str) -> CryptoResult<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(encoded.trim_end_matches('='))
        .map_err(|e| CryptoError::Encoding(format!("base64url decode failed: {e}")))
}

/// Encodes bytes as standard base64 (used for upload checksums only).
pub fn b64_encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Interprets bytes as UTF-8.
pub fn utf8_to_string(bytes: &[u8]) -> CryptoResult<String> {
    String::from_utf8(bytes.to_vec())
        .map_err(|e| CryptoError::Encoding(format!("invalid UTF-8: {e}")))
}
