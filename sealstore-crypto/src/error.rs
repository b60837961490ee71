//! Error types for the cryptographic core.

use thiserror::Error;

/// Result type for cryptographic operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors that can occur during cryptographic operations.
///
/// Every failure is terminal for the operation that produced it. Nothing in
/// this crate retries internally, and no variant is ever mapped to an empty
/// plaintext: callers either get the authenticated bytes or an error.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("decryption failed (wrong key or tampered ciphertext): {0}")]
    Decryption(String),

    #[error("stream block failed authentication")]
    InvalidCiphertext,

    #[error("invalid signature for field {0:?}")]
    InvalidSignature(String),

    #[error("signature salt mismatch for field {0:?}")]
    SignatureMismatch(String),

    #[error("malformed file envelope: {0}")]
    MalformedEnvelope(String),

    #[error("unsupported file version {found} (this client supports version {supported})")]
    UnsupportedFileVersion { found: u32, supported: u32 },

    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("encoding error: {0}")]
    Encoding(String),
}
