//! Client-layer error types.

use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors surfaced by the orchestration layer.
///
/// Key-path failures (`KeyUnavailable`, `NoReachableWrapper`) are access
/// denials, not transient faults; nothing here is retried internally.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("crypto error: {0}")]
    Crypto(#[from] sealstore_crypto::CryptoError),

    #[error("no usable key for scope {0}: {1}")]
    KeyUnavailable(String, String),

    #[error("no membership key wrapper reachable with the caller's private key")]
    NoReachableWrapper,

    #[error("key registry error: {0}")]
    Registry(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
