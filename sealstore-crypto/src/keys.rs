//! Key material containers.
//!
//! Raw symmetric keys are wrapped so they zeroize on drop and never leak
//! through `Debug` output or logs.

use crate::error::{CryptoError, CryptoResult};
use crate::provider::CryptoProvider;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A raw symmetric access key protecting all fields of one
/// (writer, user, record type) scope.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct AccessKey(Vec<u8>);

impl AccessKey {
    /// Generates a fresh random access key sized for the provider's
    /// symmetric AEAD.
    pub fn random(provider: &dyn CryptoProvider) -> Self {
        Self(provider.random_bytes(provider.key_len()))
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Validates the key length against the provider's expectation.
    pub fn check_len(&self, provider: &dyn CryptoProvider) -> CryptoResult<()> {
        let expected = provider.key_len();
        if self.0.len() != expected {
            return Err(CryptoError::InvalidKeyLength {
                expected,
                actual: self.0.len(),
            });
        }
        Ok(())
    }
}

impl fmt::Debug for AccessKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccessKey({} bytes redacted)", self.0.len())
    }
}

/// A one-time key for the streaming file cipher, wrapped under an access key
/// in the file envelope header.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct StreamKey(Vec<u8>);

impl StreamKey {
    pub fn random(provider: &dyn CryptoProvider) -> Self {
        Self(provider.random_bytes(provider.stream_key_len()))
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for StreamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StreamKey({} bytes redacted)", self.0.len())
    }
}
