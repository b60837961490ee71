//! The pluggable primitive provider seam.
//!
//! The core never implements raw primitives itself; it consumes them through
//! [`CryptoProvider`]. Implementations must agree on a NaCl-compatible
//! parameter profile (explicit nonces, detached signatures, a streaming AEAD
//! with a fixed header and per-block overhead) but are otherwise free to pick
//! their backing library. [`crate::nacl::NaclProvider`] is the default.

use crate::error::CryptoResult;

/// Raw cryptographic primitives consumed by the core.
///
/// All key and nonce arguments are raw bytes; length constants are exposed so
/// callers can size random material without knowing the backing algorithms.
pub trait CryptoProvider: Send + Sync {
    /// Short name of the backing implementation, for diagnostics only.
    fn mode(&self) -> &'static str;

    /// Nonce length for the symmetric and asymmetric AEADs.
    fn nonce_len(&self) -> usize;

    /// Symmetric AEAD key length.
    fn key_len(&self) -> usize;

    /// Streaming AEAD key length.
    fn stream_key_len(&self) -> usize;

    /// Streaming AEAD header length.
    fn stream_header_len(&self) -> usize;

    /// Per-block ciphertext overhead of the streaming AEAD.
    fn stream_overhead_len(&self) -> usize;

    /// Fills a fresh buffer with `len` random bytes from a secure source.
    fn random_bytes(&self, len: usize) -> Vec<u8>;

    /// Symmetric AEAD encryption with an explicit nonce.
    fn encrypt_symmetric(&self, plain: &[u8], nonce: &[u8], key: &[u8]) -> CryptoResult<Vec<u8>>;

    /// Symmetric AEAD decryption. Fails on any authentication error.
    fn decrypt_symmetric(&self, cipher: &[u8], nonce: &[u8], key: &[u8]) -> CryptoResult<Vec<u8>>;

    /// Asymmetric (box) encryption from `private_key` to `public_key`.
    fn encrypt_asymmetric(
        &self,
        message: &[u8],
        nonce: &[u8],
        public_key: &[u8],
        private_key: &[u8],
    ) -> CryptoResult<Vec<u8>>;

    /// Asymmetric (box) decryption. Fails on any authentication error.
    fn decrypt_asymmetric(
        &self,
        cipher: &[u8],
        nonce: &[u8],
        public_key: &[u8],
        private_key: &[u8],
    ) -> CryptoResult<Vec<u8>>;

    /// Generates an encryption keypair, returned as `(public, private)` bytes.
    fn generate_keypair(&self) -> CryptoResult<(Vec<u8>, Vec<u8>)>;

    /// Generates a signing keypair, returned as `(verifying, signing)` bytes.
    fn generate_signing_keypair(&self) -> CryptoResult<(Vec<u8>, Vec<u8>)>;

    /// Detached signature over `message`.
    fn sign(&self, message: &[u8], signing_key: &[u8]) -> CryptoResult<Vec<u8>>;

    /// Verifies a detached signature. Returns `Ok(false)` on a well-formed but
    /// invalid signature; errors are reserved for malformed key material.
    fn verify(&self, signature: &[u8], message: &[u8], verifying_key: &[u8])
        -> CryptoResult<bool>;

    /// Generic cryptographic hash of `message`.
    fn hash(&self, message: &[u8]) -> Vec<u8>;

    /// Creates a streaming AEAD encryption context keyed by `key`.
    fn encrypt_stream(&self, key: &[u8]) -> CryptoResult<Box<dyn StreamEncrypter>>;

    /// Creates a streaming AEAD decryption context from a stream header.
    fn decrypt_stream(&self, key: &[u8], header: &[u8])
        -> CryptoResult<Box<dyn StreamDecrypter>>;

    /// Creates an incremental checksum used as the upload integrity digest.
    fn checksum(&self) -> Box<dyn Checksum>;
}

/// Push side of the streaming AEAD.
pub trait StreamEncrypter: Send {
    /// The stream header that must precede all ciphertext blocks.
    fn header(&self) -> &[u8];

    /// Encrypts one block. `final_block` marks stream termination inside the
    /// AEAD tag itself, not via block length.
    fn push(&mut self, block: &[u8], final_block: bool) -> CryptoResult<Vec<u8>>;
}

/// Pull side of the streaming AEAD.
pub trait StreamDecrypter: Send {
    /// Decrypts one block, returning the plaintext and whether the block
    /// carried the final tag. Fails closed on authentication errors.
    fn pull(&mut self, block: &[u8]) -> CryptoResult<(Vec<u8>, bool)>;
}

/// Incremental digest over every byte written to the destination.
pub trait Checksum: Send {
    fn update(&mut self, bytes: &[u8]);

    /// Consumes the checksum and returns the raw digest.
    fn finish(self: Box<Self>) -> Vec<u8>;
}
