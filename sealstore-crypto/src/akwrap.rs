//! Asymmetric wrapping of access keys and private keys.
//!
//! An access key is shared with a reader by box-encrypting it from the
//! authorizer's private key to the reader's public key. The wire form is the
//! dotted pair `eak.nonce`, both segments base64url. The same construction
//! re-wraps a group's private key for a new member in the group key chain.

use crate::codec;
use crate::error::{CryptoError, CryptoResult};
use crate::keys::AccessKey;
use crate::provider::CryptoProvider;
use zeroize::Zeroizing;

/// Encrypts an access key for a reader, producing the `eak.nonce` pair.
///
/// A fresh nonce is drawn per call, so the ciphertext is never idempotent
/// even for identical inputs.
pub fn encrypt_access_key(
    provider: &dyn CryptoProvider,
    access_key: &AccessKey,
    writer_private_key: &[u8],
    reader_public_key: &[u8],
) -> CryptoResult<String> {
    seal_pair(
        provider,
        access_key.as_bytes(),
        writer_private_key,
        reader_public_key,
    )
}

/// Decrypts an `eak.nonce` pair back to the raw access key.
pub fn decrypt_access_key(
    provider: &dyn CryptoProvider,
    encrypted: &str,
    authorizer_public_key: &[u8],
    reader_private_key: &[u8],
) -> CryptoResult<AccessKey> {
    let raw = open_pair(provider, encrypted, authorizer_public_key, reader_private_key)?;
    Ok(AccessKey::from_bytes(raw.to_vec()))
}

/// Re-encrypts a raw private key from one principal to another.
///
/// This is the group membership hop: the group's private key, recovered
/// transiently by an existing member, is immediately re-wrapped for the new
/// member's public key.
pub fn encrypt_private_key(
    provider: &dyn CryptoProvider,
    private_key: &[u8],
    writer_private_key: &[u8],
    reader_public_key: &[u8],
) -> CryptoResult<String> {
    seal_pair(provider, private_key, writer_private_key, reader_public_key)
}

/// Decrypts an `eak.nonce` pair to raw key bytes that zeroize on drop.
pub fn decrypt_key_pair(
    provider: &dyn CryptoProvider,
    encrypted: &str,
    public_key: &[u8],
    private_key: &[u8],
) -> CryptoResult<Zeroizing<Vec<u8>>> {
    open_pair(provider, encrypted, public_key, private_key)
}

fn seal_pair(
    provider: &dyn CryptoProvider,
    message: &[u8],
    private_key: &[u8],
    public_key: &[u8],
) -> CryptoResult<String> {
    let nonce = provider.random_bytes(provider.nonce_len());
    let eak = provider.encrypt_asymmetric(message, &nonce, public_key, private_key)?;
    Ok(format!(
        "{}.{}",
        codec::b64url_encode(&eak),
        codec::b64url_encode(&nonce)
    ))
}

fn open_pair(
    provider: &dyn CryptoProvider,
    encrypted: &str,
    public_key: &[u8],
    private_key: &[u8],
) -> CryptoResult<Zeroizing<Vec<u8>>> {
    let (eak, nonce) = encrypted.split_once('.').ok_or_else(|| {
        CryptoError::Encoding("encrypted key is not an eak.nonce pair".into())
    })?;
    let eak = codec::b64url_decode(eak)?;
    let nonce = codec::b64url_decode(nonce)?;
    let raw = provider.decrypt_asymmetric(&eak, &nonce, public_key, private_key)?;
    Ok(Zeroizing::new(raw))
}
