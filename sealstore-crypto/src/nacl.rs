//! Default [`CryptoProvider`] built on the NaCl-compatible RustCrypto stack.
//!
//! Parameter profile: 24-byte nonces, 32-byte keys, XChaCha20-Poly1305 for
//! symmetric AEAD, X25519+XSalsa20-Poly1305 (`crypto_box`) for asymmetric,
//! Ed25519 detached signatures, BLAKE2b-256 hashing, and MD5 for the upload
//! checksum (the storage service expects a Content-MD5 style digest).
//!
//! The streaming AEAD mirrors libsodium's secretstream contract: a 24-byte
//! random header, a 17-byte per-block overhead (one tag byte sealed with the
//! plaintext plus the 16-byte MAC), and stream termination signalled by the
//! final tag rather than block length. Block nonces are the first 20 header
//! bytes concatenated with a 32-bit big-endian block counter, so blocks can
//! neither be reordered nor truncated without failing authentication.

use crate::error::{CryptoError, CryptoResult};
use crate::provider::{Checksum, CryptoProvider, StreamDecrypter, StreamEncrypter};
use blake2::digest::consts::U32;
use blake2::Blake2b;
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{XChaCha20Poly1305, XNonce};
use crypto_box::{PublicKey, SalsaBox, SecretKey};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use md5::Md5;
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroizing;

type Blake2b256 = Blake2b<U32>;

const NONCE_LEN: usize = 24;
const KEY_LEN: usize = 32;
const STREAM_HEADER_LEN: usize = 24;
// One sealed tag byte plus the 16-byte Poly1305 MAC.
const STREAM_OVERHEAD_LEN: usize = 17;

const TAG_MESSAGE: u8 = 0;
const TAG_FINAL: u8 = 3;

/// NaCl-profile primitive provider.
#[derive(Clone, Copy, Default)]
pub struct NaclProvider;

impl NaclProvider {
    pub fn new() -> Self {
        Self
    }
}

fn fixed<const N: usize>(bytes: &[u8]) -> CryptoResult<[u8; N]> {
    bytes
        .try_into()
        .map_err(|_| CryptoError::InvalidKeyLength {
            expected: N,
            actual: bytes.len(),
        })
}

fn block_nonce(header: &[u8; STREAM_HEADER_LEN], counter: u32) -> [u8; NONCE_LEN] {
    let mut nonce = [0u8; NONCE_LEN];
    nonce[..20].copy_from_slice(&header[..20]);
    nonce[20..].copy_from_slice(&counter.to_be_bytes());
    nonce
}

impl CryptoProvider for NaclProvider {
    fn mode(&self) -> &'static str {
        "nacl"
    }

    fn nonce_len(&self) -> usize {
        NONCE_LEN
    }

    fn key_len(&self) -> usize {
        KEY_LEN
    }

    fn stream_key_len(&self) -> usize {
        KEY_LEN
    }

    fn stream_header_len(&self) -> usize {
        STREAM_HEADER_LEN
    }

    fn stream_overhead_len(&self) -> usize {
        STREAM_OVERHEAD_LEN
    }

    fn random_bytes(&self, len: usize) -> Vec<u8> {
        let mut bytes = vec![0u8; len];
        OsRng.fill_bytes(&mut bytes);
        bytes
    }

    fn encrypt_symmetric(&self, plain: &[u8], nonce: &[u8], key: &[u8]) -> CryptoResult<Vec<u8>> {
        let key: [u8; KEY_LEN] = fixed(key)?;
        let nonce: [u8; NONCE_LEN] = fixed(nonce)?;
        let cipher = XChaCha20Poly1305::new_from_slice(&key)
            .map_err(|e| CryptoError::Encryption(format!("bad symmetric key: {e}")))?;
        cipher
            .encrypt(XNonce::from_slice(&nonce), plain)
            .map_err(|e| CryptoError::Encryption(format!("symmetric encrypt failed: {e}")))
    }

    fn decrypt_symmetric(&self, cipher: &[u8], nonce: &[u8], key: &[u8]) -> CryptoResult<Vec<u8>> {
        let key: [u8; KEY_LEN] = fixed(key)?;
        let nonce: [u8; NONCE_LEN] = fixed(nonce)?;
        let aead = XChaCha20Poly1305::new_from_slice(&key)
            .map_err(|e| CryptoError::Decryption(format!("bad symmetric key: {e}")))?;
        aead.decrypt(XNonce::from_slice(&nonce), cipher)
            .map_err(|_| CryptoError::Decryption("symmetric AEAD authentication failed".into()))
    }

    fn encrypt_asymmetric(
        &self,
        message: &[u8],
        nonce: &[u8],
        public_key: &[u8],
        private_key: &[u8],
    ) -> CryptoResult<Vec<u8>> {
        let public = PublicKey::from(fixed::<32>(public_key)?);
        let secret = SecretKey::from(fixed::<32>(private_key)?);
        let nonce: [u8; NONCE_LEN] = fixed(nonce)?;
        SalsaBox::new(&public, &secret)
            .encrypt(crypto_box::Nonce::from_slice(&nonce), message)
            .map_err(|e| CryptoError::Encryption(format!("box encrypt failed: {e}")))
    }

    fn decrypt_asymmetric(
        &self,
        cipher: &[u8],
        nonce: &[u8],
        public_key: &[u8],
        private_key: &[u8],
    ) -> CryptoResult<Vec<u8>> {
        let public = PublicKey::from(fixed::<32>(public_key)?);
        let secret = SecretKey::from(fixed::<32>(private_key)?);
        let nonce: [u8; NONCE_LEN] = fixed(nonce)?;
        SalsaBox::new(&public, &secret)
            .decrypt(crypto_box::Nonce::from_slice(&nonce), cipher)
            .map_err(|_| CryptoError::Decryption("box authentication failed".into()))
    }

    fn generate_keypair(&self) -> CryptoResult<(Vec<u8>, Vec<u8>)> {
        let secret = SecretKey::generate(&mut OsRng);
        let public = secret.public_key();
        Ok((public.as_bytes().to_vec(), secret.to_bytes().to_vec()))
    }

    fn generate_signing_keypair(&self) -> CryptoResult<(Vec<u8>, Vec<u8>)> {
        let signing = SigningKey::generate(&mut OsRng);
        let verifying = signing.verifying_key();
        Ok((
            verifying.to_bytes().to_vec(),
            signing.to_bytes().to_vec(),
        ))
    }

    fn sign(&self, message: &[u8], signing_key: &[u8]) -> CryptoResult<Vec<u8>> {
        let key = SigningKey::from_bytes(&fixed::<32>(signing_key)?);
        Ok(key.sign(message).to_bytes().to_vec())
    }

    fn verify(
        &self,
        signature: &[u8],
        message: &[u8],
        verifying_key: &[u8],
    ) -> CryptoResult<bool> {
        let key = VerifyingKey::from_bytes(&fixed::<32>(verifying_key)?)
            .map_err(|e| CryptoError::Encoding(format!("bad verifying key: {e}")))?;
        let Ok(signature) = Signature::from_slice(signature) else {
            return Ok(false);
        };
        Ok(key.verify(message, &signature).is_ok())
    }

    fn hash(&self, message: &[u8]) -> Vec<u8> {
        use blake2::Digest;
        Blake2b256::digest(message).to_vec()
    }

    fn encrypt_stream(&self, key: &[u8]) -> CryptoResult<Box<dyn StreamEncrypter>> {
        let key: [u8; KEY_LEN] = fixed(key)?;
        let mut header = [0u8; STREAM_HEADER_LEN];
        OsRng.fill_bytes(&mut header);
        let cipher = XChaCha20Poly1305::new_from_slice(&key)
            .map_err(|e| CryptoError::Encryption(format!("bad stream key: {e}")))?;
        Ok(Box::new(NaclStreamEncrypter {
            cipher,
            header,
            counter: 0,
            finished: false,
        }))
    }

    fn decrypt_stream(
        &self,
        key: &[u8],
        header: &[u8],
    ) -> CryptoResult<Box<dyn StreamDecrypter>> {
        let key: [u8; KEY_LEN] = fixed(key)?;
        let header: [u8; STREAM_HEADER_LEN] = header
            .try_into()
            .map_err(|_| CryptoError::MalformedEnvelope("short stream header".into()))?;
        let cipher = XChaCha20Poly1305::new_from_slice(&key)
            .map_err(|e| CryptoError::Decryption(format!("bad stream key: {e}")))?;
        Ok(Box::new(NaclStreamDecrypter {
            cipher,
            header,
            counter: 0,
            finished: false,
        }))
    }

    fn checksum(&self) -> Box<dyn Checksum> {
        use md5::Digest;
        Box::new(Md5Checksum(Md5::new()))
    }
}

struct NaclStreamEncrypter {
    cipher: XChaCha20Poly1305,
    header: [u8; STREAM_HEADER_LEN],
    counter: u32,
    finished: bool,
}

impl StreamEncrypter for NaclStreamEncrypter {
    fn header(&self) -> &[u8] {
        &self.header
    }

    fn push(&mut self, block: &[u8], final_block: bool) -> CryptoResult<Vec<u8>> {
        if self.finished {
            return Err(CryptoError::Encryption(
                "stream already finalized".into(),
            ));
        }
        let mut tagged = Zeroizing::new(Vec::with_capacity(block.len() + 1));
        tagged.push(if final_block { TAG_FINAL } else { TAG_MESSAGE });
        tagged.extend_from_slice(block);
        let nonce = block_nonce(&self.header, self.counter);
        let sealed = self
            .cipher
            .encrypt(XNonce::from_slice(&nonce), tagged.as_slice())
            .map_err(|e| CryptoError::Encryption(format!("stream push failed: {e}")))?;
        self.counter = self.counter.wrapping_add(1);
        self.finished = final_block;
        Ok(sealed)
    }
}

struct NaclStreamDecrypter {
    cipher: XChaCha20Poly1305,
    header: [u8; STREAM_HEADER_LEN],
    counter: u32,
    finished: bool,
}

impl StreamDecrypter for NaclStreamDecrypter {
    fn pull(&mut self, block: &[u8]) -> CryptoResult<(Vec<u8>, bool)> {
        if self.finished {
            return Err(CryptoError::InvalidCiphertext);
        }
        let nonce = block_nonce(&self.header, self.counter);
        let mut tagged = self
            .cipher
            .decrypt(XNonce::from_slice(&nonce), block)
            .map_err(|_| CryptoError::InvalidCiphertext)?;
        if tagged.is_empty() {
            return Err(CryptoError::InvalidCiphertext);
        }
        let tag = tagged.remove(0);
        let final_block = match tag {
            TAG_MESSAGE => false,
            TAG_FINAL => true,
            _ => return Err(CryptoError::InvalidCiphertext),
        };
        self.counter = self.counter.wrapping_add(1);
        self.finished = final_block;
        Ok((tagged, final_block))
    }
}

struct Md5Checksum(Md5);

impl Checksum for Md5Checksum {
    fn update(&mut self, bytes: &[u8]) {
        use md5::Digest;
        self.0.update(bytes);
    }

    fn finish(self: Box<Self>) -> Vec<u8> {
        use md5::Digest;
        self.0.finalize().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symmetric_roundtrip() {
        let p = NaclProvider::new();
        let key = p.random_bytes(KEY_LEN);
        let nonce = p.random_bytes(NONCE_LEN);
        let cipher = p.encrypt_symmetric(b"payload", &nonce, &key).unwrap();
        assert_eq!(p.decrypt_symmetric(&cipher, &nonce, &key).unwrap(), b"payload");
    }

    #[test]
    fn asymmetric_roundtrip() {
        let p = NaclProvider::new();
        let (writer_pub, writer_priv) = p.generate_keypair().unwrap();
        let (reader_pub, reader_priv) = p.generate_keypair().unwrap();
        let nonce = p.random_bytes(NONCE_LEN);
        let cipher = p
            .encrypt_asymmetric(b"ak", &nonce, &reader_pub, &writer_priv)
            .unwrap();
        let plain = p
            .decrypt_asymmetric(&cipher, &nonce, &writer_pub, &reader_priv)
            .unwrap();
        assert_eq!(plain, b"ak");
    }

    #[test]
    fn stream_blocks_cannot_be_reordered() {
        let p = NaclProvider::new();
        let key = p.random_bytes(KEY_LEN);
        let mut enc = p.encrypt_stream(&key).unwrap();
        let header = enc.header().to_vec();
        let b0 = enc.push(b"first", false).unwrap();
        let b1 = enc.push(b"second", true).unwrap();

        let mut dec = p.decrypt_stream(&key, &header).unwrap();
        assert!(dec.pull(&b1).is_err());
        drop(dec);

        let mut dec = p.decrypt_stream(&key, &header).unwrap();
        assert_eq!(dec.pull(&b0).unwrap(), (b"first".to_vec(), false));
        assert_eq!(dec.pull(&b1).unwrap(), (b"second".to_vec(), true));
    }

    #[test]
    fn sign_verify_detached() {
        let p = NaclProvider::new();
        let (verifying, signing) = p.generate_signing_keypair().unwrap();
        let sig = p.sign(b"doc", &signing).unwrap();
        assert!(p.verify(&sig, b"doc", &verifying).unwrap());
        assert!(!p.verify(&sig, b"other", &verifying).unwrap());
    }
}
