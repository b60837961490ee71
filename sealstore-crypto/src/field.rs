//! Field-level double encryption and salted field signatures.
//!
//! Every data field is encrypted under a fresh random data key, and only that
//! data key is encrypted under the scope's access key. The wire form is the
//! dotted quad `edk.edkN.ef.efN` with base64url segments. This bounds the
//! blast radius of any single data key and keeps bulk operations from
//! re-deriving from the access key per field.
//!
//! Field signatures prefix the plaintext with `version;salt;sigLen;signature`
//! where the signature covers `hash(salt ‖ fieldKey ‖ value)`. The salt can be
//! shared across all fields of one object or chosen per field; the verifier
//! accepts an optional pinned salt.

use crate::codec;
use crate::error::{CryptoError, CryptoResult};
use crate::keys::AccessKey;
use crate::provider::CryptoProvider;
use uuid::Uuid;
use zeroize::Zeroizing;

/// Version identifier for the field signature scheme
/// (UUIDv5 of "TFSP1;ED25519;BLAKE2B").
pub const SIGNATURE_VERSION: &str = "e7737e7c-1637-511e-8bab-93c4f3e26fd9";

/// Encrypts a single field value into the dotted-quad form.
pub fn encrypt_field(
    provider: &dyn CryptoProvider,
    field: &str,
    access_key: &AccessKey,
) -> CryptoResult<String> {
    access_key.check_len(provider)?;
    let dk = Zeroizing::new(provider.random_bytes(provider.key_len()));
    let efn = provider.random_bytes(provider.nonce_len());
    let ef = provider.encrypt_symmetric(field.as_bytes(), &efn, &dk)?;
    let edkn = provider.random_bytes(provider.nonce_len());
    let edk = provider.encrypt_symmetric(&dk, &edkn, access_key.as_bytes())?;

    Ok([&edk, &edkn, &ef, &efn]
        .map(|segment| codec::b64url_encode(segment))
        .join("."))
}

/// Decrypts a dotted-quad field back to its plaintext string.
///
/// Fails with [`CryptoError::Decryption`] if either AEAD step fails; no
/// partial data is ever returned.
pub fn decrypt_field(
    provider: &dyn CryptoProvider,
    encrypted_field: &str,
    access_key: &AccessKey,
) -> CryptoResult<String> {
    let segments: Vec<&str> = encrypted_field.split('.').collect();
    let [edk, edkn, ef, efn] = segments.as_slice() else {
        return Err(CryptoError::Encoding(format!(
            "encrypted field has {} segments, expected 4",
            segments.len()
        )));
    };
    let edk = codec::b64url_decode(edk)?;
    let edkn = codec::b64url_decode(edkn)?;
    let ef = codec::b64url_decode(ef)?;
    let efn = codec::b64url_decode(efn)?;

    let dk = Zeroizing::new(provider.decrypt_symmetric(&edk, &edkn, access_key.as_bytes())?);
    let field = provider.decrypt_symmetric(&ef, &efn, &dk)?;
    codec::utf8_to_string(&field)
}

/// Signs a key/value pair, prefixing the value with the signature header.
///
/// When `object_salt` is absent a fresh random UUID salt is generated, making
/// the signature independent of any other field.
pub fn sign_field(
    provider: &dyn CryptoProvider,
    key: &str,
    value: &str,
    signing_key: &[u8],
    object_salt: Option<&str>,
) -> CryptoResult<String> {
    let generated;
    let salt = match object_salt {
        Some(salt) => salt,
        None => {
            generated = Uuid::new_v4().to_string();
            &generated
        }
    };
    let message = field_digest(provider, salt, key, value);
    let raw_signature = provider.sign(message.as_bytes(), signing_key)?;
    let signature = codec::b64url_encode(&raw_signature);
    Ok(format!(
        "{SIGNATURE_VERSION};{salt};{len};{signature}{value}",
        len = signature.len()
    ))
}

/// Verifies a signed field and strips the signature header.
///
/// A value that does not begin with the recognized signature version is
/// treated as unsigned and returned unchanged; that is a deliberate
/// backward-compatibility affordance for data written before field signing
/// existed, not an error.
pub fn verify_field(
    provider: &dyn CryptoProvider,
    key: &str,
    value: &str,
    verifying_key: &[u8],
    object_salt: Option<&str>,
) -> CryptoResult<String> {
    let mut parts = value.splitn(4, ';');
    let (Some(version), Some(salt), Some(len_str)) = (parts.next(), parts.next(), parts.next())
    else {
        return Ok(value.to_string());
    };
    if version != SIGNATURE_VERSION {
        return Ok(value.to_string());
    }
    if let Some(expected) = object_salt {
        if salt != expected {
            return Err(CryptoError::SignatureMismatch(key.to_string()));
        }
    }
    let signature_len: usize = len_str
        .parse()
        .map_err(|_| CryptoError::InvalidSignature(key.to_string()))?;
    // Header is the three parts plus the three semicolons.
    let header_len = version.len() + salt.len() + len_str.len() + 3;
    let signature = value
        .get(header_len..header_len + signature_len)
        .ok_or_else(|| CryptoError::InvalidSignature(key.to_string()))?;
    let plain = value
        .get(header_len + signature_len..)
        .ok_or_else(|| CryptoError::InvalidSignature(key.to_string()))?;

    let message = field_digest(provider, salt, key, plain);
    let raw_signature = codec::b64url_decode(signature)?;
    if !provider.verify(&raw_signature, message.as_bytes(), verifying_key)? {
        return Err(CryptoError::InvalidSignature(key.to_string()));
    }
    Ok(plain.to_string())
}

/// Base64url digest of `salt ‖ key ‖ value`, the message actually signed.
fn field_digest(provider: &dyn CryptoProvider, salt: &str, key: &str, value: &str) -> String {
    codec::b64url_encode(&provider.hash(format!("{salt}{key}{value}").as_bytes()))
}
