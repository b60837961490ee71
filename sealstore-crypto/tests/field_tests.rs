//! Field codec tests: dotted-quad round-trips, tamper detection, and the
//! salted field signature scheme.

use pretty_assertions::{assert_eq, assert_ne};
use sealstore_crypto::{
    codec, decrypt_field, encrypt_field, sign_field, verify_field, AccessKey, CryptoError,
    CryptoProvider, NaclProvider, SIGNATURE_VERSION,
};

fn provider() -> NaclProvider {
    NaclProvider::new()
}

#[test]
fn field_roundtrip() {
    let p = provider();
    let ak = AccessKey::random(&p);
    let quad = encrypt_field(&p, "secret", &ak).unwrap();
    assert_eq!(decrypt_field(&p, &quad, &ak).unwrap(), "secret");
}

#[test]
fn quad_has_four_base64url_segments() {
    let p = provider();
    let ak = AccessKey::random(&p);
    let quad = encrypt_field(&p, "secret", &ak).unwrap();

    let segments: Vec<&str> = quad.split('.').collect();
    assert_eq!(segments.len(), 4);
    for segment in segments {
        assert!(!segment.is_empty());
        codec::b64url_decode(segment).expect("segment must be valid base64url");
    }
}

#[test]
fn same_plaintext_encrypts_differently() {
    let p = provider();
    let ak = AccessKey::random(&p);
    let a = encrypt_field(&p, "secret", &ak).unwrap();
    let b = encrypt_field(&p, "secret", &ak).unwrap();
    assert_ne!(a, b, "fresh data key and nonces per field");
}

#[test]
fn empty_field_roundtrip() {
    let p = provider();
    let ak = AccessKey::random(&p);
    let quad = encrypt_field(&p, "", &ak).unwrap();
    assert_eq!(decrypt_field(&p, &quad, &ak).unwrap(), "");
}

#[test]
fn unicode_field_roundtrip() {
    let p = provider();
    let ak = AccessKey::random(&p);
    let value = "pæder — データ ✓";
    let quad = encrypt_field(&p, value, &ak).unwrap();
    assert_eq!(decrypt_field(&p, &quad, &ak).unwrap(), value);
}

#[test]
fn wrong_access_key_fails() {
    let p = provider();
    let ak = AccessKey::random(&p);
    let other = AccessKey::random(&p);
    let quad = encrypt_field(&p, "secret", &ak).unwrap();
    assert!(matches!(
        decrypt_field(&p, &quad, &other),
        Err(CryptoError::Decryption(_))
    ));
}

/// Flips one byte inside a base64url segment of the quad.
fn tamper_segment(quad: &str, index: usize) -> String {
    let mut segments: Vec<String> = quad.split('.').map(str::to_string).collect();
    let mut raw = codec::b64url_decode(&segments[index]).unwrap();
    raw[0] ^= 0x01;
    segments[index] = codec::b64url_encode(&raw);
    segments.join(".")
}

#[test]
fn tampered_edk_fails() {
    let p = provider();
    let ak = AccessKey::random(&p);
    let quad = encrypt_field(&p, "secret", &ak).unwrap();
    let tampered = tamper_segment(&quad, 0);
    assert!(matches!(
        decrypt_field(&p, &tampered, &ak),
        Err(CryptoError::Decryption(_))
    ));
}

#[test]
fn tampered_ef_fails() {
    let p = provider();
    let ak = AccessKey::random(&p);
    let quad = encrypt_field(&p, "secret", &ak).unwrap();
    let tampered = tamper_segment(&quad, 2);
    assert!(matches!(
        decrypt_field(&p, &tampered, &ak),
        Err(CryptoError::Decryption(_))
    ));
}

#[test]
fn wrong_segment_count_is_rejected() {
    let p = provider();
    let ak = AccessKey::random(&p);
    assert!(matches!(
        decrypt_field(&p, "only.three.segments", &ak),
        Err(CryptoError::Encoding(_))
    ));
}

#[test]
fn signed_field_roundtrip() {
    let p = provider();
    let (verifying, signing) = p.generate_signing_keypair().unwrap();
    let signed = sign_field(&p, "email", "user@example.com", &signing, None).unwrap();
    assert!(signed.starts_with(SIGNATURE_VERSION));
    let plain = verify_field(&p, "email", &signed, &verifying, None).unwrap();
    assert_eq!(plain, "user@example.com");
}

#[test]
fn unsigned_value_passes_through_unchanged() {
    let p = provider();
    let (verifying, _) = p.generate_signing_keypair().unwrap();
    let plain = verify_field(&p, "email", "no signature here", &verifying, None).unwrap();
    assert_eq!(plain, "no signature here");
}

#[test]
fn object_salt_is_pinned() {
    let p = provider();
    let (verifying, signing) = p.generate_signing_keypair().unwrap();
    let signed = sign_field(&p, "k", "v", &signing, Some("salt-a")).unwrap();

    assert_eq!(
        verify_field(&p, "k", &signed, &verifying, Some("salt-a")).unwrap(),
        "v"
    );
    assert!(matches!(
        verify_field(&p, "k", &signed, &verifying, Some("salt-b")),
        Err(CryptoError::SignatureMismatch(_))
    ));
}

#[test]
fn signature_covers_the_field_key() {
    let p = provider();
    let (verifying, signing) = p.generate_signing_keypair().unwrap();
    let signed = sign_field(&p, "email", "value", &signing, None).unwrap();
    // Same signed value presented under a different key must not verify.
    assert!(matches!(
        verify_field(&p, "phone", &signed, &verifying, None),
        Err(CryptoError::InvalidSignature(_))
    ));
}

#[test]
fn altered_value_fails_verification() {
    let p = provider();
    let (verifying, signing) = p.generate_signing_keypair().unwrap();
    let signed = sign_field(&p, "k", "value", &signing, None).unwrap();
    let altered = format!("{signed}x");
    assert!(matches!(
        verify_field(&p, "k", &altered, &verifying, None),
        Err(CryptoError::InvalidSignature(_))
    ));
}

#[test]
fn wrong_verifying_key_fails() {
    let p = provider();
    let (_, signing) = p.generate_signing_keypair().unwrap();
    let (other_verifying, _) = p.generate_signing_keypair().unwrap();
    let signed = sign_field(&p, "k", "v", &signing, None).unwrap();
    assert!(matches!(
        verify_field(&p, "k", &signed, &other_verifying, None),
        Err(CryptoError::InvalidSignature(_))
    ));
}
