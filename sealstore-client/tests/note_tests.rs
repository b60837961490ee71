//! Note encryption: per-field signatures pinned to an object salt.

mod support;

use sealstore_client::{ClientError, KeyPair, Note, NoteCipher};
use sealstore_crypto::{AccessKey, CryptoError};
use std::collections::BTreeMap;
use support::provider;

fn sample_note() -> Note {
    let mut data = BTreeMap::new();
    data.insert("secret".into(), "the launch code".into());
    data.insert("owner".into(), "alice".into());
    Note {
        note_id: None,
        data,
        plain: BTreeMap::new(),
        signature: None,
        writer_signing_key: None,
        writer_encryption_key: None,
        eacp: None,
    }
}

#[tokio::test]
async fn note_roundtrip() {
    let p = provider();
    let ak = AccessKey::random(p.as_ref());
    let signing = KeyPair::generate_signing(p.as_ref()).unwrap();
    let cipher = NoteCipher::new(p);
    let note = sample_note();

    let encrypted = cipher
        .encrypt_note(&note, &ak, &signing.private_key)
        .unwrap();
    assert!(encrypted.signature.is_some());
    assert_ne!(encrypted.data["secret"], note.data["secret"]);

    let decrypted = cipher
        .decrypt_note(&encrypted, &ak, &signing.public_key)
        .unwrap();
    assert_eq!(decrypted.data, note.data);
}

#[tokio::test]
async fn fields_swapped_between_notes_fail_verification() {
    let p = provider();
    let ak = AccessKey::random(p.as_ref());
    let signing = KeyPair::generate_signing(p.as_ref()).unwrap();
    let cipher = NoteCipher::new(p);

    let a = cipher
        .encrypt_note(&sample_note(), &ak, &signing.private_key)
        .unwrap();
    let b = cipher
        .encrypt_note(&sample_note(), &ak, &signing.private_key)
        .unwrap();

    // Graft a field from note B into note A. Its own signature is valid, but
    // it was signed under B's salt, not A's.
    let mut grafted = a.clone();
    grafted
        .data
        .insert("secret".into(), b.data["secret"].clone());

    let err = cipher
        .decrypt_note(&grafted, &ak, &signing.public_key)
        .unwrap_err();
    assert!(matches!(
        err,
        ClientError::Crypto(CryptoError::SignatureMismatch(_))
    ));
}

#[tokio::test]
async fn wrong_writer_key_fails_verification() {
    let p = provider();
    let ak = AccessKey::random(p.as_ref());
    let signing = KeyPair::generate_signing(p.as_ref()).unwrap();
    let other = KeyPair::generate_signing(p.as_ref()).unwrap();
    let cipher = NoteCipher::new(p);

    let encrypted = cipher
        .encrypt_note(&sample_note(), &ak, &signing.private_key)
        .unwrap();
    assert!(cipher
        .decrypt_note(&encrypted, &ak, &other.public_key)
        .is_err());
}

#[tokio::test]
async fn legacy_unsigned_note_decrypts_without_verification() {
    let p = provider();
    let ak = AccessKey::random(p.as_ref());
    let signing = KeyPair::generate_signing(p.as_ref()).unwrap();
    let cipher = NoteCipher::new(p.clone());

    // A note written before field signing: fields encrypted directly, no
    // signature slot.
    let note = sample_note();
    let mut data = BTreeMap::new();
    for (name, value) in &note.data {
        data.insert(
            name.clone(),
            sealstore_crypto::encrypt_field(p.as_ref(), value, &ak).unwrap(),
        );
    }
    let mut legacy = note.clone();
    legacy.data = data;

    let decrypted = cipher
        .decrypt_note(&legacy, &ak, &signing.public_key)
        .unwrap();
    assert_eq!(decrypted.data, note.data);
    assert!(decrypted.signature.is_none());
}

#[tokio::test]
async fn eacp_travels_untouched() {
    let p = provider();
    let ak = AccessKey::random(p.as_ref());
    let signing = KeyPair::generate_signing(p.as_ref()).unwrap();
    let cipher = NoteCipher::new(p);

    let mut note = sample_note();
    note.eacp = Some(serde_json::json!({"email_eacp": {"email_address": "x@example.com"}}));
    let encrypted = cipher
        .encrypt_note(&note, &ak, &signing.private_key)
        .unwrap();
    assert_eq!(encrypted.eacp, note.eacp);
    let decrypted = cipher
        .decrypt_note(&encrypted, &ak, &signing.public_key)
        .unwrap();
    assert_eq!(decrypted.eacp, note.eacp);
}
