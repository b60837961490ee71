//! Record encryption round-trips and document signature canonicalization.

mod support;

use pretty_assertions::{assert_eq, assert_ne};
use sealstore_client::{KeyPair, Meta, Record, RecordCipher};
use sealstore_crypto::AccessKey;
use std::collections::BTreeMap;
use support::provider;
use uuid::Uuid;

fn sample_record(writer_id: Uuid) -> Record {
    let mut meta = Meta::new(writer_id, writer_id, "contact");
    meta.plain.insert("campaign".into(), "spring".into());
    let mut data = BTreeMap::new();
    data.insert("email".into(), "user@example.com".into());
    data.insert("phone".into(), "+1-555-0100".into());
    Record {
        meta,
        data,
        signature: None,
    }
}

#[tokio::test]
async fn record_roundtrip() {
    let p = provider();
    let ak = AccessKey::random(p.as_ref());
    let cipher = RecordCipher::new(p);
    let record = sample_record(Uuid::new_v4());

    let encrypted = cipher.encrypt_record(&record, &ak, None).unwrap();
    assert_ne!(encrypted.data["email"], record.data["email"]);
    // Plain meta travels untouched.
    assert_eq!(encrypted.meta.plain["campaign"], "spring");

    let decrypted = cipher.decrypt_record(&encrypted, &ak).unwrap();
    assert_eq!(decrypted.data, record.data);
}

#[tokio::test]
async fn every_field_value_is_a_dotted_quad() {
    let p = provider();
    let ak = AccessKey::random(p.as_ref());
    let cipher = RecordCipher::new(p);
    let encrypted = cipher
        .encrypt_record(&sample_record(Uuid::new_v4()), &ak, None)
        .unwrap();
    for value in encrypted.data.values() {
        assert_eq!(value.split('.').count(), 4);
    }
}

#[tokio::test]
async fn signed_record_verifies_after_decrypt() {
    let p = provider();
    let ak = AccessKey::random(p.as_ref());
    let signing = KeyPair::generate_signing(p.as_ref()).unwrap();
    let cipher = RecordCipher::new(p);
    let record = sample_record(Uuid::new_v4());

    let encrypted = cipher
        .encrypt_record(&record, &ak, Some(&signing.private_key))
        .unwrap();
    let signature = encrypted.signature.clone().unwrap();

    let decrypted = cipher.decrypt_record(&encrypted, &ak).unwrap();
    assert_eq!(decrypted.signature.as_deref(), Some(signature.as_str()));
    assert!(cipher
        .verify_record_signature(&decrypted, &signature, &signing.public_key)
        .unwrap());
}

#[tokio::test]
async fn tampered_plaintext_fails_signature_verification() {
    let p = provider();
    let ak = AccessKey::random(p.as_ref());
    let signing = KeyPair::generate_signing(p.as_ref()).unwrap();
    let cipher = RecordCipher::new(p);

    let encrypted = cipher
        .encrypt_record(&sample_record(Uuid::new_v4()), &ak, Some(&signing.private_key))
        .unwrap();
    let signature = encrypted.signature.clone().unwrap();
    let mut decrypted = cipher.decrypt_record(&encrypted, &ak).unwrap();
    decrypted
        .data
        .insert("email".into(), "attacker@example.com".into());

    assert!(!cipher
        .verify_record_signature(&decrypted, &signature, &signing.public_key)
        .unwrap());
}

#[tokio::test]
async fn signature_is_independent_of_field_insertion_order() {
    let p = provider();
    let ak = AccessKey::random(p.as_ref());
    let signing = KeyPair::generate_signing(p.as_ref()).unwrap();
    let cipher = RecordCipher::new(p);
    let writer_id = Uuid::new_v4();

    let mut forward = sample_record(writer_id);
    forward.data.clear();
    forward.data.insert("a".into(), "1".into());
    forward.data.insert("b".into(), "2".into());

    let mut reverse = sample_record(writer_id);
    reverse.data.clear();
    reverse.data.insert("b".into(), "2".into());
    reverse.data.insert("a".into(), "1".into());

    // Ed25519 is deterministic, so canonicalization shows up directly as
    // signature equality.
    let sig_forward = cipher
        .encrypt_record(&forward, &ak, Some(&signing.private_key))
        .unwrap()
        .signature
        .unwrap();
    let sig_reverse = cipher
        .encrypt_record(&reverse, &ak, Some(&signing.private_key))
        .unwrap()
        .signature
        .unwrap();
    assert_eq!(sig_forward, sig_reverse);
}

#[tokio::test]
async fn unsigned_record_keeps_signature_none() {
    let p = provider();
    let ak = AccessKey::random(p.as_ref());
    let cipher = RecordCipher::new(p);
    let encrypted = cipher
        .encrypt_record(&sample_record(Uuid::new_v4()), &ak, None)
        .unwrap();
    assert!(encrypted.signature.is_none());
}
