//! Whole-record encryption, decryption, and document signatures.
//!
//! Every data field goes through the field codec; the plain meta map is
//! copied untouched so the service can filter on it. Document signatures
//! cover the canonical (recursively key-sorted) serialization of the
//! client meta and plaintext data, so they are computed before encryption
//! and verified after decryption.

use crate::error::ClientResult;
use crate::types::{Meta, Record};
use sealstore_crypto::{document, field, AccessKey, CryptoProvider};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Encrypts and decrypts structured records.
pub struct RecordCipher {
    provider: Arc<dyn CryptoProvider>,
}

impl RecordCipher {
    pub fn new(provider: Arc<dyn CryptoProvider>) -> Self {
        Self { provider }
    }

    /// Encrypts every data field of a record under the scope's access key.
    ///
    /// When `signing_key` is present the canonical plaintext document is
    /// signed first and the signature attached, so readers can verify the
    /// plaintext meta+data pairing after decryption.
    pub fn encrypt_record(
        &self,
        record: &Record,
        access_key: &AccessKey,
        signing_key: Option<&[u8]>,
    ) -> ClientResult<Record> {
        let signature = match signing_key {
            Some(key) => Some(document::sign_document(
                self.provider.as_ref(),
                &canonical_record(&record.meta, &record.data),
                key,
            )?),
            None => record.signature.clone(),
        };
        let mut data = BTreeMap::new();
        for (name, value) in &record.data {
            data.insert(
                name.clone(),
                field::encrypt_field(self.provider.as_ref(), value, access_key)?,
            );
        }
        debug!(
            record_type = %record.meta.record_type,
            fields = data.len(),
            "encrypted record"
        );
        Ok(Record {
            meta: record.meta.clone(),
            data,
            signature,
        })
    }

    /// Decrypts every data field of a record.
    ///
    /// The signature travels through unchanged; it covers the plaintext, so
    /// call [`verify_record_signature`](Self::verify_record_signature) on the
    /// decrypted record.
    pub fn decrypt_record(
        &self,
        encrypted: &Record,
        access_key: &AccessKey,
    ) -> ClientResult<Record> {
        let mut data = BTreeMap::new();
        for (name, quad) in &encrypted.data {
            data.insert(
                name.clone(),
                field::decrypt_field(self.provider.as_ref(), quad, access_key)?,
            );
        }
        Ok(Record {
            meta: encrypted.meta.clone(),
            data,
            signature: encrypted.signature.clone(),
        })
    }

    /// Verifies a decrypted record's document signature.
    pub fn verify_record_signature(
        &self,
        record: &Record,
        signature: &str,
        verifying_key: &[u8],
    ) -> ClientResult<bool> {
        Ok(document::verify_document_signature(
            self.provider.as_ref(),
            &canonical_record(&record.meta, &record.data),
            signature,
            verifying_key,
        )?)
    }
}

/// Canonical signable form of a record: the client-controlled meta fields
/// plus the plaintext data, keys sorted recursively. Field insertion order
/// can never affect the signature.
fn canonical_record(meta: &Meta, data: &BTreeMap<String, String>) -> String {
    document::canonicalize(&json!({
        "meta": {
            "plain": meta.plain,
            "type": meta.record_type,
            "user_id": meta.user_id,
            "writer_id": meta.writer_id,
        },
        "data": data,
    }))
}
