//! Shared domain and wire types for the client layer.
//!
//! Wire names are snake_case to match the storage service's JSON. Fields that
//! may be absent serialize as omitted rather than null.

use chrono::{DateTime, Utc};
use sealstore_crypto::{codec, CryptoProvider};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// A base64url-encoded keypair.
///
/// Private halves never serialize; they live only in client memory.
#[derive(Clone)]
pub struct KeyPair {
    pub public_key: Vec<u8>,
    pub private_key: Vec<u8>,
}

impl KeyPair {
    /// Generates a fresh encryption keypair from the provider.
    pub fn generate(provider: &dyn CryptoProvider) -> sealstore_crypto::CryptoResult<Self> {
        let (public_key, private_key) = provider.generate_keypair()?;
        Ok(Self {
            public_key,
            private_key,
        })
    }

    /// Generates a fresh signing keypair from the provider.
    pub fn generate_signing(
        provider: &dyn CryptoProvider,
    ) -> sealstore_crypto::CryptoResult<Self> {
        let (public_key, private_key) = provider.generate_signing_keypair()?;
        Ok(Self {
            public_key,
            private_key,
        })
    }

    pub fn public_b64(&self) -> String {
        codec::b64url_encode(&self.public_key)
    }
}

/// A client's public encryption key as published to the key exchange.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientPublicKey {
    pub curve25519: String,
}

/// A client's public signing key as published to the key exchange.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientSigningKey {
    pub ed25519: String,
}

/// An access key encrypted for one specific reader.
///
/// Immutable once issued; a new one is created per (writer, reader) pair,
/// never per object.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EakInfo {
    /// `eak.nonce` dotted pair, base64url segments.
    pub eak: String,
    pub authorizer_id: Uuid,
    pub authorizer_public_key: ClientPublicKey,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signer_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signer_signing_key: Option<ClientSigningKey>,
}

/// One member's wrapped copy of a group's private key.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GroupAccessKeyWrapper {
    /// The group's private key, box-encrypted for this member.
    pub membership_key: String,
    /// Public key of the member who created this wrapper.
    pub authorizer_public_key: String,
    /// The group's public key.
    pub group_public_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_key_id: Option<Uuid>,
}

/// Group-mediated access key material for one record type.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GroupEakInfo {
    /// The access key, box-encrypted to the group's public key.
    pub eak: String,
    /// Public key of the sharer who encrypted the access key to the group.
    pub sharer_public_key: String,
    /// One wrapper per current member.
    pub access_key_wrappers: Vec<GroupAccessKeyWrapper>,
}

/// Metadata for a stored file record.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FileMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

/// Record metadata. The `plain` map is never encrypted, by design, so the
/// service can filter and search on it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Meta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<Uuid>,
    pub writer_id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub record_type: String,
    #[serde(default)]
    pub plain: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_meta: Option<FileMeta>,
}

impl Meta {
    pub fn new(writer_id: Uuid, user_id: Uuid, record_type: impl Into<String>) -> Self {
        Self {
            record_id: None,
            writer_id,
            user_id,
            record_type: record_type.into(),
            plain: BTreeMap::new(),
            created: None,
            last_modified: None,
            version: None,
            file_meta: None,
        }
    }
}

/// A structured record. The same shape carries plaintext data (field values)
/// and encrypted data (dotted-quad values); which one is in hand is
/// determined by which cipher operation produced it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Record {
    pub meta: Meta,
    #[serde(default)]
    pub data: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

/// A note: free-standing signed data addressed by keys rather than by a
/// record scope. Extended access control challenges (EACP) ride along
/// untouched; enforcing them is the service's job, not this core's.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Note {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note_id: Option<Uuid>,
    #[serde(default)]
    pub data: BTreeMap<String, String>,
    #[serde(default)]
    pub plain: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub writer_signing_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub writer_encryption_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eacp: Option<serde_json::Value>,
}
