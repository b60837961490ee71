//! Group-mediated sharing via the membership key chain.
//!
//! A group owns a keypair. Each member holds the group's private key
//! re-encrypted for their own public key (the membership key); access keys
//! for group-shared records are encrypted to the group's public key. Reading
//! therefore takes exactly two unwraps: membership key → group private key →
//! access key. Nobody learns another member's private key, and the group's
//! raw private key exists only transiently in memory during chain
//! operations.
//!
//! Reachability is the capability check: a caller whose private key opens no
//! wrapper gets [`ClientError::NoReachableWrapper`]. There is no separate
//! authorization flag.
//!
//! Removing a member deletes their wrapper but does not rotate the access
//! key; the collaborator that owns group CRUD must rotate, since a removed
//! member may still hold keys they unwrapped earlier.

use crate::error::{ClientError, ClientResult};
use crate::record::RecordCipher;
use crate::types::{GroupEakInfo, Record};
use sealstore_crypto::{akwrap, codec, AccessKey, CryptoProvider};
use std::sync::Arc;
use tracing::debug;

/// Group key chain operations.
pub struct GroupKeyChain {
    provider: Arc<dyn CryptoProvider>,
}

impl GroupKeyChain {
    pub fn new(provider: Arc<dyn CryptoProvider>) -> Self {
        Self { provider }
    }

    /// Creates a membership key for a new member.
    ///
    /// Decrypts the existing member's membership key to recover the group's
    /// raw private key, then immediately re-encrypts it for the new member.
    /// The raw key is zeroized as soon as this function returns and is never
    /// persisted or logged.
    pub fn create_membership_key(
        &self,
        existing_member_private_key: &[u8],
        existing_membership_key: &str,
        new_member_public_key: &[u8],
        authorizer_public_key: &[u8],
    ) -> ClientResult<String> {
        let group_private = akwrap::decrypt_key_pair(
            self.provider.as_ref(),
            existing_membership_key,
            authorizer_public_key,
            existing_member_private_key,
        )?;
        Ok(akwrap::encrypt_private_key(
            self.provider.as_ref(),
            &group_private,
            existing_member_private_key,
            new_member_public_key,
        )?)
    }

    /// Encrypts an access key to the group's public key.
    pub fn create_group_access_key(
        &self,
        group_public_key: &[u8],
        access_key: &AccessKey,
        sharer_private_key: &[u8],
    ) -> ClientResult<String> {
        Ok(akwrap::encrypt_access_key(
            self.provider.as_ref(),
            access_key,
            sharer_private_key,
            group_public_key,
        )?)
    }

    /// Recovers the access key for a group-shared record type.
    ///
    /// Walks the wrapper list for one this member can open, recovers the
    /// group's private key through it, and unwraps the access key encrypted
    /// to the group.
    pub fn unwrap_group_access_key(
        &self,
        member_private_key: &[u8],
        info: &GroupEakInfo,
    ) -> ClientResult<AccessKey> {
        let mut group_private = None;
        for (index, wrapper) in info.access_key_wrappers.iter().enumerate() {
            let authorizer_public = codec::b64url_decode(&wrapper.authorizer_public_key)?;
            match akwrap::decrypt_key_pair(
                self.provider.as_ref(),
                &wrapper.membership_key,
                &authorizer_public,
                member_private_key,
            ) {
                Ok(raw) => {
                    debug!(wrapper = index, "unwrapped group membership key");
                    group_private = Some(raw);
                    break;
                }
                // Not ours; unreachability of every wrapper is the denial.
                Err(_) => continue,
            }
        }
        let group_private = group_private.ok_or(ClientError::NoReachableWrapper)?;
        let sharer_public = codec::b64url_decode(&info.sharer_public_key)?;
        Ok(akwrap::decrypt_access_key(
            self.provider.as_ref(),
            &info.eak,
            &sharer_public,
            &group_private,
        )?)
    }

    /// Decrypts a record shared with a group this member belongs to.
    pub fn decrypt_group_record(
        &self,
        encrypted: &Record,
        member_private_key: &[u8],
        info: &GroupEakInfo,
    ) -> ClientResult<Record> {
        let access_key = self.unwrap_group_access_key(member_private_key, info)?;
        RecordCipher::new(self.provider.clone()).decrypt_record(encrypted, &access_key)
    }
}
