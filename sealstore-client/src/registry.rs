//! The key exchange seam.
//!
//! The storage service holds encrypted access keys and group wrapper sets;
//! this core only defines what bytes go in and come out. Concrete transports
//! implement [`KeyRegistry`]; [`MemoryRegistry`] backs tests and in-process
//! use.

use crate::error::ClientResult;
use crate::types::{EakInfo, GroupEakInfo};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Fetch/publish surface for encrypted access keys.
///
/// Absence is a domain answer (`Ok(None)`), not an error; errors are reserved
/// for transport failures and propagate untouched. Nothing here is retried by
/// the core.
#[async_trait]
pub trait KeyRegistry: Send + Sync {
    /// Fetches the EAK issued to `reader_id` for a scope, if one exists.
    async fn get_eak(
        &self,
        writer_id: Uuid,
        user_id: Uuid,
        reader_id: Uuid,
        record_type: &str,
    ) -> ClientResult<Option<EakInfo>>;

    /// Publishes an EAK for a reader.
    async fn put_eak(
        &self,
        writer_id: Uuid,
        user_id: Uuid,
        reader_id: Uuid,
        record_type: &str,
        eak: EakInfo,
    ) -> ClientResult<()>;

    /// Removes the EAK issued to `reader_id` for a scope.
    async fn delete_eak(
        &self,
        writer_id: Uuid,
        user_id: Uuid,
        reader_id: Uuid,
        record_type: &str,
    ) -> ClientResult<()>;

    /// Fetches group-mediated key material for a group and record type.
    async fn get_group_eak(
        &self,
        group_id: Uuid,
        record_type: &str,
    ) -> ClientResult<Option<GroupEakInfo>>;

    /// Publishes group-mediated key material.
    async fn put_group_eak(
        &self,
        group_id: Uuid,
        record_type: &str,
        eak: GroupEakInfo,
    ) -> ClientResult<()>;
}

type EakKey = (Uuid, Uuid, Uuid, String);

/// In-memory [`KeyRegistry`].
#[derive(Default)]
pub struct MemoryRegistry {
    eaks: RwLock<HashMap<EakKey, EakInfo>>,
    group_eaks: RwLock<HashMap<(Uuid, String), GroupEakInfo>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored EAKs, for test assertions.
    pub async fn eak_count(&self) -> usize {
        self.eaks.read().await.len()
    }
}

#[async_trait]
impl KeyRegistry for MemoryRegistry {
    async fn get_eak(
        &self,
        writer_id: Uuid,
        user_id: Uuid,
        reader_id: Uuid,
        record_type: &str,
    ) -> ClientResult<Option<EakInfo>> {
        let key = (writer_id, user_id, reader_id, record_type.to_string());
        Ok(self.eaks.read().await.get(&key).cloned())
    }

    async fn put_eak(
        &self,
        writer_id: Uuid,
        user_id: Uuid,
        reader_id: Uuid,
        record_type: &str,
        eak: EakInfo,
    ) -> ClientResult<()> {
        let key = (writer_id, user_id, reader_id, record_type.to_string());
        self.eaks.write().await.insert(key, eak);
        Ok(())
    }

    async fn delete_eak(
        &self,
        writer_id: Uuid,
        user_id: Uuid,
        reader_id: Uuid,
        record_type: &str,
    ) -> ClientResult<()> {
        let key = (writer_id, user_id, reader_id, record_type.to_string());
        self.eaks.write().await.remove(&key);
        Ok(())
    }

    async fn get_group_eak(
        &self,
        group_id: Uuid,
        record_type: &str,
    ) -> ClientResult<Option<GroupEakInfo>> {
        let key = (group_id, record_type.to_string());
        Ok(self.group_eaks.read().await.get(&key).cloned())
    }

    async fn put_group_eak(
        &self,
        group_id: Uuid,
        record_type: &str,
        eak: GroupEakInfo,
    ) -> ClientResult<()> {
        let key = (group_id, record_type.to_string());
        self.group_eaks.write().await.insert(key, eak);
        Ok(())
    }
}
