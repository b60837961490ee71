//! Shared fixtures for the client integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use sealstore_client::{ChunkSink, ChunkSource, ClientResult, EakInfo, KeyRegistry, MemoryRegistry};
use sealstore_crypto::{CryptoProvider, NaclProvider};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

pub fn provider() -> Arc<dyn CryptoProvider> {
    Arc::new(NaclProvider::new())
}

/// Chunk source backed by a queue of in-memory chunks.
pub struct MemorySource {
    chunks: VecDeque<Vec<u8>>,
}

impl MemorySource {
    pub fn new(chunks: impl IntoIterator<Item = Vec<u8>>) -> Self {
        Self {
            chunks: chunks.into_iter().collect(),
        }
    }

    /// Splits `data` into chunks of `chunk_size` bytes.
    pub fn from_bytes(data: &[u8], chunk_size: usize) -> Self {
        Self::new(data.chunks(chunk_size.max(1)).map(<[u8]>::to_vec))
    }
}

#[async_trait]
impl ChunkSource for MemorySource {
    async fn read(&mut self) -> ClientResult<Option<Vec<u8>>> {
        Ok(self.chunks.pop_front())
    }
}

/// Chunk sink collecting into memory, recording whether it was closed.
#[derive(Default)]
pub struct MemorySink {
    pub bytes: Vec<u8>,
    pub closed: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChunkSink for MemorySink {
    async fn write(&mut self, bytes: &[u8]) -> ClientResult<()> {
        self.bytes.extend_from_slice(bytes);
        Ok(())
    }

    async fn close(&mut self) -> ClientResult<()> {
        self.closed = true;
        Ok(())
    }
}

/// Registry wrapper that counts fetches and publishes.
#[derive(Default)]
pub struct CountingRegistry {
    inner: MemoryRegistry,
    pub gets: AtomicUsize,
    pub puts: AtomicUsize,
}

impl CountingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeyRegistry for CountingRegistry {
    async fn get_eak(
        &self,
        writer_id: Uuid,
        user_id: Uuid,
        reader_id: Uuid,
        record_type: &str,
    ) -> ClientResult<Option<EakInfo>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner
            .get_eak(writer_id, user_id, reader_id, record_type)
            .await
    }

    async fn put_eak(
        &self,
        writer_id: Uuid,
        user_id: Uuid,
        reader_id: Uuid,
        record_type: &str,
        eak: EakInfo,
    ) -> ClientResult<()> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.inner
            .put_eak(writer_id, user_id, reader_id, record_type, eak)
            .await
    }

    async fn delete_eak(
        &self,
        writer_id: Uuid,
        user_id: Uuid,
        reader_id: Uuid,
        record_type: &str,
    ) -> ClientResult<()> {
        self.inner
            .delete_eak(writer_id, user_id, reader_id, record_type)
            .await
    }

    async fn get_group_eak(
        &self,
        group_id: Uuid,
        record_type: &str,
    ) -> ClientResult<Option<sealstore_client::GroupEakInfo>> {
        self.inner.get_group_eak(group_id, record_type).await
    }

    async fn put_group_eak(
        &self,
        group_id: Uuid,
        record_type: &str,
        eak: sealstore_client::GroupEakInfo,
    ) -> ClientResult<()> {
        self.inner.put_group_eak(group_id, record_type, eak).await
    }
}
