//! Streaming file transforms over pluggable chunk sources and sinks.
//!
//! Drives the resumable state machines from `sealstore-crypto` with chunks of
//! whatever size the platform's streams produce. The sink never sees an
//! unauthenticated byte: a failed block aborts the transform before any part
//! of that block is written, and the sink is only closed after the final
//! tagged block. Backpressure is the sink's business; each `write` is awaited
//! before the next source read.

use crate::error::ClientResult;
use async_trait::async_trait;
use sealstore_crypto::{
    AccessKey, CryptoProvider, FileDecrypter, FileEncrypter, FileSummary, FILE_BLOCK_SIZE,
};
use std::sync::Arc;
use tracing::debug;

/// Pull side of a platform stream. `Ok(None)` signals exhaustion.
#[async_trait]
pub trait ChunkSource: Send {
    async fn read(&mut self) -> ClientResult<Option<Vec<u8>>>;
}

/// Push side of a platform stream.
#[async_trait]
pub trait ChunkSink: Send {
    async fn write(&mut self, bytes: &[u8]) -> ClientResult<()>;

    /// Marks the destination complete. Called exactly once, and only after
    /// every written byte was authenticated.
    async fn close(&mut self) -> ClientResult<()>;
}

/// Orchestrates whole-file encryption and decryption.
pub struct FileCipher {
    provider: Arc<dyn CryptoProvider>,
    block_size: usize,
}

impl FileCipher {
    pub fn new(provider: Arc<dyn CryptoProvider>) -> Self {
        Self {
            provider,
            block_size: FILE_BLOCK_SIZE,
        }
    }

    /// Uses a non-standard plaintext block size (both directions must agree).
    pub fn with_block_size(provider: Arc<dyn CryptoProvider>, block_size: usize) -> Self {
        Self {
            provider,
            block_size,
        }
    }

    /// Encrypts a file from `source` into `sink`.
    ///
    /// Returns the total encrypted size and the integrity checksum over every
    /// byte written (envelope header, stream header, and all blocks), for the
    /// transport's upload step.
    pub async fn encrypt_file(
        &self,
        source: &mut dyn ChunkSource,
        sink: &mut dyn ChunkSink,
        access_key: &AccessKey,
    ) -> ClientResult<FileSummary> {
        let mut encrypter =
            FileEncrypter::with_block_size(self.provider.as_ref(), access_key, self.block_size)?;
        while let Some(chunk) = source.read().await? {
            let sealed = encrypter.update(&chunk)?;
            if !sealed.is_empty() {
                sink.write(&sealed).await?;
            }
        }
        let (tail, summary) = encrypter.finish()?;
        sink.write(&tail).await?;
        sink.close().await?;
        debug!(size = summary.size, "encrypted file stream");
        Ok(summary)
    }

    /// Decrypts a file envelope from `source` into `sink`.
    ///
    /// Any header or block failure aborts immediately, leaving the sink
    /// unclosed; retries, if any, belong to the transport layer.
    pub async fn decrypt_file(
        &self,
        source: &mut dyn ChunkSource,
        sink: &mut dyn ChunkSink,
        access_key: AccessKey,
    ) -> ClientResult<()> {
        let mut decrypter = FileDecrypter::with_block_size(
            self.provider.clone(),
            access_key,
            self.block_size,
        );
        while let Some(chunk) = source.read().await? {
            let plain = decrypter.update(&chunk)?;
            if !plain.is_empty() {
                sink.write(&plain).await?;
            }
        }
        let last = decrypter.finish()?;
        if !last.is_empty() {
            sink.write(&last).await?;
        }
        sink.close().await?;
        debug!("decrypted file stream");
        Ok(())
    }
}
