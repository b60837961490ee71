//! Client orchestration for sealstore.
//!
//! Coordinates the cryptographic core into whole-object operations:
//! - Access key management with per-scope single-flight caching
//! - Record and note encryption with document/field signatures
//! - Group-mediated sharing through the membership key chain
//! - Streaming file transforms over pluggable chunk sources and sinks
//!
//! Transport is a seam, not a dependency: the key exchange is consumed
//! through [`registry::KeyRegistry`] and file I/O through
//! [`files::ChunkSource`]/[`files::ChunkSink`].

pub mod access_keys;
pub mod error;
pub mod files;
pub mod group;
pub mod note;
pub mod record;
pub mod registry;
pub mod types;

pub use access_keys::{AccessKeyManager, AkCacheKey};
pub use error::{ClientError, ClientResult};
pub use files::{ChunkSink, ChunkSource, FileCipher};
pub use group::GroupKeyChain;
pub use note::NoteCipher;
pub use record::RecordCipher;
pub use registry::{KeyRegistry, MemoryRegistry};
pub use types::*;
