//! Cryptographic core for sealstore.
//!
//! Turns plaintext records, notes, and files into authenticated ciphertext
//! addressable by an untrusted storage service, and reverses that transform
//! for authorized readers. Provides:
//! - Field-level double encryption (dotted-quad format) and salted field
//!   signatures
//! - Asymmetric access-key wrapping for direct and group sharing
//! - Canonical document serialization and whole-document signatures
//! - The streaming file envelope format with resumable chunk-transformation
//!   state machines
//!
//! Raw primitives are consumed through the [`provider::CryptoProvider`] seam;
//! [`nacl::NaclProvider`] is the default NaCl-profile implementation.
//!
//! # Architecture
//!
//! A single symmetric access key protects all fields of one
//! (writer, user, record type) scope, but each field is encrypted under its
//! own fresh data key; the access key only wraps the data keys. Sharing never
//! copies the access key in the clear: it is re-encrypted asymmetrically per
//! reader, or per group via the membership-key re-wrapping chain.

pub mod akwrap;
pub mod codec;
pub mod document;
pub mod error;
pub mod field;
pub mod file;
pub mod keys;
pub mod nacl;
pub mod provider;

pub use akwrap::{
    decrypt_access_key, decrypt_key_pair, encrypt_access_key, encrypt_private_key,
};
pub use document::{canonicalize, sign_document, verify_document_signature};
pub use error::{CryptoError, CryptoResult};
pub use field::{decrypt_field, encrypt_field, sign_field, verify_field, SIGNATURE_VERSION};
pub use file::{FileDecrypter, FileEncrypter, FileSummary, FILE_BLOCK_SIZE, FILE_VERSION};
pub use keys::{AccessKey, StreamKey};
pub use nacl::NaclProvider;
pub use provider::{Checksum, CryptoProvider, StreamDecrypter, StreamEncrypter};
