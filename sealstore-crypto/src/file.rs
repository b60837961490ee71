//! Streaming file envelope format and chunk transformation state machines.
//!
//! On the wire a file is `{version}.{edk}.{edkN}.` (UTF-8, base64url binary
//! segments) immediately followed by the streaming cipher's own header bytes,
//! then fixed-size ciphertext blocks. `edk`/`edkN` wrap a one-time stream key
//! under the object's access key. The last block is distinguished only by the
//! AEAD final tag set at encryption time, never by length.
//!
//! Both directions are resumable state values driven by an external loop:
//! callers feed chunks of arbitrary size with `update` and collect the bytes
//! each call emits, so the pipeline suspends naturally between chunks under
//! any concurrency model. Transport-layer chunk boundaries never need to
//! align with cryptographic block boundaries.

use crate::codec;
use crate::error::{CryptoError, CryptoResult};
use crate::keys::{AccessKey, StreamKey};
use crate::provider::{Checksum, CryptoProvider, StreamDecrypter, StreamEncrypter};
use std::sync::Arc;

/// Envelope format version this client reads and writes.
pub const FILE_VERSION: u32 = 3;

/// Plaintext bytes per encrypted block.
pub const FILE_BLOCK_SIZE: usize = 65536;

/// The envelope header must terminate within this many bytes; scanning
/// further on corrupt input would buffer without bound.
const HEADER_SCAN_BUDGET: usize = 1024;

/// Size and integrity digest of an encrypted file, for the upload step.
#[derive(Clone, Debug)]
pub struct FileSummary {
    /// Total encrypted size in bytes, headers included.
    pub size: u64,
    /// Base64 digest over every byte written (headers and ciphertext).
    pub checksum: String,
}

/// Push-based file encryption pipeline.
///
/// Emits the envelope header, the stream cipher's header, and one ciphertext
/// block per accumulated plaintext block, feeding every emitted byte through
/// the provider's checksum.
pub struct FileEncrypter {
    stream: Box<dyn StreamEncrypter>,
    checksum: Box<dyn Checksum>,
    prelude: Option<Vec<u8>>,
    buf: Vec<u8>,
    block_size: usize,
    size: u64,
}

impl FileEncrypter {
    /// Creates an encrypter with the standard block size.
    pub fn new(provider: &dyn CryptoProvider, access_key: &AccessKey) -> CryptoResult<Self> {
        Self::with_block_size(provider, access_key, FILE_BLOCK_SIZE)
    }

    /// Creates an encrypter with a caller-chosen plaintext block size.
    pub fn with_block_size(
        provider: &dyn CryptoProvider,
        access_key: &AccessKey,
        block_size: usize,
    ) -> CryptoResult<Self> {
        access_key.check_len(provider)?;
        let dk = StreamKey::random(provider);
        let edkn = provider.random_bytes(provider.nonce_len());
        let edk = provider.encrypt_symmetric(dk.as_bytes(), &edkn, access_key.as_bytes())?;
        let stream = provider.encrypt_stream(dk.as_bytes())?;

        let mut prelude = format!(
            "{FILE_VERSION}.{}.{}.",
            codec::b64url_encode(&edk),
            codec::b64url_encode(&edkn)
        )
        .into_bytes();
        prelude.extend_from_slice(stream.header());

        Ok(Self {
            stream,
            checksum: provider.checksum(),
            prelude: Some(prelude),
            buf: Vec::with_capacity(block_size),
            block_size,
            size: 0,
        })
    }

    /// Feeds plaintext bytes in, returning whatever ciphertext is ready.
    ///
    /// A full buffered block is only sealed once at least one further byte
    /// has arrived; the final tag belongs to `finish`.
    pub fn update(&mut self, chunk: &[u8]) -> CryptoResult<Vec<u8>> {
        let mut out = self.take_prelude();
        self.buf.extend_from_slice(chunk);
        while self.buf.len() > self.block_size {
            let block: Vec<u8> = self.buf.drain(..self.block_size).collect();
            let sealed = self.stream.push(&block, false)?;
            self.emit(&sealed, &mut out);
        }
        Ok(out)
    }

    /// Seals the final (possibly empty) block and returns the remaining
    /// ciphertext plus the size and checksum of the whole encrypted file.
    pub fn finish(mut self) -> CryptoResult<(Vec<u8>, FileSummary)> {
        let mut out = self.take_prelude();
        let block = std::mem::take(&mut self.buf);
        let sealed = self.stream.push(&block, true)?;
        self.emit(&sealed, &mut out);
        let summary = FileSummary {
            size: self.size,
            checksum: codec::b64_encode(&self.checksum.finish()),
        };
        Ok((out, summary))
    }

    fn take_prelude(&mut self) -> Vec<u8> {
        let mut out = Vec::new();
        if let Some(prelude) = self.prelude.take() {
            self.emit(&prelude, &mut out);
        }
        out
    }

    fn emit(&mut self, bytes: &[u8], out: &mut Vec<u8>) {
        self.checksum.update(bytes);
        self.size += bytes.len() as u64;
        out.extend_from_slice(bytes);
    }
}

/// Decryption states, in wire order.
enum DecryptState {
    /// Accumulating until the third `.` terminates the envelope header.
    AwaitingEnvelopeHeader,
    /// Envelope parsed; accumulating the streaming cipher's header.
    AwaitingStreamHeader { key: StreamKey },
    /// Stream initialized; accumulating and decrypting fixed-size blocks.
    DecryptingBlocks { stream: Box<dyn StreamDecrypter> },
    /// Final tagged block seen, or the machine is poisoned after an error.
    Done,
}

/// Pull-driven file decryption state machine.
///
/// Chunks of any size go in via [`update`](Self::update); authenticated
/// plaintext comes out. Any error is terminal: the machine poisons itself and
/// never emits an unauthenticated byte. Retries belong to the transport
/// layer, not here.
pub struct FileDecrypter {
    provider: Arc<dyn CryptoProvider>,
    access_key: AccessKey,
    state: DecryptState,
    buf: Vec<u8>,
    block_size: usize,
}

impl FileDecrypter {
    /// Creates a decrypter expecting the standard block size.
    pub fn new(provider: Arc<dyn CryptoProvider>, access_key: AccessKey) -> Self {
        Self::with_block_size(provider, access_key, FILE_BLOCK_SIZE)
    }

    /// Creates a decrypter for files written with a non-standard block size.
    pub fn with_block_size(
        provider: Arc<dyn CryptoProvider>,
        access_key: AccessKey,
        block_size: usize,
    ) -> Self {
        Self {
            provider,
            access_key,
            state: DecryptState::AwaitingEnvelopeHeader,
            buf: Vec::new(),
            block_size,
        }
    }

    /// True once the final tagged block has been decrypted.
    pub fn is_done(&self) -> bool {
        matches!(self.state, DecryptState::Done)
    }

    /// Consumes one source chunk, returning the plaintext it completed.
    pub fn update(&mut self, chunk: &[u8]) -> CryptoResult<Vec<u8>> {
        if matches!(self.state, DecryptState::Done) && !chunk.is_empty() {
            return Err(CryptoError::MalformedEnvelope(
                "data after final stream block".into(),
            ));
        }
        self.buf.extend_from_slice(chunk);
        let mut out = Vec::new();
        loop {
            // Errors leave the placeholder `Done` in place, poisoning the
            // machine so a caller cannot keep feeding an aborted transform.
            match std::mem::replace(&mut self.state, DecryptState::Done) {
                DecryptState::AwaitingEnvelopeHeader => {
                    let Some(end) = third_dot(&self.buf) else {
                        if self.buf.len() > HEADER_SCAN_BUDGET {
                            return Err(CryptoError::MalformedEnvelope(format!(
                                "envelope header not found in the first {HEADER_SCAN_BUDGET} bytes"
                            )));
                        }
                        self.state = DecryptState::AwaitingEnvelopeHeader;
                        break;
                    };
                    let key = self.parse_envelope_header(end)?;
                    self.buf.drain(..=end);
                    self.state = DecryptState::AwaitingStreamHeader { key };
                }
                DecryptState::AwaitingStreamHeader { key } => {
                    let need = self.provider.stream_header_len();
                    if self.buf.len() < need {
                        self.state = DecryptState::AwaitingStreamHeader { key };
                        break;
                    }
                    let header: Vec<u8> = self.buf.drain(..need).collect();
                    let stream = self.provider.decrypt_stream(key.as_bytes(), &header)?;
                    self.state = DecryptState::DecryptingBlocks { stream };
                }
                DecryptState::DecryptingBlocks { mut stream } => {
                    let cipher_len = self.block_size + self.provider.stream_overhead_len();
                    if self.buf.len() < cipher_len {
                        self.state = DecryptState::DecryptingBlocks { stream };
                        break;
                    }
                    let block: Vec<u8> = self.buf.drain(..cipher_len).collect();
                    let (plain, final_block) = stream.pull(&block)?;
                    out.extend_from_slice(&plain);
                    if final_block {
                        if !self.buf.is_empty() {
                            return Err(CryptoError::MalformedEnvelope(
                                "data after final stream block".into(),
                            ));
                        }
                        break;
                    }
                    self.state = DecryptState::DecryptingBlocks { stream };
                }
                DecryptState::Done => break,
            }
        }
        Ok(out)
    }

    /// Signals source exhaustion: decrypts the partial final block, if any.
    ///
    /// Fails if the source ended mid-header or before a final-tagged block
    /// arrived; a truncated file must never look like a short one.
    pub fn finish(mut self) -> CryptoResult<Vec<u8>> {
        match std::mem::replace(&mut self.state, DecryptState::Done) {
            DecryptState::Done => Ok(Vec::new()),
            DecryptState::DecryptingBlocks { mut stream } => {
                if self.buf.is_empty() {
                    return Err(CryptoError::MalformedEnvelope(
                        "file ended before the final stream block".into(),
                    ));
                }
                let block = std::mem::take(&mut self.buf);
                let (plain, final_block) = stream.pull(&block)?;
                if !final_block {
                    return Err(CryptoError::MalformedEnvelope(
                        "file ended before the final stream block".into(),
                    ));
                }
                Ok(plain)
            }
            DecryptState::AwaitingEnvelopeHeader => Err(CryptoError::MalformedEnvelope(
                "envelope header not found in file".into(),
            )),
            DecryptState::AwaitingStreamHeader { .. } => Err(CryptoError::MalformedEnvelope(
                "stream cipher header not found in file".into(),
            )),
        }
    }

    /// Parses `{version}.{edk}.{edkN}` and unwraps the one-time stream key.
    fn parse_envelope_header(&self, end: usize) -> CryptoResult<StreamKey> {
        let text = codec::utf8_to_string(&self.buf[..end])
            .map_err(|_| CryptoError::MalformedEnvelope("envelope header is not UTF-8".into()))?;
        let mut segments = text.split('.');
        let (Some(version), Some(edk), Some(edkn)) =
            (segments.next(), segments.next(), segments.next())
        else {
            return Err(CryptoError::MalformedEnvelope(
                "envelope header is missing segments".into(),
            ));
        };
        let version: u32 = version.parse().map_err(|_| {
            CryptoError::MalformedEnvelope(format!("invalid envelope version {version:?}"))
        })?;
        if version != FILE_VERSION {
            return Err(CryptoError::UnsupportedFileVersion {
                found: version,
                supported: FILE_VERSION,
            });
        }
        let edk = codec::b64url_decode(edk)?;
        let edkn = codec::b64url_decode(edkn)?;
        let dk = self
            .provider
            .decrypt_symmetric(&edk, &edkn, self.access_key.as_bytes())?;
        Ok(StreamKey::from_bytes(dk))
    }
}

/// Index of the third `.` in `bytes`, if present.
fn third_dot(bytes: &[u8]) -> Option<usize> {
    bytes
        .iter()
        .enumerate()
        .filter(|(_, b)| **b == b'.')
        .map(|(i, _)| i)
        .nth(2)
}
