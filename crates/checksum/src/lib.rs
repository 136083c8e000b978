//! Streaming digests used to prove transfer integrity.
//!
//! Two algorithms are supported:
//!
//! - [`DigestAlgorithm::ContentHash`]: the remote store's block-hash-of-block-hashes
//!   scheme. Each 4 MiB block is SHA-256 hashed on its own, then the
//!   concatenated block digests are hashed again.
//! - [`DigestAlgorithm::Sha256`]: a plain SHA-256 over the whole stream, used
//!   for the locally written manifest.
//!
//! Readers are consumed in fixed [`READ_CHUNK_SIZE`] chunks, so memory use does
//! not grow with file size.

mod digest;
mod hasher;
mod reader;

pub use digest::{DigestAlgorithm, DigestValue};
pub use hasher::{ContentHasher, Hasher};
pub use reader::{HashingReader, digest_file, digest_reader};

/// Block size of the remote content hash: 4 MiB.
pub const CONTENT_HASH_BLOCK_SIZE: usize = 4 * 1024 * 1024;

/// Buffer size used when reading streams: 64 KiB.
pub const READ_CHUNK_SIZE: usize = 64 * 1024;

/// Errors produced by the checksum crate.
#[derive(Debug, thiserror::Error)]
pub enum ChecksumError {
    #[error("stream read error: {0}")]
    StreamRead(#[from] std::io::Error),

    #[error("malformed {algorithm} digest: {value:?}")]
    Malformed {
        algorithm: &'static str,
        value: String,
    },
}

/// Computes the digest of an in-memory buffer.
pub fn digest_bytes(data: &[u8], algorithm: DigestAlgorithm) -> DigestValue {
    let mut hasher = Hasher::new(algorithm);
    hasher.update(data);
    hasher.finalize()
}
