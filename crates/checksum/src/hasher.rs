use sha2::{Digest, Sha256};

use crate::{CONTENT_HASH_BLOCK_SIZE, DigestAlgorithm, DigestValue};

/// Incremental remote-style content hasher.
///
/// Input is split into fixed-size blocks regardless of how it is fed to
/// [`update`](Self::update); block boundaries never depend on chunking.
pub struct ContentHasher {
    overall: Sha256,
    block: Sha256,
    block_pos: usize,
    block_size: usize,
}

impl Default for ContentHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentHasher {
    pub fn new() -> Self {
        Self::with_block_size(CONTENT_HASH_BLOCK_SIZE)
    }

    pub(crate) fn with_block_size(block_size: usize) -> Self {
        Self {
            overall: Sha256::new(),
            block: Sha256::new(),
            block_pos: 0,
            block_size,
        }
    }

    pub fn update(&mut self, mut data: &[u8]) {
        while !data.is_empty() {
            if self.block_pos == self.block_size {
                self.flush_block();
            }
            let space = self.block_size - self.block_pos;
            let take = space.min(data.len());
            self.block.update(&data[..take]);
            self.block_pos += take;
            data = &data[take..];
        }
    }

    fn flush_block(&mut self) {
        let block = std::mem::replace(&mut self.block, Sha256::new());
        self.overall.update(block.finalize());
        self.block_pos = 0;
    }

    /// Returns the raw 32-byte digest.
    pub fn finalize(mut self) -> [u8; 32] {
        if self.block_pos > 0 {
            self.flush_block();
        }
        self.overall.finalize().into()
    }
}

/// Incremental accumulator for either [`DigestAlgorithm`].
pub enum Hasher {
    ContentHash(ContentHasher),
    Sha256(Sha256),
}

impl Hasher {
    pub fn new(algorithm: DigestAlgorithm) -> Self {
        match algorithm {
            DigestAlgorithm::ContentHash => Self::ContentHash(ContentHasher::new()),
            DigestAlgorithm::Sha256 => Self::Sha256(Sha256::new()),
        }
    }

    pub fn algorithm(&self) -> DigestAlgorithm {
        match self {
            Self::ContentHash(_) => DigestAlgorithm::ContentHash,
            Self::Sha256(_) => DigestAlgorithm::Sha256,
        }
    }

    pub fn update(&mut self, data: &[u8]) {
        match self {
            Self::ContentHash(h) => h.update(data),
            Self::Sha256(h) => h.update(data),
        }
    }

    pub fn finalize(self) -> DigestValue {
        match self {
            Self::ContentHash(h) => {
                DigestValue::from_raw(DigestAlgorithm::ContentHash, &h.finalize())
            }
            Self::Sha256(h) => DigestValue::from_raw(DigestAlgorithm::Sha256, &h.finalize()),
        }
    }
}
