use std::fmt;

use crate::ChecksumError;

/// Digest algorithm selectable per call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigestAlgorithm {
    /// Remote-style block-hash-of-block-hashes (4 MiB blocks, SHA-256).
    ContentHash,
    /// Conventional single-pass SHA-256.
    Sha256,
}

impl DigestAlgorithm {
    /// Name written into manifests and logs.
    pub fn name(self) -> &'static str {
        match self {
            Self::ContentHash => "content_hash",
            Self::Sha256 => "SHA256",
        }
    }

    /// Length of the hex encoding of a digest.
    pub fn hex_len(self) -> usize {
        64
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A finished digest tagged with the algorithm that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DigestValue {
    algorithm: DigestAlgorithm,
    hex: String,
}

impl DigestValue {
    pub(crate) fn from_raw(algorithm: DigestAlgorithm, raw: &[u8]) -> Self {
        Self {
            algorithm,
            hex: hex::encode(raw),
        }
    }

    /// Parses a hex digest as reported by a store.
    ///
    /// Upper-case input is normalised; anything that is not exactly
    /// [`DigestAlgorithm::hex_len`] hex digits is rejected.
    pub fn parse(algorithm: DigestAlgorithm, value: &str) -> Result<Self, ChecksumError> {
        let trimmed = value.trim();
        if trimmed.len() != algorithm.hex_len()
            || !trimmed.bytes().all(|b| b.is_ascii_hexdigit())
        {
            return Err(ChecksumError::Malformed {
                algorithm: algorithm.name(),
                value: value.to_string(),
            });
        }
        Ok(Self {
            algorithm,
            hex: trimmed.to_ascii_lowercase(),
        })
    }

    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    /// Lowercase hexadecimal form.
    pub fn hex(&self) -> &str {
        &self.hex
    }
}

impl fmt::Display for DigestValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hex)
    }
}
