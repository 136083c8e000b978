//! Per-file integrity manifest.
//!
//! The first line is `sha256sum`-compatible (`<hex>  <file name>`), so
//! `sha256sum -c` can verify the stored file directly. Provenance follows as
//! `# key: value` comment lines:
//!
//! ```text
//! 9f86d08...  report.zip
//! # source: /Archives/A/report.zip
//! # algorithm: SHA256
//! # transferred: 2024-05-01T12:00:00Z
//! # extra.beginning_year: 1990
//! ```

use att_checksum::{DigestAlgorithm, DigestValue};
use chrono::{DateTime, SecondsFormat, Utc};

const SOURCE_KEY: &str = "source";
const ALGORITHM_KEY: &str = "algorithm";
const TRANSFERRED_KEY: &str = "transferred";
const EXTRA_PREFIX: &str = "extra.";

/// Errors from reading a manifest back.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("malformed manifest: {0}")]
    Malformed(String),
}

/// Integrity record written next to every transferred file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    pub remote_path: String,
    pub file_name: String,
    pub digest: DigestValue,
    pub transferred_at: DateTime<Utc>,
    pub extra: Vec<(String, String)>,
}

impl Manifest {
    pub fn render(&self) -> String {
        let mut out = format!("{}  {}\n", self.digest.hex(), self.file_name);
        push_field(&mut out, SOURCE_KEY, &self.remote_path);
        push_field(&mut out, ALGORITHM_KEY, self.digest.algorithm().name());
        push_field(
            &mut out,
            TRANSFERRED_KEY,
            &self.transferred_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        );
        for (key, value) in &self.extra {
            push_field(&mut out, &format!("{EXTRA_PREFIX}{key}"), value);
        }
        out
    }

    pub fn parse(text: &str) -> Result<Self, ManifestError> {
        let mut lines = text.lines();
        let first = lines
            .next()
            .ok_or_else(|| ManifestError::Malformed("empty manifest".into()))?;
        let (hex, file_name) = first
            .split_once("  ")
            .ok_or_else(|| ManifestError::Malformed(format!("bad checksum line: {first:?}")))?;

        let mut remote_path = None;
        let mut algorithm = None;
        let mut transferred_at = None;
        let mut extra = Vec::new();

        for line in lines {
            let Some(field) = line.strip_prefix("# ") else {
                continue;
            };
            let Some((key, value)) = field.split_once(": ") else {
                continue;
            };
            match key {
                SOURCE_KEY => remote_path = Some(value.to_string()),
                ALGORITHM_KEY => algorithm = Some(parse_algorithm(value)?),
                TRANSFERRED_KEY => {
                    let ts = DateTime::parse_from_rfc3339(value).map_err(|e| {
                        ManifestError::Malformed(format!("bad timestamp {value:?}: {e}"))
                    })?;
                    transferred_at = Some(ts.with_timezone(&Utc));
                }
                other => {
                    if let Some(name) = other.strip_prefix(EXTRA_PREFIX) {
                        extra.push((name.to_string(), value.to_string()));
                    }
                }
            }
        }

        let algorithm = algorithm.unwrap_or(DigestAlgorithm::Sha256);
        let digest = DigestValue::parse(algorithm, hex)
            .map_err(|e| ManifestError::Malformed(e.to_string()))?;

        Ok(Self {
            remote_path: remote_path
                .ok_or_else(|| ManifestError::Malformed("missing source".into()))?,
            file_name: file_name.to_string(),
            digest,
            transferred_at: transferred_at
                .ok_or_else(|| ManifestError::Malformed("missing timestamp".into()))?,
            extra,
        })
    }
}

/// Appends one `# key: value` line. Line breaks are flattened in both
/// parts, and a key never contains the `: ` separator.
fn push_field(out: &mut String, key: &str, value: &str) {
    let key = key.replace(['\r', '\n'], " ").replace(':', "_");
    let value = value.replace(['\r', '\n'], " ");
    out.push_str(&format!("# {key}: {value}\n"));
}

fn parse_algorithm(name: &str) -> Result<DigestAlgorithm, ManifestError> {
    [DigestAlgorithm::Sha256, DigestAlgorithm::ContentHash]
        .into_iter()
        .find(|alg| alg.name() == name)
        .ok_or_else(|| ManifestError::Malformed(format!("unknown algorithm {name:?}")))
}
