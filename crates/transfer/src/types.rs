//! Data types for the transfer flow.

use std::path::{Path, PathBuf};

use att_checksum::DigestValue;

use crate::layout::{ArchivePaths, archive_folder, manifest_path};

/// One object to move. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    remote_path: String,
    local_folder: PathBuf,
    extra: Vec<(String, String)>,
}

impl TransferRequest {
    /// Creates a request for `remote_path` (relative to the remote root)
    /// landing in `local_folder` (relative to the local root).
    pub fn new(remote_path: impl Into<String>, local_folder: impl Into<PathBuf>) -> Self {
        Self {
            remote_path: remote_path.into(),
            local_folder: local_folder.into(),
            extra: Vec::new(),
        }
    }

    /// Creates a request using the archive layout: the file lands in
    /// `<remote folder>/<cleaned stem>/` on the local store.
    pub fn for_archive(remote_path: impl Into<String>) -> Self {
        let remote_path = remote_path.into();
        let local_folder = archive_folder(&remote_path);
        Self::new(remote_path, local_folder)
    }

    /// Adds extra manifest fields, in order.
    pub fn with_extra(mut self, extra: Vec<(String, String)>) -> Self {
        self.extra = extra;
        self
    }

    pub fn remote_path(&self) -> &str {
        &self.remote_path
    }

    pub fn local_folder(&self) -> &Path {
        &self.local_folder
    }

    pub fn extra(&self) -> &[(String, String)] {
        &self.extra
    }

    /// Local file name: the remote object's base name.
    pub fn file_name(&self) -> &str {
        att_remote::remote_file_name(&self.remote_path)
    }

    /// Relative local path of the transferred file.
    pub fn target_path(&self) -> PathBuf {
        self.local_folder.join(self.file_name())
    }

    /// Relative local path of the manifest. Requests with equal manifest
    /// paths also share a metadata sidecar.
    pub fn manifest_path(&self) -> PathBuf {
        manifest_path(&self.local_folder, self.file_name())
    }

    /// Derived local paths for the file and its sidecars.
    pub fn paths(&self, metadata_name: &str) -> ArchivePaths {
        ArchivePaths::new(&self.local_folder, self.file_name(), metadata_name)
    }
}

/// Caller-supplied transfer policy.
#[derive(Debug, Clone, Default)]
pub struct TransferOptions {
    /// Replace an existing local file (and its sidecars). Off by default.
    pub overwrite: bool,
}

/// Terminal state of one transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferStatus {
    Success,
    SkippedExisting,
    Failed { reason: String },
}

impl TransferStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Result of one transfer request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferOutcome {
    /// Requested remote path (relative to the remote root).
    pub remote_path: String,
    /// Local file path (relative to the local root).
    pub local_path: PathBuf,
    pub status: TransferStatus,
    /// SHA-256 of the stored file. Only set on success.
    pub standard_digest: Option<DigestValue>,
    /// Digest declared by the remote store, if resolution got that far.
    pub remote_digest: Option<String>,
}

impl TransferOutcome {
    pub(crate) fn failed(request: &TransferRequest, reason: String) -> Self {
        Self {
            remote_path: request.remote_path().to_string(),
            local_path: request.target_path(),
            status: TransferStatus::Failed { reason },
            standard_digest: None,
            remote_digest: None,
        }
    }
}

/// Progress events emitted by the orchestrator.
#[derive(Debug, Clone)]
pub enum TransferEvent {
    Started { remote_path: String },
    Finished { outcome: TransferOutcome },
}

/// Aggregated result of a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    /// One outcome per request, in request order.
    pub outcomes: Vec<TransferOutcome>,
}

impl BatchSummary {
    pub fn from_outcomes(outcomes: Vec<TransferOutcome>) -> Self {
        let mut summary = Self::default();
        for outcome in &outcomes {
            match outcome.status {
                TransferStatus::Success => summary.succeeded += 1,
                TransferStatus::SkippedExisting => summary.skipped += 1,
                TransferStatus::Failed { .. } => summary.failed += 1,
            }
        }
        summary.outcomes = outcomes;
        summary
    }

    /// `true` when no item failed. Skips do not count as failures.
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}
