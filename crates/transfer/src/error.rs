//! Per-item transfer errors.
//!
//! Every variant is caught at the orchestrator boundary and turned into a
//! `Failed` outcome; the `Display` text is the outcome's reason.

use att_local::SinkError;
use att_remote::RemoteError;

/// Errors that end a single transfer.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("remote object not found: {0}")]
    NotFound(String),

    #[error("missing remote checksum")]
    MissingRemoteChecksum,

    #[error("transfer I/O error: {0}")]
    Io(String),

    #[error("checksum mismatch: declared {declared}, computed {computed}")]
    ChecksumMismatch { declared: String, computed: String },

    #[error("metadata sidecar error: {0}")]
    Metadata(String),

    #[error("manifest write error: {0}")]
    Manifest(String),

    #[error("sidecar collision: {path} belongs to {owner}")]
    SidecarCollision { path: String, owner: String },

    #[error("remote store error: {0}")]
    Remote(RemoteError),

    #[error("local store error: {0}")]
    Local(SinkError),

    #[error("batch cancelled")]
    Cancelled,

    #[error("transfer task aborted")]
    Aborted,
}

impl From<RemoteError> for TransferError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::NotFound(path) => Self::NotFound(path),
            other => Self::Remote(other),
        }
    }
}
