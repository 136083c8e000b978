//! Checksum-validated transfer pipeline.
//!
//! Moves one named object from a [`RemoteObjectSource`] into a
//! [`LocalObjectSink`] and proves the copy is bit-for-bit identical.
//!
//! # Pipeline
//!
//! 1. **Resolve**: look up the object and its declared content hash
//! 2. **Check target**: skip if the local file exists and overwrite is off
//! 3. **Fetch + write**: stream to disk while computing the content hash
//! 4. **Verify**: compare against the declared hash; remove the file on mismatch
//! 5. **Recompute**: SHA-256 of the stored file for the manifest
//! 6. **Sidecar**: copy the folder's default metadata document verbatim
//! 7. **Manifest**: write the per-file integrity record
//!
//! [`BatchRunner`] drives many requests through the same pipeline.
//!
//! [`RemoteObjectSource`]: att_remote::RemoteObjectSource
//! [`LocalObjectSink`]: att_local::LocalObjectSink

pub mod batch;
pub mod error;
pub mod file_list;
pub mod layout;
pub mod manifest;
pub mod orchestrator;
pub mod types;

pub use batch::BatchRunner;
pub use error::TransferError;
pub use file_list::{FileListError, load_file_list, parse_file_list};
pub use layout::{ArchivePaths, cleaned_name};
pub use manifest::{Manifest, ManifestError};
pub use orchestrator::TransferOrchestrator;
pub use types::{
    BatchSummary, TransferEvent, TransferOptions, TransferOutcome, TransferRequest, TransferStatus,
};
