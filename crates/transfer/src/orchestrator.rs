//! Single-object transfer protocol.
//!
//! Every step depends on the previous one, so a request runs strictly in
//! order: resolve, check target, fetch and write, verify, recompute,
//! metadata sidecar, manifest. Any error is turned into a `Failed` outcome
//! here and never propagates further.

use std::path::Path;
use std::sync::Arc;

use att_checksum::{DigestAlgorithm, DigestValue, HashingReader, digest_reader};
use att_local::{LocalObjectSink, SinkError};
use att_remote::{DEFAULT_METADATA_NAME, RemoteObjectSource};
use chrono::Utc;
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::TransferError;
use crate::layout::ArchivePaths;
use crate::manifest::Manifest;
use crate::types::{
    TransferEvent, TransferOptions, TransferOutcome, TransferRequest, TransferStatus,
};

/// What a completed run produced.
enum Completed {
    Transferred(DigestValue),
    Skipped,
}

/// Facts gathered while a request runs, reported even on failure.
#[derive(Default)]
struct Attempt {
    remote_digest: Option<String>,
    wrote_target: bool,
    wrote_metadata: bool,
    wrote_manifest: bool,
    /// Sidecars already at the derived paths describe this same file.
    owns_sidecars: bool,
}

/// Runs the validated transfer protocol against injected stores.
#[derive(Clone)]
pub struct TransferOrchestrator {
    remote: Arc<dyn RemoteObjectSource>,
    sink: Arc<dyn LocalObjectSink>,
    options: TransferOptions,
    metadata_name: String,
    events: Option<mpsc::Sender<TransferEvent>>,
}

impl TransferOrchestrator {
    pub fn new(
        remote: Arc<dyn RemoteObjectSource>,
        sink: Arc<dyn LocalObjectSink>,
        options: TransferOptions,
    ) -> Self {
        Self {
            remote,
            sink,
            options,
            metadata_name: DEFAULT_METADATA_NAME.to_string(),
            events: None,
        }
    }

    /// Sets the name of the remote default metadata document, which decides
    /// the sidecar's extension.
    pub fn with_metadata_name(mut self, name: impl Into<String>) -> Self {
        self.metadata_name = name.into();
        self
    }

    /// Emits [`TransferEvent`]s on `tx`.
    pub fn with_events(mut self, tx: mpsc::Sender<TransferEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn options(&self) -> &TransferOptions {
        &self.options
    }

    /// Transfers one object. Never fails: errors become a `Failed` outcome.
    pub async fn transfer(&self, request: &TransferRequest) -> TransferOutcome {
        self.emit(TransferEvent::Started {
            remote_path: request.remote_path().to_string(),
        })
        .await;

        let paths = request.paths(&self.metadata_name);
        let mut attempt = Attempt::default();
        let result = self.run(request, &paths, &mut attempt).await;

        let (status, standard_digest) = match result {
            Ok(Completed::Transferred(digest)) => {
                info!(
                    remote = request.remote_path(),
                    local = %paths.target.display(),
                    digest = %digest,
                    "transfer verified"
                );
                (TransferStatus::Success, Some(digest))
            }
            Ok(Completed::Skipped) => {
                info!(
                    remote = request.remote_path(),
                    local = %paths.target.display(),
                    "target exists, skipped"
                );
                (TransferStatus::SkippedExisting, None)
            }
            Err(err) => {
                warn!(remote = request.remote_path(), error = %err, "transfer failed");
                if attempt.wrote_target {
                    self.cleanup(&paths, &attempt).await;
                }
                (
                    TransferStatus::Failed {
                        reason: err.to_string(),
                    },
                    None,
                )
            }
        };

        let outcome = TransferOutcome {
            remote_path: request.remote_path().to_string(),
            local_path: paths.target.clone(),
            status,
            standard_digest,
            remote_digest: attempt.remote_digest,
        };
        self.emit(TransferEvent::Finished {
            outcome: outcome.clone(),
        })
        .await;
        outcome
    }

    async fn run(
        &self,
        request: &TransferRequest,
        paths: &ArchivePaths,
        attempt: &mut Attempt,
    ) -> Result<Completed, TransferError> {
        let overwrite = self.options.overwrite;

        // Resolve
        let handle = self.remote.resolve(request.remote_path()).await?;
        attempt.remote_digest = handle.declared_digest.clone();
        debug!(remote = %handle.full_path, size = handle.size, "resolved");

        // Check target
        if !overwrite && self.sink.exists(&paths.target).await.map_err(TransferError::Local)? {
            return Ok(Completed::Skipped);
        }

        // Verification is mandatory; refuse to copy what cannot be checked.
        let declared = handle
            .declared_digest()
            .ok_or(TransferError::MissingRemoteChecksum)?;

        // Files sharing a stem share sidecar paths; never touch another file's proof.
        attempt.owns_sidecars = self.claim_sidecars(request, paths).await?;

        // Fetch, then write and digest in a single pass.
        let stream = self
            .remote
            .open_stream(request.remote_path())
            .await
            .map_err(|e| match e {
                att_remote::RemoteError::NotFound(p) => TransferError::NotFound(p),
                other => TransferError::Io(other.to_string()),
            })?;
        let mut reader = HashingReader::new(stream, DigestAlgorithm::ContentHash);

        attempt.wrote_target = true;
        let written = match self.sink.write(&paths.target, &mut reader, overwrite).await {
            Ok(w) => w,
            Err(SinkError::AlreadyExists(_)) => {
                // Someone else created it between the check and the write.
                attempt.wrote_target = false;
                return Ok(Completed::Skipped);
            }
            Err(e) => return Err(TransferError::Io(e.to_string())),
        };
        debug!(
            local = %written.path.display(),
            bytes = written.bytes,
            expected = handle.size,
            "written"
        );

        // Verify
        let computed = reader.finalize();
        if computed != declared {
            return Err(TransferError::ChecksumMismatch {
                declared: declared.hex().to_string(),
                computed: computed.hex().to_string(),
            });
        }
        debug!(digest = %computed, "content hash verified");

        // Recompute standard digest from the stored copy.
        let standard = self.standard_digest(&paths.target).await?;

        // Metadata sidecar, copied verbatim.
        attempt.wrote_metadata = true;
        self.copy_metadata(handle.folder(), &paths.metadata).await?;

        // Manifest
        let manifest = Manifest {
            remote_path: handle.full_path.clone(),
            file_name: request.file_name().to_string(),
            digest: standard.clone(),
            transferred_at: Utc::now(),
            extra: request.extra().to_vec(),
        };
        attempt.wrote_manifest = true;
        self.sink
            .write_text(&paths.manifest, &manifest.render())
            .await
            .map_err(|e| TransferError::Manifest(e.to_string()))?;

        Ok(Completed::Transferred(standard))
    }

    async fn standard_digest(&self, target: &Path) -> Result<DigestValue, TransferError> {
        let mut stored = self
            .sink
            .open(target)
            .await
            .map_err(|e| TransferError::Io(e.to_string()))?;
        digest_reader(&mut stored, DigestAlgorithm::Sha256)
            .await
            .map_err(|e| TransferError::Io(e.to_string()))
    }

    async fn copy_metadata(&self, folder: &str, sidecar: &Path) -> Result<(), TransferError> {
        let mut doc = self
            .remote
            .fetch_default_metadata(folder)
            .await
            .map_err(|e| TransferError::Metadata(e.to_string()))?;
        self.sink
            .write(sidecar, &mut doc, true)
            .await
            .map_err(|e| TransferError::Metadata(e.to_string()))?;
        Ok(())
    }

    /// Checks who the sidecars at the derived paths belong to.
    ///
    /// Returns `true` when an existing manifest names this request's file,
    /// `false` when there is none. A manifest naming another file, or one
    /// that cannot be read, is a collision.
    async fn claim_sidecars(
        &self,
        request: &TransferRequest,
        paths: &ArchivePaths,
    ) -> Result<bool, TransferError> {
        let manifest_path = &paths.manifest;
        if !self.sink.exists(manifest_path).await.map_err(TransferError::Local)? {
            return Ok(false);
        }

        let collision = |owner: String| TransferError::SidecarCollision {
            path: manifest_path.display().to_string(),
            owner,
        };
        let mut stream = self.sink.open(manifest_path).await.map_err(TransferError::Local)?;
        let mut text = String::new();
        if let Err(e) = stream.read_to_string(&mut text).await {
            return Err(collision(format!("unreadable manifest ({e})")));
        }
        let existing = Manifest::parse(&text).map_err(|e| collision(e.to_string()))?;
        if existing.file_name != request.file_name() {
            return Err(collision(existing.file_name));
        }
        Ok(true)
    }

    /// Removes the target, plus the sidecars this attempt wrote or that
    /// described the same file.
    async fn cleanup(&self, paths: &ArchivePaths, attempt: &Attempt) {
        let mut doomed = vec![paths.target.as_path()];
        if attempt.wrote_metadata || attempt.owns_sidecars {
            doomed.push(&paths.metadata);
        }
        if attempt.wrote_manifest || attempt.owns_sidecars {
            doomed.push(&paths.manifest);
        }
        for path in doomed {
            if let Err(e) = self.sink.remove(path).await {
                warn!(path = %path.display(), error = %e, "cleanup failed");
            }
        }
    }

    async fn emit(&self, event: TransferEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event).await;
        }
    }
}
