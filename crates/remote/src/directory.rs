//! Directory-backed stand-in for the remote store.

use std::path::{Path, PathBuf};

use att_checksum::{DigestAlgorithm, digest_file};
use futures_util::future::BoxFuture;
use tracing::debug;

use crate::path::{join_remote, remote_parent, validate_relative};
use crate::{ByteStream, DEFAULT_METADATA_NAME, RemoteError, RemoteObjectHandle, RemoteObjectSource};

/// Serves files below a local directory as remote objects.
///
/// The declared digest is the remote-style content hash of the file on disk,
/// computed at [`resolve`](RemoteObjectSource::resolve) time.
pub struct DirectorySource {
    root: PathBuf,
    metadata_name: String,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            metadata_name: DEFAULT_METADATA_NAME.to_string(),
        }
    }

    /// Overrides the default metadata document name.
    pub fn with_metadata_name(mut self, name: impl Into<String>) -> Self {
        self.metadata_name = name.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn local_path(&self, relative: &str) -> Result<PathBuf, RemoteError> {
        validate_relative(relative)?;
        Ok(self.root.join(relative))
    }

    fn metadata_path(&self, folder: &str) -> String {
        if folder.is_empty() {
            self.metadata_name.clone()
        } else {
            format!("{folder}/{}", self.metadata_name)
        }
    }

    async fn open(&self, relative: &str) -> Result<ByteStream, RemoteError> {
        let path = self.local_path(relative)?;
        match tokio::fs::File::open(&path).await {
            Ok(file) => Ok(Box::pin(file)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(RemoteError::NotFound(relative.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl RemoteObjectSource for DirectorySource {
    fn resolve<'a>(
        &'a self,
        path: &'a str,
    ) -> BoxFuture<'a, Result<RemoteObjectHandle, RemoteError>> {
        Box::pin(async move {
            let local = self.local_path(path)?;
            let meta = match tokio::fs::metadata(&local).await {
                Ok(m) if m.is_file() => m,
                Ok(_) => return Err(RemoteError::NotFound(path.to_string())),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Err(RemoteError::NotFound(path.to_string()));
                }
                Err(e) => return Err(e.into()),
            };

            let digest = digest_file(&local, DigestAlgorithm::ContentHash).await?;
            debug!(path, size = meta.len(), "resolved directory object");

            Ok(RemoteObjectHandle {
                path: path.to_string(),
                full_path: join_remote(&self.root.to_string_lossy(), path),
                size: meta.len(),
                declared_digest: Some(digest.hex().to_string()),
                digest_algorithm: DigestAlgorithm::ContentHash,
                metadata_path: self.metadata_path(remote_parent(path)),
            })
        })
    }

    fn open_stream<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<ByteStream, RemoteError>> {
        Box::pin(self.open(path))
    }

    fn fetch_default_metadata<'a>(
        &'a self,
        folder: &'a str,
    ) -> BoxFuture<'a, Result<ByteStream, RemoteError>> {
        Box::pin(async move {
            let path = self.metadata_path(folder);
            self.open(&path).await
        })
    }

    fn check(&self) -> BoxFuture<'_, Result<String, RemoteError>> {
        Box::pin(async move {
            let meta = tokio::fs::metadata(&self.root).await?;
            if !meta.is_dir() {
                return Err(RemoteError::InvalidPath(format!(
                    "not a directory: {}",
                    self.root.display()
                )));
            }
            Ok(format!("directory {}", self.root.display()))
        })
    }
}
