//! Filesystem-backed sink.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use futures_util::future::BoxFuture;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tracing::{debug, warn};

use crate::{LocalObjectSink, LocalStream, SinkError, WrittenFile, relative_components};

const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Writes below a root directory on a mounted filesystem.
#[derive(Debug, Clone)]
pub struct FsSink {
    root: PathBuf,
    require_top_folder: bool,
}

impl FsSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            require_top_folder: false,
        }
    }

    /// When set, writes never create the first folder of a path; it must
    /// already exist below the root. Deeper folders are still created.
    pub fn require_top_folder(mut self, require: bool) -> Self {
        self.require_top_folder = require;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a relative path against the root after validating it.
    pub fn resolve(&self, path: &Path) -> Result<PathBuf, SinkError> {
        relative_components(path)?;
        Ok(self.root.join(path))
    }

    async fn ensure_parent(&self, path: &Path, full: &Path) -> Result<(), SinkError> {
        let parts = relative_components(path)?;
        if self.require_top_folder && parts.len() > 1 {
            let top = self.root.join(parts[0]);
            let is_dir = tokio::fs::metadata(&top).await.is_ok_and(|m| m.is_dir());
            if !is_dir {
                return Err(SinkError::MissingFolder(top));
            }
        }

        let Some(parent) = full.parent() else {
            return Ok(());
        };
        let mut builder = tokio::fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        builder.mode(0o775);
        builder.create(parent).await.map_err(|source| SinkError::Write {
            path: parent.to_path_buf(),
            source,
        })
    }

    async fn write_stream(
        &self,
        path: &Path,
        reader: &mut (dyn AsyncRead + Send + Unpin),
        overwrite: bool,
    ) -> Result<WrittenFile, SinkError> {
        let full = self.resolve(path)?;
        self.ensure_parent(path, &full).await?;

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true);
        if overwrite {
            options.create(true).truncate(true);
        } else {
            options.create_new(true);
        }

        let mut file = match options.open(&full).await {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(SinkError::AlreadyExists(full));
            }
            Err(source) => return Err(SinkError::Write { path: full, source }),
        };

        let write_err = |source| SinkError::Write {
            path: full.clone(),
            source,
        };

        let mut buf = vec![0u8; COPY_BUFFER_SIZE];
        let mut bytes = 0u64;
        loop {
            let n = reader.read(&mut buf).await.map_err(SinkError::StreamRead)?;
            if n == 0 {
                break;
            }
            file.write_all(&buf[..n]).await.map_err(write_err)?;
            bytes += n as u64;
        }
        file.flush().await.map_err(write_err)?;
        file.sync_all().await.map_err(write_err)?;

        debug!(path = %full.display(), bytes, overwrite, "file written");
        Ok(WrittenFile { path: full, bytes })
    }
}

impl LocalObjectSink for FsSink {
    fn exists<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, Result<bool, SinkError>> {
        Box::pin(async move {
            let full = self.resolve(path)?;
            match tokio::fs::try_exists(&full).await {
                Ok(found) => Ok(found),
                Err(source) => Err(SinkError::Write { path: full, source }),
            }
        })
    }

    fn write<'a>(
        &'a self,
        path: &'a Path,
        reader: &'a mut (dyn AsyncRead + Send + Unpin),
        overwrite: bool,
    ) -> BoxFuture<'a, Result<WrittenFile, SinkError>> {
        Box::pin(self.write_stream(path, reader, overwrite))
    }

    fn write_text<'a>(
        &'a self,
        path: &'a Path,
        content: &'a str,
    ) -> BoxFuture<'a, Result<WrittenFile, SinkError>> {
        Box::pin(async move {
            let mut reader = content.as_bytes();
            self.write_stream(path, &mut reader, true).await
        })
    }

    fn open<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, Result<LocalStream, SinkError>> {
        Box::pin(async move {
            let full = self.resolve(path)?;
            let file = tokio::fs::File::open(&full)
                .await
                .map_err(SinkError::StreamRead)?;
            Ok(Box::pin(file) as LocalStream)
        })
    }

    fn remove<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, Result<(), SinkError>> {
        Box::pin(async move {
            let full = self.resolve(path)?;
            match tokio::fs::remove_file(&full).await {
                Ok(()) => {
                    debug!(path = %full.display(), "file removed");
                    Ok(())
                }
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                Err(source) => {
                    warn!(path = %full.display(), error = %source, "failed to remove file");
                    Err(SinkError::Write { path: full, source })
                }
            }
        })
    }

    fn check(&self) -> BoxFuture<'_, Result<String, SinkError>> {
        Box::pin(async move {
            match tokio::fs::metadata(&self.root).await {
                Ok(meta) if meta.is_dir() => Ok(format!("directory {}", self.root.display())),
                Ok(_) => Err(SinkError::Unavailable(format!(
                    "not a directory: {}",
                    self.root.display()
                ))),
                Err(e) => Err(SinkError::Unavailable(format!(
                    "{}: {e}",
                    self.root.display()
                ))),
            }
        })
    }
}
