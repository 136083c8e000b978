//! Local object sink.
//!
//! [`LocalObjectSink`] is the boundary the transfer pipeline writes to.
//! [`FsSink`] implements it on a mounted filesystem path. Paths passed to a
//! sink are always relative to its root.

mod fs;
mod relative;

use std::path::{Path, PathBuf};
use std::pin::Pin;

use futures_util::future::BoxFuture;
use tokio::io::AsyncRead;

pub use fs::FsSink;
pub use relative::relative_components;

/// Errors produced by local sinks.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("target already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("stream read error: {0}")]
    StreamRead(#[source] std::io::Error),

    #[error("write error on {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("folder does not exist on the local store: {0}")]
    MissingFolder(PathBuf),

    #[error("local store unavailable: {0}")]
    Unavailable(String),
}

/// Result of a completed write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFile {
    /// Absolute path of the written file.
    pub path: PathBuf,
    /// Bytes written.
    pub bytes: u64,
}

/// Owned reader over a stored file.
pub type LocalStream = Pin<Box<dyn AsyncRead + Send>>;

/// Abstract local durable store.
///
/// Implementations must be safe to share between concurrent transfers.
pub trait LocalObjectSink: Send + Sync {
    /// Returns `true` if a file exists at `path`.
    fn exists<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, Result<bool, SinkError>>;

    /// Streams `reader` into `path`.
    ///
    /// With `overwrite == false` an existing target fails with
    /// [`SinkError::AlreadyExists`] and is left untouched.
    fn write<'a>(
        &'a self,
        path: &'a Path,
        reader: &'a mut (dyn AsyncRead + Send + Unpin),
        overwrite: bool,
    ) -> BoxFuture<'a, Result<WrittenFile, SinkError>>;

    /// Writes a small text document, replacing any existing one.
    fn write_text<'a>(
        &'a self,
        path: &'a Path,
        content: &'a str,
    ) -> BoxFuture<'a, Result<WrittenFile, SinkError>>;

    /// Opens a stored file for reading.
    fn open<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, Result<LocalStream, SinkError>>;

    /// Removes a file. Removing a missing file succeeds.
    fn remove<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, Result<(), SinkError>>;

    /// Verifies the store is reachable; returns a description of it.
    fn check(&self) -> BoxFuture<'_, Result<String, SinkError>>;
}
