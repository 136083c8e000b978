//! Remote object sources.
//!
//! [`RemoteObjectSource`] is the boundary the transfer pipeline pulls from.
//! Two implementations ship here:
//!
//! - [`DropboxSource`] talks to the Dropbox v2 HTTP API with a bearer token.
//! - [`DirectorySource`] serves a local directory as if it were the remote
//!   store (offline and test workspaces).
//!
//! All paths handed to a source are relative to its configured root folder,
//! in `folder/file name.ext` form.

mod directory;
mod dropbox;
mod path;

use std::pin::Pin;

use att_checksum::{DigestAlgorithm, DigestValue};
use futures_util::future::BoxFuture;
use tokio::io::AsyncRead;

pub use directory::DirectorySource;
pub use dropbox::{AccountInfo, DropboxSource};
pub use path::{
    join_remote, remote_file_name, remote_parent, validate_relative, validate_remote_file,
};

/// Default metadata document expected in every remote folder.
pub const DEFAULT_METADATA_NAME: &str = "default_metadata.xml";

/// Owned byte stream produced by a source.
pub type ByteStream = Pin<Box<dyn AsyncRead + Send>>;

/// Errors produced by remote sources.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("remote object not found: {0}")]
    NotFound(String),

    #[error("invalid remote path: {0}")]
    InvalidPath(String),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("checksum error: {0}")]
    Checksum(#[from] att_checksum::ChecksumError),

    #[error("invalid access token")]
    InvalidToken,

    #[error("connected to the wrong account: {0}")]
    WrongAccount(String),
}

/// Read-only description of a remote object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteObjectHandle {
    /// Path relative to the source root, as requested.
    pub path: String,
    /// Store-absolute path, as reported in manifests.
    pub full_path: String,
    /// Size in bytes.
    pub size: u64,
    /// Digest declared by the store, verbatim. `None` if the store sent none.
    pub declared_digest: Option<String>,
    /// Algorithm the declared digest was computed with.
    pub digest_algorithm: DigestAlgorithm,
    /// Relative path of the folder's default metadata document.
    pub metadata_path: String,
}

impl RemoteObjectHandle {
    /// Parsed declared digest; `None` when absent or malformed.
    pub fn declared_digest(&self) -> Option<DigestValue> {
        let raw = self.declared_digest.as_deref()?;
        DigestValue::parse(self.digest_algorithm, raw).ok()
    }

    /// Relative folder containing the object.
    pub fn folder(&self) -> &str {
        remote_parent(&self.path)
    }

    /// Object file name.
    pub fn file_name(&self) -> &str {
        remote_file_name(&self.path)
    }
}

/// Abstract remote store.
///
/// Implementations must be safe to share between concurrent transfers.
pub trait RemoteObjectSource: Send + Sync {
    /// Looks up an object. Fails with [`RemoteError::NotFound`] if absent.
    fn resolve<'a>(
        &'a self,
        path: &'a str,
    ) -> BoxFuture<'a, Result<RemoteObjectHandle, RemoteError>>;

    /// Opens the object's content as a stream.
    fn open_stream<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<ByteStream, RemoteError>>;

    /// Opens the default metadata document of `folder`.
    fn fetch_default_metadata<'a>(
        &'a self,
        folder: &'a str,
    ) -> BoxFuture<'a, Result<ByteStream, RemoteError>>;

    /// Verifies the store is reachable; returns a description of what was reached.
    fn check(&self) -> BoxFuture<'_, Result<String, RemoteError>>;
}
