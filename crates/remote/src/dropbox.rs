//! Dropbox v2 API client.
//!
//! Async HTTP client using `reqwest` with Bearer token authentication.
//! Obtaining the token (OAuth) is the caller's concern.

use att_checksum::DigestAlgorithm;
use futures_util::TryStreamExt;
use futures_util::future::BoxFuture;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Deserialize;
use tokio_util::io::StreamReader;
use tracing::debug;

use crate::path::{join_remote, remote_parent, validate_relative};
use crate::{
    ByteStream, DEFAULT_METADATA_NAME, RemoteError, RemoteObjectHandle, RemoteObjectSource,
};

const DEFAULT_API_URL: &str = "https://api.dropboxapi.com/2";
const DEFAULT_CONTENT_URL: &str = "https://content.dropboxapi.com/2";

const API_ARG_HEADER: &str = "Dropbox-API-Arg";
const PATH_ROOT_HEADER: &str = "Dropbox-API-Path-Root";

/// Account the token belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountInfo {
    pub display_name: String,
    pub team_name: Option<String>,
    pub root_namespace_id: String,
}

#[derive(Debug, Deserialize)]
struct FileMetadata {
    #[serde(rename = ".tag")]
    tag: String,
    #[serde(default)]
    path_display: Option<String>,
    #[serde(default)]
    size: u64,
    #[serde(default)]
    content_hash: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    error_summary: String,
}

#[derive(Debug, Deserialize)]
struct FullAccount {
    name: AccountName,
    #[serde(default)]
    team: Option<Team>,
    root_info: RootInfo,
}

#[derive(Debug, Deserialize)]
struct AccountName {
    display_name: String,
}

#[derive(Debug, Deserialize)]
struct Team {
    name: String,
}

#[derive(Debug, Deserialize)]
struct RootInfo {
    root_namespace_id: String,
}

/// Dropbox-backed [`RemoteObjectSource`].
pub struct DropboxSource {
    http: reqwest::Client,
    api_url: String,
    content_url: String,
    root: String,
    metadata_name: String,
    path_root: Option<String>,
    expected_team: Option<String>,
}

impl DropboxSource {
    /// Creates a client for `root` (e.g. `/ArchivesTransfer/`) with the given token.
    pub fn new(access_token: &str, root: &str) -> Result<Self, RemoteError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {access_token}"))
                .map_err(|_| RemoteError::InvalidToken)?,
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            api_url: DEFAULT_API_URL.to_string(),
            content_url: DEFAULT_CONTENT_URL.to_string(),
            root: root.to_string(),
            metadata_name: DEFAULT_METADATA_NAME.to_string(),
            path_root: None,
            expected_team: None,
        })
    }

    /// Creates a client scoped to the account's root namespace.
    ///
    /// Team folders are only visible from the root namespace, not from the
    /// member's home namespace.
    pub async fn connect(access_token: &str, root: &str) -> Result<Self, RemoteError> {
        Self::new(access_token, root)?.scoped_to_root_namespace().await
    }

    /// Looks up the account and sends every later request against its
    /// root namespace.
    pub async fn scoped_to_root_namespace(mut self) -> Result<Self, RemoteError> {
        let account = self.account().await?;
        debug!(
            account = %account.display_name,
            namespace = %account.root_namespace_id,
            "scoping to root namespace"
        );
        self.path_root = Some(account.root_namespace_id);
        Ok(self)
    }

    /// Overrides the default metadata document name.
    pub fn with_metadata_name(mut self, name: impl Into<String>) -> Self {
        self.metadata_name = name.into();
        self
    }

    /// Makes [`check`](RemoteObjectSource::check) fail unless the account
    /// belongs to `team`.
    pub fn with_expected_team(mut self, team: impl Into<String>) -> Self {
        self.expected_team = Some(team.into());
        self
    }

    /// Sets custom API and content base URLs.
    pub fn with_base_urls(
        mut self,
        api_url: impl Into<String>,
        content_url: impl Into<String>,
    ) -> Self {
        self.api_url = api_url.into();
        self.content_url = content_url.into();
        self
    }

    fn full_path(&self, relative: &str) -> String {
        join_remote(&self.root, relative)
    }

    fn metadata_path(&self, folder: &str) -> String {
        if folder.is_empty() {
            self.metadata_name.clone()
        } else {
            format!("{folder}/{}", self.metadata_name)
        }
    }

    fn request(&self, url: String) -> reqwest::RequestBuilder {
        let req = self.http.post(url);
        match &self.path_root {
            Some(ns) => req.header(PATH_ROOT_HEADER, path_root_header(ns)),
            None => req,
        }
    }

    /// Calls an RPC endpoint with a JSON body.
    async fn rpc(&self, endpoint: &str, body: &serde_json::Value) -> Result<Vec<u8>, RemoteError> {
        let url = format!("{}{}", self.api_url, endpoint);
        let resp = self
            .request(url)
            .header(CONTENT_TYPE, "application/json")
            .body(serde_json::to_vec(body)?)
            .send()
            .await?;
        let resp = check_status(resp, endpoint).await?;
        Ok(resp.bytes().await?.to_vec())
    }

    /// Returns the account the token belongs to.
    pub async fn account(&self) -> Result<AccountInfo, RemoteError> {
        let body = self
            .rpc("/users/get_current_account", &serde_json::Value::Null)
            .await?;
        let account: FullAccount = serde_json::from_slice(&body)?;
        Ok(AccountInfo {
            display_name: account.name.display_name,
            team_name: account.team.map(|t| t.name),
            root_namespace_id: account.root_info.root_namespace_id,
        })
    }

    async fn download(&self, relative: &str) -> Result<ByteStream, RemoteError> {
        validate_relative(relative)?;
        let full = self.full_path(relative);
        let arg = serde_json::json!({ "path": full });
        let url = format!("{}/files/download", self.content_url);

        let resp = self
            .request(url)
            .header(API_ARG_HEADER, header_safe_json(&arg))
            .send()
            .await?;
        let resp = check_status(resp, &full).await?;
        debug!(path = %full, "download started");

        let stream = resp.bytes_stream().map_err(std::io::Error::other);
        Ok(Box::pin(StreamReader::new(stream)))
    }
}

impl RemoteObjectSource for DropboxSource {
    fn resolve<'a>(
        &'a self,
        path: &'a str,
    ) -> BoxFuture<'a, Result<RemoteObjectHandle, RemoteError>> {
        Box::pin(async move {
            validate_relative(path)?;
            let full = self.full_path(path);
            let body = self
                .rpc("/files/get_metadata", &serde_json::json!({ "path": full }))
                .await
                .map_err(|e| match e {
                    RemoteError::NotFound(_) => RemoteError::NotFound(full.clone()),
                    other => other,
                })?;
            let meta: FileMetadata = serde_json::from_slice(&body)?;
            if meta.tag != "file" {
                return Err(RemoteError::NotFound(full));
            }

            Ok(RemoteObjectHandle {
                path: path.to_string(),
                full_path: meta.path_display.unwrap_or(full),
                size: meta.size,
                declared_digest: meta.content_hash,
                digest_algorithm: DigestAlgorithm::ContentHash,
                metadata_path: self.metadata_path(remote_parent(path)),
            })
        })
    }

    fn open_stream<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<ByteStream, RemoteError>> {
        Box::pin(self.download(path))
    }

    fn fetch_default_metadata<'a>(
        &'a self,
        folder: &'a str,
    ) -> BoxFuture<'a, Result<ByteStream, RemoteError>> {
        Box::pin(async move {
            let path = self.metadata_path(folder);
            self.download(&path).await
        })
    }

    fn check(&self) -> BoxFuture<'_, Result<String, RemoteError>> {
        Box::pin(async move {
            let account = self.account().await?;
            if let Some(expected) = &self.expected_team
                && account.team_name.as_deref() != Some(expected.as_str())
            {
                return Err(RemoteError::WrongAccount(format!(
                    "expected team {expected}, got {}",
                    account.team_name.as_deref().unwrap_or("no team")
                )));
            }
            Ok(match account.team_name {
                Some(team) => format!("{} ({team})", account.display_name),
                None => account.display_name,
            })
        })
    }
}

/// Maps non-success responses to errors.
///
/// A `path/not_found` conflict becomes [`RemoteError::NotFound`].
async fn check_status(
    resp: reqwest::Response,
    target: &str,
) -> Result<reqwest::Response, RemoteError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(classify_error(status.as_u16(), body, target))
}

fn classify_error(status: u16, body: String, target: &str) -> RemoteError {
    if status == 401 {
        return RemoteError::InvalidToken;
    }
    if status == 409 {
        let summary = serde_json::from_str::<ApiErrorBody>(&body)
            .map(|b| b.error_summary)
            .unwrap_or_default();
        if summary.contains("not_found") {
            return RemoteError::NotFound(target.to_string());
        }
    }
    RemoteError::Api { status, body }
}

/// HTTP header values must be ASCII, so non-ASCII characters in the JSON
/// argument are written as `\uXXXX` escapes.
fn header_safe_json(value: &serde_json::Value) -> String {
    let raw = value.to_string();
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                out.push_str(&format!("\\u{unit:04x}"));
            }
        }
    }
    out
}

fn path_root_header(namespace_id: &str) -> String {
    serde_json::json!({ ".tag": "root", "root": namespace_id }).to_string()
}
