//! Batch lists: a CSV naming the files of one remote folder.
//!
//! The first column holds file names relative to the folder the list lives
//! in. Every other column becomes an extra manifest field keyed by its
//! header.

use std::io::Read;

use att_remote::{RemoteError, RemoteObjectSource, remote_parent};
use tokio::io::AsyncReadExt;
use tracing::debug;

use crate::types::TransferRequest;

/// Errors from reading a batch list.
#[derive(Debug, thiserror::Error)]
pub enum FileListError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("batch list has no columns")]
    NoColumns,

    #[error("row {row} has an empty file name")]
    EmptyFileName { row: usize },
}

/// Parses a batch list whose rows name files inside `folder`.
pub fn parse_file_list<R: Read>(
    reader: R,
    folder: &str,
) -> Result<Vec<TransferRequest>, FileListError> {
    let mut csv = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = csv.headers()?.iter().map(str::to_string).collect();
    if headers.is_empty() {
        return Err(FileListError::NoColumns);
    }

    let mut requests = Vec::new();
    for (i, record) in csv.records().enumerate() {
        let record = record?;
        let name = record.get(0).unwrap_or_default();
        if name.is_empty() {
            return Err(FileListError::EmptyFileName { row: i + 1 });
        }

        let remote_path = if folder.is_empty() {
            name.to_string()
        } else {
            format!("{folder}/{name}")
        };
        let extra = headers
            .iter()
            .skip(1)
            .zip(record.iter().skip(1))
            .map(|(key, value)| (key.clone(), value.to_string()))
            .collect();

        requests.push(TransferRequest::for_archive(remote_path).with_extra(extra));
    }

    Ok(requests)
}

/// Downloads the batch list at `list_path` and parses it.
///
/// File names in the list are relative to the list's own folder.
pub async fn load_file_list(
    remote: &dyn RemoteObjectSource,
    list_path: &str,
) -> Result<Vec<TransferRequest>, FileListError> {
    let mut stream = remote.open_stream(list_path).await?;
    let mut content = Vec::new();
    stream.read_to_end(&mut content).await?;

    let requests = parse_file_list(content.as_slice(), remote_parent(list_path))?;
    debug!(list = list_path, items = requests.len(), "batch list loaded");
    Ok(requests)
}
