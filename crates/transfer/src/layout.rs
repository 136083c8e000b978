//! Local path layout for transferred files and their sidecars.

use std::path::{Path, PathBuf};

/// Suffix of the manifest file name.
pub const MANIFEST_SUFFIX: &str = "_manifest.txt";

/// Suffix (before the extension) of the metadata sidecar file name.
pub const METADATA_SUFFIX: &str = "_metadata";

/// Replaces `.` and ` ` with `_` so a file stem can name a folder.
pub fn cleaned_name(stem: &str) -> String {
    stem.replace(['.', ' '], "_")
}

/// Stem of a file name: everything before the last `.` (the whole name if
/// there is none or it is a leading dot).
fn file_stem(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(i) if i > 0 => &file_name[..i],
        _ => file_name,
    }
}

/// Folder an archive lands in: `<remote folder>/<cleaned stem>`.
pub(crate) fn archive_folder(remote_path: &str) -> PathBuf {
    let folder = att_remote::remote_parent(remote_path);
    let name = att_remote::remote_file_name(remote_path);
    Path::new(folder).join(cleaned_name(file_stem(name)))
}

/// `<folder>/<stem>_manifest.txt`. Files sharing a stem in one folder share
/// this path, and the metadata sidecar path with it.
pub fn manifest_path(folder: &Path, file_name: &str) -> PathBuf {
    folder.join(format!("{}{MANIFEST_SUFFIX}", file_stem(file_name)))
}

/// Relative local paths of a transferred file and its sidecars.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivePaths {
    /// `<folder>/<file name>`
    pub target: PathBuf,
    /// `<folder>/<stem>_manifest.txt`
    pub manifest: PathBuf,
    /// `<folder>/<stem>_metadata.<metadata document extension>`
    pub metadata: PathBuf,
}

impl ArchivePaths {
    pub fn new(folder: &Path, file_name: &str, metadata_name: &str) -> Self {
        let stem = file_stem(file_name);
        let metadata_file = match Path::new(metadata_name).extension() {
            Some(ext) => format!("{stem}{METADATA_SUFFIX}.{}", ext.to_string_lossy()),
            None => format!("{stem}{METADATA_SUFFIX}"),
        };
        Self {
            target: folder.join(file_name),
            manifest: manifest_path(folder, file_name),
            metadata: folder.join(metadata_file),
        }
    }
}
