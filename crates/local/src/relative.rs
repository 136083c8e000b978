//! Sink-relative paths.

use std::ffi::OsStr;
use std::path::{Component, Path};

use crate::SinkError;

/// Splits a sink-relative path into its named components, dropping `.`.
///
/// A path that is empty, absolute or climbs with `..` could land outside the
/// sink root and is rejected.
pub fn relative_components(path: &Path) -> Result<Vec<&OsStr>, SinkError> {
    let mut parts = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(part),
            Component::CurDir => {}
            Component::ParentDir => return Err(invalid(path, "climbs out of the sink root")),
            Component::RootDir | Component::Prefix(_) => return Err(invalid(path, "is absolute")),
        }
    }
    if parts.is_empty() {
        return Err(invalid(path, "names nothing"));
    }
    Ok(parts)
}

fn invalid(path: &Path, problem: &str) -> SinkError {
    SinkError::InvalidPath(format!("{:?} {problem}", path.display().to_string()))
}
