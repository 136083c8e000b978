use crate::RemoteError;

/// Validates a `folder/file name.ext` argument.
///
/// Requires exactly one `/`, a folder of at least two characters starting
/// with an ASCII letter or digit, and a file name with a non-empty stem and a
/// 3 to 5 character extension.
pub fn validate_remote_file(value: &str) -> Result<(), RemoteError> {
    let invalid = || {
        RemoteError::InvalidPath(format!("{value:?} is not formatted as folder/file name.ext"))
    };

    let (folder, file) = value.split_once('/').ok_or_else(invalid)?;
    if file.contains('/') {
        return Err(invalid());
    }

    let mut folder_chars = folder.chars();
    match folder_chars.next() {
        Some(c) if c.is_ascii_alphanumeric() => {}
        _ => return Err(invalid()),
    }
    if folder_chars.next().is_none() {
        return Err(invalid());
    }

    let has_extension = file.char_indices().any(|(i, c)| {
        if c != '.' || i == 0 {
            return false;
        }
        let ext_len = file[i + 1..].chars().count();
        (3..=5).contains(&ext_len)
    });
    if !has_extension {
        return Err(invalid());
    }

    Ok(())
}

/// Validates that a relative remote path cannot escape the source root.
pub fn validate_relative(path: &str) -> Result<(), RemoteError> {
    if path.is_empty() {
        return Err(RemoteError::InvalidPath("empty path".into()));
    }
    if path.starts_with('/') || path.starts_with('\\') {
        return Err(RemoteError::InvalidPath(format!(
            "absolute path not allowed: {path}"
        )));
    }
    if path.split(['/', '\\']).any(|segment| segment == "..") {
        return Err(RemoteError::InvalidPath(format!(
            "parent directory traversal not allowed: {path}"
        )));
    }
    Ok(())
}

/// Joins a root folder and a relative path with exactly one `/` between them.
///
/// The result always starts with `/`.
pub fn join_remote(root: &str, relative: &str) -> String {
    let root = root.trim_end_matches('/');
    let relative = relative.trim_start_matches('/');
    let joined = if relative.is_empty() {
        root.to_string()
    } else {
        format!("{root}/{relative}")
    };
    if joined.starts_with('/') {
        joined
    } else {
        format!("/{joined}")
    }
}

/// Folder part of a `/`-separated path (empty for a bare name).
pub fn remote_parent(path: &str) -> &str {
    match path.rfind('/') {
        Some(i) => &path[..i],
        None => "",
    }
}

/// Last segment of a `/`-separated path.
pub fn remote_file_name(path: &str) -> &str {
    match path.rfind('/') {
        Some(i) => &path[i + 1..],
        None => path,
    }
}
