//! Member name normalization.
//!
//! Names are handled as `/`-separated strings. A normalized name has no
//! empty, `.` or `..` segments, no leading separator and no drive prefix.

use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Normalize `name`, rejecting anything that leaves the archive root.
///
/// The empty string (the archive root) is returned as-is.
pub(crate) fn normalize(name: &str) -> Result<String> {
    if name.contains('\0') {
        return Err(Error::invalid_path(name, "contains a NUL byte"));
    }

    let unified = name.replace('\\', "/");
    if unified.starts_with('/') {
        return Err(Error::invalid_path(name, "absolute path"));
    }
    if has_drive_prefix(&unified) {
        return Err(Error::invalid_path(name, "drive prefix"));
    }

    let mut segments: Vec<&str> = Vec::new();
    for segment in unified.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(Error::invalid_path(name, "escapes the archive root"));
                }
            }
            s => segments.push(s),
        }
    }

    Ok(segments.join("/"))
}

/// Normalize a member name from the central directory.
///
/// Returns the normalized name and whether it is a directory marker.
pub(crate) fn normalize_member(raw: &str) -> Result<(String, bool)> {
    let is_directory = raw.ends_with('/') || raw.ends_with('\\');
    let name = normalize(raw)?;
    if name.is_empty() {
        return Err(Error::invalid_path(raw, "empty name"));
    }
    Ok((name, is_directory))
}

fn has_drive_prefix(name: &str) -> bool {
    let bytes = name.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// Number of `/`-separated levels in a normalized name.
pub(crate) fn depth(name: &str) -> usize {
    if name.is_empty() {
        0
    } else {
        name.matches('/').count() + 1
    }
}

/// Parent of a normalized name, `""` for top-level names.
pub(crate) fn parent(name: &str) -> &str {
    name.rsplit_once('/').map_or("", |(parent, _)| parent)
}

/// Join a normalized name onto `root`, one component per segment.
///
/// Every segment must be a plain file name on this platform; anything
/// else is refused instead of being joined.
pub(crate) fn destination(root: &Path, name: &str) -> Result<PathBuf> {
    let mut path = root.to_path_buf();
    for segment in name.split('/').filter(|s| !s.is_empty()) {
        let mut components = Path::new(segment).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(part)), None) => path.push(part),
            _ => return Err(Error::invalid_path(name, "not a plain path segment")),
        }
    }
    Ok(path)
}
