//! Path helpers shared by every backend and view.
//!
//! All paths are relative to a filesystem root. `""` is the root; a leading
//! `/` is accepted and ignored.

use std::path::{Component, Path, PathBuf};

use crate::error::{VfsError, VfsResult};

/// Normalize a path: remove leading `/`, resolve `.` and `..` lexically.
pub fn normalize(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::RootDir | Component::CurDir | Component::Prefix(_) => {}
            Component::ParentDir => {
                result.pop();
            }
            Component::Normal(s) => result.push(s),
        }
    }
    result
}

/// The normalized path split into UTF-8 segments.
pub fn segments(path: &Path) -> Vec<String> {
    normalize(path)
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect()
}

/// Rebuild a relative path from segments.
pub fn join_segments<S: AsRef<str>>(segments: &[S]) -> PathBuf {
    segments.iter().map(|s| s.as_ref()).collect()
}

/// Reject names that cannot be a single directory entry.
pub fn validate_name(name: &str) -> VfsResult<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains('/') {
        return Err(VfsError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Split a path into (parent, file name); `None` for the root.
pub fn split_last(path: &Path) -> Option<(PathBuf, String)> {
    let mut segs = segments(path);
    let name = segs.pop()?;
    Some((join_segments(&segs), name))
}
