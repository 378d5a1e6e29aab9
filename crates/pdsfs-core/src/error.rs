//! Error taxonomy for the filesystem layer.
//!
//! Nothing in this crate retries: every variant is either misuse or a data
//! integrity problem and goes straight back to the caller.

use std::io;
use std::path::{Path, PathBuf};

use pdsfs_types::{IdError, Lidvid};
use thiserror::Error;

pub type VfsResult<T> = Result<T, VfsError>;

#[derive(Debug, Error)]
pub enum VfsError {
    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("is a directory: {}", .0.display())]
    IsADirectory(PathBuf),

    #[error("not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    #[error("invalid name {0:?}")]
    InvalidName(String),

    #[error("invalid path {}: {reason}", .path.display())]
    InvalidPath { path: PathBuf, reason: &'static str },

    #[error("malformed version index, line {line}: {reason}")]
    MalformedVersionIndex { line: usize, reason: String },

    #[error("version not found: {0}")]
    VersionNotFound(Lidvid),

    #[error("inconsistent version index at {}: {reason}", .path.display())]
    InconsistentVersionIndex { path: PathBuf, reason: String },

    #[error("read-only view: {}", .0.display())]
    ReadOnlyView(PathBuf),

    #[error("invalid LIDVID: {0}")]
    InvalidLidvid(#[from] IdError),

    #[error("unknown parent: {0}")]
    UnknownParent(Lidvid),

    #[error("{child} is not a subcomponent of {parent}")]
    NotASubcomponent { parent: Lidvid, child: Lidvid },

    #[error("not a bundle: {0}")]
    NotABundle(Lidvid),

    #[error("path lies outside the archive's bundle: {}", .0.display())]
    OutsideArchive(PathBuf),

    #[error("overlay does not sit on a projection of {0}")]
    BaseMismatch(Lidvid),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl VfsError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, VfsError::NotFound(_))
    }

    /// Classify a backend I/O failure at `path` into the primitive taxonomy.
    pub(crate) fn from_io(err: io::Error, path: &Path) -> Self {
        let path = path.to_path_buf();
        match err.kind() {
            io::ErrorKind::NotFound => VfsError::NotFound(path),
            io::ErrorKind::AlreadyExists => VfsError::AlreadyExists(path),
            io::ErrorKind::NotADirectory => VfsError::NotADirectory(path),
            io::ErrorKind::IsADirectory => VfsError::IsADirectory(path),
            _ => VfsError::Io(err),
        }
    }
}
