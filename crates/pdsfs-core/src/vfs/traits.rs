//! Core VFS traits and types.

use async_trait::async_trait;
use pdsfs_types::Lidvid;
use std::path::Path;

use super::handle::{FileHandle, OpenMode, WriteBack};
use crate::error::{VfsError, VfsResult};

/// Kind of directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirEntryKind {
    File,
    Directory,
}

/// A directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Name of the entry (not full path).
    pub name: String,
    /// Kind of entry.
    pub kind: DirEntryKind,
}

impl DirEntry {
    /// Create a new directory entry.
    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: DirEntryKind::Directory,
        }
    }

    /// Create a new file entry.
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: DirEntryKind::File,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == DirEntryKind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind == DirEntryKind::File
    }
}

/// Abstract filesystem interface.
///
/// This is the whole surface pipeline stages see, whether they hold a plain
/// backend, a version projection or a copy-on-write overlay.
///
/// All operations use paths relative to the filesystem root; a leading `/`
/// is ignored.
#[async_trait]
pub trait Filesystem: Send + Sync {
    /// Read the entire contents of a file.
    async fn read(&self, path: &Path) -> VfsResult<Vec<u8>>;

    /// Write data to a file, creating it and its parents if needed.
    ///
    /// Returns `Err` if the filesystem is read-only.
    async fn write(&self, path: &Path, data: &[u8]) -> VfsResult<()>;

    /// List entries in a directory, sorted by name.
    async fn list(&self, path: &Path) -> VfsResult<Vec<DirEntry>>;

    /// Describe a single path. The root is reported as a directory named `/`.
    async fn stat(&self, path: &Path) -> VfsResult<DirEntry>;

    /// Create a directory and any missing parents. Existing directories are
    /// fine; an existing file in the way is `NotADirectory`.
    async fn make_dirs(&self, path: &Path) -> VfsResult<()>;

    /// Remove a file or a directory with everything beneath it.
    async fn remove(&self, path: &Path) -> VfsResult<()>;

    /// Returns true if this filesystem is read-only.
    fn read_only(&self) -> bool;

    /// The LIDVID this filesystem is a version projection of, if any.
    fn projected(&self) -> Option<&Lidvid> {
        None
    }

    /// Check if a path exists.
    ///
    /// Only `NotFound` means "no"; any other failure (a corrupt version
    /// index, say) is returned.
    async fn exists(&self, path: &Path) -> VfsResult<bool> {
        match self.stat(path).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Check if a path is an existing directory.
    async fn is_dir(&self, path: &Path) -> VfsResult<bool> {
        match self.stat(path).await {
            Ok(entry) => Ok(entry.is_dir()),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Names in a directory, sorted.
    async fn list_names(&self, path: &Path) -> VfsResult<Vec<String>> {
        Ok(self
            .list(path)
            .await?
            .into_iter()
            .map(|e| e.name)
            .collect())
    }

    /// Open a file for reading as a byte stream.
    async fn open_read(&self, path: &Path) -> VfsResult<FileHandle<'static>> {
        let data = self.read(path).await?;
        Ok(FileHandle::reader(path, data))
    }

    /// Open a file for writing. Bytes land when the handle is closed.
    async fn open_write<'a>(&'a self, path: &Path) -> VfsResult<FileHandle<'a>> {
        if self.read_only() {
            return Err(VfsError::ReadOnlyView(path.to_path_buf()));
        }
        match self.stat(path).await {
            Ok(entry) if entry.is_dir() => return Err(VfsError::IsADirectory(path.to_path_buf())),
            Ok(_) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }
        Ok(FileHandle::writer(
            path,
            OpenMode::Write,
            Vec::new(),
            Box::new(FsSink(self)),
        ))
    }
}

/// Routes a closed handle's bytes through `Filesystem::write`.
struct FsSink<'a, F: ?Sized>(&'a F);

#[async_trait]
impl<F: Filesystem + ?Sized> WriteBack for FsSink<'_, F> {
    async fn write_back(&self, path: &Path, data: &[u8]) -> VfsResult<()> {
        self.0.write(path, data).await
    }
}
