//! `Filesystem` over any primitives backend.
//!
//! Path operations are answered by walking nodes from the root one segment
//! at a time, so a backend only ever sees single-name operations.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use super::local::LocalFs;
use super::memory::MemoryFs;
use super::path::{normalize, segments, split_last};
use super::primitives::{Node, NodeKind, Primitives};
use super::traits::{DirEntry, Filesystem};
use crate::error::{VfsError, VfsResult};

/// Adapts a [`Primitives`] backend to the path-based [`Filesystem`] trait.
#[derive(Debug, Default)]
pub struct PrimFs<P> {
    prims: P,
}

impl PrimFs<MemoryFs> {
    /// A fresh, empty in-memory filesystem.
    pub fn memory() -> Self {
        Self::new(MemoryFs::new())
    }
}

impl PrimFs<LocalFs> {
    /// A filesystem over an existing host directory.
    pub fn local(root: impl Into<PathBuf>) -> Self {
        Self::new(LocalFs::new(root))
    }
}

impl<P: Primitives> PrimFs<P> {
    pub fn new(prims: P) -> Self {
        Self { prims }
    }

    /// The underlying backend.
    pub fn prims(&self) -> &P {
        &self.prims
    }

    /// Find the node at `path`, walking from the root.
    pub async fn lookup(&self, path: &Path) -> VfsResult<Node> {
        let mut node = self.prims.root();
        for segment in segments(path) {
            node = self.prims.child(&node, &segment).await?;
        }
        Ok(node)
    }

    /// Walk to `path`, creating missing dirs along the way.
    async fn ensure_dir(&self, path: &Path) -> VfsResult<Node> {
        let mut node = self.prims.root();
        for segment in segments(path) {
            node = match self.prims.child(&node, &segment).await {
                Ok(child) if self.prims.is_dir(&child) => child,
                Ok(child) => return Err(VfsError::NotADirectory(child.path().to_path_buf())),
                Err(e) if e.is_not_found() => {
                    debug!(path = %node.child_path(&segment).display(), "creating directory");
                    self.prims.add_child_dir(&node, &segment).await?
                }
                Err(e) => return Err(e),
            };
        }
        Ok(node)
    }
}

#[async_trait]
impl<P: Primitives> Filesystem for PrimFs<P> {
    async fn read(&self, path: &Path) -> VfsResult<Vec<u8>> {
        let node = self.lookup(path).await?;
        if self.prims.is_dir(&node) {
            return Err(VfsError::IsADirectory(node.path().to_path_buf()));
        }
        self.prims.read_file(&node).await
    }

    async fn write(&self, path: &Path, data: &[u8]) -> VfsResult<()> {
        let Some((parent, name)) = split_last(path) else {
            return Err(VfsError::IsADirectory(PathBuf::new()));
        };
        let parent = self.ensure_dir(&parent).await?;
        let node = match self.prims.child(&parent, &name).await {
            Ok(node) if self.prims.is_dir(&node) => {
                return Err(VfsError::IsADirectory(node.path().to_path_buf()));
            }
            Ok(node) => node,
            Err(e) if e.is_not_found() => self.prims.add_child_file(&parent, &name).await?,
            Err(e) => return Err(e),
        };
        self.prims.write_file(&node, data).await
    }

    async fn list(&self, path: &Path) -> VfsResult<Vec<DirEntry>> {
        let node = self.lookup(path).await?;
        let children = self.prims.children(&node).await?;
        Ok(children
            .into_iter()
            .map(|(name, child)| match child.kind() {
                NodeKind::Dir => DirEntry::directory(name),
                NodeKind::File => DirEntry::file(name),
            })
            .collect())
    }

    async fn stat(&self, path: &Path) -> VfsResult<DirEntry> {
        let Some((_, name)) = split_last(path) else {
            return Ok(DirEntry::directory("/"));
        };
        let node = self.lookup(path).await?;
        Ok(if self.prims.is_dir(&node) {
            DirEntry::directory(name)
        } else {
            DirEntry::file(name)
        })
    }

    async fn make_dirs(&self, path: &Path) -> VfsResult<()> {
        self.ensure_dir(path).await.map(|_| ())
    }

    async fn remove(&self, path: &Path) -> VfsResult<()> {
        let Some((parent, name)) = split_last(path) else {
            return Err(VfsError::InvalidPath {
                path: normalize(path),
                reason: "cannot remove the root",
            });
        };
        let parent = self.lookup(&parent).await?;
        if self.prims.is_file(&parent) {
            return Err(VfsError::NotADirectory(parent.path().to_path_buf()));
        }
        self.prims.remove_child(&parent, &name).await
    }

    fn read_only(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn test_write_creates_parents() {
        let fs = PrimFs::memory();
        fs.write(Path::new("/a/b/c.txt"), b"hi").await.unwrap();

        assert_eq!(fs.read(Path::new("a/b/c.txt")).await.unwrap(), b"hi");
        assert!(fs.is_dir(Path::new("a/b")).await.unwrap());
        assert_eq!(fs.list_names(Path::new("a")).await.unwrap(), ["b"]);
    }

    #[tokio::test]
    async fn test_stat_root() {
        let fs = PrimFs::memory();
        let entry = fs.stat(Path::new("/")).await.unwrap();
        assert_eq!(entry, DirEntry::directory("/"));
    }

    #[tokio::test]
    async fn test_write_over_dir_fails() {
        let fs = PrimFs::memory();
        fs.make_dirs(Path::new("d")).await.unwrap();
        let result = fs.write(Path::new("d"), b"x").await;
        assert!(matches!(result, Err(VfsError::IsADirectory(_))));
    }

    #[tokio::test]
    async fn test_make_dirs_through_file_fails() {
        let fs = PrimFs::memory();
        fs.write(Path::new("f"), b"x").await.unwrap();
        let result = fs.make_dirs(Path::new("f/g")).await;
        assert!(matches!(result, Err(VfsError::NotADirectory(_))));
    }

    #[tokio::test]
    async fn test_remove_root_refused() {
        let fs = PrimFs::memory();
        let result = fs.remove(Path::new("/")).await;
        assert!(matches!(result, Err(VfsError::InvalidPath { .. })));
    }

    #[tokio::test]
    async fn test_exists_only_swallows_not_found() {
        let fs = PrimFs::memory();
        fs.write(Path::new("f"), b"x").await.unwrap();
        assert!(!fs.exists(Path::new("missing")).await.unwrap());
        // Walking through a file is a different failure.
        assert!(fs.exists(Path::new("f/inner")).await.is_err());
    }

    #[tokio::test]
    async fn test_open_write_then_read() {
        let fs = PrimFs::memory();
        let mut handle = fs.open_write(Path::new("notes/log.txt")).await.unwrap();
        handle.write_all(b"line\n").await.unwrap();
        handle.close().await.unwrap();

        let mut reader = fs.open_read(Path::new("notes/log.txt")).await.unwrap();
        let mut text = String::new();
        reader.read_to_string(&mut text).await.unwrap();
        assert_eq!(text, "line\n");
    }

    #[tokio::test]
    async fn test_dropped_handle_discards() {
        let fs = PrimFs::memory();
        {
            let mut handle = fs.open_write(Path::new("draft.txt")).await.unwrap();
            handle.write_all(b"unsaved").await.unwrap();
        }
        assert!(!fs.exists(Path::new("draft.txt")).await.unwrap());
    }
}
