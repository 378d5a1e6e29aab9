//! Local filesystem primitives backend.
//!
//! Provides access to a real directory tree, the usual home of a
//! multiversioned archive.

use super::primitives::{check_existing_child, check_new_child, Node, NodeKind, Primitives};
use crate::error::{VfsError, VfsResult};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

/// Local filesystem backend.
///
/// All node paths are relative to `root`. For example, if `root` is
/// `/data/archive`, then the node `hst_00000/v$1` is
/// `/data/archive/hst_00000/v$1`.
#[derive(Debug, Clone)]
pub struct LocalFs {
    root: PathBuf,
}

impl LocalFs {
    /// Create a new local filesystem rooted at the given path.
    ///
    /// The path must exist and be a directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the root directory if needed, then open it.
    pub async fn create(root: impl Into<PathBuf>) -> VfsResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .await
            .map_err(|e| VfsError::from_io(e, &root))?;
        Ok(Self::new(root))
    }

    /// Get the root path.
    pub fn root_path(&self) -> &Path {
        &self.root
    }

    /// Resolve a node path within the root WITHOUT following symlinks.
    ///
    /// Node paths come from our own normalized walks, but anything with a
    /// `..` or an absolute component is refused rather than trusted.
    fn resolve(&self, path: &Path) -> VfsResult<PathBuf> {
        let mut full = self.root.clone();
        for component in path.components() {
            match component {
                Component::Normal(c) => full.push(c),
                Component::CurDir => {}
                _ => {
                    return Err(VfsError::InvalidPath {
                        path: path.to_path_buf(),
                        reason: "path escapes root",
                    });
                }
            }
        }
        Ok(full)
    }
}

#[async_trait]
impl Primitives for LocalFs {
    async fn dir_children(&self, node: &Node) -> VfsResult<BTreeMap<String, Node>> {
        let full_path = self.resolve(node.path())?;
        let mut dir = fs::read_dir(&full_path)
            .await
            .map_err(|e| VfsError::from_io(e, node.path()))?;

        let mut children = BTreeMap::new();
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| VfsError::from_io(e, node.path()))?
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| VfsError::from_io(e, node.path()))?;
            // Special files (sockets, pipes, devices) count as files.
            let kind = if file_type.is_dir() {
                NodeKind::Dir
            } else {
                NodeKind::File
            };
            let path = node.child_path(&name);
            children.insert(name, Node::new(path, kind));
        }
        Ok(children)
    }

    async fn read_file(&self, node: &Node) -> VfsResult<Vec<u8>> {
        let full_path = self.resolve(node.path())?;
        fs::read(&full_path)
            .await
            .map_err(|e| VfsError::from_io(e, node.path()))
    }

    async fn write_file(&self, node: &Node, data: &[u8]) -> VfsResult<()> {
        let full_path = self.resolve(node.path())?;
        let meta = fs::metadata(&full_path)
            .await
            .map_err(|e| VfsError::from_io(e, node.path()))?;
        if meta.is_dir() {
            return Err(VfsError::IsADirectory(node.path().to_path_buf()));
        }
        fs::write(&full_path, data)
            .await
            .map_err(|e| VfsError::from_io(e, node.path()))
    }

    async fn add_child_dir(&self, parent: &Node, name: &str) -> VfsResult<Node> {
        let path = check_new_child(parent, name)?;
        let full_path = self.resolve(&path)?;
        fs::create_dir(&full_path)
            .await
            .map_err(|e| VfsError::from_io(e, &path))?;
        Ok(Node::dir(path))
    }

    async fn add_child_file(&self, parent: &Node, name: &str) -> VfsResult<Node> {
        let path = check_new_child(parent, name)?;
        let full_path = self.resolve(&path)?;
        fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&full_path)
            .await
            .map_err(|e| VfsError::from_io(e, &path))?;
        Ok(Node::file(path))
    }

    async fn remove_child(&self, parent: &Node, name: &str) -> VfsResult<()> {
        let path = check_existing_child(parent, name)?;
        let full_path = self.resolve(&path)?;
        let meta = fs::symlink_metadata(&full_path)
            .await
            .map_err(|e| VfsError::from_io(e, &path))?;

        if meta.is_dir() {
            fs::remove_dir_all(&full_path).await
        } else {
            fs::remove_file(&full_path).await
        }
        .map_err(|e| VfsError::from_io(e, &path))
    }
}
