//! Node primitives.
//!
//! The filesystem is modelled as a tree with two kinds of nodes. A file has
//! bytes and can be opened; a dir maps names to nodes. The root is always a
//! dir. Backends only implement this handful of operations; everything else
//! (`PrimFs`) is derived from them.
//!
//! Laws every backend must uphold:
//!
//! - the root exists and is a dir;
//! - a freshly added child is immediately visible in `children`;
//! - a removed child is immediately absent;
//! - two nodes are equal iff their paths are equal.

use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::handle::{FileHandle, OpenMode, WriteBack};
use super::path::validate_name;
use crate::error::{VfsError, VfsResult};

/// Which side of the tagged union a node is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    File,
    Dir,
}

/// A file or dir, identified by its path within its store.
#[derive(Debug, Clone)]
pub struct Node {
    path: PathBuf,
    kind: NodeKind,
}

impl Node {
    pub fn new(path: impl Into<PathBuf>, kind: NodeKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    pub fn root() -> Self {
        Self::new(PathBuf::new(), NodeKind::Dir)
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::new(path, NodeKind::File)
    }

    pub fn dir(path: impl Into<PathBuf>) -> Self {
        Self::new(path, NodeKind::Dir)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn is_file(&self) -> bool {
        self.kind == NodeKind::File
    }

    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Dir
    }

    /// Path of a would-be child called `name`.
    pub fn child_path(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
    }
}

/// The primitive operations a storage backend provides.
#[async_trait]
pub trait Primitives: Send + Sync {
    /// The root dir. Always exists.
    fn root(&self) -> Node {
        Node::root()
    }

    fn is_file(&self, node: &Node) -> bool {
        node.is_file()
    }

    fn is_dir(&self, node: &Node) -> bool {
        !self.is_file(node)
    }

    /// Children of a dir node, keyed by name.
    async fn children(&self, node: &Node) -> VfsResult<BTreeMap<String, Node>> {
        if self.is_file(node) {
            return Err(VfsError::NotADirectory(node.path().to_path_buf()));
        }
        self.dir_children(node).await
    }

    /// Look up one child by name.
    async fn child(&self, node: &Node, name: &str) -> VfsResult<Node> {
        self.children(node)
            .await?
            .remove(name)
            .ok_or_else(|| VfsError::NotFound(node.child_path(name)))
    }

    /// Open a file node. The handle is released when dropped; writes are
    /// kept only if it is closed.
    async fn open<'a>(&'a self, node: &Node, mode: OpenMode) -> VfsResult<FileHandle<'a>> {
        if self.is_dir(node) {
            return Err(VfsError::IsADirectory(node.path().to_path_buf()));
        }
        let path = node.path().to_path_buf();
        match mode {
            OpenMode::Read => Ok(FileHandle::reader(path, self.read_file(node).await?)),
            OpenMode::Write => Ok(FileHandle::writer(
                path,
                mode,
                Vec::new(),
                Box::new(PrimSink(self)),
            )),
            OpenMode::Append => {
                let existing = self.read_file(node).await?;
                Ok(FileHandle::writer(path, mode, existing, Box::new(PrimSink(self))))
            }
        }
    }

    /// Children of a node already known to be a dir.
    async fn dir_children(&self, node: &Node) -> VfsResult<BTreeMap<String, Node>>;

    /// Whole contents of a file node.
    async fn read_file(&self, node: &Node) -> VfsResult<Vec<u8>>;

    /// Replace the contents of an existing file node.
    async fn write_file(&self, node: &Node, data: &[u8]) -> VfsResult<()>;

    /// Create an empty dir called `name` under `parent`.
    async fn add_child_dir(&self, parent: &Node, name: &str) -> VfsResult<Node>;

    /// Create an empty file called `name` under `parent`.
    async fn add_child_file(&self, parent: &Node, name: &str) -> VfsResult<Node>;

    /// Remove the child called `name`, and everything beneath it if it is
    /// a dir.
    async fn remove_child(&self, parent: &Node, name: &str) -> VfsResult<()>;
}

/// Checks shared by every backend's `add_child_*`.
pub(crate) fn check_new_child(parent: &Node, name: &str) -> VfsResult<PathBuf> {
    validate_name(name)?;
    if parent.is_file() {
        return Err(VfsError::NotADirectory(parent.path().to_path_buf()));
    }
    Ok(parent.child_path(name))
}

/// Checks shared by every backend's `remove_child`. An empty name would
/// otherwise address `parent` itself.
pub(crate) fn check_existing_child(parent: &Node, name: &str) -> VfsResult<PathBuf> {
    validate_name(name)?;
    Ok(parent.child_path(name))
}

/// Routes a closed handle's bytes back into the node it was opened from.
struct PrimSink<'a, P: ?Sized>(&'a P);

#[async_trait]
impl<P: Primitives + ?Sized> WriteBack for PrimSink<'_, P> {
    async fn write_back(&self, path: &Path, data: &[u8]) -> VfsResult<()> {
        self.0.write_file(&Node::file(path), data).await
    }
}
