//! In-memory primitives backend.
//!
//! Used for tests and scratch archives. All data is ephemeral.

use super::primitives::{check_existing_child, check_new_child, Node, NodeKind, Primitives};
use crate::error::{VfsError, VfsResult};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use tokio::sync::RwLock;

/// Entry in the memory filesystem.
#[derive(Debug, Clone)]
enum Entry {
    File { data: Vec<u8> },
    Directory,
}

impl Entry {
    fn kind(&self) -> NodeKind {
        match self {
            Entry::File { .. } => NodeKind::File,
            Entry::Directory => NodeKind::Dir,
        }
    }
}

/// In-memory filesystem.
///
/// Keys are normalized relative paths; `""` is the root. Thread-safe via
/// internal `RwLock`. All data is lost when dropped.
#[derive(Debug)]
pub struct MemoryFs {
    entries: RwLock<HashMap<PathBuf, Entry>>,
}

impl Default for MemoryFs {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFs {
    /// Create a new empty in-memory filesystem.
    pub fn new() -> Self {
        let mut entries = HashMap::new();
        // Root directory always exists
        entries.insert(PathBuf::new(), Entry::Directory);
        Self {
            entries: RwLock::new(entries),
        }
    }

    async fn add_child(&self, parent: &Node, name: &str, kind: NodeKind) -> VfsResult<Node> {
        let path = check_new_child(parent, name)?;
        let mut entries = self.entries.write().await;

        match entries.get(parent.path()) {
            Some(Entry::Directory) => {}
            Some(Entry::File { .. }) => {
                return Err(VfsError::NotADirectory(parent.path().to_path_buf()));
            }
            None => return Err(VfsError::NotFound(parent.path().to_path_buf())),
        }
        if entries.contains_key(&path) {
            return Err(VfsError::AlreadyExists(path));
        }

        let entry = match kind {
            NodeKind::File => Entry::File { data: Vec::new() },
            NodeKind::Dir => Entry::Directory,
        };
        entries.insert(path.clone(), entry);
        Ok(Node::new(path, kind))
    }
}

#[async_trait]
impl Primitives for MemoryFs {
    async fn dir_children(&self, node: &Node) -> VfsResult<BTreeMap<String, Node>> {
        let entries = self.entries.read().await;
        let dir = node.path();

        // Verify the path is a directory
        match entries.get(dir) {
            Some(Entry::Directory) => {}
            Some(Entry::File { .. }) => return Err(VfsError::NotADirectory(dir.to_path_buf())),
            None => return Err(VfsError::NotFound(dir.to_path_buf())),
        }

        // Find all direct children
        let mut result = BTreeMap::new();
        for (entry_path, entry) in entries.iter() {
            if entry_path.as_path() == dir || entry_path.parent() != Some(dir) {
                continue;
            }
            if let Some(name) = entry_path.file_name() {
                result.insert(
                    name.to_string_lossy().into_owned(),
                    Node::new(entry_path.clone(), entry.kind()),
                );
            }
        }
        Ok(result)
    }

    async fn read_file(&self, node: &Node) -> VfsResult<Vec<u8>> {
        let entries = self.entries.read().await;
        match entries.get(node.path()) {
            Some(Entry::File { data, .. }) => Ok(data.clone()),
            Some(Entry::Directory) => {
                Err(VfsError::IsADirectory(node.path().to_path_buf()))
            }
            None => Err(VfsError::NotFound(node.path().to_path_buf())),
        }
    }

    async fn write_file(&self, node: &Node, data: &[u8]) -> VfsResult<()> {
        let mut entries = self.entries.write().await;
        match entries.get_mut(node.path()) {
            Some(Entry::File { data: existing }) => {
                *existing = data.to_vec();
                Ok(())
            }
            Some(Entry::Directory) => {
                Err(VfsError::IsADirectory(node.path().to_path_buf()))
            }
            None => Err(VfsError::NotFound(node.path().to_path_buf())),
        }
    }

    async fn add_child_dir(&self, parent: &Node, name: &str) -> VfsResult<Node> {
        self.add_child(parent, name, NodeKind::Dir).await
    }

    async fn add_child_file(&self, parent: &Node, name: &str) -> VfsResult<Node> {
        self.add_child(parent, name, NodeKind::File).await
    }

    async fn remove_child(&self, parent: &Node, name: &str) -> VfsResult<()> {
        let path = check_existing_child(parent, name)?;
        let mut entries = self.entries.write().await;

        let removed = entries
            .remove(&path)
            .ok_or_else(|| VfsError::NotFound(path.clone()))?;
        if matches!(removed, Entry::Directory) {
            // Take the whole subtree with it
            entries.retain(|k, _| !k.starts_with(&path));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vfs::OpenMode;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn test_write_through_handle() {
        let fs = MemoryFs::new();
        let file = fs.add_child_file(&fs.root(), "test.txt").await.unwrap();

        let mut handle = fs.open(&file, OpenMode::Write).await.unwrap();
        handle.write_all(b"hello world").await.unwrap();
        handle.close().await.unwrap();

        assert_eq!(fs.read_file(&file).await.unwrap(), b"hello world");
    }

    #[tokio::test]
    async fn test_append_keeps_existing() {
        let fs = MemoryFs::new();
        let file = fs.add_child_file(&fs.root(), "log").await.unwrap();
        fs.write_file(&file, b"one\n").await.unwrap();

        let mut handle = fs.open(&file, OpenMode::Append).await.unwrap();
        handle.write_all(b"two\n").await.unwrap();
        handle.close().await.unwrap();

        let mut handle = fs.open(&file, OpenMode::Read).await.unwrap();
        let mut text = String::new();
        handle.read_to_string(&mut text).await.unwrap();
        assert_eq!(text, "one\ntwo\n");
    }

    #[tokio::test]
    async fn test_remove_dir_takes_subtree() {
        let fs = MemoryFs::new();
        let root = fs.root();
        let dir = fs.add_child_dir(&root, "dir").await.unwrap();
        let sub = fs.add_child_dir(&dir, "sub").await.unwrap();
        fs.add_child_file(&sub, "deep.txt").await.unwrap();

        fs.remove_child(&root, "dir").await.unwrap();
        assert!(fs.children(&root).await.unwrap().is_empty());

        // Nothing under the old path survives to reappear on re-creation
        let dir = fs.add_child_dir(&root, "dir").await.unwrap();
        assert!(fs.children(&dir).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_under_file_fails() {
        let fs = MemoryFs::new();
        let file = fs.add_child_file(&fs.root(), "f").await.unwrap();
        let result = fs.add_child_file(&file, "x").await;
        assert!(matches!(result, Err(VfsError::NotADirectory(_))));
    }

    #[tokio::test]
    async fn test_remove_empty_name_keeps_root() {
        let fs = MemoryFs::new();
        let root = fs.root();
        fs.add_child_file(&root, "keep.txt").await.unwrap();

        let result = fs.remove_child(&root, "").await;
        assert!(matches!(result, Err(VfsError::InvalidName(_))));
        assert_eq!(fs.children(&root).await.unwrap().len(), 1);
    }
}
