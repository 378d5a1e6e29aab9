//! Copy-on-write overlay.
//!
//! Wraps a base filesystem (usually a [`VersionView`](super::VersionView))
//! and records every edit in an in-memory delta instead of touching the
//! base. The delta is later handed to
//! [`VersionedStore::commit`](super::VersionedStore::commit) or dropped.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{VfsError, VfsResult};
use crate::vfs::path::{normalize, segments, split_last};
use crate::vfs::{DirEntry, DirEntryKind, Filesystem};

/// One recorded edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delta {
    /// A file with new or replaced content.
    File(Vec<u8>),
    /// A directory created in the overlay. Hides anything the base has
    /// beneath the same path.
    Dir,
    /// The path is deleted relative to the base.
    Tombstone,
}

/// How the merged view sees one path.
enum Probe {
    File(Vec<u8>),
    Dir,
    Absent,
    Base,
}

/// A writable layer over a base filesystem.
pub struct CowFs<'b> {
    base: &'b dyn Filesystem,
    delta: RwLock<BTreeMap<PathBuf, Delta>>,
}

impl std::fmt::Debug for CowFs<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CowFs")
            .field("delta", &self.delta)
            .finish_non_exhaustive()
    }
}

impl<'b> CowFs<'b> {
    /// An overlay with no edits yet.
    pub fn new(base: &'b dyn Filesystem) -> Self {
        Self {
            base,
            delta: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn base(&self) -> &'b dyn Filesystem {
        self.base
    }

    /// Snapshot of every recorded edit, in path order.
    pub async fn changes(&self) -> Vec<(PathBuf, Delta)> {
        self.delta
            .read()
            .await
            .iter()
            .map(|(path, delta)| (path.clone(), delta.clone()))
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.delta.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.delta.read().await.is_empty()
    }

    /// Consume the overlay, keeping only its edits.
    pub fn into_delta(self) -> BTreeMap<PathBuf, Delta> {
        self.delta.into_inner()
    }

    /// Drop every edit. The base is untouched.
    pub fn abandon(self) {
        let delta = self.delta.into_inner();
        debug!(edits = delta.len(), "abandoned overlay");
    }

    async fn probe(&self, path: &Path) -> Probe {
        let delta = self.delta.read().await;
        let mut opaque = false;
        for ancestor in path.ancestors().skip(1) {
            match delta.get(ancestor) {
                Some(Delta::File(_)) | Some(Delta::Tombstone) => return Probe::Absent,
                Some(Delta::Dir) => opaque = true,
                None => {}
            }
        }
        match delta.get(path) {
            Some(Delta::File(data)) => Probe::File(data.clone()),
            Some(Delta::Dir) => Probe::Dir,
            Some(Delta::Tombstone) => Probe::Absent,
            None if opaque => Probe::Absent,
            None => Probe::Base,
        }
    }

    /// Whether some ancestor edit hides the base beneath `path`.
    async fn shadowed(&self, path: &Path) -> bool {
        let delta = self.delta.read().await;
        path.ancestors().skip(1).any(|a| delta.contains_key(a))
    }

    /// Kind of `path` in the merged view; `None` when absent.
    async fn kind_of(&self, path: &Path) -> VfsResult<Option<DirEntryKind>> {
        match self.probe(path).await {
            Probe::File(_) => Ok(Some(DirEntryKind::File)),
            Probe::Dir => Ok(Some(DirEntryKind::Directory)),
            Probe::Absent => Ok(None),
            Probe::Base => match self.base.stat(path).await {
                Ok(entry) => Ok(Some(entry.kind)),
                Err(e) if e.is_not_found() => Ok(None),
                Err(e) => Err(e),
            },
        }
    }

    /// Record `delta` at `path`, dropping any edits beneath it.
    async fn record(&self, path: PathBuf, delta: Delta) {
        let mut map = self.delta.write().await;
        map.retain(|p, _| p == &path || !p.starts_with(&path));
        map.insert(path, delta);
    }
}

#[async_trait]
impl Filesystem for CowFs<'_> {
    async fn read(&self, path: &Path) -> VfsResult<Vec<u8>> {
        let path = normalize(path);
        match self.probe(&path).await {
            Probe::File(data) => Ok(data),
            Probe::Dir => Err(VfsError::IsADirectory(path)),
            Probe::Absent => Err(VfsError::NotFound(path)),
            Probe::Base => self.base.read(&path).await,
        }
    }

    async fn write(&self, path: &Path, data: &[u8]) -> VfsResult<()> {
        let Some((parent, _)) = split_last(path) else {
            return Err(VfsError::IsADirectory(PathBuf::new()));
        };
        let path = normalize(path);
        self.make_dirs(&parent).await?;
        if self.kind_of(&path).await? == Some(DirEntryKind::Directory) {
            return Err(VfsError::IsADirectory(path));
        }
        self.delta.write().await.insert(path, Delta::File(data.to_vec()));
        Ok(())
    }

    async fn list(&self, path: &Path) -> VfsResult<Vec<DirEntry>> {
        let path = normalize(path);
        let mut merged: BTreeMap<String, DirEntry> = match self.probe(&path).await {
            Probe::File(_) => return Err(VfsError::NotADirectory(path)),
            Probe::Absent => return Err(VfsError::NotFound(path)),
            Probe::Dir => BTreeMap::new(),
            Probe::Base => self
                .base
                .list(&path)
                .await?
                .into_iter()
                .map(|e| (e.name.clone(), e))
                .collect(),
        };

        let delta = self.delta.read().await;
        let children = delta
            .range(path.clone()..)
            .take_while(|(p, _)| p.starts_with(&path))
            .filter(|(p, _)| p.parent() == Some(path.as_path()));
        for (child, edit) in children {
            let Some(name) = child.file_name().map(|n| n.to_string_lossy().into_owned()) else {
                continue;
            };
            match edit {
                Delta::File(_) => merged.insert(name.clone(), DirEntry::file(name)),
                Delta::Dir => merged.insert(name.clone(), DirEntry::directory(name)),
                Delta::Tombstone => merged.remove(&name),
            };
        }
        Ok(merged.into_values().collect())
    }

    async fn stat(&self, path: &Path) -> VfsResult<DirEntry> {
        let path = normalize(path);
        let Some(name) = segments(&path).pop() else {
            return Ok(DirEntry::directory("/"));
        };
        match self.probe(&path).await {
            Probe::File(_) => Ok(DirEntry::file(name)),
            Probe::Dir => Ok(DirEntry::directory(name)),
            Probe::Absent => Err(VfsError::NotFound(path)),
            Probe::Base => self.base.stat(&path).await,
        }
    }

    async fn make_dirs(&self, path: &Path) -> VfsResult<()> {
        let mut current = PathBuf::new();
        for segment in segments(path) {
            current.push(segment);
            match self.kind_of(&current).await? {
                Some(DirEntryKind::Directory) => {}
                Some(DirEntryKind::File) => return Err(VfsError::NotADirectory(current)),
                None => self.record(current.clone(), Delta::Dir).await,
            }
        }
        Ok(())
    }

    async fn remove(&self, path: &Path) -> VfsResult<()> {
        let path = normalize(path);
        if path.as_os_str().is_empty() {
            return Err(VfsError::InvalidPath {
                path,
                reason: "cannot remove the root",
            });
        }
        let in_base = !self.shadowed(&path).await && self.base.exists(&path).await?;
        let mut delta = self.delta.write().await;
        delta.retain(|p, _| p == &path || !p.starts_with(&path));
        if !in_base && delta.remove(&path).is_some() {
            debug!(path = %path.display(), "dropped overlay-only entry");
        } else {
            debug!(path = %path.display(), "tombstoned");
            delta.insert(path, Delta::Tombstone);
        }
        Ok(())
    }

    fn read_only(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vfs::PrimFs;

    async fn base() -> PrimFs<crate::vfs::MemoryFs> {
        let fs = PrimFs::memory();
        fs.write(Path::new("a.txt"), b"a").await.unwrap();
        fs.write(Path::new("dir/inner.txt"), b"inner").await.unwrap();
        fs
    }

    #[tokio::test]
    async fn test_write_and_remove_leave_base_alone() {
        let base = base().await;
        let cow = CowFs::new(&base);

        cow.write(Path::new("b.txt"), b"b").await.unwrap();
        assert_eq!(cow.list_names(Path::new("")).await.unwrap(), ["a.txt", "b.txt", "dir"]);

        cow.remove(Path::new("a.txt")).await.unwrap();
        assert_eq!(cow.list_names(Path::new("")).await.unwrap(), ["b.txt", "dir"]);
        assert!(!cow.exists(Path::new("a.txt")).await.unwrap());
        assert_eq!(base.read(Path::new("a.txt")).await.unwrap(), b"a");
        assert!(!base.exists(Path::new("b.txt")).await.unwrap());
    }

    #[tokio::test]
    async fn test_overwrite_shadows_base() {
        let base = base().await;
        let cow = CowFs::new(&base);
        cow.write(Path::new("dir/inner.txt"), b"new").await.unwrap();

        assert_eq!(cow.read(Path::new("dir/inner.txt")).await.unwrap(), b"new");
        assert_eq!(base.read(Path::new("dir/inner.txt")).await.unwrap(), b"inner");
        // The base dir was already a dir, so no Dir entry was recorded.
        assert_eq!(
            cow.changes().await,
            [(PathBuf::from("dir/inner.txt"), Delta::File(b"new".to_vec()))]
        );
    }

    #[tokio::test]
    async fn test_removed_dir_hides_descendants() {
        let base = base().await;
        let cow = CowFs::new(&base);
        cow.remove(Path::new("dir")).await.unwrap();

        assert!(cow.read(Path::new("dir/inner.txt")).await.unwrap_err().is_not_found());
        assert!(cow.list(Path::new("dir")).await.unwrap_err().is_not_found());

        // Recreating it gives an empty, opaque dir.
        cow.make_dirs(Path::new("dir")).await.unwrap();
        assert!(cow.list(Path::new("dir")).await.unwrap().is_empty());
        assert_eq!(cow.changes().await, [(PathBuf::from("dir"), Delta::Dir)]);
    }

    #[tokio::test]
    async fn test_remove_overlay_only_entry() {
        let base = base().await;
        let cow = CowFs::new(&base);
        cow.write(Path::new("new/x.txt"), b"x").await.unwrap();
        assert_eq!(cow.len().await, 2);

        cow.remove(Path::new("new")).await.unwrap();
        assert!(cow.is_empty().await);
        assert!(!cow.exists(Path::new("new")).await.unwrap());
    }

    #[tokio::test]
    async fn test_remove_missing_still_tombstones() {
        let base = base().await;
        let cow = CowFs::new(&base);
        cow.remove(Path::new("ghost")).await.unwrap();
        assert_eq!(cow.changes().await, [(PathBuf::from("ghost"), Delta::Tombstone)]);
    }

    #[tokio::test]
    async fn test_write_over_dir_or_through_file_fails() {
        let base = base().await;
        let cow = CowFs::new(&base);
        assert!(matches!(
            cow.write(Path::new("dir"), b"x").await,
            Err(VfsError::IsADirectory(_))
        ));
        assert!(matches!(
            cow.write(Path::new("a.txt/x"), b"x").await,
            Err(VfsError::NotADirectory(_))
        ));
        assert!(cow.is_empty().await);
    }

    #[tokio::test]
    async fn test_replace_file_with_dir() {
        let base = base().await;
        let cow = CowFs::new(&base);
        cow.remove(Path::new("a.txt")).await.unwrap();
        cow.write(Path::new("a.txt/nested"), b"n").await.unwrap();

        assert!(cow.is_dir(Path::new("a.txt")).await.unwrap());
        assert_eq!(cow.read(Path::new("a.txt/nested")).await.unwrap(), b"n");

        cow.remove(Path::new("a.txt/nested")).await.unwrap();
        assert!(cow.list(Path::new("a.txt")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_open_write_lands_in_overlay() {
        use tokio::io::AsyncWriteExt;

        let base = base().await;
        let cow = CowFs::new(&base);
        let mut handle = cow.open_write(Path::new("log.txt")).await.unwrap();
        handle.write_all(b"entry").await.unwrap();
        handle.close().await.unwrap();

        assert_eq!(cow.read(Path::new("log.txt")).await.unwrap(), b"entry");
        let delta = cow.into_delta();
        assert_eq!(delta.get(Path::new("log.txt")), Some(&Delta::File(b"entry".to_vec())));
    }
}
