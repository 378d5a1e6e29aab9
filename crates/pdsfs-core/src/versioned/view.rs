//! Read-only projection of one LIDVID.
//!
//! Presents the snapshot as an ordinary tree with no version segments:
//!
//! ```text
//! layout                                  view of urn:nasa:pds:hst_00000::3
//! hst_00000/v$3/bundle.xml           ->   hst_00000/bundle.xml
//! hst_00000/data_xxx_raw/v$2/x.xml   ->   hst_00000/data_xxx_raw/x.xml
//! ```
//!
//! Which version of each child appears is decided by the version index of
//! its parent's version. Nothing is resolved up front; a broken index is
//! reported when a path through it is first touched.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use pdsfs_types::Lidvid;
use tracing::debug;

use super::layout::{is_reserved, lidvid_dir};
use super::store::VersionedStore;
use crate::error::{VfsError, VfsResult};
use crate::vfs::path::{normalize, segments};
use crate::vfs::{DirEntry, Filesystem};

/// What a projected path refers to.
#[derive(Debug)]
enum Resolved {
    /// An ancestor of the projected LID; holds only the next segment.
    Ancestor { next: String },
    /// The directory of some LID, at the version chosen for it.
    Component(Lidvid),
    /// A plain entry stored inside a version directory.
    Plain(PathBuf),
}

/// A read-only view of a single version of a bundle, collection or
/// product.
#[derive(Debug)]
pub struct VersionView<'s> {
    store: &'s VersionedStore,
    lidvid: Lidvid,
}

impl<'s> VersionView<'s> {
    /// Fails with `VersionNotFound` unless `lidvid` is stored.
    pub async fn new(store: &'s VersionedStore, lidvid: Lidvid) -> VfsResult<Self> {
        if !store.contains(&lidvid).await? {
            return Err(VfsError::VersionNotFound(lidvid));
        }
        debug!(lidvid = %lidvid, "opened version view");
        Ok(Self { store, lidvid })
    }

    pub fn lidvid(&self) -> &Lidvid {
        &self.lidvid
    }

    pub fn store(&self) -> &'s VersionedStore {
        self.store
    }

    async fn resolve(&self, path: &Path) -> VfsResult<Resolved> {
        let segs = segments(path);
        let ancestors = self.lidvid.lid().parts();

        let mut walked = PathBuf::new();
        for (seg, expected) in segs.iter().zip(ancestors) {
            walked.push(seg);
            if seg != expected {
                return Err(VfsError::NotFound(walked));
            }
        }
        if segs.len() < ancestors.len() {
            return Ok(Resolved::Ancestor {
                next: ancestors[segs.len()].clone(),
            });
        }

        let mut resolved = Resolved::Component(self.lidvid.clone());
        for seg in &segs[ancestors.len()..] {
            walked.push(seg);
            if is_reserved(seg) {
                return Err(VfsError::NotFound(walked));
            }
            resolved = match resolved {
                Resolved::Component(context) => match self.store.pinned_child(&context, seg).await? {
                    Some(child) => {
                        if !self.store.contains(&child).await? {
                            return Err(VfsError::InconsistentVersionIndex {
                                path: lidvid_dir(&child),
                                reason: format!("{context} pins {seg} at {}, which is not stored", child.vid()),
                            });
                        }
                        Resolved::Component(child)
                    }
                    None => Resolved::Plain(lidvid_dir(&context).join(seg)),
                },
                Resolved::Plain(inner) => Resolved::Plain(inner.join(seg)),
                Resolved::Ancestor { .. } => unreachable!("ancestors are consumed above"),
            };
        }
        Ok(resolved)
    }

    /// Listing of a component directory: its version directory's plain
    /// entries plus its pinned children.
    async fn list_component(&self, lidvid: &Lidvid) -> VfsResult<Vec<DirEntry>> {
        let mut entries: Vec<DirEntry> = self
            .store
            .backing()
            .list(&lidvid_dir(lidvid))
            .await?
            .into_iter()
            .filter(|e| !is_reserved(&e.name))
            .collect();
        for name in self.store.read_index(lidvid).await?.into_keys() {
            entries.retain(|e| e.name != name);
            entries.push(DirEntry::directory(name));
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}

/// Report backend failures against the projected path rather than the
/// layout path.
fn reproject(err: VfsError, path: &Path) -> VfsError {
    match err {
        VfsError::NotFound(_) => VfsError::NotFound(normalize(path)),
        VfsError::NotADirectory(_) => VfsError::NotADirectory(normalize(path)),
        VfsError::IsADirectory(_) => VfsError::IsADirectory(normalize(path)),
        other => other,
    }
}

#[async_trait]
impl Filesystem for VersionView<'_> {
    async fn read(&self, path: &Path) -> VfsResult<Vec<u8>> {
        match self.resolve(path).await? {
            Resolved::Plain(inner) => self
                .store
                .backing()
                .read(&inner)
                .await
                .map_err(|e| reproject(e, path)),
            _ => Err(VfsError::IsADirectory(normalize(path))),
        }
    }

    async fn write(&self, path: &Path, _data: &[u8]) -> VfsResult<()> {
        Err(VfsError::ReadOnlyView(normalize(path)))
    }

    async fn list(&self, path: &Path) -> VfsResult<Vec<DirEntry>> {
        match self.resolve(path).await? {
            Resolved::Ancestor { next } => Ok(vec![DirEntry::directory(next)]),
            Resolved::Component(lidvid) => self.list_component(&lidvid).await,
            Resolved::Plain(inner) => {
                let entries = self
                    .store
                    .backing()
                    .list(&inner)
                    .await
                    .map_err(|e| reproject(e, path))?;
                Ok(entries.into_iter().filter(|e| !is_reserved(&e.name)).collect())
            }
        }
    }

    async fn stat(&self, path: &Path) -> VfsResult<DirEntry> {
        let resolved = self.resolve(path).await?;
        let Some(name) = segments(path).pop() else {
            return Ok(DirEntry::directory("/"));
        };
        match resolved {
            Resolved::Ancestor { .. } | Resolved::Component(_) => Ok(DirEntry::directory(name)),
            Resolved::Plain(inner) => self
                .store
                .backing()
                .stat(&inner)
                .await
                .map_err(|e| reproject(e, path)),
        }
    }

    async fn make_dirs(&self, path: &Path) -> VfsResult<()> {
        Err(VfsError::ReadOnlyView(normalize(path)))
    }

    async fn remove(&self, path: &Path) -> VfsResult<()> {
        Err(VfsError::ReadOnlyView(normalize(path)))
    }

    fn read_only(&self) -> bool {
        true
    }

    fn projected(&self) -> Option<&Lidvid> {
        Some(&self.lidvid)
    }
}
