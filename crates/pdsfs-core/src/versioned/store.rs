//! The multiversioned archive store.
//!
//! Owns the backing filesystem and knows the layout: which directories are
//! LIDs, which are versions of them, and what each version's index pins.
//! Existing version directories are never modified; new versions are added
//! as siblings.

use std::path::Path;

use pdsfs_types::{Lid, Lidvid, Vid};
use tracing::debug;

use super::index::{self, VersionIndex};
use super::layout::{index_path, is_reserved, lid_dir, lidvid_dir, parse_version_dir_name};
use super::view::VersionView;
use crate::config::VersioningConfig;
use crate::error::{VfsError, VfsResult};
use crate::vfs::Filesystem;

/// A multiversioned archive over some backing filesystem.
pub struct VersionedStore {
    fs: Box<dyn Filesystem>,
    versioning: VersioningConfig,
}

impl std::fmt::Debug for VersionedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersionedStore")
            .field("versioning", &self.versioning)
            .finish_non_exhaustive()
    }
}

impl VersionedStore {
    /// Open a store with the default versioning rules.
    pub fn new(fs: impl Filesystem + 'static) -> Self {
        Self::with_config(Box::new(fs), VersioningConfig::default())
    }

    pub fn with_config(fs: Box<dyn Filesystem>, versioning: VersioningConfig) -> Self {
        Self { fs, versioning }
    }

    /// The raw layout, version directories and all.
    pub fn backing(&self) -> &dyn Filesystem {
        self.fs.as_ref()
    }

    pub fn versioning(&self) -> &VersioningConfig {
        &self.versioning
    }

    /// A read-only projection of one LIDVID.
    pub async fn view(&self, lidvid: &Lidvid) -> VfsResult<VersionView<'_>> {
        VersionView::new(self, lidvid.clone()).await
    }

    /// Create the version directory for `lidvid` (and its logical parents)
    /// with an empty index. Safe to repeat.
    pub async fn make_lidvid_directories(&self, lidvid: &Lidvid) -> VfsResult<()> {
        let dir = lidvid_dir(lidvid);
        self.fs.make_dirs(&dir).await?;
        let index = index_path(lidvid);
        if !self.fs.exists(&index).await? {
            debug!(lidvid = %lidvid, "created version directory");
            self.fs.write(&index, b"").await?;
        }
        Ok(())
    }

    /// Create `child` and pin it in `parent`'s index.
    ///
    /// The index is written after the child directory exists.
    pub async fn add_subcomponent(&self, parent: &Lidvid, child: &Lidvid) -> VfsResult<()> {
        if child.lid().parent().as_ref() != Some(parent.lid()) {
            return Err(VfsError::NotASubcomponent {
                parent: parent.clone(),
                child: child.clone(),
            });
        }
        if !self.contains(parent).await? {
            return Err(VfsError::UnknownParent(parent.clone()));
        }
        self.make_lidvid_directories(child).await?;
        let mut index = self.read_index(parent).await?;
        index.insert(
            child.lid().last_segment().to_string(),
            child.vid().to_string(),
        );
        self.write_index(parent, &index).await?;
        debug!(parent = %parent, child = %child, "pinned subcomponent");
        Ok(())
    }

    /// Whether the version directory of `lidvid` exists.
    pub async fn contains(&self, lidvid: &Lidvid) -> VfsResult<bool> {
        self.fs.is_dir(&lidvid_dir(lidvid)).await
    }

    /// All versions of `lid`, oldest first. Empty when the LID is unknown.
    pub async fn versions(&self, lid: &Lid) -> VfsResult<Vec<Vid>> {
        let entries = match self.fs.list(&lid_dir(lid)).await {
            Ok(entries) => entries,
            Err(e) if e.is_not_found() => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        let mut vids: Vec<Vid> = entries
            .iter()
            .filter(|e| e.is_dir())
            .filter_map(|e| parse_version_dir_name(&e.name))
            .collect();
        vids.sort();
        Ok(vids)
    }

    /// The newest version of `lid`, if any.
    pub async fn latest(&self, lid: &Lid) -> VfsResult<Option<Lidvid>> {
        Ok(self
            .versions(lid)
            .await?
            .pop()
            .map(|vid| Lidvid::new(lid.clone(), vid)))
    }

    /// The VID a new version of `lid` would get.
    pub async fn next_vid(&self, lid: &Lid) -> VfsResult<Vid> {
        let latest = self.latest(lid).await?.map(|lv| lv.vid());
        Ok(self.versioning.next_vid(latest)?)
    }

    /// The version index of `lidvid`. A version without an index file has
    /// an empty one.
    pub async fn read_index(&self, lidvid: &Lidvid) -> VfsResult<VersionIndex> {
        if !self.contains(lidvid).await? {
            return Err(VfsError::VersionNotFound(lidvid.clone()));
        }
        let bytes = match self.fs.read(&index_path(lidvid)).await {
            Ok(bytes) => bytes,
            Err(e) if e.is_not_found() => return Ok(VersionIndex::new()),
            Err(e) => return Err(e),
        };
        let text = String::from_utf8(bytes).map_err(|_| VfsError::MalformedVersionIndex {
            line: 0,
            reason: "index is not UTF-8".to_string(),
        })?;
        index::parse(&text)
    }

    pub async fn write_index(&self, lidvid: &Lidvid, index: &VersionIndex) -> VfsResult<()> {
        let text = index::serialize(index)?;
        self.fs.write(&index_path(lidvid), text.as_bytes()).await
    }

    /// The version of child `segment` pinned by `parent`, if pinned.
    pub async fn pinned_child(&self, parent: &Lidvid, segment: &str) -> VfsResult<Option<Lidvid>> {
        let index = self.read_index(parent).await?;
        let Some(vid) = index.get(segment) else {
            return Ok(None);
        };
        Ok(Some(Lidvid::new(parent.lid().extend(segment)?, vid.parse()?)))
    }

    /// Every child pinned by `lidvid`, in name order.
    pub async fn subcomponents(&self, lidvid: &Lidvid) -> VfsResult<Vec<Lidvid>> {
        let index = self.read_index(lidvid).await?;
        index
            .iter()
            .map(|(name, vid)| -> VfsResult<Lidvid> {
                Ok(Lidvid::new(lidvid.lid().extend(name)?, vid.parse()?))
            })
            .collect()
    }

    /// Which version of `lid` belongs to the snapshot `base`, following
    /// indexes down from `base`. `None` when some index on the way does
    /// not pin the next segment.
    pub async fn resolve_lidvid(&self, base: &Lidvid, lid: &Lid) -> VfsResult<Option<Lidvid>> {
        if !lid.starts_with(base.lid()) {
            return Err(VfsError::NotASubcomponent {
                parent: base.clone(),
                child: Lidvid::new(lid.clone(), base.vid()),
            });
        }
        let mut current = base.clone();
        for segment in &lid.parts()[base.lid().depth()..] {
            match self.pinned_child(&current, segment).await? {
                Some(next) => current = next,
                None => return Ok(None),
            }
        }
        Ok(Some(current))
    }

    /// Bundle LIDs at the top of the archive.
    pub async fn bundles(&self) -> VfsResult<Vec<Lid>> {
        let mut bundles = Vec::new();
        for entry in self.fs.list(Path::new("")).await? {
            if entry.is_dir() && Lid::is_valid_segment(&entry.name) {
                bundles.push(Lid::from_parts(&[entry.name])?);
            }
        }
        Ok(bundles)
    }

    /// Every stored LIDVID of `lid` and of the LIDs beneath it, sorted.
    pub async fn lidvids_under(&self, lid: &Lid) -> VfsResult<Vec<Lidvid>> {
        let mut found = Vec::new();
        let mut pending = vec![lid.clone()];
        while let Some(lid) = pending.pop() {
            for vid in self.versions(&lid).await? {
                found.push(Lidvid::new(lid.clone(), vid));
            }
            if lid.is_product() {
                continue;
            }
            let entries = match self.fs.list(&lid_dir(&lid)).await {
                Ok(entries) => entries,
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(e),
            };
            for entry in entries {
                if entry.is_dir() && !is_reserved(&entry.name) && Lid::is_valid_segment(&entry.name) {
                    pending.push(lid.extend(&entry.name)?);
                }
            }
        }
        found.sort();
        Ok(found)
    }
}
