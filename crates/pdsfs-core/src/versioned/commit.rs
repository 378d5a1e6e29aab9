//! Turning an overlay's edits into new versions.
//!
//! In a projection, directories at depth 1 to 3 are components (bundle,
//! collection, product); anything deeper is plain content of a product.
//! Each component touched by an edit gets a new version directory next to
//! its old ones. Untouched components are reused by reference through the
//! new parent's version index.

use std::cmp::Reverse;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use pdsfs_types::{Lid, Lidvid, Vid};
use tracing::{debug, info, warn};

use super::cow::{CowFs, Delta};
use super::index::VersionIndex;
use super::layout::{lid_dir, lidvid_dir};
use super::store::VersionedStore;
use crate::error::{VfsError, VfsResult};
use crate::vfs::path::segments;
use crate::vfs::{copy_tree, Filesystem};

/// Deepest component depth in an archive.
const MAX_COMPONENT_DEPTH: usize = 3;

impl VersionedStore {
    /// Write the edits in `overlay` as a new version of the bundle `base`.
    ///
    /// `overlay` must sit on a projection of `base`. Returns the new bundle
    /// LIDVID, or `base` itself when there are no edits. On failure every
    /// version directory created so far is removed again.
    pub async fn commit(&self, base: &Lidvid, overlay: CowFs<'_>) -> VfsResult<Lidvid> {
        if !base.lid().is_bundle() {
            return Err(VfsError::NotABundle(base.clone()));
        }
        if overlay.base().projected() != Some(base) {
            return Err(VfsError::BaseMismatch(base.clone()));
        }
        if !self.contains(base).await? {
            return Err(VfsError::VersionNotFound(base.clone()));
        }

        let changes = overlay.changes().await;
        if changes.is_empty() {
            debug!(base = %base, "nothing to commit");
            return Ok(base.clone());
        }

        let mut changed: Vec<Lid> = changed_lids(base.lid(), &changes)?.into_iter().collect();
        changed.sort_by_key(|lid| Reverse(lid.depth()));

        let mut created = Vec::new();
        match self.write_versions(base, &overlay, &changed, &mut created).await {
            Ok(new) => {
                info!(base = %base, new = %new, components = changed.len(), "committed");
                Ok(new)
            }
            Err(err) => {
                self.roll_back(&created).await;
                warn!(base = %base, error = %err, "commit failed, rolled back");
                Err(err)
            }
        }
    }

    async fn write_versions(
        &self,
        base: &Lidvid,
        overlay: &CowFs<'_>,
        changed: &[Lid],
        created: &mut Vec<PathBuf>,
    ) -> VfsResult<Lidvid> {
        let mut new_vids: HashMap<&Lid, Vid> = HashMap::new();

        for lid in changed {
            // Projection paths of components coincide with their logical dirs.
            let view_dir = lid_dir(lid);
            if !overlay.is_dir(&view_dir).await? {
                debug!(lid = %lid, "component removed, no new version");
                continue;
            }

            let lidvid = Lidvid::new(lid.clone(), self.next_vid(lid).await?);
            let version_dir = lidvid_dir(&lidvid);
            created.push(self.first_missing_dir(lid, &version_dir).await?);
            self.backing().make_dirs(&version_dir).await?;

            let mut index = VersionIndex::new();
            for entry in overlay.list(&view_dir).await? {
                let from = view_dir.join(&entry.name);
                if entry.is_dir() && !lid.is_product() {
                    let child = lid.extend(&entry.name)?;
                    let vid = match new_vids.get(&child) {
                        Some(vid) => *vid,
                        None => self.pinned_vid(base, &child, from).await?,
                    };
                    index.insert(entry.name, vid.to_string());
                } else {
                    copy_tree(overlay, &from, self.backing(), &version_dir.join(&entry.name)).await?;
                }
            }
            self.write_index(&lidvid, &index).await?;
            debug!(lidvid = %lidvid, "wrote version");
            new_vids.insert(lid, lidvid.vid());
        }

        match new_vids.get(base.lid()) {
            Some(vid) => Ok(Lidvid::new(base.lid().clone(), *vid)),
            None => Err(VfsError::InconsistentVersionIndex {
                path: lid_dir(base.lid()),
                reason: "bundle vanished during commit".to_string(),
            }),
        }
    }

    /// VID of an unchanged component as pinned in the base snapshot.
    async fn pinned_vid(&self, base: &Lidvid, child: &Lid, view_path: PathBuf) -> VfsResult<Vid> {
        match self.resolve_lidvid(base, child).await? {
            Some(pinned) => Ok(pinned.vid()),
            None => Err(VfsError::InconsistentVersionIndex {
                path: view_path,
                reason: format!("{child} is not pinned by {base}"),
            }),
        }
    }

    /// The outermost directory that creating `version_dir` will add, so
    /// rollback can remove exactly what the commit made.
    async fn first_missing_dir(&self, lid: &Lid, version_dir: &Path) -> VfsResult<PathBuf> {
        for depth in 1..=lid.depth() {
            let dir = lid_dir(&Lid::from_parts(&lid.parts()[..depth])?);
            if !self.backing().exists(&dir).await? {
                return Ok(dir);
            }
        }
        Ok(version_dir.to_path_buf())
    }

    async fn roll_back(&self, created: &[PathBuf]) {
        for dir in created.iter().rev() {
            match self.backing().remove(dir).await {
                Ok(()) => debug!(path = %dir.display(), "rolled back"),
                Err(e) if e.is_not_found() => {}
                Err(e) => warn!(path = %dir.display(), error = %e, "rollback could not remove directory"),
            }
        }
    }
}

/// Every component whose content an edit touches, including all of its
/// ancestors.
fn changed_lids(bundle: &Lid, changes: &[(PathBuf, Delta)]) -> VfsResult<BTreeSet<Lid>> {
    let mut changed = BTreeSet::new();
    for (path, delta) in changes {
        let segs = segments(path);
        let n = segs.len();
        let depth = match delta {
            // A file belongs to the component directory holding it.
            Delta::File(_) => n.saturating_sub(1).min(MAX_COMPONENT_DEPTH),
            // A new component directory is itself a changed component.
            Delta::Dir => n.min(MAX_COMPONENT_DEPTH),
            // Removing a component changes its parent.
            Delta::Tombstone if n <= MAX_COMPONENT_DEPTH => n.saturating_sub(1),
            Delta::Tombstone => MAX_COMPONENT_DEPTH,
        };
        if depth == 0 || segs[0] != bundle.bundle_id() {
            return Err(VfsError::OutsideArchive(path.clone()));
        }
        for d in 1..=depth {
            changed.insert(Lid::from_parts(&segs[..d])?);
        }
    }
    Ok(changed)
}
