//! Deliverable manifests.
//!
//! The checksum manifest has one `"<md5 hex>  <path>\n"` line per file,
//! sorted by path, in the format `md5sum -c` accepts. The transfer manifest
//! has one line per component of a bundle version: its LIDVID, padded to a
//! common width, then the component's directory in the projection.

use std::path::PathBuf;

use async_trait::async_trait;
use md5::{Digest, Md5};
use pdsfs_types::Lidvid;

use crate::error::VfsResult;
use crate::versioned::layout::lid_dir;
use crate::versioned::VersionedStore;
use crate::vfs::Filesystem;
use crate::walk::{walk, Entity, Visitor};

/// `(path, md5 hex)` for every file in `fs`, sorted by path.
pub async fn checksums(fs: &dyn Filesystem) -> VfsResult<Vec<(PathBuf, String)>> {
    let mut sums = Vec::new();
    let mut pending = vec![PathBuf::new()];
    while let Some(dir) = pending.pop() {
        for entry in fs.list(&dir).await? {
            let path = dir.join(&entry.name);
            if entry.is_dir() {
                pending.push(path);
            } else {
                let data = fs.read(&path).await?;
                sums.push((path, format!("{:x}", Md5::digest(&data))));
            }
        }
    }
    sums.sort();
    Ok(sums)
}

/// The manifest text for every file in `fs`.
pub async fn manifest(fs: &dyn Filesystem) -> VfsResult<String> {
    let mut out = String::new();
    for (path, sum) in checksums(fs).await? {
        out.push_str(&sum);
        out.push_str("  ");
        out.push_str(&path.to_string_lossy());
        out.push('\n');
    }
    Ok(out)
}

/// Collects every component on its pre-visit.
#[derive(Default)]
struct Reached(Vec<Lidvid>);

#[async_trait]
impl Visitor for Reached {
    async fn visit(&mut self, entity: &Entity, post: bool) -> VfsResult<()> {
        if !post {
            self.0.push(entity.lidvid().clone());
        }
        Ok(())
    }
}

/// `(LIDVID, projection directory)` for every component of the bundle
/// version `bundle`, sorted by LIDVID text.
pub async fn transfer_entries(
    store: &VersionedStore,
    bundle: &Lidvid,
) -> VfsResult<Vec<(Lidvid, PathBuf)>> {
    let mut reached = Reached::default();
    walk(store, bundle, &mut reached).await?;
    let mut entries: Vec<(Lidvid, PathBuf)> = reached
        .0
        .into_iter()
        .map(|lidvid| {
            let dir = lid_dir(lidvid.lid());
            (lidvid, dir)
        })
        .collect();
    entries.sort_by_cached_key(|(lidvid, _)| lidvid.to_string());
    Ok(entries)
}

/// The transfer manifest text for the bundle version `bundle`.
pub async fn transfer_manifest(store: &VersionedStore, bundle: &Lidvid) -> VfsResult<String> {
    let rows: Vec<(String, PathBuf)> = transfer_entries(store, bundle)
        .await?
        .into_iter()
        .map(|(lidvid, dir)| (lidvid.to_string(), dir))
        .collect();
    let width = rows.iter().map(|(lidvid, _)| lidvid.len()).max().unwrap_or(0);

    let mut out = String::new();
    for (lidvid, dir) in rows {
        out.push_str(&format!("{lidvid:<width$} {}\n", dir.display()));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vfs::PrimFs;
    use std::path::Path;

    #[tokio::test]
    async fn test_manifest() {
        let fs = PrimFs::memory();
        fs.write(Path::new("b/z.txt"), b"").await.unwrap();
        fs.write(Path::new("b/a/x.txt"), b"hello").await.unwrap();
        fs.make_dirs(Path::new("b/empty")).await.unwrap();

        assert_eq!(
            manifest(&fs).await.unwrap(),
            "5d41402abc4b2a76b9719d911017c592  b/a/x.txt\n\
             d41d8cd98f00b204e9800998ecf8427e  b/z.txt\n"
        );
    }

    #[tokio::test]
    async fn test_empty_manifest() {
        assert_eq!(manifest(&PrimFs::memory()).await.unwrap(), "");
    }

    fn lv(s: &str) -> Lidvid {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn test_transfer_manifest() {
        let store = VersionedStore::new(PrimFs::memory());
        let b = lv("urn:nasa:pds:b::2.0");
        let data = lv("urn:nasa:pds:b:data_acs_raw::1.0");
        store.make_lidvid_directories(&b).await.unwrap();
        store.add_subcomponent(&b, &data).await.unwrap();
        store.add_subcomponent(&b, &lv("urn:nasa:pds:b:document::1.0")).await.unwrap();
        store
            .add_subcomponent(&data, &lv("urn:nasa:pds:b:data_acs_raw:p1::1.0"))
            .await
            .unwrap();
        // Stored but not pinned by b 2.0
        store.make_lidvid_directories(&lv("urn:nasa:pds:b:stale::1.0")).await.unwrap();

        assert_eq!(
            transfer_manifest(&store, &b).await.unwrap(),
            "urn:nasa:pds:b::2.0                 b\n\
             urn:nasa:pds:b:data_acs_raw::1.0    b/data_acs_raw\n\
             urn:nasa:pds:b:data_acs_raw:p1::1.0 b/data_acs_raw/p1\n\
             urn:nasa:pds:b:document::1.0        b/document\n"
        );
    }

    #[tokio::test]
    async fn test_transfer_manifest_needs_bundle() {
        let store = VersionedStore::new(PrimFs::memory());
        let c = lv("urn:nasa:pds:b:c::1.0");
        store.make_lidvid_directories(&c).await.unwrap();
        assert!(transfer_manifest(&store, &c).await.is_err());
    }
}
