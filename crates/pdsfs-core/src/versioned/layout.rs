//! On-disk naming for multiversioned archives.
//!
//! ```text
//! hst_00000/                       bundle LID
//! ├── v$3/                         one dir per bundle VID
//! │   ├── subdir$versions.txt      version index
//! │   └── bundle.xml
//! └── data_xxx_raw/                collection LID
//!     └── v$2/
//! ```
//!
//! Any name containing `$` belongs to the layout and is never shown to
//! readers of a projection.

use std::path::PathBuf;

use pdsfs_types::{Lid, Lidvid, Vid};

use crate::error::VfsResult;
use crate::vfs::path::join_segments;
use crate::vfs::Filesystem;

/// Prefix of every version directory name.
pub const VERSION_MARKER: &str = "v$";

/// Name of the version index file inside a version directory.
pub const INDEX_FILENAME: &str = "subdir$versions.txt";

/// `v$<vid>`
pub fn version_dir_name(vid: Vid) -> String {
    format!("{VERSION_MARKER}{vid}")
}

/// The VID of a version directory name, if it is one.
pub fn parse_version_dir_name(name: &str) -> Option<Vid> {
    name.strip_prefix(VERSION_MARKER)?.parse().ok()
}

/// True for names reserved by the layout.
pub fn is_reserved(name: &str) -> bool {
    name.contains('$')
}

/// Logical directory of a LID, e.g. `hst_00000/data_xxx_raw`.
pub fn lid_dir(lid: &Lid) -> PathBuf {
    join_segments(lid.parts())
}

/// Version directory of a LIDVID, e.g. `hst_00000/v$3`.
pub fn lidvid_dir(lidvid: &Lidvid) -> PathBuf {
    lid_dir(lidvid.lid()).join(version_dir_name(lidvid.vid()))
}

/// Version index file of a LIDVID.
pub fn index_path(lidvid: &Lidvid) -> PathBuf {
    lidvid_dir(lidvid).join(INDEX_FILENAME)
}

/// What kind of tree a filesystem holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsCategory {
    /// No files at all.
    Empty,
    /// A plain tree with no layout names, such as a projection or export.
    SingleVersioned,
    /// A tree using the multiversioned layout.
    Multiversioned,
}

impl std::fmt::Display for FsCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            FsCategory::Empty => "empty",
            FsCategory::SingleVersioned => "single-versioned",
            FsCategory::Multiversioned => "multiversioned",
        })
    }
}

/// Classify a filesystem by scanning it for layout names and files.
///
/// Stops at the first reserved name; otherwise visits the whole tree.
pub async fn categorize(fs: &dyn Filesystem) -> VfsResult<FsCategory> {
    let mut saw_file = false;
    let mut pending = vec![PathBuf::new()];
    while let Some(dir) = pending.pop() {
        for entry in fs.list(&dir).await? {
            if is_reserved(&entry.name) {
                return Ok(FsCategory::Multiversioned);
            }
            if entry.is_dir() {
                pending.push(dir.join(&entry.name));
            } else {
                saw_file = true;
            }
        }
    }
    Ok(if saw_file {
        FsCategory::SingleVersioned
    } else {
        FsCategory::Empty
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vfs::PrimFs;
    use std::path::Path;

    #[test]
    fn test_version_dir_names() {
        assert_eq!(version_dir_name(Vid::new(3)), "v$3");
        assert_eq!(version_dir_name(Vid::with_minor(1, 0)), "v$1.0");
        assert_eq!(parse_version_dir_name("v$1.0"), Some(Vid::with_minor(1, 0)));
        assert_eq!(parse_version_dir_name("v3"), None);
        assert_eq!(parse_version_dir_name("v$x"), None);
    }

    #[test]
    fn test_lidvid_dir() {
        let lidvid: Lidvid = "urn:nasa:pds:hst_00000:data_xxx_raw::2".parse().unwrap();
        assert_eq!(lidvid_dir(&lidvid), PathBuf::from("hst_00000/data_xxx_raw/v$2"));
        assert_eq!(
            index_path(&lidvid),
            PathBuf::from("hst_00000/data_xxx_raw/v$2/subdir$versions.txt")
        );
    }

    #[tokio::test]
    async fn test_categorize() {
        let fs = PrimFs::memory();
        assert_eq!(categorize(&fs).await.unwrap(), FsCategory::Empty);

        fs.make_dirs(Path::new("b/c")).await.unwrap();
        assert_eq!(categorize(&fs).await.unwrap(), FsCategory::Empty);

        fs.write(Path::new("b/c/x.txt"), b"").await.unwrap();
        assert_eq!(categorize(&fs).await.unwrap(), FsCategory::SingleVersioned);

        fs.make_dirs(Path::new("b/v$1")).await.unwrap();
        assert_eq!(categorize(&fs).await.unwrap(), FsCategory::Multiversioned);
    }
}
