//! Copy subtrees between filesystems.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::traits::Filesystem;
use crate::error::VfsResult;

/// Copy the file or directory at `src_path` in `src` to `dst_path` in `dst`.
///
/// Directories are copied with everything beneath them. Existing
/// directories at the destination are merged into; existing files are
/// overwritten.
pub async fn copy_tree(
    src: &dyn Filesystem,
    src_path: &Path,
    dst: &dyn Filesystem,
    dst_path: &Path,
) -> VfsResult<()> {
    if !src.stat(src_path).await?.is_dir() {
        let data = src.read(src_path).await?;
        return dst.write(dst_path, &data).await;
    }

    // Work list instead of recursion: archive trees can be deep.
    let mut pending: Vec<(PathBuf, PathBuf)> = vec![(src_path.to_path_buf(), dst_path.to_path_buf())];
    while let Some((from, to)) = pending.pop() {
        dst.make_dirs(&to).await?;
        for entry in src.list(&from).await? {
            let child_from = from.join(&entry.name);
            let child_to = to.join(&entry.name);
            if entry.is_dir() {
                pending.push((child_from, child_to));
            } else {
                let data = src.read(&child_from).await?;
                dst.write(&child_to, &data).await?;
            }
        }
    }
    debug!(from = %src_path.display(), to = %dst_path.display(), "copied tree");
    Ok(())
}

/// Copy the whole of `src` into the root of `dst`.
pub async fn copy_fs(src: &dyn Filesystem, dst: &dyn Filesystem) -> VfsResult<()> {
    copy_tree(src, Path::new(""), dst, Path::new("")).await
}
