//! Subcommand implementations.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use pdsfs_core::manifest::{checksums, manifest, transfer_entries, transfer_manifest};
use pdsfs_core::versioned::{categorize, CowFs, FsCategory, VersionedStore};
use pdsfs_core::vfs::{copy_fs, Filesystem, LocalFs, PrimFs};
use pdsfs_core::walk::{walk, Entity, Visitor};
use pdsfs_core::{Config, Lidvid, VfsResult};
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::cli::{Cli, Command};

pub async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("Failed to load configuration")?;
    let archive = cli
        .archive
        .clone()
        .or_else(|| config.archive_dir.clone())
        .context("No archive directory: pass --archive or set archive_dir in the config")?;
    let json = cli.json;

    match cli.command {
        Command::Init { lidvid } => {
            let store = open_store(&archive, &config, true).await?;
            store.make_lidvid_directories(&lidvid).await?;
            print_lidvid(&lidvid, json)
        }
        Command::Pin { parent, child } => {
            let store = open_store(&archive, &config, false).await?;
            store.add_subcomponent(&parent, &child).await?;
            print_lidvid(&child, json)
        }
        Command::Versions { lid } => {
            let store = open_store(&archive, &config, false).await?;
            let versions: Vec<String> = store
                .versions(&lid)
                .await?
                .iter()
                .map(|v| v.to_string())
                .collect();
            if json {
                print_json(&versions)
            } else {
                for vid in versions {
                    println!("{vid}");
                }
                Ok(())
            }
        }
        Command::Ls { lidvid, path } => {
            let store = open_store(&archive, &config, false).await?;
            let view = store.view(&lidvid).await?;
            let entries = view.list(&path.unwrap_or_default()).await?;
            if json {
                let rows: Vec<EntryRow> = entries
                    .iter()
                    .map(|e| EntryRow {
                        name: &e.name,
                        kind: if e.is_dir() { "directory" } else { "file" },
                    })
                    .collect();
                print_json(&rows)
            } else {
                for entry in entries {
                    let slash = if entry.is_dir() { "/" } else { "" };
                    println!("{}{slash}", entry.name);
                }
                Ok(())
            }
        }
        Command::Cat { lidvid, path } => {
            let store = open_store(&archive, &config, false).await?;
            let view = store.view(&lidvid).await?;
            let data = view.read(&path).await?;
            let mut stdout = tokio::io::stdout();
            stdout.write_all(&data).await?;
            stdout.flush().await?;
            Ok(())
        }
        Command::Tree { lidvid } => {
            let store = open_store(&archive, &config, false).await?;
            let view = store.view(&lidvid).await?;
            let paths = tree(&view).await?;
            if json {
                print_json(&paths)
            } else {
                for path in paths {
                    println!("{path}");
                }
                Ok(())
            }
        }
        Command::Components { lidvid } => {
            let store = open_store(&archive, &config, false).await?;
            let mut collector = Components::default();
            walk(&store, &lidvid, &mut collector).await?;
            if json {
                print_json(&collector.rows)
            } else {
                for row in &collector.rows {
                    println!("{}{} ({})", "  ".repeat(row.depth), row.lidvid, row.kind);
                }
                Ok(())
            }
        }
        Command::Export { lidvid, dest } => {
            let store = open_store(&archive, &config, false).await?;
            let view = store.view(&lidvid).await?;
            let out = PrimFs::new(
                LocalFs::create(&dest)
                    .await
                    .with_context(|| format!("Failed to create {}", dest.display()))?,
            );
            if categorize(&out).await? != FsCategory::Empty {
                bail!("{} is not empty", dest.display());
            }
            copy_fs(&view, &out).await?;
            info!(lidvid = %lidvid, dest = %dest.display(), "exported");
            Ok(())
        }
        Command::Manifest {
            lidvid,
            transfer: true,
        } => {
            let store = open_store(&archive, &config, false).await?;
            if json {
                let rows: Vec<TransferRow> = transfer_entries(&store, &lidvid)
                    .await?
                    .into_iter()
                    .map(|(lidvid, dir)| TransferRow { lidvid, dir })
                    .collect();
                print_json(&rows)
            } else {
                print!("{}", transfer_manifest(&store, &lidvid).await?);
                Ok(())
            }
        }
        Command::Manifest {
            lidvid,
            transfer: false,
        } => {
            let store = open_store(&archive, &config, false).await?;
            let view = store.view(&lidvid).await?;
            if json {
                let rows: Vec<ChecksumRow> = checksums(&view)
                    .await?
                    .into_iter()
                    .map(|(path, md5)| ChecksumRow { path, md5 })
                    .collect();
                print_json(&rows)
            } else {
                print!("{}", manifest(&view).await?);
                Ok(())
            }
        }
        Command::Stage {
            lidvid,
            puts,
            removals,
        } => {
            let store = open_store(&archive, &config, false).await?;
            let view = store.view(&lidvid).await?;
            let overlay = CowFs::new(&view);
            for (src, dest) in &puts {
                let data = tokio::fs::read(src)
                    .await
                    .with_context(|| format!("Failed to read {}", src.display()))?;
                overlay.write(dest, &data).await?;
            }
            for path in &removals {
                overlay.remove(path).await?;
            }
            let new = store.commit(&lidvid, overlay).await?;
            print_lidvid(&new, json)
        }
    }
}

/// Open the archive at `dir`, refusing anything that is not multiversioned.
async fn open_store(dir: &Path, config: &Config, create: bool) -> Result<VersionedStore> {
    let backing = if create {
        LocalFs::create(dir)
            .await
            .with_context(|| format!("Failed to create archive {}", dir.display()))?
    } else {
        if !dir.is_dir() {
            bail!("Archive {} does not exist", dir.display());
        }
        LocalFs::new(dir)
    };
    let backing = PrimFs::new(backing);
    let category = categorize(&backing).await?;
    if category == FsCategory::SingleVersioned {
        bail!("{} is a {category} tree, not an archive", dir.display());
    }
    Ok(VersionedStore::with_config(
        Box::new(backing),
        config.versioning.clone(),
    ))
}

/// Every path in `fs`, directories with a trailing `/`, sorted.
async fn tree(fs: &dyn Filesystem) -> VfsResult<Vec<String>> {
    let mut paths = Vec::new();
    let mut pending = vec![PathBuf::new()];
    while let Some(dir) = pending.pop() {
        for entry in fs.list(&dir).await? {
            let path = dir.join(&entry.name);
            if entry.is_dir() {
                paths.push(format!("{}/", path.display()));
                pending.push(path);
            } else {
                paths.push(path.display().to_string());
            }
        }
    }
    paths.sort();
    Ok(paths)
}

fn print_lidvid(lidvid: &Lidvid, json: bool) -> Result<()> {
    if json {
        print_json(&serde_json::json!({ "lidvid": lidvid }))
    } else {
        println!("{lidvid}");
        Ok(())
    }
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[derive(Serialize)]
struct EntryRow<'a> {
    name: &'a str,
    kind: &'static str,
}

#[derive(Serialize)]
struct ChecksumRow {
    path: PathBuf,
    md5: String,
}

#[derive(Serialize)]
struct TransferRow {
    lidvid: Lidvid,
    dir: PathBuf,
}

#[derive(Debug, Serialize)]
struct ComponentRow {
    lidvid: Lidvid,
    kind: String,
    #[serde(skip)]
    depth: usize,
}

/// Collects each component on its pre-visit.
#[derive(Default)]
struct Components {
    rows: Vec<ComponentRow>,
}

#[async_trait]
impl Visitor for Components {
    async fn visit(&mut self, entity: &Entity, post: bool) -> VfsResult<()> {
        if post {
            return Ok(());
        }
        let kind = match entity {
            Entity::Bundle(_) => "bundle".to_string(),
            Entity::Collection(_, kind) => format!("{kind} collection"),
            Entity::Product(_) => "product".to_string(),
        };
        self.rows.push(ComponentRow {
            lidvid: entity.lidvid().clone(),
            kind,
            depth: entity.lidvid().lid().depth() - 1,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lv(s: &str) -> Lidvid {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn open_store_refuses_plain_tree() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("readme.txt"), "plain").unwrap();
        let err = open_store(dir.path(), &Config::default(), false)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("single-versioned"));
    }

    #[tokio::test]
    async fn open_store_requires_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        assert!(open_store(&missing, &Config::default(), false).await.is_err());
        assert!(open_store(&missing, &Config::default(), true).await.is_ok());
        assert!(missing.is_dir());
    }

    #[tokio::test]
    async fn tree_lists_everything() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path(), &Config::default(), true).await.unwrap();
        let b = lv("urn:nasa:pds:b::1.0");
        store.make_lidvid_directories(&b).await.unwrap();
        store
            .add_subcomponent(&b, &lv("urn:nasa:pds:b:c::1.0"))
            .await
            .unwrap();
        store
            .backing()
            .write(Path::new("b/c/v$1.0/c.xml"), b"")
            .await
            .unwrap();

        let view = store.view(&b).await.unwrap();
        assert_eq!(tree(&view).await.unwrap(), ["b/", "b/c/", "b/c/c.xml"]);

        let manifest = transfer_manifest(&store, &b).await.unwrap();
        assert_eq!(
            manifest,
            "urn:nasa:pds:b::1.0   b\nurn:nasa:pds:b:c::1.0 b/c\n"
        );

        let mut collector = Components::default();
        walk(&store, &b, &mut collector).await.unwrap();
        let kinds: Vec<&str> = collector.rows.iter().map(|r| r.kind.as_str()).collect();
        assert_eq!(kinds, ["bundle", "other collection"]);
    }
}
