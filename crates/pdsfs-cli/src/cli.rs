//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use pdsfs_core::{Lid, Lidvid};

/// Versioned, copy-on-write access to PDS4 archives
#[derive(Debug, Parser)]
#[command(name = "pdsfs", version)]
#[command(about = "Inspect, export and extend multiversioned PDS4 archives")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Archive root directory (overrides `archive_dir` in the config)
    #[arg(long, global = true)]
    pub archive: Option<PathBuf>,

    /// Configuration file (default: $XDG_CONFIG_HOME/pdsfs/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create the directories for a LIDVID
    Init { lidvid: Lidvid },

    /// Create CHILD and pin it in PARENT's version index
    Pin { parent: Lidvid, child: Lidvid },

    /// List the stored versions of a LID
    Versions { lid: Lid },

    /// List a directory of a version
    Ls {
        lidvid: Lidvid,
        /// Directory inside the version (default: the root)
        path: Option<PathBuf>,
    },

    /// Print a file of a version
    Cat { lidvid: Lidvid, path: PathBuf },

    /// Print every path in a version
    Tree { lidvid: Lidvid },

    /// Print the collections and products a bundle version pins
    Components { lidvid: Lidvid },

    /// Copy a version into a plain directory
    Export { lidvid: Lidvid, dest: PathBuf },

    /// Print MD5 checksums of every file in a version
    Manifest {
        lidvid: Lidvid,

        /// Print the transfer manifest (LIDVID and directory of every
        /// component) instead
        #[arg(long)]
        transfer: bool,
    },

    /// Apply edits to a bundle version and commit them as a new version
    Stage {
        lidvid: Lidvid,

        /// Copy host file SRC to DEST inside the version (repeatable)
        #[arg(long = "put", value_name = "SRC=DEST", value_parser = parse_put)]
        puts: Vec<(PathBuf, PathBuf)>,

        /// Remove PATH from the version (repeatable)
        #[arg(long = "rm", value_name = "PATH")]
        removals: Vec<PathBuf>,
    },
}

fn parse_put(s: &str) -> Result<(PathBuf, PathBuf), String> {
    match s.split_once('=') {
        Some((src, dest)) if !src.is_empty() && !dest.is_empty() => {
            Ok((PathBuf::from(src), PathBuf::from(dest)))
        }
        _ => Err(format!("expected SRC=DEST, got {s:?}")),
    }
}
