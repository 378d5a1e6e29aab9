//! User configuration.
//!
//! Loaded from `$XDG_CONFIG_HOME/pdsfs/config.toml` unless a path is given.
//! A missing file yields the defaults.
//!
//! ```toml
//! archive_dir = "/data/archive"
//!
//! [versioning]
//! initial_vid = "1.0"
//! bump = "major"
//! ```

use std::io;
use std::path::{Path, PathBuf};

use pdsfs_types::{IdError, Vid};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::paths;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("invalid config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Multiversioned archive used when `--archive` is not given.
    pub archive_dir: Option<PathBuf>,
    pub versioning: VersioningConfig,
}

/// How new VIDs are allocated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VersioningConfig {
    /// VID of the first version of a LID.
    pub initial_vid: Vid,
    /// Which part of the latest VID to bump for a new version.
    pub bump: Bump,
}

impl Default for VersioningConfig {
    fn default() -> Self {
        Self {
            initial_vid: Vid::with_minor(1, 0),
            bump: Bump::Major,
        }
    }
}

impl VersioningConfig {
    /// The VID that follows `latest`, or the initial VID.
    pub fn next_vid(&self, latest: Option<Vid>) -> Result<Vid, IdError> {
        match (latest, self.bump) {
            (None, _) => Ok(self.initial_vid),
            (Some(vid), Bump::Major) => vid.next_major(),
            (Some(vid), Bump::Minor) => vid.next_minor(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bump {
    #[default]
    Major,
    Minor,
}

impl Config {
    /// Load from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&paths::config_file())
    }

    /// Load from `path`; a missing file gives the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
