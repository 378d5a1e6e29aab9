//! XDG Base Directory paths for pdsfs.
//!
//! | Purpose | XDG Variable | Default | pdsfs Path |
//! |---------|--------------|---------|------------|
//! | Config | `$XDG_CONFIG_HOME` | `~/.config` | `$XDG_CONFIG_HOME/pdsfs/config.toml` |

use std::path::PathBuf;

use directories::BaseDirs;

/// Get the config directory.
///
/// Uses `$XDG_CONFIG_HOME/pdsfs` or falls back to `~/.config/pdsfs`.
pub fn config_dir() -> PathBuf {
    BaseDirs::new()
        .map(|d| d.config_dir().to_path_buf())
        .unwrap_or_else(|| dirs_fallback().join(".config"))
        .join("pdsfs")
}

/// Default location of the config file.
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

/// Fallback home directory when BaseDirs fails.
fn dirs_fallback() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_file_is_under_pdsfs() {
        assert!(config_dir().ends_with("pdsfs"));
        assert!(config_file().starts_with(config_dir()));
        assert!(config_file().ends_with("config.toml"));
    }
}
