//! pdsfs-core: versioned, copy-on-write filesystem for PDS4 archives.
//!
//! An archive keeps every version of every bundle, collection and product
//! side by side on one filesystem. This crate provides:
//!
//! - **vfs**: the node primitives, their backends and the path-based
//!   [`Filesystem`](vfs::Filesystem) trait everything else speaks
//! - **versioned**: the multiversioned store, read-only projections of a
//!   single version, and copy-on-write overlays committed as new versions
//! - **walk** and **manifest**: traversals over a stored bundle version
//! - **config** and **paths**: user configuration
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use pdsfs_core::versioned::{CowFs, VersionedStore};
//! use pdsfs_core::vfs::{Filesystem, PrimFs};
//!
//! # async fn demo() -> pdsfs_core::VfsResult<()> {
//! let store = VersionedStore::new(PrimFs::local("/data/archive"));
//! let base: pdsfs_core::Lidvid = "urn:nasa:pds:hst_00000::1.0".parse()?;
//! let view = store.view(&base).await?;
//! let overlay = CowFs::new(&view);
//! overlay.write(Path::new("hst_00000/readme.txt"), b"updated").await?;
//! let new = store.commit(&base, overlay).await?;
//! # let _ = new;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod manifest;
pub mod paths;
pub mod versioned;
pub mod vfs;
pub mod walk;

pub use config::{Bump, Config, ConfigError, VersioningConfig};
pub use error::{VfsError, VfsResult};
pub use pdsfs_types::{IdError, Lid, Lidvid, Vid};
