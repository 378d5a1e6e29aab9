//! Virtual filesystem layer.
//!
//! Two levels of interface:
//!
//! - [`Primitives`]: the node model a storage backend implements
//!   ([`MemoryFs`], [`LocalFs`]).
//! - [`Filesystem`]: the path-based surface everything else uses. [`PrimFs`]
//!   derives it from any primitives backend; version projections and
//!   copy-on-write overlays implement it directly.

mod adapter;
mod copy;
mod handle;
mod local;
mod memory;
pub mod path;
mod primitives;
mod traits;

pub use adapter::PrimFs;
pub use copy::{copy_fs, copy_tree};
pub use handle::{FileHandle, OpenMode, WriteBack};
pub use local::LocalFs;
pub use memory::MemoryFs;
pub use primitives::{Node, NodeKind, Primitives};
pub use traits::{DirEntry, DirEntryKind, Filesystem};
