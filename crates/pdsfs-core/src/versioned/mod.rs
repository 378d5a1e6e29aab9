//! Multiversioned archive storage.
//!
//! - [`layout`]: naming of LID and version directories.
//! - [`index`]: the per-version index codec.
//! - [`VersionedStore`]: creation and lookup of versions.
//! - [`VersionView`]: a single version presented as a plain tree.
//! - [`CowFs`]: edits staged over a view, committed as new versions.

mod commit;
mod cow;
pub mod index;
pub mod layout;
mod store;
mod view;

pub use cow::{CowFs, Delta};
pub use index::VersionIndex;
pub use layout::{categorize, FsCategory};
pub use store::VersionedStore;
pub use view::VersionView;
