//! pdsfs-types: identifiers for archive entities.
//!
//! A PDS4 archive names every entity with a logical identifier (LID):
//!
//! ```text
//! urn:nasa:pds:hst_00000                              bundle
//! urn:nasa:pds:hst_00000:data_xxx_raw                 collection
//! urn:nasa:pds:hst_00000:data_xxx_raw:u2q9xx01j_raw   product
//! ```
//!
//! A version identifier (VID) is scoped to one LID, and the pair, written
//! `<lid>::<vid>`, is a LIDVID naming one immutable snapshot.

mod error;
mod lid;
mod lidvid;
mod vid;

pub use error::IdError;
pub use lid::{Lid, LID_PREFIX};
pub use lidvid::Lidvid;
pub use vid::Vid;
