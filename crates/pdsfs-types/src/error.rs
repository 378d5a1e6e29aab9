//! Identifier parse errors.

use thiserror::Error;

/// Why a LID, VID or LIDVID string was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    #[error("LID {0:?} does not start with \"urn:nasa:pds:\"")]
    MissingPrefix(String),

    #[error("LID {lid:?} has {count} segments; expected 1 to 3")]
    SegmentCount { lid: String, count: usize },

    #[error("invalid LID segment {0:?}")]
    InvalidSegment(String),

    #[error("invalid VID {0:?}")]
    InvalidVid(String),

    #[error("VID {0} has no successor")]
    VidOverflow(String),

    #[error("LIDVID {0:?} is not of the form <lid>::<vid>")]
    InvalidLidvid(String),

    #[error("cannot extend product LID {0}")]
    TooDeep(String),
}
