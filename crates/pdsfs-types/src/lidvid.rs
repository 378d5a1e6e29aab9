//! LIDVIDs: a LID pinned to one version.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{IdError, Lid, Vid};

/// One immutable snapshot of one archive entity, written `<lid>::<vid>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Lidvid {
    lid: Lid,
    vid: Vid,
}

impl Lidvid {
    pub fn new(lid: Lid, vid: Vid) -> Self {
        Self { lid, vid }
    }

    pub fn lid(&self) -> &Lid {
        &self.lid
    }

    pub fn vid(&self) -> Vid {
        self.vid
    }
}

impl fmt::Display for Lidvid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.lid, self.vid)
    }
}

impl FromStr for Lidvid {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lid, vid) = s
            .split_once("::")
            .ok_or_else(|| IdError::InvalidLidvid(s.to_string()))?;
        Ok(Self {
            lid: lid.parse()?,
            vid: vid.parse()?,
        })
    }
}

impl TryFrom<String> for Lidvid {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Lidvid> for String {
    fn from(lidvid: Lidvid) -> Self {
        lidvid.to_string()
    }
}
