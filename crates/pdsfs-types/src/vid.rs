//! Version identifiers.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::IdError;

static VID_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^(0|[1-9][0-9]*)(?:\.(0|[1-9][0-9]*))?$").expect("VID regex is valid")
});

/// A version number, `major` or `major.minor`.
///
/// The textual form is preserved: `3` displays as `3` and `1.0` as `1.0`,
/// so version directory names round-trip exactly. Leading zeros are
/// rejected, giving every VID one spelling. Ordering compares
/// numerically with a missing minor sorting before any explicit minor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Vid {
    major: u32,
    minor: Option<u32>,
}

impl Vid {
    /// A major-only VID such as `3`.
    pub const fn new(major: u32) -> Self {
        Self { major, minor: None }
    }

    /// A dotted VID such as `1.0`.
    pub const fn with_minor(major: u32, minor: u32) -> Self {
        Self {
            major,
            minor: Some(minor),
        }
    }

    pub fn major(&self) -> u32 {
        self.major
    }

    pub fn minor(&self) -> Option<u32> {
        self.minor
    }

    /// The next major version, keeping the textual shape (`3` -> `4`,
    /// `1.2` -> `2.0`).
    pub fn next_major(&self) -> Result<Self, IdError> {
        let major = self
            .major
            .checked_add(1)
            .ok_or_else(|| IdError::VidOverflow(self.to_string()))?;
        Ok(Self {
            major,
            minor: self.minor.map(|_| 0),
        })
    }

    /// The next minor version (`3` -> `3.1`, `1.2` -> `1.3`).
    pub fn next_minor(&self) -> Result<Self, IdError> {
        let minor = match self.minor {
            None => 1,
            Some(m) => m
                .checked_add(1)
                .ok_or_else(|| IdError::VidOverflow(self.to_string()))?,
        };
        Ok(Self {
            major: self.major,
            minor: Some(minor),
        })
    }
}

impl Ord for Vid {
    fn cmp(&self, other: &Self) -> Ordering {
        self.major
            .cmp(&other.major)
            .then_with(|| self.minor.cmp(&other.minor))
    }
}

impl PartialOrd for Vid {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Vid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.minor {
            Some(minor) => write!(f, "{}.{}", self.major, minor),
            None => write!(f, "{}", self.major),
        }
    }
}

impl FromStr for Vid {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = VID_RE
            .captures(s)
            .ok_or_else(|| IdError::InvalidVid(s.to_string()))?;
        let parse = |text: &str| {
            text.parse::<u32>()
                .map_err(|_| IdError::InvalidVid(s.to_string()))
        };
        let major = parse(&caps[1])?;
        let minor = caps.get(2).map(|m| parse(m.as_str())).transpose()?;
        Ok(Self { major, minor })
    }
}

impl TryFrom<String> for Vid {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Vid> for String {
    fn from(vid: Vid) -> Self {
        vid.to_string()
    }
}
