//! Logical identifiers.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::IdError;

/// Every LID in the archive lives under this URN namespace.
pub const LID_PREFIX: &str = "urn:nasa:pds:";

static SEGMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^[a-z0-9][a-z0-9._-]*$").expect("segment regex is valid")
});

/// A logical identifier for a bundle, collection or product.
///
/// Segments are lowercase and never contain `$` or `/`, so they can be used
/// directly as directory names next to version directories.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Lid {
    parts: Vec<String>,
}

impl Lid {
    /// Build a LID from its segments, bundle first.
    pub fn from_parts<S: AsRef<str>>(parts: &[S]) -> Result<Self, IdError> {
        if parts.is_empty() || parts.len() > 3 {
            return Err(IdError::SegmentCount {
                lid: parts
                    .iter()
                    .map(|p| p.as_ref())
                    .collect::<Vec<_>>()
                    .join(":"),
                count: parts.len(),
            });
        }
        let mut owned = Vec::with_capacity(parts.len());
        for part in parts {
            let part = part.as_ref();
            if !Self::is_valid_segment(part) {
                return Err(IdError::InvalidSegment(part.to_string()));
            }
            owned.push(part.to_string());
        }
        Ok(Self { parts: owned })
    }

    /// Whether `segment` may appear in a LID.
    pub fn is_valid_segment(segment: &str) -> bool {
        SEGMENT_RE.is_match(segment)
    }

    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    /// 1 for a bundle, 2 for a collection, 3 for a product.
    pub fn depth(&self) -> usize {
        self.parts.len()
    }

    pub fn bundle_id(&self) -> &str {
        &self.parts[0]
    }

    pub fn collection_id(&self) -> Option<&str> {
        self.parts.get(1).map(String::as_str)
    }

    pub fn product_id(&self) -> Option<&str> {
        self.parts.get(2).map(String::as_str)
    }

    /// The last segment.
    pub fn last_segment(&self) -> &str {
        // parts is never empty
        &self.parts[self.parts.len() - 1]
    }

    pub fn is_bundle(&self) -> bool {
        self.depth() == 1
    }

    pub fn is_collection(&self) -> bool {
        self.depth() == 2
    }

    pub fn is_product(&self) -> bool {
        self.depth() == 3
    }

    /// The enclosing LID, or `None` for a bundle.
    pub fn parent(&self) -> Option<Lid> {
        if self.is_bundle() {
            None
        } else {
            Some(Self {
                parts: self.parts[..self.parts.len() - 1].to_vec(),
            })
        }
    }

    /// The LID one level down.
    pub fn extend(&self, segment: &str) -> Result<Lid, IdError> {
        if self.is_product() {
            return Err(IdError::TooDeep(self.to_string()));
        }
        if !Self::is_valid_segment(segment) {
            return Err(IdError::InvalidSegment(segment.to_string()));
        }
        let mut parts = self.parts.clone();
        parts.push(segment.to_string());
        Ok(Self { parts })
    }

    /// Whether `self` equals `other` or lies beneath it.
    pub fn starts_with(&self, other: &Lid) -> bool {
        self.parts.starts_with(&other.parts)
    }

    /// Map a raw data collection (or a product in one) to its browse
    /// counterpart: `data_<inst>_<suffix>` becomes `browse_<inst>_<suffix>`.
    pub fn to_browse_lid(&self) -> Option<Lid> {
        let collection = self.collection_id()?;
        let rest = collection.strip_prefix("data_")?;
        let mut parts = self.parts.clone();
        parts[1] = format!("browse_{rest}");
        Some(Self { parts })
    }
}

impl fmt::Display for Lid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", LID_PREFIX, self.parts.join(":"))
    }
}

impl FromStr for Lid {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix(LID_PREFIX)
            .ok_or_else(|| IdError::MissingPrefix(s.to_string()))?;
        let parts: Vec<&str> = rest.split(':').collect();
        if parts.len() > 3 {
            return Err(IdError::SegmentCount {
                lid: s.to_string(),
                count: parts.len(),
            });
        }
        Self::from_parts(&parts)
    }
}

impl TryFrom<String> for Lid {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Lid> for String {
    fn from(lid: Lid) -> Self {
        lid.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn parses_product_lid() {
        let lid: Lid = "urn:nasa:pds:hst_00000:data_xxx_raw:u2q9xx01j_raw"
            .parse()
            .unwrap();
        assert_eq!(lid.depth(), 3);
        assert_eq!(lid.bundle_id(), "hst_00000");
        assert_eq!(lid.collection_id(), Some("data_xxx_raw"));
        assert_eq!(lid.product_id(), Some("u2q9xx01j_raw"));
        assert_eq!(lid.last_segment(), "u2q9xx01j_raw");
        assert!(lid.is_product());
    }

    #[rstest]
    #[case::no_prefix("hst_00000")]
    #[case::empty_segment("urn:nasa:pds:hst_00000::x")]
    #[case::uppercase("urn:nasa:pds:HST")]
    #[case::dollar("urn:nasa:pds:v$1")]
    #[case::too_many("urn:nasa:pds:a:b:c:d")]
    fn rejects_malformed(#[case] text: &str) {
        assert!(text.parse::<Lid>().is_err(), "{text} should not parse");
    }

    #[test]
    fn parent_and_extend_are_inverse() {
        let bundle: Lid = "urn:nasa:pds:hst_00000".parse().unwrap();
        assert_eq!(bundle.parent(), None);

        let coll = bundle.extend("data_xxx_raw").unwrap();
        assert_eq!(coll.to_string(), "urn:nasa:pds:hst_00000:data_xxx_raw");
        assert_eq!(coll.parent(), Some(bundle.clone()));
        assert!(coll.starts_with(&bundle));
        assert!(!bundle.starts_with(&coll));

        let product = coll.extend("p").unwrap();
        assert_eq!(
            product.extend("deeper"),
            Err(IdError::TooDeep(product.to_string()))
        );
    }

    #[test]
    fn browse_lid_rewrites_data_collection() {
        let lid: Lid = "urn:nasa:pds:hst_00000:data_wfpc2_raw:u2q9xx01j"
            .parse()
            .unwrap();
        let browse = lid.to_browse_lid().unwrap();
        assert_eq!(
            browse.to_string(),
            "urn:nasa:pds:hst_00000:browse_wfpc2_raw:u2q9xx01j"
        );

        let doc: Lid = "urn:nasa:pds:hst_00000:document".parse().unwrap();
        assert_eq!(doc.to_browse_lid(), None);
    }
}
