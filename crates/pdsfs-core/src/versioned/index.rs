//! Version index codec.
//!
//! Every version directory may hold a `subdir$versions.txt` pinning each
//! child component to the VID it had in that version:
//!
//! ```text
//! data_xxx_raw 2
//! document 1.0
//! ```
//!
//! One `"<name> <vid>\n"` line per child, sorted by name.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{VfsError, VfsResult};

/// Child name to VID string.
pub type VersionIndex = BTreeMap<String, String>;

static VID_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^[0-9.]+$").expect("valid regex")
});

/// Parse the text of an index file.
///
/// Blank lines are skipped. Line numbers in errors are 1-based.
pub fn parse(text: &str) -> VfsResult<VersionIndex> {
    let mut index = VersionIndex::new();
    for (n, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        let [name, vid] = fields[..] else {
            return Err(VfsError::MalformedVersionIndex {
                line: n + 1,
                reason: format!("expected 2 fields, found {}", fields.len()),
            });
        };
        if !VID_FIELD.is_match(vid) {
            return Err(VfsError::MalformedVersionIndex {
                line: n + 1,
                reason: format!("bad VID {vid:?}"),
            });
        }
        index.insert(name.to_string(), vid.to_string());
    }
    Ok(index)
}

/// Render an index as file text.
pub fn serialize(index: &VersionIndex) -> VfsResult<String> {
    let mut out = String::new();
    for (n, (name, vid)) in index.iter().enumerate() {
        if name.is_empty() || name.contains(char::is_whitespace) {
            return Err(VfsError::MalformedVersionIndex {
                line: n + 1,
                reason: format!("bad child name {name:?}"),
            });
        }
        if !VID_FIELD.is_match(vid) {
            return Err(VfsError::MalformedVersionIndex {
                line: n + 1,
                reason: format!("bad VID {vid:?}"),
            });
        }
        out.push_str(name);
        out.push(' ');
        out.push_str(vid);
        out.push('\n');
    }
    Ok(out)
}
