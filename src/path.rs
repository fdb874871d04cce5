//! Concrete locations within a document and their string renderings.
//!
//! A location is a slice of [`PathKey`]s, starting below the root. It renders
//! either as a canonical path string (`$['store']['book'][0]`), which is what
//! the listener registry uses as its key, or as a JSON Pointer
//! (`/store/book/0`).
use std::fmt;

use itertools::Itertools;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    static ref BARE_SEGMENT: Regex = Regex::new(r"^[0-9*]+$").unwrap();
}

/// An array element index or object member name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathKey {
    Index(usize),
    Name(String),
}

impl PathKey {
    /// The array index this key addresses, if any. Names made of digits only
    /// address array elements too.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            PathKey::Index(i) => Some(*i),
            PathKey::Name(name) => {
                if !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit()) {
                    name.parse().ok()
                } else {
                    None
                }
            }
        }
    }

    pub fn to_name(&self) -> String {
        match self {
            PathKey::Index(i) => i.to_string(),
            PathKey::Name(name) => name.to_owned(),
        }
    }

    fn render(&self) -> String {
        match self {
            PathKey::Index(i) => format!("[{i}]"),
            PathKey::Name(name) if BARE_SEGMENT.is_match(name) => format!("[{name}]"),
            PathKey::Name(name) => {
                format!("['{}']", name.replace('\\', "\\\\").replace('\'', "\\'"))
            }
        }
    }
}

impl fmt::Display for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathKey::Index(i) => write!(f, "{i}"),
            PathKey::Name(name) => f.write_str(name),
        }
    }
}

impl From<usize> for PathKey {
    fn from(index: usize) -> Self {
        PathKey::Index(index)
    }
}

impl From<&str> for PathKey {
    fn from(name: &str) -> Self {
        PathKey::Name(name.to_owned())
    }
}

impl From<String> for PathKey {
    fn from(name: String) -> Self {
        PathKey::Name(name)
    }
}

/// Render a location as a canonical path string.
///
/// Keys made only of digits (or `*`) render bare inside brackets, all others
/// are quoted: `$['a'][0]['b c']`.
pub fn to_path_string(path: &[PathKey]) -> String {
    format!("${}", path.iter().map(PathKey::render).join(""))
}

/// Render a location as a JSON Pointer, escaping `~` as `~0` and `/` as `~1`.
/// The root renders as an empty string.
pub fn to_pointer(path: &[PathKey]) -> String {
    path.iter()
        .map(|key| format!("/{}", key.to_name().replace('~', "~0").replace('/', "~1")))
        .join("")
}
