//! Slash-delimited key paths over the document tree
//!
//! A key path such as `users/1/email` addresses nested Object members. Only
//! Objects are traversed: arrays are leaves as far as addressing goes, so
//! `tags/0` never reaches into an array.
//!
//! Writes create missing intermediate Objects and **silently replace**
//! intermediates that exist but are not Objects. Writing `a/b` when `a` holds
//! a string throws the string away.

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};

use crate::error::{DocError, DocResult};

/// Path separator inside key paths.
pub const SEPARATOR: char = '/';

/// Parsed key path. Always has at least one segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyPath {
    segments: Vec<String>,
}

impl KeyPath {
    /// Split `path` on `/`.
    ///
    /// Empty segments (`a//b`, a trailing `/`) are kept as ordinary keys.
    /// Only the empty string itself is rejected.
    pub fn parse(path: &str) -> DocResult<Self> {
        if path.is_empty() {
            return Err(DocError::InvalidPath {
                path: String::new(),
                reason: "no key provided".into(),
            });
        }
        Ok(Self {
            segments: path.split(SEPARATOR).map(str::to_owned).collect(),
        })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Final segment.
    pub fn last(&self) -> &str {
        // parse() guarantees at least one segment
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// Path without its final segment, or `None` for a top-level key.
    pub fn parent(&self) -> Option<KeyPath> {
        if self.segments.len() < 2 {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Path extended by one segment. `segment` is taken literally, slashes
    /// included.
    pub fn child(&self, segment: &str) -> KeyPath {
        let mut segments = self.segments.clone();
        segments.push(segment.to_owned());
        Self { segments }
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

impl FromStr for KeyPath {
    type Err = DocError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// True iff every segment resolves through nested Objects.
pub fn exists(root: &Value, path: &KeyPath) -> bool {
    read(root, path).is_some()
}

/// Value at `path`, if every segment resolves.
pub fn read<'a>(root: &'a Value, path: &KeyPath) -> Option<&'a Value> {
    path.segments
        .iter()
        .try_fold(root, |node, segment| node.as_object()?.get(segment))
}

/// Mutable value at `path`, if every segment resolves.
pub fn read_mut<'a>(root: &'a mut Value, path: &KeyPath) -> Option<&'a mut Value> {
    path.segments
        .iter()
        .try_fold(root, |node, segment| node.as_object_mut()?.get_mut(segment))
}

/// Set `path` to `value`, creating or replacing intermediates as needed.
pub fn write(root: &mut Value, path: &KeyPath, value: Value) {
    let Some((last, parents)) = path.segments.split_last() else {
        return;
    };

    let mut node = root;
    for segment in parents {
        let map = ensure_object(node);
        node = map
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    ensure_object(node).insert(last.clone(), value);
}

/// Remove the final segment of `path` from its parent Object.
///
/// Sibling order is preserved. Returns the removed value.
pub fn remove(root: &mut Value, path: &KeyPath) -> Option<Value> {
    let parent = match path.parent() {
        Some(parent) => read_mut(root, &parent)?,
        None => root,
    };
    parent.as_object_mut()?.shift_remove(path.last())
}

/// Make `node` an Object (discarding any other content) and borrow its map.
fn ensure_object(node: &mut Value) -> &mut Map<String, Value> {
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    match node {
        Value::Object(map) => map,
        _ => unreachable!("node was just replaced with an object"),
    }
}
