//! Leaf search over the document tree
//!
//! Walks Objects and Arrays depth-first and reports every leaf equal to the
//! needle, keyed by its slash-joined path. Array elements use their index as
//! the path segment, so search paths can name locations that key-path
//! addressing cannot reach.

use serde_json::{Map, Value};

use crate::validation::{numbers_equal, string_form};

/// How a leaf is compared with the needle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    /// Equal values, or equal string forms: `"5"` matches `5` and `"true"`
    /// matches `true`.
    #[default]
    Loose,
    /// Equal values only.
    Strict,
}

impl SearchMode {
    /// Numbers are compared by value in both modes, so `5` matches `5.0`.
    pub fn matches(self, leaf: &Value, needle: &Value) -> bool {
        let equal = match (leaf, needle) {
            (Value::Number(a), Value::Number(b)) => numbers_equal(a, b),
            _ => leaf == needle,
        };
        match self {
            SearchMode::Strict => equal,
            SearchMode::Loose => equal || string_form(leaf) == string_form(needle),
        }
    }
}

/// All leaves under `root` matching `needle`, in traversal order.
///
/// A `root` that is itself a leaf yields no matches.
pub fn search(root: &Value, needle: &Value, mode: SearchMode) -> Map<String, Value> {
    let mut results = Map::new();
    walk(root, needle, mode, "", &mut results);
    results
}

fn walk(node: &Value, needle: &Value, mode: SearchMode, prefix: &str, results: &mut Map<String, Value>) {
    let join = |segment: &str| {
        if prefix.is_empty() {
            segment.to_owned()
        } else {
            format!("{}/{}", prefix, segment)
        }
    };

    match node {
        Value::Object(map) => {
            for (key, child) in map {
                visit(child, needle, mode, join(key), results);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                visit(child, needle, mode, join(&index.to_string()), results);
            }
        }
        _ => {}
    }
}

fn visit(child: &Value, needle: &Value, mode: SearchMode, path: String, results: &mut Map<String, Value>) {
    match child {
        Value::Object(_) | Value::Array(_) => walk(child, needle, mode, &path, results),
        leaf => {
            if mode.matches(leaf, needle) {
                results.insert(path, leaf.clone());
            }
        }
    }
}
