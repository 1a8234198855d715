//! Per-field regular-expression validation
//!
//! Patterns live inside the document itself, under the reserved root key
//! [`REGEX_TABLE_KEY`], as a map from field key to pattern text:
//!
//! ```json
//! { "_regex": { "email": "^[^@]+@[^@]+$" } }
//! ```
//!
//! Before a create or edit writes a value, every top-level member of that
//! value whose key has a registered pattern must match it. A value that is
//! not an Object is checked against the pattern for the final path segment.
//! Matching is an unanchored search, so patterns carry their own `^`/`$`.

use hashbrown::HashMap;
use regex::Regex;
use serde_json::{Map, Number, Value};

use crate::error::{DocError, DocResult};
use crate::path::KeyPath;

/// Root key holding the field-key → pattern table.
pub const REGEX_TABLE_KEY: &str = "_regex";

/// The pattern table of `doc`, if present and an Object.
pub fn regex_table(doc: &Value) -> Option<&Map<String, Value>> {
    doc.get(REGEX_TABLE_KEY)?.as_object()
}

/// Whether `path` lies inside the pattern table.
pub fn in_regex_table(path: &KeyPath) -> bool {
    path.segments().first().map(String::as_str) == Some(REGEX_TABLE_KEY)
}

/// Text a pattern is matched against.
///
/// Strings are used verbatim; everything else is its compact JSON text,
/// except that an integral float prints like the integer it equals (`5.0`
/// and `5` both give `"5"`).
pub fn string_form(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => number_form(n),
        other => other.to_string(),
    }
}

/// Largest magnitude below which every integral `f64` is exact.
const MAX_EXACT_F64: f64 = 9_007_199_254_740_992.0;

fn number_form(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < MAX_EXACT_F64 => {
            (f as i64).to_string()
        }
        _ => n.to_string(),
    }
}

/// Numeric equality across integer and float representations.
///
/// Integers compare exactly; as soon as either side is a float both are
/// compared as `f64`.
pub fn numbers_equal(a: &Number, b: &Number) -> bool {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return x == y;
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return x == y;
    }
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

/// Checks values against the pattern table, caching compiled patterns.
#[derive(Debug, Default)]
pub struct Validator {
    cache: HashMap<String, Regex>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile `pattern` (registered for `key`), reusing a cached build.
    pub fn compile(&mut self, key: &str, pattern: &str) -> DocResult<&Regex> {
        if !self.cache.contains_key(pattern) {
            let regex = Regex::new(pattern).map_err(|e| DocError::InvalidPattern {
                key: key.to_owned(),
                pattern: pattern.to_owned(),
                reason: e.to_string(),
            })?;
            self.cache.insert(pattern.to_owned(), regex);
        }
        Ok(&self.cache[pattern])
    }

    /// Validate `value` about to be written at `path` against `doc`'s table.
    ///
    /// Writes into the table itself are not checked: its entries are
    /// patterns, not field values.
    pub fn check(&mut self, doc: &Value, path: &KeyPath, value: &Value) -> DocResult<()> {
        if in_regex_table(path) {
            return Ok(());
        }
        let Some(table) = regex_table(doc) else {
            return Ok(());
        };

        match value {
            Value::Object(fields) => {
                for (key, field) in fields {
                    self.check_field(table, key, field)?;
                }
                Ok(())
            }
            other => self.check_field(table, path.last(), other),
        }
    }

    fn check_field(&mut self, table: &Map<String, Value>, key: &str, value: &Value) -> DocResult<()> {
        // non-string entries are not patterns
        let Some(pattern) = table.get(key).and_then(Value::as_str) else {
            return Ok(());
        };

        let text = string_form(value);
        if self.compile(key, pattern)?.is_match(&text) {
            Ok(())
        } else {
            Err(DocError::Validation {
                key: key.to_owned(),
                pattern: pattern.to_owned(),
                value: text,
            })
        }
    }

    /// Number of compiled patterns held in the cache.
    pub fn cached_patterns(&self) -> usize {
        self.cache.len()
    }
}
