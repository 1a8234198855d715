//! Merge rules for edit operations
//!
//! `deep_merge` recurses where both sides hold an Object and lets the
//! incoming side win everywhere else. Arrays are replaced whole, never merged
//! element-wise. The merge is not commutative.

use serde_json::{Map, Value};

/// Deep-merge `incoming` into `base` and return the result.
///
/// If either side is not an Object, `incoming` replaces `base`.
pub fn deep_merge(base: Value, incoming: Value) -> Value {
    match (base, incoming) {
        (Value::Object(mut base), Value::Object(incoming)) => {
            merge_maps(&mut base, incoming);
            Value::Object(base)
        }
        (_, incoming) => incoming,
    }
}

fn merge_maps(base: &mut Map<String, Value>, incoming: Map<String, Value>) {
    for (key, value) in incoming {
        match base.get_mut(&key) {
            Some(existing) if existing.is_object() && value.is_object() => {
                let current = existing.take();
                *existing = deep_merge(current, value);
            }
            _ => {
                base.insert(key, value);
            }
        }
    }
}

/// Overwrite the top-level members of `base` with those of `incoming`.
///
/// Nested Objects in `incoming` replace their counterparts instead of being
/// merged. A non-Object `base` is treated as empty.
pub fn shallow_merge(base: Value, incoming: Map<String, Value>) -> Map<String, Value> {
    let mut merged = match base {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    for (key, value) in incoming {
        merged.insert(key, value);
    }
    merged
}
