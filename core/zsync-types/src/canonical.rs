//! Canonical JSON encoding.
//!
//! `serde_json` keeps object keys in insertion order once the
//! `preserve_order` feature is enabled anywhere in the dependency graph, so
//! key order is normalized here instead of relying on the map type.

use serde_json::{Map, Value};

/// Returns a copy of `value` with every object's keys in ascending order.
#[must_use]
pub fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let mut sorted = Map::with_capacity(entries.len());
            for (key, inner) in entries {
                sorted.insert(key.clone(), canonicalize(inner));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

/// Encodes `value` as compact JSON with canonical key order.
pub fn to_string(value: &Value) -> serde_json::Result<String> {
    serde_json::to_string(&canonicalize(value))
}
