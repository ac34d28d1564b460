//! JSON merge patch (RFC 7396) over config layers.
//!
//! Objects merge key by key, `null` removes a key, anything else replaces.

use serde_json::{Map, Value};

/// Apply `patch` on top of `target`.
///
/// ```
/// use serde_json::json;
/// use closet_config::merge::merge_patch;
///
/// let global = json!({"generator": {"module_name": "A", "store_name": "S"}});
/// let local = json!({"generator": {"module_name": "B"}, "logging": {"json": true}});
/// assert_eq!(
///     merge_patch(global, local),
///     json!({"generator": {"module_name": "B", "store_name": "S"}, "logging": {"json": true}})
/// );
/// ```
pub fn merge_patch(target: Value, patch: Value) -> Value {
    let Value::Object(patch) = patch else {
        return patch;
    };
    let mut merged = match target {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    for (key, value) in patch {
        if value.is_null() {
            merged.remove(&key);
        } else {
            let base = merged.remove(&key).unwrap_or(Value::Null);
            merged.insert(key, merge_patch(base, value));
        }
    }
    Value::Object(merged)
}

/// Fold layers lowest-precedence first.
pub fn merge_layers(layers: impl IntoIterator<Item = Value>) -> Value {
    layers
        .into_iter()
        .fold(Value::Object(Map::new()), merge_patch)
}
