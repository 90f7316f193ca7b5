// ABOUTME: JSON deep-merge used to combine restored snapshots with default state.
// ABOUTME: Objects merge recursively; everything else in the patch replaces the base.

use serde_json::Value;

/// Merge `patch` over `base`, returning the combined value.
///
/// Objects merge key by key, recursing into keys present on both sides.
/// Keys absent from the patch keep their base value. Any non-object patch
/// value (including null and arrays) replaces the base value wholesale.
pub fn deep_merge(base: Value, patch: Value) -> Value {
    match (base, patch) {
        (Value::Object(mut base_map), Value::Object(patch_map)) => {
            for (key, patch_value) in patch_map {
                match base_map.remove(&key) {
                    Some(base_value) => {
                        base_map.insert(key, deep_merge(base_value, patch_value));
                    }
                    None => {
                        base_map.insert(key, patch_value);
                    }
                }
            }
            Value::Object(base_map)
        }
        (_, patch) => patch,
    }
}
