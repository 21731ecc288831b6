//! Layered deep merge over JSON documents.
//!
//! Rules, dispatched on the (base, overlay) variant pair:
//! - object + object: merge key by key; keys new in `overlay` are appended
//!   after `base`'s keys
//! - array + array: `base` elements then `overlay` elements, no dedup
//! - anything else: `overlay` replaces `base`
//!
//! Env and peer lists are built up across layers, so concatenation keeps
//! every contributor's entries, duplicates included. Resolving duplicate env
//! names is left to the orchestration layer.

use serde_json::{Map, Value};

/// Merge `overlay` onto `base`, returning a fresh document. Neither argument
/// is modified.
pub fn merge(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Object(b), Value::Object(o)) => {
            let mut out = b.clone();
            for (key, ov) in o {
                let merged = match b.get(key) {
                    Some(bv) => merge(bv, ov),
                    None => ov.clone(),
                };
                out.insert(key.clone(), merged);
            }
            Value::Object(out)
        }
        (Value::Array(b), Value::Array(o)) => {
            Value::Array(b.iter().chain(o.iter()).cloned().collect())
        }
        _ => overlay.clone(),
    }
}

/// Apply one whole layer. An absent (`null`) layer contributes nothing.
pub fn apply_layer(acc: &Value, layer: &Value) -> Value {
    if layer.is_null() {
        acc.clone()
    } else {
        merge(acc, layer)
    }
}

/// Fold `layers` left to right onto an empty document.
pub fn merge_all<'a, I>(layers: I) -> Value
where
    I: IntoIterator<Item = &'a Value>,
{
    layers
        .into_iter()
        .fold(Value::Object(Map::new()), |acc, layer| apply_layer(&acc, layer))
}
