//! Best-effort deep merge of host update payloads into stored documents.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

#[derive(Debug)]
pub enum PatchError {
    NotAnObject,
    Json(serde_json::Error),
}

impl std::fmt::Display for PatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PatchError::NotAnObject => write!(f, "update payload is not an object"),
            PatchError::Json(e) => write!(f, "update payload rejected: {}", e),
        }
    }
}

impl std::error::Error for PatchError {}

impl From<serde_json::Error> for PatchError {
    fn from(e: serde_json::Error) -> Self {
        PatchError::Json(e)
    }
}

/// Turns `{"config.animation.type": "torch"}` into nested objects. Keys
/// prefixed with `-=` are kept as deletion markers for [`deep_merge`].
pub fn expand_dotted(value: &Value) -> Value {
    let Value::Object(map) = value else {
        return value.clone();
    };
    let mut out = Map::new();
    'keys: for (key, v) in map {
        let v = expand_dotted(v);
        let mut parts = key.split('.').collect::<Vec<_>>();
        let Some(last) = parts.pop() else { continue };
        let mut cursor = &mut out;
        for p in parts {
            let slot = cursor
                .entry(p.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            cursor = match slot {
                Value::Object(next) => next,
                _ => continue 'keys,
            };
        }
        match (cursor.get_mut(last), v) {
            (Some(existing @ Value::Object(_)), v @ Value::Object(_)) => deep_merge(existing, &v),
            (_, v) => {
                cursor.insert(last.to_string(), v);
            }
        }
    }
    Value::Object(out)
}

/// Recursively merges `patch` into `target`. Objects merge key by key,
/// everything else replaces. `"-=key": null` removes `key`.
pub fn deep_merge(target: &mut Value, patch: &Value) {
    match (target, patch) {
        (Value::Object(t), Value::Object(p)) => {
            for (k, v) in p {
                if let Some(del) = k.strip_prefix("-=") {
                    t.remove(del);
                    continue;
                }
                match t.get_mut(k) {
                    Some(slot) if slot.is_object() && v.is_object() => deep_merge(slot, v),
                    _ => {
                        t.insert(k.clone(), v.clone());
                    }
                }
            }
        }
        (t, p) => *t = p.clone(),
    }
}

/// Applies an update payload to a typed document and returns the merged copy.
/// The stored document is left untouched when the payload does not fit.
pub fn apply_patch<T>(doc: &T, changes: &Value) -> Result<T, PatchError>
where
    T: Serialize + DeserializeOwned,
{
    if !changes.is_object() {
        return Err(PatchError::NotAnObject);
    }
    let mut base = serde_json::to_value(doc)?;
    deep_merge(&mut base, &expand_dotted(changes));
    Ok(serde_json::from_value(base)?)
}
