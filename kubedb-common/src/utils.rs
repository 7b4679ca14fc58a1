// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

use serde::Serialize;
use blake3::hash as blake3_hash;
use serde_json::Value;

/// Compute a stable hash for any serializable manifest.
///
/// Object keys are sorted and `null` members dropped before hashing, so two
/// manifests that only differ in key order or in explicit nulls hash the same.
pub fn compute_object_hash<T>(object: &T) -> Result<String, serde_json::Error>
where
    T: Serialize,
{
    let value = serde_json::to_value(object)?;
    let canonical = serde_json::to_string(&sort_json(strip_nulls(value)))?;

    Ok(blake3_hash(canonical.as_bytes()).to_hex().to_string())
}

/// Recursively sort JSON objects
pub fn sort_json(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            Value::Object(entries.into_iter().map(|(k, v)| (k, sort_json(v))).collect())
        },
        Value::Array(arr) => Value::Array(arr.into_iter().map(sort_json).collect()),
        _ => value,
    }
}

/// Recursively drop object members whose value is `null`
pub fn strip_nulls(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, strip_nulls(v)))
                .collect()
        ),
        Value::Array(arr) => Value::Array(arr.into_iter().map(strip_nulls).collect()),
        _ => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_hash_ignores_key_order_and_nulls() {
        let a = json!({"spec": {"version": "8.0.35", "replicas": 3}, "status": null});
        let b = json!({"spec": {"replicas": 3, "version": "8.0.35"}});

        assert_eq!(compute_object_hash(&a).unwrap(), compute_object_hash(&b).unwrap());
    }

    #[test]
    fn test_hash_changes_with_content() {
        let a = json!({"spec": {"replicas": 3}});
        let b = json!({"spec": {"replicas": 1}});

        assert_ne!(compute_object_hash(&a).unwrap(), compute_object_hash(&b).unwrap());
    }

    #[test]
    fn test_strip_nulls_keeps_array_positions() {
        let value = strip_nulls(json!({"items": [null, {"a": null, "b": 1}]}));

        assert_eq!(value, json!({"items": [null, {"b": 1}]}));
    }
}
