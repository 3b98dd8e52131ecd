//! JSON flattening - convert nested JSON into a single-level key/value row
//!
//! Object keys are joined to their parent path with `.` and array elements
//! get bracket-indexed suffixes, so `{"a": {"b": 1}, "c": [10, 20]}`
//! flattens to `{"a.b": 1, "c[0]": 10, "c[1]": 20}`.
//!
//! Recursion is unbounded: a pathologically deep message body will consume
//! stack in proportion to its nesting depth. That resource bound belongs to
//! whoever accepted the payload, not to this module.

use crate::frame::types::Scalar;
use serde_json::Value;
use std::collections::BTreeMap;

/// One message body flattened to dotted/indexed keys.
///
/// A `BTreeMap` keeps the keys in alphabetical order, which is what makes
/// downstream column ordering deterministic.
pub type FlattenedRow = BTreeMap<String, Scalar>;

/// Flatten a parsed JSON value into a single-level row.
///
/// Scalars terminate the recursion and are stored verbatim under their
/// accumulated key. A scalar at the root (no accumulated key) is stored
/// under `"value"`.
pub fn flatten(value: &Value) -> FlattenedRow {
    let mut row = FlattenedRow::new();
    flatten_into("", value, &mut row);
    row
}

fn flatten_into(prefix: &str, value: &Value, out: &mut FlattenedRow) {
    match value {
        Value::Object(obj) => {
            for (key, child) in obj {
                let child_key = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten_into(&child_key, child, out);
            }
        }
        Value::Array(arr) => {
            for (idx, child) in arr.iter().enumerate() {
                flatten_into(&format!("{}[{}]", prefix, idx), child, out);
            }
        }
        scalar => {
            let key = if prefix.is_empty() { "value" } else { prefix };
            if let Some(s) = Scalar::from_json(scalar) {
                out.insert(key.to_string(), s);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_object_and_array() {
        let row = flatten(&json!({"a": {"b": 1}, "c": [10, 20]}));

        assert_eq!(row.len(), 3);
        assert_eq!(row.get("a.b"), Some(&Scalar::Float64(1.0)));
        assert_eq!(row.get("c[0]"), Some(&Scalar::Float64(10.0)));
        assert_eq!(row.get("c[1]"), Some(&Scalar::Float64(20.0)));
    }

    #[test]
    fn test_objects_inside_arrays() {
        let row = flatten(&json!({"readings": [{"v": 1.5}, {"v": 2.5}]}));

        assert_eq!(row.get("readings[0].v"), Some(&Scalar::Float64(1.5)));
        assert_eq!(row.get("readings[1].v"), Some(&Scalar::Float64(2.5)));
    }

    #[test]
    fn test_scalar_kinds_preserved() {
        let row = flatten(&json!({"f": 1.5, "s": "x", "b": false, "n": null}));

        assert_eq!(row.get("f"), Some(&Scalar::Float64(1.5)));
        assert_eq!(row.get("s"), Some(&Scalar::Str("x".to_string())));
        assert_eq!(row.get("b"), Some(&Scalar::Bool(false)));
        assert_eq!(row.get("n"), Some(&Scalar::Null));
    }

    #[test]
    fn test_root_scalar_keyed_as_value() {
        let row = flatten(&json!(42.0));

        assert_eq!(row.len(), 1);
        assert_eq!(row.get("value"), Some(&Scalar::Float64(42.0)));
    }

    #[test]
    fn test_root_array() {
        let row = flatten(&json!([1, "two"]));

        assert_eq!(row.get("[0]"), Some(&Scalar::Float64(1.0)));
        assert_eq!(row.get("[1]"), Some(&Scalar::Str("two".to_string())));
    }

    #[test]
    fn test_keys_come_out_alphabetical() {
        let row = flatten(&json!({"z": 1, "a": 2, "m": 3}));
        let keys: Vec<&str> = row.keys().map(String::as_str).collect();

        assert_eq!(keys, vec!["a", "m", "z"]);
    }
}
