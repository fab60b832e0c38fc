//! Deep equality and key-union helpers over `serde_json::Value`.
//!
//! Equality ignores object key order and compares numbers by numeric value,
//! so `1` and `1.0` are the same leaf. An absent value (`None`) only equals
//! another absent value.

use std::collections::HashSet;

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Deep structural equality.
pub fn json_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            x == y || matches!((x.as_f64(), y.as_f64()), (Some(p), Some(q)) if p == q)
        }
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(p, q)| json_eq(p, q))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .all(|(key, p)| y.get(key).is_some_and(|q| json_eq(p, q)))
        }
        _ => a == b,
    }
}

/// [`json_eq`] lifted over possibly-absent values.
pub fn opt_json_eq(a: Option<&Value>, b: Option<&Value>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => json_eq(a, b),
        _ => false,
    }
}

/// Union of the keys of several objects, in order of first appearance.
pub fn key_union<'a>(maps: &[&'a Map<String, Value>]) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    let mut keys = Vec::new();
    for map in maps {
        for key in map.keys() {
            if seen.insert(key.as_str()) {
                keys.push(key.as_str());
            }
        }
    }
    keys
}

/// Deserialize a possibly-absent value, keeping an explicit `null`.
///
/// Plain `Option<Value>` maps `null` to `None`. Used with
/// `#[serde(default, deserialize_with = "...")]` an absent field becomes
/// `None` and `null` becomes `Some(Value::Null)`.
pub fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn object_equality_ignores_key_order() {
        let a = json!({"a": 1, "b": [1, 2]});
        let b = json!({"b": [1, 2], "a": 1});
        assert!(json_eq(&a, &b));
    }

    #[test]
    fn numbers_compare_by_value() {
        assert!(json_eq(&json!(1), &json!(1.0)));
        assert!(!json_eq(&json!(1), &json!(2)));
        assert!(!json_eq(&json!(1), &json!("1")));
    }

    #[test]
    fn arrays_are_ordered() {
        assert!(!json_eq(&json!([1, 2]), &json!([2, 1])));
        assert!(!json_eq(&json!([1]), &json!([1, 1])));
    }

    #[test]
    fn missing_key_differs_from_null() {
        assert!(!json_eq(&json!({"a": null}), &json!({})));
    }

    #[test]
    fn absent_values() {
        assert!(opt_json_eq(None, None));
        assert!(!opt_json_eq(None, Some(&Value::Null)));
    }

    #[test]
    fn key_union_keeps_first_appearance_order() {
        let a = json!({"x": 1, "y": 2});
        let b = json!({"z": 3, "x": 4});
        let (Value::Object(a), Value::Object(b)) = (a, b) else {
            unreachable!()
        };
        assert_eq!(key_union(&[&a, &b]), vec!["x", "y", "z"]);
    }
}
