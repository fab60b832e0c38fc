//! Reading and writing inside a JSON tree by token path.
//!
//! Writes take the tree by value and hand back the rebuilt tree. Subtrees
//! off the written path are moved, not copied, and the caller's other
//! copies of the tree are never touched.
//!
//! Absent values are `None`: reading a path that does not exist yields
//! `None`, and writing `None` deletes.

use serde_json::{Map, Value};

use crate::error::{TypeError, TypeResult};
use crate::pointer::is_array_index;

/// The value at `tokens` inside `root`, or `None` if the path does not exist.
///
/// On arrays a token must be a canonical index within bounds.
pub fn value_at<'a, S: AsRef<str>>(root: &'a Value, tokens: &[S]) -> Option<&'a Value> {
    tokens.iter().try_fold(root, |current, token| {
        let token = token.as_ref();
        match current {
            Value::Object(map) => map.get(token),
            Value::Array(items) if is_array_index(token) => {
                token.parse::<usize>().ok().and_then(|i| items.get(i))
            }
            _ => None,
        }
    })
}

/// Rebuild `root` with `value` written at `tokens`.
///
/// Missing or non-container intermediates are replaced by a fresh container:
/// an array when the token that addresses into it is an index, otherwise an
/// object. Writing `None` removes an object key, drops the last slot of an
/// array, or nulls an inner array slot. An empty path replaces the whole
/// tree.
///
/// # Errors
///
/// [`TypeError::InvalidPath`] when a non-index token addresses an existing
/// array, or an index lies past the end of the array.
pub fn with_value_at<S: AsRef<str>>(
    root: Option<Value>,
    tokens: &[S],
    value: Option<Value>,
) -> TypeResult<Option<Value>> {
    let Some((head, rest)) = tokens.split_first() else {
        return Ok(value);
    };
    let head = head.as_ref();

    let container = match root {
        Some(existing @ (Value::Object(_) | Value::Array(_))) => existing,
        _ if is_array_index(head) => Value::Array(Vec::new()),
        _ => Value::Object(Map::new()),
    };

    match container {
        Value::Object(mut map) => {
            let child = map.get_mut(head).map(Value::take);
            match with_value_at(child, rest, value)? {
                Some(v) => {
                    map.insert(head.to_string(), v);
                }
                None => {
                    map.shift_remove(head);
                }
            }
            Ok(Some(Value::Object(map)))
        }
        Value::Array(mut items) => {
            let index = array_index(head, items.len())?;
            let child = items.get_mut(index).map(Value::take);
            match with_value_at(child, rest, value)? {
                Some(v) if index == items.len() => items.push(v),
                Some(v) => items[index] = v,
                None if index + 1 == items.len() => {
                    items.pop();
                }
                None => {
                    if let Some(slot) = items.get_mut(index) {
                        *slot = Value::Null;
                    }
                }
            }
            Ok(Some(Value::Array(items)))
        }
        // Only containers reach this point.
        other => Ok(Some(other)),
    }
}

fn array_index(token: &str, len: usize) -> TypeResult<usize> {
    let invalid = |reason: &str| TypeError::InvalidPath {
        token: token.to_string(),
        reason: reason.to_string(),
    };
    if !is_array_index(token) {
        return Err(invalid("arrays are addressed by index"));
    }
    let index: usize = token.parse().map_err(|_| invalid("index overflow"))?;
    if index > len {
        return Err(invalid("index past the end of the array"));
    }
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_nested_values() {
        let tree = json!({"fields": {"hp": 10, "tags": ["a", "b"]}});
        assert_eq!(value_at(&tree, &["fields", "hp"]), Some(&json!(10)));
        assert_eq!(value_at(&tree, &["fields", "tags", "1"]), Some(&json!("b")));
        assert_eq!(value_at::<&str>(&tree, &[]), Some(&tree));
    }

    #[test]
    fn missing_paths_read_as_none() {
        let tree = json!({"fields": {"tags": ["a"]}});
        assert_eq!(value_at(&tree, &["fields", "mood"]), None);
        assert_eq!(value_at(&tree, &["fields", "tags", "5"]), None);
        assert_eq!(value_at(&tree, &["fields", "tags", "01"]), None);
        assert_eq!(value_at(&tree, &["fields", "tags", "0", "x"]), None);
    }

    #[test]
    fn overwrites_existing_leaf_in_place() {
        let tree = json!({"a": 1, "b": 2, "c": 3});
        let out = with_value_at(Some(tree), &["b"], Some(json!(20))).unwrap().unwrap();
        let keys: Vec<&String> = out.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
        assert_eq!(out["b"], json!(20));
    }

    #[test]
    fn creates_intermediate_containers_by_next_token() {
        let out = with_value_at(Some(json!({})), &["fields", "list", "0", "name"], Some(json!("x")))
            .unwrap()
            .unwrap();
        assert_eq!(out, json!({"fields": {"list": [{"name": "x"}]}}));
    }

    #[test]
    fn replaces_scalar_intermediate() {
        let out = with_value_at(Some(json!({"a": 5})), &["a", "b"], Some(json!(true)))
            .unwrap()
            .unwrap();
        assert_eq!(out, json!({"a": {"b": true}}));
    }

    #[test]
    fn deleting_removes_key_and_keeps_order() {
        let tree = json!({"a": 1, "b": 2, "c": 3});
        let out = with_value_at(Some(tree), &["a"], None).unwrap().unwrap();
        let keys: Vec<&String> = out.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["b", "c"]);
    }

    #[test]
    fn deleting_inner_array_slot_nulls_it() {
        let out = with_value_at(Some(json!([1, 2, 3])), &["1"], None).unwrap().unwrap();
        assert_eq!(out, json!([1, null, 3]));
    }

    #[test]
    fn deleting_last_array_slot_drops_it() {
        let out = with_value_at(Some(json!([1, 2, 3])), &["2"], None).unwrap().unwrap();
        assert_eq!(out, json!([1, 2]));
    }

    #[test]
    fn appends_at_array_end() {
        let out = with_value_at(Some(json!([1])), &["1"], Some(json!(2))).unwrap().unwrap();
        assert_eq!(out, json!([1, 2]));
    }

    #[test]
    fn rejects_non_index_token_on_array() {
        let err = with_value_at(Some(json!([1])), &["name"], Some(json!(2))).unwrap_err();
        assert!(matches!(err, TypeError::InvalidPath { ref token, .. } if token == "name"));
    }

    #[test]
    fn rejects_index_past_end() {
        let err = with_value_at(Some(json!([1])), &["3"], Some(json!(2))).unwrap_err();
        assert!(matches!(err, TypeError::InvalidPath { .. }));
    }

    #[test]
    fn empty_path_replaces_root() {
        assert_eq!(
            with_value_at::<&str>(Some(json!({"a": 1})), &[], Some(json!(7))).unwrap(),
            Some(json!(7))
        );
        assert_eq!(with_value_at::<&str>(Some(json!({"a": 1})), &[], None).unwrap(), None);
    }

    #[test]
    fn missing_root_is_created() {
        let out = with_value_at(None, &["title"], Some(json!("T"))).unwrap();
        assert_eq!(out, Some(json!({"title": "T"})));
    }

    #[test]
    fn original_tree_is_untouched() {
        let original = json!({"fields": {"hp": 1}});
        let out = with_value_at(Some(original.clone()), &["fields", "hp"], Some(json!(2)))
            .unwrap()
            .unwrap();
        assert_eq!(original, json!({"fields": {"hp": 1}}));
        assert_eq!(out, json!({"fields": {"hp": 2}}));
    }
}
