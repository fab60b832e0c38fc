//! Unit-level structural diff.
//!
//! Two trees are walked in lockstep. Equal subtrees are skipped, arrays are
//! compared index by index, objects over the union of their keys, and any
//! other mismatch is reported once at the path where it occurs without
//! descending further.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use wf_types::json::{key_union, opt_json_eq};
use wf_types::{to_pointer, DiffChange, UnitId, UnitValues};

/// The changes between two unit maps.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UnitDiff {
    /// Changes in walk order, grouped by unit id ascending.
    pub changes: Vec<DiffChange>,
}

impl UnitDiff {
    /// Returns `true` if there are no changes.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Number of changes.
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Changes that introduce a value where there was none.
    pub fn additions(&self) -> usize {
        self.changes
            .iter()
            .filter(|c| c.from.is_none() && c.to.is_some())
            .count()
    }

    /// Changes that remove a value.
    pub fn removals(&self) -> usize {
        self.changes
            .iter()
            .filter(|c| c.from.is_some() && c.to.is_none())
            .count()
    }

    /// Changes that replace one value with another.
    pub fn modifications(&self) -> usize {
        self.changes
            .iter()
            .filter(|c| c.from.is_some() && c.to.is_some())
            .count()
    }

    /// Number of distinct units with at least one change.
    pub fn units_touched(&self) -> usize {
        self.changes
            .iter()
            .map(|c| &c.unit_id)
            .collect::<BTreeSet<_>>()
            .len()
    }

    pub fn into_changes(self) -> Vec<DiffChange> {
        self.changes
    }
}

/// Diff two unit maps over the union of their unit ids.
///
/// A unit present on only one side is reported as a single change at the
/// empty path.
pub fn diff_units(from: &UnitValues, to: &UnitValues) -> UnitDiff {
    let ids: BTreeSet<&UnitId> = from.keys().chain(to.keys()).collect();
    let mut changes = Vec::new();
    for id in ids {
        changes.extend(diff_values(id, from.get(id), to.get(id)));
    }
    let diff = UnitDiff { changes };
    debug!(
        changes = diff.len(),
        units = diff.units_touched(),
        "computed unit diff"
    );
    diff
}

/// Diff one unit tree. `None` stands for an absent unit.
pub fn diff_values(unit_id: &UnitId, from: Option<&Value>, to: Option<&Value>) -> Vec<DiffChange> {
    let mut walker = Walker {
        unit_id,
        path: Vec::new(),
        changes: Vec::new(),
    };
    walker.walk(from, to);
    walker.changes
}

struct Walker<'a> {
    unit_id: &'a UnitId,
    path: Vec<String>,
    changes: Vec<DiffChange>,
}

impl Walker<'_> {
    fn walk(&mut self, from: Option<&Value>, to: Option<&Value>) {
        if opt_json_eq(from, to) {
            return;
        }
        match (from, to) {
            (Some(Value::Array(a)), Some(Value::Array(b))) => {
                for i in 0..a.len().max(b.len()) {
                    self.descend(i.to_string(), a.get(i), b.get(i));
                }
            }
            (Some(Value::Object(a)), Some(Value::Object(b))) => {
                for key in key_union(&[a, b]) {
                    self.descend(key.to_string(), a.get(key), b.get(key));
                }
            }
            _ => self.changes.push(DiffChange {
                unit_id: self.unit_id.clone(),
                path: to_pointer(&self.path),
                from: from.cloned(),
                to: to.cloned(),
            }),
        }
    }

    fn descend(&mut self, token: String, from: Option<&Value>, to: Option<&Value>) {
        self.path.push(token);
        self.walk(from, to);
        self.path.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::apply_changes;
    use proptest::prelude::*;
    use serde_json::json;
    use wf_types::json::json_eq;
    use wf_types::Unit;

    fn units(pairs: &[(&str, Value)]) -> UnitValues {
        pairs
            .iter()
            .map(|(id, v)| (UnitId::new(*id), v.clone()))
            .collect()
    }

    fn npc(title: &str, fields: Value) -> Value {
        let mut unit = Unit::new("u1", "npc", title);
        if let Value::Object(map) = fields {
            unit.fields = map;
        }
        unit.to_value()
    }

    #[test]
    fn identical_maps_have_no_changes() {
        let map = units(&[("u1", npc("Ana", json!({"hp": 10})))]);
        assert!(diff_units(&map, &map).is_empty());
    }

    #[test]
    fn leaf_change_reports_pointer() {
        let from = units(&[("u1", npc("Ana", json!({"hp": 10, "mood": "calm"})))]);
        let to = units(&[("u1", npc("Ana", json!({"hp": 12, "mood": "calm"})))]);
        let diff = diff_units(&from, &to);
        assert_eq!(
            diff.changes,
            vec![DiffChange {
                unit_id: UnitId::new("u1"),
                path: "/fields/hp".into(),
                from: Some(json!(10)),
                to: Some(json!(12)),
            }]
        );
        assert_eq!(diff.modifications(), 1);
    }

    #[test]
    fn escapes_slash_in_keys() {
        let from = units(&[("u1", npc("Ana", json!({"a/b": 1})))]);
        let to = units(&[("u1", npc("Ana", json!({"a/b": 2})))]);
        let diff = diff_units(&from, &to);
        assert_eq!(diff.len(), 1);
        assert_eq!(diff.changes[0].path, "/fields/a~1b");
    }

    #[test]
    fn added_and_removed_units_report_at_root() {
        let from = units(&[("gone", json!({"id": "gone"}))]);
        let to = units(&[("new", json!({"id": "new"}))]);
        let diff = diff_units(&from, &to);
        assert_eq!(diff.len(), 2);
        assert_eq!(diff.additions(), 1);
        assert_eq!(diff.removals(), 1);
        assert!(diff.changes.iter().all(|c| c.path.is_empty()));
        assert_eq!(diff.units_touched(), 2);
    }

    #[test]
    fn arrays_compare_index_wise() {
        let id = UnitId::new("u1");
        let changes = diff_values(&id, Some(&json!([1, 2, 3])), Some(&json!([1, 5])));
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].path, "/1");
        assert_eq!(changes[0].to, Some(json!(5)));
        assert_eq!(changes[1].path, "/2");
        assert_eq!(changes[1].from, Some(json!(3)));
        assert_eq!(changes[1].to, None);
    }

    #[test]
    fn type_mismatch_does_not_recurse() {
        let id = UnitId::new("u1");
        let changes = diff_values(&id, Some(&json!({"a": [1]})), Some(&json!({"a": {"0": 1}})));
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].path, "/a");
    }

    #[test]
    fn key_order_and_number_form_are_not_changes() {
        let id = UnitId::new("u1");
        let changes = diff_values(
            &id,
            Some(&json!({"a": 1, "b": 2.0})),
            Some(&json!({"b": 2, "a": 1.0})),
        );
        assert!(changes.is_empty());
    }

    #[test]
    fn object_changes_follow_key_union_order() {
        let id = UnitId::new("u1");
        let changes = diff_values(
            &id,
            Some(&json!({"z": 1, "a": 1})),
            Some(&json!({"m": 1, "z": 2})),
        );
        let paths: Vec<&str> = changes.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, vec!["/z", "/a", "/m"]);
    }

    #[test]
    fn serializes_as_change_list() {
        let from = units(&[("u1", json!({"title": "A"}))]);
        let to = units(&[("u1", json!({}))]);
        let json = serde_json::to_value(diff_units(&from, &to)).unwrap();
        assert_eq!(
            json,
            json!({"changes": [{"unitId": "u1", "path": "/title", "from": "A"}]})
        );
    }

    fn arb_json() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            (-5i64..5).prop_map(|n| json!(n)),
            "[a-c/~]{0,2}".prop_map(Value::String),
        ];
        leaf.prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                proptest::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                proptest::collection::btree_map("[a-c/~]{1,2}", inner, 0..4)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    fn arb_units() -> impl Strategy<Value = UnitValues> {
        proptest::collection::btree_map("u[0-3]", arb_json(), 0..4)
            .prop_map(|m| m.into_iter().map(|(k, v)| (UnitId::new(k), v)).collect())
    }

    fn same_units(a: &UnitValues, b: &UnitValues) -> bool {
        a.len() == b.len()
            && a
                .iter()
                .all(|(id, v)| b.get(id).is_some_and(|w| json_eq(v, w)))
    }

    proptest! {
        #[test]
        fn diff_with_self_is_empty(map in arb_units()) {
            prop_assert!(diff_units(&map, &map).is_empty());
        }

        #[test]
        fn applying_diff_reproduces_target(a in arb_units(), b in arb_units()) {
            let diff = diff_units(&a, &b);
            let patched = apply_changes(a, &diff.changes).unwrap();
            prop_assert!(same_units(&patched, &b), "patched {:?} != {:?}", patched, b);
        }
    }
}
