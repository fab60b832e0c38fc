//! Three-way merge of unit maps.
//!
//! Every subtree is settled by the first rule that applies:
//!
//! 1. `ours == theirs`: take ours (both sides agree, including both deleted).
//! 2. `base == ours`: take theirs (only theirs changed).
//! 3. `base == theirs`: take ours (only ours changed).
//! 4. All three are arrays: merge index by index.
//! 5. All three are objects: merge over the union of keys, dropping keys
//!    whose merged value is absent.
//! 6. Otherwise: record a conflict and provisionally take ours.
//!
//! Equality is deep JSON equality; an absent value only equals another
//! absent value.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use wf_types::json::{key_union, opt_json_eq};
use wf_types::{to_pointer, MergeConflict, UnitId, UnitValues};

/// The result of a three-way merge.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeOutcome {
    /// Merged trees. Units absent after the merge are omitted.
    pub merged: UnitValues,
    /// Unsettled disagreements, grouped by unit id ascending.
    pub conflicts: Vec<MergeConflict>,
}

impl MergeOutcome {
    /// Returns `true` if the merge produced no conflicts.
    pub fn is_clean(&self) -> bool {
        self.conflicts.is_empty()
    }

    /// Conflicts reported for one unit.
    pub fn conflicts_for<'a>(&'a self, unit_id: &'a UnitId) -> impl Iterator<Item = &'a MergeConflict> {
        self.conflicts.iter().filter(move |c| &c.unit_id == unit_id)
    }
}

/// Merge three unit maps over the union of their unit ids.
pub fn merge_units(base: &UnitValues, ours: &UnitValues, theirs: &UnitValues) -> MergeOutcome {
    let ids: BTreeSet<&UnitId> = base.keys().chain(ours.keys()).chain(theirs.keys()).collect();
    let mut outcome = MergeOutcome::default();

    for id in ids {
        let (value, conflicts) = merge_values(id, base.get(id), ours.get(id), theirs.get(id));
        if let Some(value) = value {
            outcome.merged.insert(id.clone(), value);
        }
        outcome.conflicts.extend(conflicts);
    }

    debug!(
        units = outcome.merged.len(),
        conflicts = outcome.conflicts.len(),
        "three-way merge complete"
    );
    outcome
}

/// Merge one unit tree. `None` stands for an absent unit.
pub fn merge_values(
    unit_id: &UnitId,
    base: Option<&Value>,
    ours: Option<&Value>,
    theirs: Option<&Value>,
) -> (Option<Value>, Vec<MergeConflict>) {
    let mut merger = Merger {
        unit_id,
        path: Vec::new(),
        conflicts: Vec::new(),
    };
    let value = merger.merge(base, ours, theirs);
    (value, merger.conflicts)
}

struct Merger<'a> {
    unit_id: &'a UnitId,
    path: Vec<String>,
    conflicts: Vec<MergeConflict>,
}

impl Merger<'_> {
    fn merge(
        &mut self,
        base: Option<&Value>,
        ours: Option<&Value>,
        theirs: Option<&Value>,
    ) -> Option<Value> {
        if opt_json_eq(ours, theirs) {
            return ours.cloned();
        }
        if opt_json_eq(base, ours) {
            return theirs.cloned();
        }
        if opt_json_eq(base, theirs) {
            return ours.cloned();
        }

        match (base, ours, theirs) {
            (Some(Value::Array(b)), Some(Value::Array(o)), Some(Value::Array(t))) => {
                let len = b.len().max(o.len()).max(t.len());
                let mut slots: Vec<Option<Value>> = (0..len)
                    .map(|i| self.descend(i.to_string(), b.get(i), o.get(i), t.get(i)))
                    .collect();
                while matches!(slots.last(), Some(None)) {
                    slots.pop();
                }
                Some(Value::Array(
                    slots
                        .into_iter()
                        .map(|slot| slot.unwrap_or(Value::Null))
                        .collect(),
                ))
            }
            (Some(Value::Object(b)), Some(Value::Object(o)), Some(Value::Object(t))) => {
                let mut merged = Map::new();
                for key in key_union(&[b, o, t]) {
                    if let Some(value) = self.descend(key.to_string(), b.get(key), o.get(key), t.get(key)) {
                        merged.insert(key.to_string(), value);
                    }
                }
                Some(Value::Object(merged))
            }
            _ => {
                self.conflicts.push(MergeConflict {
                    unit_id: self.unit_id.clone(),
                    path: to_pointer(&self.path),
                    base: base.cloned(),
                    ours: ours.cloned(),
                    theirs: theirs.cloned(),
                });
                ours.cloned()
            }
        }
    }

    fn descend(
        &mut self,
        token: String,
        base: Option<&Value>,
        ours: Option<&Value>,
        theirs: Option<&Value>,
    ) -> Option<Value> {
        self.path.push(token);
        let merged = self.merge(base, ours, theirs);
        self.path.pop();
        merged
    }
}
