//! Replaying a change list onto a unit map.

use wf_types::{from_pointer, with_value_at, DiffChange, TypeResult, UnitValues};

/// Apply `changes` to `units`, producing the target side of the diff.
///
/// Writes are applied first in list order so that arrays grow one slot at a
/// time. Removals follow in reverse order so that trailing array slots are
/// dropped from the end inward.
pub fn apply_changes(mut units: UnitValues, changes: &[DiffChange]) -> TypeResult<UnitValues> {
    let (writes, removals): (Vec<&DiffChange>, Vec<&DiffChange>) =
        changes.iter().partition(|c| c.to.is_some());

    for change in writes.into_iter().chain(removals.into_iter().rev()) {
        let tokens = from_pointer(&change.path)?;
        let current = units.remove(&change.unit_id);
        if let Some(updated) = with_value_at(current, &tokens, change.to.clone())? {
            units.insert(change.unit_id.clone(), updated);
        }
    }
    Ok(units)
}
