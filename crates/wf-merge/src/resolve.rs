//! Applying caller resolutions to a merge result.
//!
//! A resolution names a unit, a JSON Pointer into it and a choice. `ours`
//! and `theirs` read the value at that path from the respective side's full
//! unit tree; `manual` supplies it directly. The value is then written into
//! the merged tree, creating intermediate containers as needed. Resolutions
//! apply in order, so a later one on an overlapping path wins.

use serde_json::Value;
use tracing::debug;

use wf_types::{
    from_pointer, value_at, with_value_at, Resolution, ResolutionChoice, TypeError, Unit,
    UnitMap, UnitValues,
};

use crate::error::{ResolveError, ResolveResult};

/// Apply `resolutions` on top of `merged`.
///
/// `ours` and `theirs` are the unit trees the merge was computed from.
/// A resolution whose value is absent deletes the addressed field, or the
/// whole unit when the path is empty.
pub fn apply_resolutions(
    mut merged: UnitValues,
    ours: &UnitValues,
    theirs: &UnitValues,
    resolutions: &[Resolution],
) -> ResolveResult<UnitValues> {
    for resolution in resolutions {
        let tokens = from_pointer(&resolution.path).map_err(|_| ResolveError::MalformedPointer {
            pointer: resolution.path.clone(),
        })?;

        let side = |units: &UnitValues| -> Option<Value> {
            units
                .get(&resolution.unit_id)
                .and_then(|unit| value_at(unit, &tokens))
                .cloned()
        };
        let value = match resolution.choice {
            ResolutionChoice::Ours => side(ours),
            ResolutionChoice::Theirs => side(theirs),
            ResolutionChoice::Manual => resolution.value.clone(),
        };

        let current = merged.remove(&resolution.unit_id);
        let updated = with_value_at(current, &tokens, value).map_err(|e| {
            let reason = match e {
                TypeError::InvalidPath { reason, .. } => reason,
                other => other.to_string(),
            };
            ResolveError::InvalidPath {
                unit_id: resolution.unit_id.to_string(),
                path: resolution.path.clone(),
                reason,
            }
        })?;
        if let Some(updated) = updated {
            merged.insert(resolution.unit_id.clone(), updated);
        }
    }

    debug!(
        resolutions = resolutions.len(),
        units = merged.len(),
        "applied resolutions"
    );
    Ok(merged)
}

/// Check that every resolved tree is a well-formed unit stored under its
/// own id.
pub fn into_units(resolved: UnitValues) -> ResolveResult<UnitMap> {
    resolved
        .into_iter()
        .map(|(id, value)| {
            let unit = Unit::from_value(&id, value).map_err(|e| ResolveError::InvalidUnit {
                unit_id: id.to_string(),
                reason: e.to_string(),
            })?;
            Ok((id, unit))
        })
        .collect()
}
