//! Structural diff engine for WorldFork.
//!
//! Compares two unit maps field by field and reports each leaf-level
//! difference as a [`DiffChange`](wf_types::DiffChange) addressed by JSON
//! Pointer.
//!
//! # Key Types
//!
//! - [`UnitDiff`] -- the ordered change list with summary counts
//! - [`diff_units`] / [`diff_values`] -- map-level and tree-level entry points
//! - [`apply_changes`] -- replay a change list onto the source map

pub mod patch;
pub mod unit_diff;

pub use patch::apply_changes;
pub use unit_diff::{diff_units, diff_values, UnitDiff};
