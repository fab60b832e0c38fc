//! Merge engine for WorldFork.
//!
//! Implements a path-level three-way merge over unit maps and the
//! application of caller-supplied resolutions to the conflicts it reports.
//!
//! # Key Types
//!
//! - [`MergeOutcome`] -- merged unit trees plus the conflicts found
//! - [`merge_units`] -- the three-way merge
//! - [`apply_resolutions`] / [`into_units`] -- settle conflicts and
//!   validate the result

pub mod error;
pub mod resolve;
pub mod three_way;

pub use error::{ResolveError, ResolveResult};
pub use resolve::{apply_resolutions, into_units};
pub use three_way::{merge_units, merge_values, MergeOutcome};
