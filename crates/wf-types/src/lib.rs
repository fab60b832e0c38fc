//! Foundation types for WorldFork.
//!
//! WorldFork versions collections of structured JSON documents ("units")
//! grouped into worlds. This crate holds the vocabulary every other crate
//! speaks: identifiers, the unit/commit/branch model, the change records
//! produced by diff and merge, and the JSON Pointer codec used to address a
//! field inside a unit.
//!
//! # Key Types
//!
//! - [`Unit`] / [`UnitMap`] / [`UnitValues`] -- versioned documents
//! - [`Commit`] / [`Branch`] / [`World`] -- the history model
//! - [`DiffChange`] / [`MergeConflict`] / [`Resolution`] -- engine records
//! - [`pointer`] -- RFC 6901 pointer encode/decode
//! - [`json`] -- deep JSON equality and key-union helpers
//! - [`path`] -- token-path reads and copy-on-write writes
//! - [`Page`] -- cursor pagination

pub mod change;
pub mod error;
pub mod id;
pub mod json;
pub mod model;
pub mod page;
pub mod path;
pub mod pointer;
pub mod unit;

pub use change::{DiffChange, MergeConflict, Resolution, ResolutionChoice};
pub use error::{TypeError, TypeResult};
pub use id::{BranchId, CommitId, TenantId, UnitId, WorldId};
pub use model::{Branch, Commit, World};
pub use page::{paginate, Page};
pub use path::{value_at, with_value_at};
pub use pointer::{escape_token, from_pointer, is_array_index, to_pointer, unescape_token};
pub use unit::{unit_values, Unit, UnitMap, UnitSummary, UnitValues};
