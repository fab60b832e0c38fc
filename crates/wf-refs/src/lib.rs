//! Reference grammar for WorldFork.
//!
//! A ref names the content to read: either the mutable current state of a
//! branch (`branch:<name>`) or the immutable snapshots of a commit
//! (`commit:<id>`).
//!
//! # Modules
//!
//! - [`error`] -- Error types for ref parsing and validation
//! - [`spec`] -- The [`RefSpec`] grammar
//! - [`names`] -- Branch name validation

pub mod error;
pub mod names;
pub mod spec;

pub use error::{RefError, Result};
pub use names::validate_branch_name;
pub use spec::RefSpec;
