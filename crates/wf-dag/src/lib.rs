//! Commit graph for WorldFork.
//!
//! Commits form a directed acyclic graph through their `parent_a` and
//! `parent_b` links. This crate provides the graph walks the rest of the
//! system needs (ancestor sets, merge-base resolution, branch history) over
//! any [`CommitSource`], plus [`CommitDag`], an in-memory arena that
//! enforces the graph invariants at insertion time.

pub mod dag;
pub mod error;
pub mod walk;

pub use dag::CommitDag;
pub use error::{DagError, DagResult};
pub use walk::{ancestors, common_ancestor, history, CommitSource};
