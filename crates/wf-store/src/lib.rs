//! Storage layer for WorldFork.
//!
//! The engine needs very little from storage: read and write a branch's
//! current unit content, read a commit's snapshots, read commit records, and
//! run a commit as one atomic unit (create the commit and its snapshots,
//! then compare-and-swap the branch head). [`WorldStore`] and
//! [`Transaction`] capture exactly that; [`InMemoryStore`] implements them
//! behind a single `RwLock`.

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryStore;
pub use traits::{CasOutcome, StoreCommits, Transaction, WorldStore};
