//! Error types for storage operations.

use wf_dag::DagError;
use wf_types::{BranchId, CommitId, WorldId};

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The world does not exist.
    #[error("world not found: {0}")]
    WorldNotFound(WorldId),

    /// The branch does not exist.
    #[error("branch not found: {0}")]
    BranchNotFound(BranchId),

    /// A commit referenced by a write does not exist in the branch's world.
    #[error("commit not found: {0}")]
    CommitNotFound(CommitId),

    /// A branch with this name already exists in the world.
    #[error("branch already exists: {name}")]
    BranchExists { world_id: WorldId, name: String },

    /// A commit violates the commit graph invariants.
    #[error(transparent)]
    Dag(#[from] DagError),

    /// Snapshot encode/decode failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Filesystem failure while saving or loading a snapshot.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A writer panicked while holding the store lock.
    #[error("lock poisoned: {0}")]
    LockPoisoned(String),
}

/// Convenience alias for storage results.
pub type StoreResult<T> = Result<T, StoreError>;
