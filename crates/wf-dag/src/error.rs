//! Error types for the commit graph.

use wf_types::CommitId;

/// Errors that can occur while building the commit graph.
#[derive(Debug, thiserror::Error)]
pub enum DagError {
    /// Attempted to insert a commit whose id already exists.
    #[error("duplicate commit: {0}")]
    DuplicateCommit(CommitId),

    /// A parent reference points to a commit that does not exist.
    #[error("dangling parent reference: commit {commit} references missing parent {parent}")]
    DanglingParent {
        /// The commit containing the bad reference.
        commit: CommitId,
        /// The missing parent.
        parent: CommitId,
    },

    /// A commit names itself as a parent.
    #[error("commit {0} cannot be its own parent")]
    SelfParent(CommitId),

    /// Serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Convenience alias for DAG results.
pub type DagResult<T> = Result<T, DagError>;
