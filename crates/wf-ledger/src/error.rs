use thiserror::Error;
use wf_store::StoreError;
use wf_types::{BranchId, CommitId};

/// Errors produced by branch head operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("branch not found: {0}")]
    BranchNotFound(BranchId),

    #[error("head of branch {branch_name} changed: expected {}, found {}", display_head(.expected), display_head(.actual))]
    HeadChanged {
        branch_name: String,
        expected: Option<CommitId>,
        actual: Option<CommitId>,
    },

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

fn display_head(head: &Option<CommitId>) -> String {
    head.as_ref()
        .map_or_else(|| "no commit".to_string(), |id| id.to_string())
}

pub type LedgerResult<T> = Result<T, LedgerError>;
