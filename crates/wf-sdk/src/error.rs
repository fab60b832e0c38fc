use serde_json::{json, Value};
use thiserror::Error;

use wf_ledger::LedgerError;
use wf_merge::ResolveError;
use wf_refs::RefError;
use wf_store::StoreError;
use wf_types::{CommitId, TypeError, UnitId, WorldId};

/// Errors returned by SDK operations, one variant per wire error code.
#[derive(Debug, Error)]
pub enum SdkError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid ref: {0:?}")]
    InvalidRef(String),

    #[error("world not found: {0}")]
    WorldNotFound(WorldId),

    #[error("branch not found: {0}")]
    BranchNotFound(String),

    #[error("commit not found: {0}")]
    CommitNotFound(CommitId),

    #[error("unit not found: {0}")]
    UnitNotFound(UnitId),

    #[error("branch head changed on {branch_name}")]
    HeadChanged {
        branch_name: String,
        expected: Option<CommitId>,
        actual: Option<CommitId>,
    },

    #[error("malformed JSON pointer: {pointer:?}")]
    MalformedPointer { pointer: String },

    #[error("internal error: {0}")]
    Internal(String),
}

impl SdkError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::InvalidRef(_) => "INVALID_REF",
            Self::WorldNotFound(_) => "WORLD_NOT_FOUND",
            Self::BranchNotFound(_) => "BRANCH_NOT_FOUND",
            Self::CommitNotFound(_) => "COMMIT_NOT_FOUND",
            Self::UnitNotFound(_) => "UNIT_NOT_FOUND",
            Self::HeadChanged { .. } => "HEAD_CHANGED",
            Self::MalformedPointer { .. } => "MALFORMED_POINTER",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Structured details for the error payload, when the code carries any.
    pub fn details(&self) -> Option<Value> {
        match self {
            Self::HeadChanged {
                branch_name,
                expected,
                actual,
            } => Some(json!({
                "branchName": branch_name,
                "expected": expected,
                "actual": actual,
            })),
            Self::MalformedPointer { pointer } => Some(json!({ "pointer": pointer })),
            _ => None,
        }
    }
}

impl From<RefError> for SdkError {
    fn from(err: RefError) -> Self {
        match err {
            RefError::InvalidRef { input } => Self::InvalidRef(input),
            other => Self::InvalidInput(other.to_string()),
        }
    }
}

impl From<StoreError> for SdkError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::WorldNotFound(id) => Self::WorldNotFound(id),
            StoreError::BranchNotFound(id) => Self::BranchNotFound(id.to_string()),
            StoreError::CommitNotFound(id) => Self::CommitNotFound(id),
            StoreError::BranchExists { name, .. } => {
                Self::InvalidInput(format!("branch already exists: {name}"))
            }
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<LedgerError> for SdkError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::BranchNotFound(id) => Self::BranchNotFound(id.to_string()),
            LedgerError::HeadChanged {
                branch_name,
                expected,
                actual,
            } => Self::HeadChanged {
                branch_name,
                expected,
                actual,
            },
            LedgerError::Store(e) => e.into(),
        }
    }
}

impl From<ResolveError> for SdkError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::MalformedPointer { pointer } => Self::MalformedPointer { pointer },
            other => Self::InvalidInput(other.to_string()),
        }
    }
}

impl From<TypeError> for SdkError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::MalformedPointer { pointer } => Self::MalformedPointer { pointer },
            other => Self::InvalidInput(other.to_string()),
        }
    }
}

pub type SdkResult<T> = Result<T, SdkError>;
