//! Error types for reference operations.

use thiserror::Error;

/// Errors that can occur while parsing or validating refs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RefError {
    /// The string does not match `branch:<name>` or `commit:<id>`.
    #[error("invalid ref: {input:?}")]
    InvalidRef { input: String },

    /// The branch name is invalid.
    #[error("invalid branch name: {name}: {reason}")]
    InvalidBranchName { name: String, reason: String },
}

/// Convenience type alias for ref operations.
pub type Result<T> = std::result::Result<T, RefError>;
