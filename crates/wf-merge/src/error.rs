//! Error types for conflict resolution.

use thiserror::Error;

/// Errors that can occur while applying resolutions.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// A resolution path that is not a valid JSON Pointer.
    #[error("malformed JSON pointer: {pointer:?}")]
    MalformedPointer { pointer: String },

    /// A resolution path that cannot be written into the merged unit.
    #[error("cannot resolve {unit_id} at {path:?}: {reason}")]
    InvalidPath {
        unit_id: String,
        path: String,
        reason: String,
    },

    /// A resolved tree that is no longer a valid unit.
    #[error("resolved unit {unit_id} is invalid: {reason}")]
    InvalidUnit { unit_id: String, reason: String },
}

/// Convenience alias for resolution results.
pub type ResolveResult<T> = Result<T, ResolveError>;
