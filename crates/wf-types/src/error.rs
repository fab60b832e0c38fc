use thiserror::Error;

/// Errors produced by type-level parsing and validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    /// A non-empty JSON Pointer that does not start with `/`.
    #[error("malformed JSON pointer: {pointer:?}")]
    MalformedPointer { pointer: String },

    /// A JSON value that does not have the shape of a unit.
    #[error("invalid unit {unit_id}: {reason}")]
    InvalidUnit { unit_id: String, reason: String },

    /// A path that cannot be written into the tree it addresses.
    #[error("invalid path at token {token:?}: {reason}")]
    InvalidPath { token: String, reason: String },

    /// A pagination cursor that is not part of the listing.
    #[error("unknown cursor: {0}")]
    InvalidCursor(String),
}

/// Convenience alias for type-level results.
pub type TypeResult<T> = Result<T, TypeError>;
