//! Error types for query building and patching.

use recordkit_model::{FieldType, ModelError};
use thiserror::Error;

/// Result type for query operations.
pub type QueryResult<T> = Result<T, QueryError>;

/// Request validation failures. Every variant is a client-input fault.
#[derive(Debug, Error)]
pub enum QueryError {
    /// A property name or path that does not exist on the entity type.
    #[error("unknown field: {0}")]
    UnknownField(String),

    /// A filter value that cannot be converted to the field's type.
    #[error("invalid filter value {value:?} for {field}: {reason}")]
    InvalidFilterValue {
        field: String,
        value: String,
        reason: String,
    },

    /// The operator is not defined for the field's type.
    #[error("operator {operator} is not supported on {field} ({field_type})")]
    UnsupportedOperator {
        field: String,
        operator: String,
        field_type: FieldType,
    },

    /// Sort direction other than asc/desc.
    #[error("invalid sort order: {0}")]
    InvalidSortOrder(String),

    /// The field has no natural ordering.
    #[error("field cannot be sorted: {0}")]
    UnsortableField(String),

    /// Page number or size below 1.
    #[error("invalid page: number {number}, size {size}")]
    InvalidPage { number: i64, size: i64 },

    /// Patch document absent or empty.
    #[error("patch document is missing or empty")]
    MissingPatch,

    /// A `test` operation did not match the current value.
    #[error("patch test failed at {path}: expected {expected}, found {actual}")]
    PatchTestFailed {
        path: String,
        expected: String,
        actual: String,
    },

    /// A malformed patch operation, or one whose target cannot be written.
    #[error("invalid patch: {0}")]
    InvalidPatch(String),

    /// Attempt to write the identifier.
    #[error("field is read-only: {0}")]
    ReadOnlyField(String),
}

impl From<ModelError> for QueryError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::UnknownField(path) => Self::UnknownField(path),
            ModelError::ReadOnlyField(path) => Self::ReadOnlyField(path),
            other => Self::InvalidPatch(other.to_string()),
        }
    }
}
