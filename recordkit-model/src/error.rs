//! Error types for the entity model.

use crate::FieldType;
use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while resolving fields or coercing values.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The path does not name a field of the entity type.
    #[error("unknown field: {0}")]
    UnknownField(String),

    /// A value could not be converted to the field's declared type.
    #[error("invalid value for field {field}: expected {expected}, got {value}")]
    InvalidValue {
        field: String,
        expected: FieldType,
        value: String,
    },

    /// The field cannot be written.
    #[error("field is read-only: {0}")]
    ReadOnlyField(String),

    /// A collection index outside the current bounds.
    #[error("index {index} out of range for {path} (length {len})")]
    IndexOutOfRange {
        path: String,
        index: usize,
        len: usize,
    },

    /// The object that should contain the field is null or absent.
    #[error("parent of {0} does not exist")]
    MissingParent(String),

    /// The entity payload is not shaped like an entity.
    #[error("invalid entity: {0}")]
    InvalidEntity(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
