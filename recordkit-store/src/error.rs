//! Error types for the storage layer.

use recordkit_types::EntityId;
use std::sync::PoisonError;
use thiserror::Error;

/// Result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Entity not found.
    #[error("entity not found: {entity_type} {id}")]
    NotFound { entity_type: String, id: EntityId },

    /// An entity with the same id already exists.
    #[error("entity already exists: {entity_type} {id}")]
    Duplicate { entity_type: String, id: EntityId },

    /// The stored version differs from the one the writer read.
    #[error("version conflict on {id}: expected {expected}, found {actual}")]
    VersionConflict {
        id: EntityId,
        expected: u64,
        actual: u64,
    },

    /// The backend does not hold this entity type.
    #[error("unknown collection: {0}")]
    UnknownCollection(String),

    /// A lock was poisoned by a panicking writer.
    #[error("store lock poisoned: {0}")]
    Lock(String),
}

impl<T> From<PoisonError<T>> for StoreError {
    fn from(err: PoisonError<T>) -> Self {
        Self::Lock(err.to_string())
    }
}
