//! Error types for the entity service.

use recordkit_model::ModelError;
use recordkit_query::QueryError;
use recordkit_store::StoreError;
use recordkit_types::EntityId;
use thiserror::Error;

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// How the boundary layer should report a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The request itself is invalid (bad field, value, page, patch...).
    InvalidRequest,
    /// The addressed entity does not exist.
    NotFound,
    /// The write lost an optimistic-concurrency race.
    Conflict,
    /// Storage failure, surfaced unmodified.
    Internal,
}

/// Errors returned by [`crate::EntityService`].
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Filter, sort, page or patch validation failed.
    #[error(transparent)]
    Query(#[from] QueryError),

    /// No entity with this id.
    #[error("{entity_type} not found: {id}")]
    EntityNotFound { entity_type: String, id: EntityId },

    /// The submitted entity does not match the schema.
    #[error("invalid entity: {0}")]
    InvalidEntity(String),

    /// The id in the request path differs from the id in the body.
    #[error("mismatched id: path {path}, body {body}")]
    IdMismatch { path: EntityId, body: EntityId },

    /// The stored version changed since the caller read it.
    #[error("version conflict on {id}: expected {expected}, found {actual}")]
    VersionConflict {
        id: EntityId,
        expected: u64,
        actual: u64,
    },

    /// No service is registered for this entity type.
    #[error("unknown entity type: {0}")]
    UnknownEntityType(String),

    /// Any other storage failure.
    #[error("storage error: {0}")]
    Store(#[source] StoreError),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Query(_) | Self::InvalidEntity(_) | Self::IdMismatch { .. } => {
                ErrorKind::InvalidRequest
            }
            Self::EntityNotFound { .. } | Self::UnknownEntityType(_) => ErrorKind::NotFound,
            Self::VersionConflict { .. } => ErrorKind::Conflict,
            Self::Store(_) => ErrorKind::Internal,
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity_type, id } => Self::EntityNotFound { entity_type, id },
            StoreError::VersionConflict {
                id,
                expected,
                actual,
            } => Self::VersionConflict {
                id,
                expected,
                actual,
            },
            other => Self::Store(other),
        }
    }
}

impl From<ModelError> for ServiceError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::UnknownField(name) => Self::Query(QueryError::UnknownField(name)),
            other => Self::InvalidEntity(other.to_string()),
        }
    }
}
