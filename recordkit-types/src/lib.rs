//! Core type definitions for recordkit.
//!
//! Every record managed by the engine, whatever its entity type, is keyed by
//! an [`EntityId`]. The nil UUID stands for "no identifier assigned yet" and is
//! replaced by the service on create.

mod ids;

pub use ids::EntityId;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),
}
