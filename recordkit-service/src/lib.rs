//! Generic entity service for recordkit.
//!
//! One [`EntityService`] per entity type composes the query engine with a
//! storage backend:
//! - `create` / `get_by_id` / `update` / `delete` for whole entities
//! - `get` for filtered, searched, sorted and paginated listings
//! - `patch` for RFC 6902 partial updates
//!
//! [`EntityRegistry`] wires one service per registered schema onto a shared
//! store.

mod config;
mod error;
mod query;
mod registry;
mod service;

pub use config::ServiceConfig;
pub use error::{ErrorKind, ServiceError, ServiceResult};
pub use query::GetQuery;
pub use registry::EntityRegistry;
pub use service::EntityService;
