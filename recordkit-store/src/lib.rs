//! Storage collaborator for recordkit.
//!
//! The query engine never touches persistence directly. It reads and writes
//! through [`EntityStore`]; [`InMemoryStore`] is the reference backend used by
//! the CLI and the tests.
//!
//! Each call is atomic on its own. Nothing here spans calls: two writers that
//! read the same entity race at `replace`, unless the caller passes the version
//! it read as `expected_version`.

mod error;
mod memory;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryStore;

use recordkit_model::Entity;
use recordkit_types::EntityId;

/// Trait implemented by storage backends.
///
/// Entities returned by the store carry their related data already attached
/// (navigation objects and collections live inside `Entity::data`).
pub trait EntityStore: Send + Sync {
    /// All entities of a type, in insertion order. Unknown types are empty.
    fn query_all(&self, entity_type: &str) -> StoreResult<Vec<Entity>>;

    /// Single lookup. `Ok(None)` when absent.
    fn find_by_id(&self, entity_type: &str, id: EntityId) -> StoreResult<Option<Entity>>;

    /// Stores a new entity, stamping version 1 and both timestamps.
    /// Fails with `Duplicate` if the id is taken.
    fn insert(&self, entity: Entity) -> StoreResult<Entity>;

    /// Stores an entity loaded from elsewhere, keeping its version (at least 1)
    /// and any timestamps it carries. Fails with `Duplicate` if the id is taken.
    ///
    /// Backends that cannot keep versions fall back to [`EntityStore::insert`].
    fn import(&self, entity: Entity) -> StoreResult<Entity> {
        self.insert(entity)
    }

    /// Replaces a stored entity, bumping its version and `modified_at`.
    /// With `expected_version`, fails with `VersionConflict` unless the stored
    /// version matches.
    fn replace(&self, entity: Entity, expected_version: Option<u64>) -> StoreResult<Entity>;

    /// Removes and returns an entity.
    fn remove(&self, entity_type: &str, id: EntityId) -> StoreResult<Entity>;

    /// Number of stored entities of a type.
    fn count(&self, entity_type: &str) -> StoreResult<usize> {
        self.query_all(entity_type).map(|all| all.len())
    }
}
