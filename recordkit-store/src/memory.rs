use crate::{EntityStore, StoreError, StoreResult};
use recordkit_model::Entity;
use recordkit_types::EntityId;
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;
use tracing::debug;

/// Entities kept in memory, one insertion-ordered collection per type.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    collections: RwLock<HashMap<String, Vec<Entity>>>,
    /// When set, only these types are accepted.
    known_types: Option<HashSet<String>>,
}

impl InMemoryStore {
    /// A store that accepts any entity type.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store limited to the given entity types. Others fail with
    /// `UnknownCollection`.
    pub fn with_types<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            collections: RwLock::new(HashMap::new()),
            known_types: Some(types.into_iter().map(Into::into).collect()),
        }
    }

    fn check_type(&self, entity_type: &str) -> StoreResult<()> {
        match &self.known_types {
            Some(known) if !known.contains(entity_type) => {
                Err(StoreError::UnknownCollection(entity_type.to_string()))
            }
            _ => Ok(()),
        }
    }

    fn push(&self, entity: Entity) -> StoreResult<Entity> {
        self.check_type(&entity.entity_type)?;
        let mut collections = self.collections.write()?;
        let items = collections.entry(entity.entity_type.clone()).or_default();
        if items.iter().any(|e| e.id == entity.id) {
            return Err(StoreError::Duplicate {
                entity_type: entity.entity_type,
                id: entity.id,
            });
        }
        items.push(entity.clone());
        debug!(
            "Inserted {} {} (version {})",
            entity.entity_type, entity.id, entity.version
        );
        Ok(entity)
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn not_found(entity_type: &str, id: EntityId) -> StoreError {
    StoreError::NotFound {
        entity_type: entity_type.to_string(),
        id,
    }
}

impl EntityStore for InMemoryStore {
    fn query_all(&self, entity_type: &str) -> StoreResult<Vec<Entity>> {
        self.check_type(entity_type)?;
        let collections = self.collections.read()?;
        Ok(collections.get(entity_type).cloned().unwrap_or_default())
    }

    fn find_by_id(&self, entity_type: &str, id: EntityId) -> StoreResult<Option<Entity>> {
        self.check_type(entity_type)?;
        let collections = self.collections.read()?;
        Ok(collections
            .get(entity_type)
            .and_then(|items| items.iter().find(|e| e.id == id))
            .cloned())
    }

    fn insert(&self, mut entity: Entity) -> StoreResult<Entity> {
        let now = now_millis();
        entity.version = 1;
        entity.created_at = now;
        entity.modified_at = now;
        self.push(entity)
    }

    fn import(&self, mut entity: Entity) -> StoreResult<Entity> {
        let now = now_millis();
        entity.version = entity.version.max(1);
        if entity.created_at == 0 {
            entity.created_at = now;
        }
        if entity.modified_at == 0 {
            entity.modified_at = entity.created_at;
        }
        self.push(entity)
    }

    fn replace(&self, mut entity: Entity, expected_version: Option<u64>) -> StoreResult<Entity> {
        self.check_type(&entity.entity_type)?;
        let mut collections = self.collections.write()?;
        let stored = collections
            .get_mut(&entity.entity_type)
            .and_then(|items| items.iter_mut().find(|e| e.id == entity.id))
            .ok_or_else(|| not_found(&entity.entity_type, entity.id))?;

        if let Some(expected) = expected_version {
            if stored.version != expected {
                return Err(StoreError::VersionConflict {
                    id: entity.id,
                    expected,
                    actual: stored.version,
                });
            }
        }

        entity.version = stored.version + 1;
        entity.created_at = stored.created_at;
        entity.modified_at = now_millis().max(stored.modified_at);
        *stored = entity.clone();
        debug!(
            "Replaced {} {} (version {})",
            entity.entity_type, entity.id, entity.version
        );
        Ok(entity)
    }

    fn remove(&self, entity_type: &str, id: EntityId) -> StoreResult<Entity> {
        self.check_type(entity_type)?;
        let mut collections = self.collections.write()?;
        let items = collections
            .get_mut(entity_type)
            .ok_or_else(|| not_found(entity_type, id))?;
        let index = items
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| not_found(entity_type, id))?;
        let removed = items.remove(index);
        debug!("Removed {} {}", entity_type, id);
        Ok(removed)
    }

    fn count(&self, entity_type: &str) -> StoreResult<usize> {
        self.check_type(entity_type)?;
        let collections = self.collections.read()?;
        Ok(collections.get(entity_type).map_or(0, Vec::len))
    }
}
