use crate::{GetQuery, ServiceConfig, ServiceError, ServiceResult};
use recordkit_model::{Entity, EntitySchema};
use recordkit_query::{
    apply_patch, paginate, Page, PatchDocument, Predicate, QueryError, SortPlan, SortSpec,
};
use recordkit_store::{EntityStore, StoreError};
use recordkit_types::EntityId;
use std::sync::Arc;
use tracing::{debug, warn};

/// Create, read, update, patch and delete for one entity type.
///
/// Holds no mutable state of its own. Every request validates its input
/// before reading storage and writes through [`EntityStore`] in a single call.
#[derive(Clone)]
pub struct EntityService {
    schema: Arc<EntitySchema>,
    store: Arc<dyn EntityStore>,
    config: ServiceConfig,
}

impl EntityService {
    pub fn new(schema: EntitySchema, store: Arc<dyn EntityStore>) -> Self {
        Self::with_config(schema, store, ServiceConfig::default())
    }

    pub fn with_config(
        schema: impl Into<Arc<EntitySchema>>,
        store: Arc<dyn EntityStore>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            schema: schema.into(),
            store,
            config,
        }
    }

    pub fn schema(&self) -> &EntitySchema {
        &self.schema
    }

    pub fn entity_type(&self) -> &str {
        &self.schema.entity_type
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Stores a new entity and returns its id. A nil id is replaced by a
    /// fresh one; missing fields take their type defaults.
    pub fn create(&self, mut entity: Entity) -> ServiceResult<EntityId> {
        self.check_type(&entity)?;
        if entity.id.is_nil() {
            entity.id = EntityId::new();
        }
        entity.data = self.schema.conform(entity.data)?;

        let stored = self.store.insert(entity)?;
        debug!("Created {} {}", stored.entity_type, stored.id);
        Ok(stored.id)
    }

    /// Loads an entity that already has a history, such as a saved data
    /// file, keeping its id and version. A nil id is replaced as in `create`.
    pub fn import(&self, mut entity: Entity) -> ServiceResult<Entity> {
        self.check_type(&entity)?;
        if entity.id.is_nil() {
            entity.id = EntityId::new();
        }
        entity.data = self.schema.conform(entity.data)?;
        Ok(self.store.import(entity)?)
    }

    /// Filtered, searched, sorted and paginated listing.
    ///
    /// Page, sort and filter parameters are all validated before storage is
    /// read, so an invalid request never touches the store.
    pub fn get(&self, query: &GetQuery) -> ServiceResult<Vec<Entity>> {
        let page = Page::new(query.page_number(), query.page_size(&self.config))?;
        let sort = SortSpec::from_params(query.sort_field.as_deref(), query.sort_order())?;
        let plan = SortPlan::plan(&self.schema, sort.as_ref())?;
        let predicate = Predicate::build(&self.schema, &query.filters, query.search_term.as_deref())?;

        let all = self.store.query_all(self.entity_type())?;
        let total = all.len();
        let matched: Vec<Entity> = if predicate.is_always() {
            all
        } else {
            all.into_iter().filter(|e| predicate.test(e)).collect()
        };
        let matched_count = matched.len();
        let ordered = match plan {
            Some(plan) => plan.sort(matched),
            None => matched,
        };
        let items = paginate(ordered, page);

        debug!(
            "Get {}: {} of {} matched, page {}x{} returned {}",
            self.entity_type(),
            matched_count,
            total,
            page.number(),
            page.size(),
            items.len()
        );
        Ok(items)
    }

    /// Single lookup. Absence is `Ok(None)`, not an error.
    pub fn get_by_id(&self, id: EntityId) -> ServiceResult<Option<Entity>> {
        debug!("GetById {} {}", self.entity_type(), id);
        Ok(self.store.find_by_id(self.entity_type(), id)?)
    }

    /// Replaces the stored entity with `entity`. The body id must equal `id`.
    pub fn update(&self, id: EntityId, mut entity: Entity) -> ServiceResult<Entity> {
        self.check_type(&entity)?;
        if entity.id != id {
            return Err(ServiceError::IdMismatch {
                path: id,
                body: entity.id,
            });
        }
        entity.data = self.schema.conform(entity.data)?;
        self.require(id)?;

        // A version of 0 means the caller never read one; the write is unconditional.
        let expected = (self.config.optimistic_concurrency && entity.version > 0)
            .then_some(entity.version);
        let stored = self.store.replace(entity, expected).inspect_err(|e| self.log_conflict(e))?;
        debug!("Updated {} {} (version {})", stored.entity_type, stored.id, stored.version);
        Ok(stored)
    }

    /// Applies a patch document to the stored entity and persists the result.
    /// Nothing is written unless every operation succeeds.
    pub fn patch(&self, id: EntityId, patch: &PatchDocument) -> ServiceResult<Entity> {
        if patch.is_empty() {
            return Err(QueryError::MissingPatch.into());
        }
        let existing = self.require(id)?;
        let patched = apply_patch(&self.schema, &existing, patch)?;

        let expected = self.config.optimistic_concurrency.then_some(existing.version);
        let stored = self.store.replace(patched, expected).inspect_err(|e| self.log_conflict(e))?;
        debug!(
            "Patched {} {} with {} operations (version {})",
            stored.entity_type,
            stored.id,
            patch.len(),
            stored.version
        );
        Ok(stored)
    }

    /// Removes the entity. Fails with `EntityNotFound` if it does not exist.
    pub fn delete(&self, id: EntityId) -> ServiceResult<()> {
        self.require(id)?;
        self.store.remove(self.entity_type(), id)?;
        debug!("Deleted {} {}", self.entity_type(), id);
        Ok(())
    }

    fn require(&self, id: EntityId) -> ServiceResult<Entity> {
        self.store
            .find_by_id(self.entity_type(), id)?
            .ok_or_else(|| ServiceError::EntityNotFound {
                entity_type: self.entity_type().to_string(),
                id,
            })
    }

    fn check_type(&self, entity: &Entity) -> ServiceResult<()> {
        if entity.entity_type != self.schema.entity_type {
            return Err(ServiceError::InvalidEntity(format!(
                "expected entity type {}, got {}",
                self.schema.entity_type, entity.entity_type
            )));
        }
        Ok(())
    }

    fn log_conflict(&self, err: &StoreError) {
        if let StoreError::VersionConflict { id, expected, actual } = err {
            warn!(
                "Write to {} {} rejected: expected version {}, found {}",
                self.entity_type(),
                id,
                expected,
                actual
            );
        }
    }
}
