use crate::{EntityService, ServiceConfig, ServiceError, ServiceResult};
use recordkit_model::EntitySchema;
use recordkit_store::EntityStore;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

/// One [`EntityService`] per registered entity type, all sharing a store.
pub struct EntityRegistry {
    store: Arc<dyn EntityStore>,
    config: ServiceConfig,
    services: BTreeMap<String, EntityService>,
}

impl EntityRegistry {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self::with_config(store, ServiceConfig::default())
    }

    pub fn with_config(store: Arc<dyn EntityStore>, config: ServiceConfig) -> Self {
        Self {
            store,
            config,
            services: BTreeMap::new(),
        }
    }

    /// Registers every schema of a catalog.
    pub fn from_catalog(
        store: Arc<dyn EntityStore>,
        config: ServiceConfig,
        schemas: impl IntoIterator<Item = EntitySchema>,
    ) -> Self {
        let mut registry = Self::with_config(store, config);
        for schema in schemas {
            registry.register(schema);
        }
        registry
    }

    /// Adds a service for the schema's entity type. A second registration of
    /// the same type replaces the first.
    pub fn register(&mut self, schema: EntitySchema) -> &EntityService {
        let entity_type = schema.entity_type.clone();
        let service = EntityService::with_config(schema, Arc::clone(&self.store), self.config.clone());
        match self.services.entry(entity_type) {
            Entry::Occupied(mut slot) => {
                warn!("Replaced existing registration for {}", slot.key());
                slot.insert(service);
                slot.into_mut()
            }
            Entry::Vacant(slot) => {
                info!("Registered entity type {}", slot.key());
                slot.insert(service)
            }
        }
    }

    pub fn service(&self, entity_type: &str) -> ServiceResult<&EntityService> {
        self.services
            .get(entity_type)
            .ok_or_else(|| ServiceError::UnknownEntityType(entity_type.to_string()))
    }

    /// Registered entity types in name order.
    pub fn entity_types(&self) -> Vec<&str> {
        self.services.keys().map(String::as_str).collect()
    }

    pub fn store(&self) -> &Arc<dyn EntityStore> {
        &self.store
    }
}
