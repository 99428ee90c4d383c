//! Library side of the `recordkit` binary: argument definitions and the
//! command runner, kept here so tests can drive them directly.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use recordkit_model::{Entity, EntitySchema};
use recordkit_query::PatchDocument;
use recordkit_service::{EntityRegistry, GetQuery, ServiceConfig};
use recordkit_store::{EntityStore, InMemoryStore};
use recordkit_types::EntityId;
use serde_json::{json, Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "recordkit")]
#[command(about = "Query and mutate entities described by a schema catalog")]
pub struct Args {
    /// Schema catalog: a JSON array of entity schemas
    #[arg(short, long)]
    pub schemas: PathBuf,

    /// Seed data: a JSON object mapping entity type to an array of entities
    #[arg(short, long)]
    pub data: Option<PathBuf>,

    /// Write every entity back to the data file after a successful mutation
    #[arg(long, requires = "data")]
    pub save: bool,

    /// Reject updates whose `Version` is stale; a body without one writes unconditionally
    #[arg(long)]
    pub optimistic: bool,

    /// Page size when a query does not give one
    #[arg(long, default_value = "10")]
    pub default_page_size: i64,

    /// Enable verbose debug logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the entity types in the catalog
    Types,

    /// Filter, search, sort and page through entities
    Query {
        entity_type: String,
        /// Filter criteria as JSON: [{"PropertyName":..,"Operator":..,"Value":..}]
        #[arg(long)]
        filters: Option<String>,
        #[arg(long)]
        search: Option<String>,
        #[arg(long, default_value = "1", allow_negative_numbers = true)]
        page: i64,
        #[arg(long, allow_negative_numbers = true)]
        page_size: Option<i64>,
        #[arg(long)]
        sort_field: Option<String>,
        #[arg(long, default_value = "asc")]
        sort_order: String,
    },

    /// Fetch one entity; prints null when absent
    Get { entity_type: String, id: String },

    /// Create an entity from JSON (inline or @file)
    Create { entity_type: String, json: String },

    /// Replace an entity with JSON (inline or @file)
    Update {
        entity_type: String,
        id: String,
        json: String,
    },

    /// Apply a JSON patch document (inline or @file)
    Patch {
        entity_type: String,
        id: String,
        json: String,
    },

    /// Delete an entity
    Delete { entity_type: String, id: String },
}

impl Command {
    fn mutates(&self) -> bool {
        matches!(
            self,
            Self::Create { .. } | Self::Update { .. } | Self::Patch { .. } | Self::Delete { .. }
        )
    }
}

/// Runs one command and returns its JSON output, pretty-printed.
pub fn run(args: &Args) -> Result<String> {
    let schemas = load_catalog(&args.schemas)?;
    let config = ServiceConfig {
        default_page_size: args.default_page_size,
        optimistic_concurrency: args.optimistic,
    };
    let store: Arc<dyn EntityStore> = Arc::new(InMemoryStore::with_types(
        schemas.iter().map(|s| s.entity_type.clone()),
    ));
    let registry = EntityRegistry::from_catalog(store, config, schemas);

    if let Some(path) = &args.data {
        let loaded = load_seed(&registry, path)?;
        info!("Loaded {} entities from {:?}", loaded, path);
    }

    let output = execute(&registry, &args.command)?;

    if args.save && args.command.mutates() {
        if let Some(path) = &args.data {
            save_data(&registry, path)?;
            info!("Saved data to {:?}", path);
        }
    }
    Ok(serde_json::to_string_pretty(&output)?)
}

fn execute(registry: &EntityRegistry, command: &Command) -> Result<Value> {
    let output = match command {
        Command::Types => json!(registry.entity_types()),
        Command::Query {
            entity_type,
            filters,
            search,
            page,
            page_size,
            sort_field,
            sort_order,
        } => {
            let service = registry.service(entity_type)?;
            let mut query = GetQuery::new();
            if let Some(raw) = filters {
                query = query.with_filters_json(raw)?;
            }
            query.search_term = search.clone();
            query.page_number = Some(*page);
            query.page_size = *page_size;
            query.sort_field = sort_field.clone();
            query.sort_order = Some(sort_order.clone());
            let items = service.get(&query)?;
            Value::Array(items.iter().map(Entity::to_json).collect())
        }
        Command::Get { entity_type, id } => {
            let service = registry.service(entity_type)?;
            service
                .get_by_id(parse_id(id)?)?
                .map_or(Value::Null, |e| e.to_json())
        }
        Command::Create { entity_type, json } => {
            let service = registry.service(entity_type)?;
            let entity = Entity::from_json(entity_type.as_str(), read_json(json)?)?;
            let id = service.create(entity)?;
            json!({ "id": id.to_string() })
        }
        Command::Update {
            entity_type,
            id,
            json,
        } => {
            let service = registry.service(entity_type)?;
            let id = parse_id(id)?;
            let entity = Entity::from_json(entity_type.as_str(), read_json(json)?)?;
            service.update(id, entity)?.to_json()
        }
        Command::Patch {
            entity_type,
            id,
            json,
        } => {
            let service = registry.service(entity_type)?;
            let patch: PatchDocument =
                serde_json::from_value(read_json(json)?).context("Failed to parse patch document")?;
            service.patch(parse_id(id)?, &patch)?.to_json()
        }
        Command::Delete { entity_type, id } => {
            let service = registry.service(entity_type)?;
            service.delete(parse_id(id)?)?;
            json!({ "status": true })
        }
    };
    Ok(output)
}

fn load_catalog(path: &Path) -> Result<Vec<EntitySchema>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read schema catalog {}", path.display()))?;
    let schemas: Vec<EntitySchema> =
        serde_json::from_str(&raw).context("Failed to parse schema catalog")?;
    if schemas.is_empty() {
        bail!("schema catalog {} declares no entity types", path.display());
    }
    Ok(schemas)
}

fn load_seed(registry: &EntityRegistry, path: &Path) -> Result<usize> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read data file {}", path.display()))?;
    let seed: Map<String, Value> =
        serde_json::from_str(&raw).context("Failed to parse data file")?;

    let mut loaded = 0;
    for (entity_type, items) in seed {
        let service = registry.service(&entity_type)?;
        let Value::Array(items) = items else {
            bail!("data for {entity_type} must be an array");
        };
        for (index, item) in items.into_iter().enumerate() {
            let entity = Entity::from_json(entity_type.as_str(), item)
                .with_context(|| format!("{entity_type}[{index}]"))?;
            service
                .import(entity)
                .with_context(|| format!("Failed to load {entity_type}[{index}]"))?;
            loaded += 1;
        }
    }
    Ok(loaded)
}

fn save_data(registry: &EntityRegistry, path: &Path) -> Result<()> {
    let mut out = Map::new();
    for entity_type in registry.entity_types() {
        let items = registry.store().query_all(entity_type)?;
        out.insert(
            entity_type.to_string(),
            Value::Array(items.iter().map(Entity::to_json).collect()),
        );
    }
    fs::write(path, serde_json::to_string_pretty(&Value::Object(out))?)
        .with_context(|| format!("Failed to write data file {}", path.display()))
}

fn parse_id(raw: &str) -> Result<EntityId> {
    EntityId::parse(raw).with_context(|| format!("Invalid id: {raw}"))
}

/// Inline JSON, or `@path` to read it from a file.
fn read_json(raw: &str) -> Result<Value> {
    let text = match raw.strip_prefix('@') {
        Some(path) => fs::read_to_string(path).with_context(|| format!("Failed to read {path}"))?,
        None => raw.to_string(),
    };
    serde_json::from_str(&text).context("Failed to parse JSON argument")
}
