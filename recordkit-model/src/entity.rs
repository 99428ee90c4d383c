use crate::{FieldType, ModelError, ModelResult, ID_FIELD, VERSION_FIELD};
use recordkit_types::EntityId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A generic record managed by the engine.
///
/// `data` holds the entity's fields as a JSON object whose shape is declared
/// by the type's [`crate::EntitySchema`]. Related sub-entities are nested in
/// `data` as navigation objects or collections. `version`, `created_at` and
/// `modified_at` are maintained by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub entity_type: String,
    pub data: Value,
    #[serde(default)]
    pub version: u64,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub modified_at: i64,
}

impl Entity {
    /// An entity that has not been stored yet. The service assigns its id.
    pub fn draft(entity_type: impl Into<String>, data: Value) -> Self {
        Self::with_id(EntityId::nil(), entity_type, data)
    }

    pub fn with_id(id: EntityId, entity_type: impl Into<String>, data: Value) -> Self {
        Self {
            id,
            entity_type: entity_type.into(),
            data,
            version: 0,
            created_at: 0,
            modified_at: 0,
        }
    }

    /// Builds an entity from its wire form: the field object with optional
    /// `"Id"` and `"Version"` members. A missing or null `Id` yields a draft;
    /// a missing `Version` reads as 0.
    pub fn from_json(entity_type: impl Into<String>, json: Value) -> ModelResult<Self> {
        let Value::Object(mut map) = json else {
            return Err(ModelError::InvalidEntity(
                "entity body must be a JSON object".into(),
            ));
        };
        let id = match map.remove(ID_FIELD) {
            None | Some(Value::Null) => EntityId::nil(),
            Some(Value::String(s)) => EntityId::parse(&s).map_err(|_| invalid_id(&s))?,
            Some(other) => return Err(invalid_id(&other)),
        };
        let version = match map.remove(VERSION_FIELD) {
            None | Some(Value::Null) => 0,
            Some(Value::Number(n)) => n.as_u64().ok_or_else(|| invalid_version(&n))?,
            Some(other) => return Err(invalid_version(&other)),
        };
        let mut entity = Self::with_id(id, entity_type, Value::Object(map));
        entity.version = version;
        Ok(entity)
    }

    /// The wire form: `data` with `"Id"` merged in, plus `"Version"` once the
    /// entity has been stored.
    pub fn to_json(&self) -> Value {
        let mut out = serde_json::Map::new();
        out.insert(ID_FIELD.to_string(), Value::String(self.id.to_string()));
        if self.version > 0 {
            out.insert(VERSION_FIELD.to_string(), Value::from(self.version));
        }
        if let Value::Object(map) = &self.data {
            out.extend(map.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        Value::Object(out)
    }
}

fn invalid_id(value: &impl std::fmt::Display) -> ModelError {
    ModelError::InvalidValue {
        field: ID_FIELD.to_string(),
        expected: FieldType::Uuid,
        value: value.to_string(),
    }
}

fn invalid_version(value: &impl std::fmt::Display) -> ModelError {
    ModelError::InvalidValue {
        field: VERSION_FIELD.to_string(),
        expected: FieldType::Integer,
        value: value.to_string(),
    }
}
