use crate::{Entity, FieldPath, FieldValue, ModelError, ModelResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Name of the identifier field every entity type exposes.
pub const ID_FIELD: &str = "Id";

/// Wire-form member carrying the stored version of an entity.
pub const VERSION_FIELD: &str = "Version";

/// Describes an entity type's fields for filtering, sorting, search and patching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitySchema {
    pub entity_type: String,
    pub fields: Vec<FieldDef>,
}

impl EntitySchema {
    pub fn new(entity_type: impl Into<String>, fields: Vec<FieldDef>) -> Self {
        Self {
            entity_type: entity_type.into(),
            fields,
        }
    }

    /// Looks up a top-level field by exact name.
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Paths of every searchable text field, including those nested in
    /// navigation objects. Collections are not searched.
    pub fn searchable_paths(&self) -> Vec<FieldPath> {
        let mut out = Vec::new();
        collect_searchable(&self.fields, &mut Vec::new(), &mut out);
        out
    }

    /// Validates a JSON payload against this schema and returns its canonical
    /// form: coerced values, missing fields back-filled with type defaults and
    /// any `Id` or `Version` key stripped (both live on [`Entity`] itself).
    pub fn conform(&self, data: Value) -> ModelResult<Value> {
        let Value::Object(mut map) = data else {
            return Err(ModelError::InvalidEntity(format!(
                "{} data must be a JSON object",
                self.entity_type
            )));
        };
        map.remove(ID_FIELD);
        map.remove(VERSION_FIELD);
        conform_object(&self.fields, map, "").map(Value::Object)
    }

    /// Checks that a stored entity belongs to this type and that its payload
    /// conforms, without modifying it.
    pub fn validate(&self, entity: &Entity) -> ModelResult<()> {
        if entity.entity_type != self.entity_type {
            return Err(ModelError::InvalidEntity(format!(
                "expected entity type {}, got {}",
                self.entity_type, entity.entity_type
            )));
        }
        self.conform(entity.data.clone()).map(|_| ())
    }
}

fn collect_searchable(fields: &[FieldDef], prefix: &mut Vec<String>, out: &mut Vec<FieldPath>) {
    for field in fields {
        match field.field_type {
            FieldType::Navigation => {
                prefix.push(field.name.clone());
                collect_searchable(field.children(), prefix, out);
                prefix.pop();
            }
            t if t.is_textual() && field.searchable => {
                let mut names = prefix.clone();
                names.push(field.name.clone());
                out.push(FieldPath::from_names(names));
            }
            _ => {}
        }
    }
}

pub(crate) fn conform_object(
    fields: &[FieldDef],
    mut map: Map<String, Value>,
    prefix: &str,
) -> ModelResult<Map<String, Value>> {
    if let Some(unknown) = map.keys().find(|k| !fields.iter().any(|f| &f.name == *k)) {
        return Err(ModelError::UnknownField(format!("{prefix}/{unknown}")));
    }

    let mut out = Map::with_capacity(fields.len());
    for field in fields {
        let path = format!("{prefix}/{}", field.name);
        let value = match map.remove(&field.name) {
            Some(v) => conform_value(field, v, &path)?,
            None => field.default_value(),
        };
        out.insert(field.name.clone(), value);
    }
    Ok(out)
}

/// Coerces one JSON value into the canonical representation of `field`.
pub(crate) fn conform_value(field: &FieldDef, value: Value, path: &str) -> ModelResult<Value> {
    match field.field_type {
        FieldType::Navigation => match value {
            Value::Null => Ok(Value::Null),
            Value::Object(map) => conform_object(field.children(), map, path).map(Value::Object),
            other => Err(field.invalid(&other)),
        },
        FieldType::Collection => match value {
            Value::Null if field.nullable => Ok(Value::Null),
            Value::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| conform_element(field, item, &format!("{path}/{i}")))
                .collect::<ModelResult<Vec<_>>>()
                .map(Value::Array),
            other => Err(field.invalid(&other)),
        },
        _ => FieldValue::from_json(field, &value).map(|v| v.to_json()),
    }
}

/// Coerces one element of a collection field.
pub(crate) fn conform_element(collection: &FieldDef, value: Value, path: &str) -> ModelResult<Value> {
    match value {
        Value::Object(map) => conform_object(collection.children(), map, path).map(Value::Object),
        other => Err(collection.invalid(&other)),
    }
}

/// A single field of an entity type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub field_type: FieldType,
    /// Participates in free-text search. Only meaningful for textual fields.
    #[serde(default)]
    pub searchable: bool,
    #[serde(default)]
    pub nullable: bool,
    /// Allowed values. Only meaningful when FieldType is Enum.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(alias = "options")]
    pub enum_options: Option<Vec<String>>,
    /// Shape of a navigation object, or of each collection element.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<FieldDef>>,
}

impl FieldDef {
    fn simple(name: &str, field_type: FieldType, searchable: bool) -> Self {
        Self {
            name: name.into(),
            field_type,
            searchable,
            nullable: false,
            enum_options: None,
            fields: None,
        }
    }

    /// Shorthand for a text field.
    pub fn text(name: &str, searchable: bool) -> Self {
        Self::simple(name, FieldType::Text, searchable)
    }

    pub fn integer(name: &str) -> Self {
        Self::simple(name, FieldType::Integer, false)
    }

    pub fn decimal(name: &str) -> Self {
        Self::simple(name, FieldType::Decimal, false)
    }

    pub fn bool(name: &str) -> Self {
        Self::simple(name, FieldType::Bool, false)
    }

    pub fn datetime(name: &str) -> Self {
        Self::simple(name, FieldType::DateTime, false)
    }

    pub fn uuid(name: &str) -> Self {
        Self::simple(name, FieldType::Uuid, false)
    }

    /// Shorthand for an enum field with fixed options.
    pub fn enumeration(name: &str, options: Vec<String>) -> Self {
        Self {
            enum_options: Some(options),
            ..Self::simple(name, FieldType::Enum, false)
        }
    }

    /// A related object loaded alongside the entity. Always nullable.
    pub fn navigation(name: &str, fields: Vec<FieldDef>) -> Self {
        Self {
            nullable: true,
            fields: Some(fields),
            ..Self::simple(name, FieldType::Navigation, false)
        }
    }

    /// A list of related objects loaded alongside the entity.
    pub fn collection(name: &str, fields: Vec<FieldDef>) -> Self {
        Self {
            fields: Some(fields),
            ..Self::simple(name, FieldType::Collection, false)
        }
    }

    /// Marks the field as accepting null.
    pub fn optional(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Includes the field in free-text search.
    pub fn with_search(mut self) -> Self {
        self.searchable = true;
        self
    }

    /// Nested fields of a navigation or collection field.
    pub fn children(&self) -> &[FieldDef] {
        self.fields.as_deref().unwrap_or(&[])
    }

    pub fn child(&self, name: &str) -> Option<&FieldDef> {
        self.children().iter().find(|f| f.name == name)
    }

    /// The value a field takes when it is created without one or removed.
    pub fn default_value(&self) -> Value {
        if self.nullable {
            return Value::Null;
        }
        match self.field_type {
            FieldType::Text => Value::String(String::new()),
            FieldType::Integer => Value::from(0),
            FieldType::Decimal => Value::from(0.0),
            FieldType::Bool => Value::Bool(false),
            FieldType::DateTime => FieldValue::DateTime(chrono::DateTime::<chrono::Utc>::UNIX_EPOCH).to_json(),
            FieldType::Uuid => Value::String(uuid::Uuid::nil().to_string()),
            FieldType::Enum => self
                .enum_options
                .as_ref()
                .and_then(|o| o.first())
                .map(|s| Value::String(s.clone()))
                .unwrap_or(Value::Null),
            FieldType::Navigation => Value::Null,
            FieldType::Collection => Value::Array(Vec::new()),
        }
    }

    pub(crate) fn invalid(&self, value: &impl fmt::Display) -> ModelError {
        ModelError::InvalidValue {
            field: self.name.clone(),
            expected: self.field_type,
            value: value.to_string(),
        }
    }
}

/// The declared type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Integer,
    Decimal,
    Bool,
    #[serde(alias = "datetime")]
    DateTime,
    Uuid,
    Enum,
    Navigation,
    Collection,
}

impl FieldType {
    /// Supports GreaterThan/LessThan style comparisons and sorting.
    pub fn is_orderable(self) -> bool {
        matches!(
            self,
            Self::Text | Self::Integer | Self::Decimal | Self::DateTime | Self::Enum
        )
    }

    /// Supports substring operators and free-text search.
    pub fn is_textual(self) -> bool {
        matches!(self, Self::Text | Self::Enum)
    }

    /// Holds related objects rather than a scalar.
    pub fn is_composite(self) -> bool {
        matches!(self, Self::Navigation | Self::Collection)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Decimal => "decimal",
            Self::Bool => "bool",
            Self::DateTime => "datetime",
            Self::Uuid => "uuid",
            Self::Enum => "enum",
            Self::Navigation => "navigation",
            Self::Collection => "collection",
        };
        f.write_str(name)
    }
}
