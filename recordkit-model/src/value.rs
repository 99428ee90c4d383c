use crate::{FieldDef, FieldType, ModelResult};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;
use uuid::Uuid;

/// A typed value read from a field or coerced from request input.
#[derive(Debug, Clone)]
pub enum FieldValue {
    Null,
    Text(String),
    Integer(i64),
    Decimal(f64),
    Bool(bool),
    DateTime(DateTime<Utc>),
    Uuid(Uuid),
    /// Navigation objects and collections, kept as JSON.
    Composite(Value),
}

impl FieldValue {
    /// Coerces a filter string into the field's type.
    ///
    /// An empty string on a nullable non-text field means null.
    pub fn parse(field: &FieldDef, raw: &str) -> ModelResult<Self> {
        if raw.is_empty() && !field.field_type.is_textual() {
            return if field.nullable {
                Ok(Self::Null)
            } else {
                Err(field.invalid(&"\"\""))
            };
        }

        let parsed = match field.field_type {
            FieldType::Text => Some(Self::Text(raw.to_string())),
            FieldType::Enum => enum_member(field, raw).map(Self::Text),
            FieldType::Integer => raw.trim().parse().ok().map(Self::Integer),
            FieldType::Decimal => raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(Self::Decimal),
            FieldType::Bool => parse_bool(raw).map(Self::Bool),
            FieldType::DateTime => parse_datetime(raw).map(Self::DateTime),
            FieldType::Uuid => Uuid::parse_str(raw.trim()).ok().map(Self::Uuid),
            FieldType::Navigation | FieldType::Collection => None,
        };
        parsed.ok_or_else(|| field.invalid(&raw))
    }

    /// Coerces a JSON value into the field's type. Strings are accepted for
    /// every scalar type and parsed as in [`FieldValue::parse`].
    pub fn from_json(field: &FieldDef, json: &Value) -> ModelResult<Self> {
        if json.is_null() {
            return if field.nullable {
                Ok(Self::Null)
            } else {
                Err(field.invalid(json))
            };
        }
        if let Value::String(s) = json {
            return Self::parse(field, s);
        }

        let coerced = match (field.field_type, json) {
            (FieldType::Text, Value::Number(n)) => Some(Self::Text(n.to_string())),
            (FieldType::Text, Value::Bool(b)) => Some(Self::Text(b.to_string())),
            (FieldType::Integer, Value::Number(n)) => n.as_i64().map(Self::Integer),
            (FieldType::Decimal, Value::Number(n)) => n.as_f64().map(Self::Decimal),
            (FieldType::Bool, Value::Bool(b)) => Some(Self::Bool(*b)),
            (FieldType::Navigation, Value::Object(_)) | (FieldType::Collection, Value::Array(_)) => {
                Some(Self::Composite(json.clone()))
            }
            _ => None,
        };
        coerced.ok_or_else(|| field.invalid(json))
    }

    /// Canonical JSON representation, as stored in [`crate::Entity::data`].
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Text(s) => Value::String(s.clone()),
            Self::Integer(i) => Value::from(*i),
            Self::Decimal(f) => Value::from(*f),
            Self::Bool(b) => Value::Bool(*b),
            Self::DateTime(dt) => Value::String(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Self::Uuid(u) => Value::String(u.to_string()),
            Self::Composite(v) => v.clone(),
        }
    }

    /// Natural ordering between two values of the same kind. Integers and
    /// decimals compare numerically. Returns `None` for null or mismatched
    /// kinds; callers decide where those go.
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => Some(a.cmp(b)),
            (Self::Decimal(a), Self::Decimal(b)) => a.partial_cmp(b),
            (Self::Integer(a), Self::Decimal(b)) => (*a as f64).partial_cmp(b),
            (Self::Decimal(a), Self::Integer(b)) => a.partial_cmp(&(*b as f64)),
            (Self::Text(a), Self::Text(b)) => Some(a.cmp(b)),
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            (Self::DateTime(a), Self::DateTime(b)) => Some(a.cmp(b)),
            (Self::Uuid(a), Self::Uuid(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Text(_) => "text",
            Self::Integer(_) => "integer",
            Self::Decimal(_) => "decimal",
            Self::Bool(_) => "bool",
            Self::DateTime(_) => "datetime",
            Self::Uuid(_) => "uuid",
            Self::Composite(_) => "composite",
        }
    }
}

fn enum_member(field: &FieldDef, raw: &str) -> Option<String> {
    let options = field.enum_options.as_deref().unwrap_or(&[]);
    options.iter().find(|o| o.as_str() == raw).cloned()
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Composite(a), Self::Composite(b)) => a == b,
            _ => self.compare(other) == Some(Ordering::Equal),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Text(s) => f.write_str(s),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Decimal(d) => write!(f, "{d}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::DateTime(_) | Self::Uuid(_) | Self::Composite(_) => match self.to_json() {
                Value::String(s) => f.write_str(&s),
                other => write!(f, "{other}"),
            },
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        Self::Decimal(f)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}
