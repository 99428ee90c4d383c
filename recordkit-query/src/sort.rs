use crate::{QueryError, QueryResult};
use recordkit_model::{Entity, EntitySchema, FieldHandle, FieldValue};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Sort direction. Parsed case-insensitively from `asc`/`desc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
}

impl SortDirection {
    /// Blank input means ascending.
    pub fn parse(raw: &str) -> QueryResult<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "asc" => Ok(Self::Ascending),
            "desc" => Ok(Self::Descending),
            _ => Err(QueryError::InvalidSortOrder(raw.to_string())),
        }
    }
}

impl FromStr for SortDirection {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ascending => "asc",
            Self::Descending => "desc",
        })
    }
}

/// Requested ordering: a dotted field name and a direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    /// Builds a `SortSpec` from the external `sortField`/`sortOrder` pair.
    /// Without a field the order is ignored.
    pub fn from_params(field: Option<&str>, order: &str) -> QueryResult<Option<Self>> {
        let Some(field) = field.map(str::trim).filter(|f| !f.is_empty()) else {
            return Ok(None);
        };
        Ok(Some(Self::new(field, SortDirection::parse(order)?)))
    }
}

/// A validated ordering over one field.
///
/// Nulls sort last when ascending and first when descending. Sorting is
/// stable, so ties keep their input order.
#[derive(Debug, Clone)]
pub struct SortPlan<'s> {
    handle: FieldHandle<'s>,
    direction: SortDirection,
}

impl<'s> SortPlan<'s> {
    /// Returns `None` without a `SortSpec` or when its field is blank.
    pub fn plan(schema: &'s EntitySchema, spec: Option<&SortSpec>) -> QueryResult<Option<Self>> {
        let Some(spec) = spec else {
            return Ok(None);
        };
        let field = spec.field.trim();
        if field.is_empty() {
            return Ok(None);
        }

        let handle = schema.resolve_name(field)?;
        if handle.field_type().is_composite() {
            return Err(QueryError::UnsortableField(field.to_string()));
        }
        Ok(Some(Self {
            handle,
            direction: spec.direction,
        }))
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    pub fn compare(&self, a: &Entity, b: &Entity) -> Ordering {
        self.order(&self.handle.get(a), &self.handle.get(b))
    }

    fn order(&self, a: &FieldValue, b: &FieldValue) -> Ordering {
        let ord = match (a.is_null(), b.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => a.compare(b).unwrap_or(Ordering::Equal),
        };
        match self.direction {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    }

    /// Sorts entities, reading each sort key once.
    pub fn sort(&self, entities: Vec<Entity>) -> Vec<Entity> {
        let mut keyed: Vec<(FieldValue, Entity)> = entities
            .into_iter()
            .map(|e| (self.handle.get(&e), e))
            .collect();
        keyed.sort_by(|(a, _), (b, _)| self.order(a, b));
        keyed.into_iter().map(|(_, e)| e).collect()
    }
}
