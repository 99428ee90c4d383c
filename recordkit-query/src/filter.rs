//! Filter criteria and free-text search, compiled into a [`Predicate`].

use crate::{QueryError, QueryResult};
use recordkit_model::{Entity, EntitySchema, FieldHandle, FieldValue, ModelResult};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;
use tracing::{debug, warn};

/// Comparison applied by one filter criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterOperator {
    Equal,
    NotEqual,
    GreaterThan,
    LessThan,
    GreaterOrEqual,
    LessOrEqual,
    Contains,
    StartsWith,
    EndsWith,
    In,
}

impl FilterOperator {
    pub const ALL: [FilterOperator; 10] = [
        Self::Equal,
        Self::NotEqual,
        Self::GreaterThan,
        Self::LessThan,
        Self::GreaterOrEqual,
        Self::LessOrEqual,
        Self::Contains,
        Self::StartsWith,
        Self::EndsWith,
        Self::In,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equal => "Equal",
            Self::NotEqual => "NotEqual",
            Self::GreaterThan => "GreaterThan",
            Self::LessThan => "LessThan",
            Self::GreaterOrEqual => "GreaterOrEqual",
            Self::LessOrEqual => "LessOrEqual",
            Self::Contains => "Contains",
            Self::StartsWith => "StartsWith",
            Self::EndsWith => "EndsWith",
            Self::In => "In",
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `(property, operator, value)` test.
///
/// Wire form: `{"PropertyName": "Status", "Operator": "Equal", "Value": "Open"}`.
/// `Value` is a string; JSON numbers and booleans are accepted and read as
/// their string form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FilterCriterion {
    pub property_name: String,
    pub operator: FilterOperator,
    #[serde(default, deserialize_with = "scalar_string")]
    pub value: String,
}

impl FilterCriterion {
    pub fn new(property_name: impl Into<String>, operator: FilterOperator, value: impl Into<String>) -> Self {
        Self {
            property_name: property_name.into(),
            operator,
            value: value.into(),
        }
    }
}

fn scalar_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Null => Ok(String::new()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "filter value must be a scalar, got {other}"
        ))),
    }
}

/// Ordered criteria combined with AND. Empty matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSet {
    criteria: Vec<FilterCriterion>,
}

impl FilterSet {
    pub fn new(criteria: Vec<FilterCriterion>) -> Self {
        Self { criteria }
    }

    /// Parses the external filter expression: a JSON array of criteria.
    /// Blank input and `null` are the empty set.
    pub fn from_json(raw: &str) -> QueryResult<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let parsed: Option<Self> =
            serde_json::from_str(raw).map_err(|e| QueryError::InvalidFilterValue {
                field: "filters".to_string(),
                value: raw.to_string(),
                reason: e.to_string(),
            })?;
        Ok(parsed.unwrap_or_default())
    }

    pub fn push(&mut self, criterion: FilterCriterion) {
        self.criteria.push(criterion);
    }

    pub fn iter(&self) -> impl Iterator<Item = &FilterCriterion> {
        self.criteria.iter()
    }

    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }
}

impl From<Vec<FilterCriterion>> for FilterSet {
    fn from(criteria: Vec<FilterCriterion>) -> Self {
        Self::new(criteria)
    }
}

#[derive(Debug, Clone, Copy)]
enum Bound {
    Gt,
    Lt,
    Ge,
    Le,
}

#[derive(Debug, Clone, Copy)]
enum TextMatch {
    Contains,
    StartsWith,
    EndsWith,
}

impl TextMatch {
    fn matches(self, haystack: &str, needle: &str) -> bool {
        let haystack = haystack.to_lowercase();
        match self {
            Self::Contains => haystack.contains(needle),
            Self::StartsWith => haystack.starts_with(needle),
            Self::EndsWith => haystack.ends_with(needle),
        }
    }
}

#[derive(Debug, Clone)]
enum Test {
    Eq(FieldValue),
    Ne(FieldValue),
    Ordered(Bound, FieldValue),
    /// Needle is stored lowercased.
    Text(TextMatch, String),
    In(Vec<FieldValue>),
}

#[derive(Debug, Clone)]
struct Clause<'s> {
    handle: FieldHandle<'s>,
    test: Test,
}

impl<'s> Clause<'s> {
    fn build(schema: &'s EntitySchema, criterion: &FilterCriterion) -> QueryResult<Self> {
        let handle = schema.resolve_name(&criterion.property_name)?;
        let field_type = handle.field_type();
        let unsupported = || QueryError::UnsupportedOperator {
            field: criterion.property_name.clone(),
            operator: criterion.operator.to_string(),
            field_type,
        };
        if field_type.is_composite() {
            return Err(unsupported());
        }

        let coerce = |raw: &str| {
            handle.parse(raw).map_err(|e| QueryError::InvalidFilterValue {
                field: criterion.property_name.clone(),
                value: raw.to_string(),
                reason: e.to_string(),
            })
        };

        let bound = match criterion.operator {
            FilterOperator::GreaterThan => Some(Bound::Gt),
            FilterOperator::LessThan => Some(Bound::Lt),
            FilterOperator::GreaterOrEqual => Some(Bound::Ge),
            FilterOperator::LessOrEqual => Some(Bound::Le),
            _ => None,
        };
        let text = match criterion.operator {
            FilterOperator::Contains => Some(TextMatch::Contains),
            FilterOperator::StartsWith => Some(TextMatch::StartsWith),
            FilterOperator::EndsWith => Some(TextMatch::EndsWith),
            _ => None,
        };

        let test = match criterion.operator {
            FilterOperator::Equal => Test::Eq(coerce(&criterion.value)?),
            FilterOperator::NotEqual => Test::Ne(coerce(&criterion.value)?),
            FilterOperator::In => Test::In(
                criterion
                    .value
                    .split(',')
                    .map(|item| coerce(item.trim()))
                    .collect::<QueryResult<Vec<_>>>()?,
            ),
            _ => match (bound, text) {
                (Some(bound), _) if field_type.is_orderable() => {
                    Test::Ordered(bound, coerce(&criterion.value)?)
                }
                (_, Some(text)) if field_type.is_textual() => {
                    Test::Text(text, criterion.value.to_lowercase())
                }
                _ => return Err(unsupported()),
            },
        };
        Ok(Self { handle, test })
    }

    fn test(&self, entity: &Entity) -> bool {
        let actual = self.handle.get(entity);
        match &self.test {
            Test::Eq(v) => actual == *v,
            Test::Ne(v) => actual != *v,
            Test::Ordered(bound, v) => match actual.compare(v) {
                Some(ord) => match bound {
                    Bound::Gt => ord == Ordering::Greater,
                    Bound::Lt => ord == Ordering::Less,
                    Bound::Ge => ord != Ordering::Less,
                    Bound::Le => ord != Ordering::Greater,
                },
                None => false,
            },
            Test::Text(m, needle) => actual.as_text().is_some_and(|s| m.matches(s, needle)),
            Test::In(values) => values.iter().any(|v| actual == *v),
        }
    }
}

#[derive(Debug, Clone)]
struct Search<'s> {
    needle: String,
    fields: Vec<FieldHandle<'s>>,
}

impl Search<'_> {
    fn test(&self, entity: &Entity) -> bool {
        self.fields.iter().any(|h| {
            h.get(entity)
                .as_text()
                .is_some_and(|s| TextMatch::Contains.matches(s, &self.needle))
        })
    }
}

/// A compiled filter: every criterion must hold, and when a search term is
/// present at least one searchable field must contain it.
#[derive(Debug, Clone)]
pub struct Predicate<'s> {
    clauses: Vec<Clause<'s>>,
    search: Option<Search<'s>>,
}

impl<'s> Predicate<'s> {
    /// Resolves and coerces every criterion up front, so an invalid request
    /// fails before any entity is examined.
    pub fn build(schema: &'s EntitySchema, filters: &FilterSet, search_term: Option<&str>) -> QueryResult<Self> {
        let clauses = filters
            .iter()
            .map(|c| Clause::build(schema, c))
            .collect::<QueryResult<Vec<_>>>()?;

        let search = match search_term.map(str::trim).filter(|t| !t.is_empty()) {
            None => None,
            Some(term) => {
                let fields = schema
                    .searchable_paths()
                    .iter()
                    .map(|p| schema.resolve(p))
                    .collect::<ModelResult<Vec<_>>>()?;
                if fields.is_empty() {
                    warn!(
                        "Search term supplied for {} which has no searchable fields",
                        schema.entity_type
                    );
                }
                Some(Search {
                    needle: term.to_lowercase(),
                    fields,
                })
            }
        };

        debug!(
            "Built predicate for {}: {} criteria, search={}",
            schema.entity_type,
            clauses.len(),
            search.is_some()
        );
        Ok(Self { clauses, search })
    }

    /// The predicate that accepts every entity.
    pub fn always() -> Self {
        Self {
            clauses: Vec::new(),
            search: None,
        }
    }

    pub fn is_always(&self) -> bool {
        self.clauses.is_empty() && self.search.is_none()
    }

    pub fn test(&self, entity: &Entity) -> bool {
        self.clauses.iter().all(|c| c.test(entity))
            && self.search.as_ref().is_none_or(|s| s.test(entity))
    }
}
