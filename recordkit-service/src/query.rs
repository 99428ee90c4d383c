use crate::ServiceConfig;
use recordkit_query::{FilterCriterion, FilterSet, QueryResult};
use serde::{Deserialize, Serialize};

/// Parameters of a `get` request.
///
/// Mirrors the external query string: `filters`, `searchTerm`, `pageNumber`,
/// `pageSize`, `sortField`, `sortOrder`. Absent values take their defaults
/// when the query runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GetQuery {
    pub filters: FilterSet,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_term: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_number: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<String>,
}

impl GetQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filters(mut self, filters: impl Into<FilterSet>) -> Self {
        self.filters = filters.into();
        self
    }

    /// Sets filters from their JSON string form, as received in a query string.
    pub fn with_filters_json(mut self, raw: &str) -> QueryResult<Self> {
        self.filters = FilterSet::from_json(raw)?;
        Ok(self)
    }

    pub fn filter(mut self, criterion: FilterCriterion) -> Self {
        self.filters.push(criterion);
        self
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search_term = Some(term.into());
        self
    }

    pub fn page(mut self, number: i64, size: i64) -> Self {
        self.page_number = Some(number);
        self.page_size = Some(size);
        self
    }

    pub fn sort(mut self, field: impl Into<String>, order: impl Into<String>) -> Self {
        self.sort_field = Some(field.into());
        self.sort_order = Some(order.into());
        self
    }

    pub fn page_number(&self) -> i64 {
        self.page_number.unwrap_or(1)
    }

    pub fn page_size(&self, config: &ServiceConfig) -> i64 {
        self.page_size.unwrap_or(config.default_page_size)
    }

    pub fn sort_order(&self) -> &str {
        self.sort_order.as_deref().unwrap_or("asc")
    }
}
