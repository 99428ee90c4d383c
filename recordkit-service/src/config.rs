use serde::{Deserialize, Serialize};

/// Page size used when a query does not specify one.
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Configuration shared by every entity service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Page size for queries that omit `pageSize`.
    pub default_page_size: i64,
    /// Reject writes whose entity version no longer matches the store.
    pub optimistic_concurrency: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            optimistic_concurrency: false,
        }
    }
}
