//! Query and mutation engine for recordkit entities.
//!
//! Everything here is driven by an [`EntitySchema`](recordkit_model::EntitySchema):
//! - [`Predicate`]: filter criteria (AND) plus free-text search
//! - [`SortPlan`]: ordering by one field, ascending or descending
//! - [`Page`]: offset pagination over an ordered result
//! - [`apply_patch`]: RFC 6902 patch documents, all-or-nothing

mod error;
mod filter;
mod page;
mod patch;
mod sort;

pub use error::{QueryError, QueryResult};
pub use filter::{FilterCriterion, FilterOperator, FilterSet, Predicate};
pub use page::{paginate, Page};
pub use patch::{apply_patch, PatchDocument, PatchKind, PatchOperation};
pub use sort::{SortDirection, SortPlan, SortSpec};
