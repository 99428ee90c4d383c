//! Core entity model for recordkit.
//!
//! Defines the types every other crate builds on:
//! - [`Entity`]: the generic record (id, type, JSON payload, version, timestamps)
//! - [`EntitySchema`]: declares an entity type's fields, their types and which are searchable
//! - [`FieldValue`]: a typed value read from or coerced into a field
//! - [`FieldPath`] / [`FieldHandle`]: name resolution and typed get/set on an entity
//!
//! One schema per entity type replaces any per-type code: filtering, sorting,
//! searching and patching all go through [`EntitySchema::resolve`].

mod accessor;
mod entity;
mod error;
mod path;
mod schema;
mod value;

pub use accessor::{FieldHandle, Slot};
pub use entity::Entity;
pub use error::{ModelError, ModelResult};
pub use path::{FieldPath, PathStep};
pub use schema::{EntitySchema, FieldDef, FieldType, ID_FIELD, VERSION_FIELD};
pub use value::FieldValue;
