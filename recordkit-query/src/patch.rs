//! RFC 6902 patch documents applied through the field accessor.
//!
//! A document is applied to a working copy of the entity. The caller only
//! sees the result when every operation succeeded.

use crate::{QueryError, QueryResult};
use recordkit_model::{Entity, EntitySchema, FieldHandle, FieldPath, FieldValue};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::debug;

/// Patch operation vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchKind {
    Add,
    Remove,
    Replace,
    Move,
    Copy,
    Test,
}

impl fmt::Display for PatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Add => "add",
            Self::Remove => "remove",
            Self::Replace => "replace",
            Self::Move => "move",
            Self::Copy => "copy",
            Self::Test => "test",
        })
    }
}

/// One `{op, path, from?, value?}` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchOperation {
    pub op: PatchKind,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    /// `Some(Value::Null)` when the document carries an explicit `null`.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

impl PatchOperation {
    fn with(op: PatchKind, path: &str, from: Option<&str>, value: Option<Value>) -> Self {
        Self {
            op,
            path: path.to_string(),
            from: from.map(str::to_string),
            value,
        }
    }

    pub fn add(path: &str, value: Value) -> Self {
        Self::with(PatchKind::Add, path, None, Some(value))
    }

    pub fn remove(path: &str) -> Self {
        Self::with(PatchKind::Remove, path, None, None)
    }

    pub fn replace(path: &str, value: Value) -> Self {
        Self::with(PatchKind::Replace, path, None, Some(value))
    }

    pub fn move_from(from: &str, path: &str) -> Self {
        Self::with(PatchKind::Move, path, Some(from), None)
    }

    pub fn copy_from(from: &str, path: &str) -> Self {
        Self::with(PatchKind::Copy, path, Some(from), None)
    }

    pub fn test(path: &str, value: Value) -> Self {
        Self::with(PatchKind::Test, path, None, Some(value))
    }

    fn required_value(&self) -> QueryResult<Value> {
        self.value
            .clone()
            .ok_or_else(|| QueryError::InvalidPatch(format!("{} at {} requires a value", self.op, self.path)))
    }

    fn required_from(&self) -> QueryResult<&str> {
        self.from
            .as_deref()
            .ok_or_else(|| QueryError::InvalidPatch(format!("{} to {} requires from", self.op, self.path)))
    }
}

/// An ordered list of patch operations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatchDocument {
    operations: Vec<PatchOperation>,
}

impl PatchDocument {
    pub fn new(operations: Vec<PatchOperation>) -> Self {
        Self { operations }
    }

    /// Parses a JSON patch array. `null` yields an empty document.
    pub fn from_json(raw: &str) -> QueryResult<Self> {
        let parsed: Option<Self> =
            serde_json::from_str(raw).map_err(|e| QueryError::InvalidPatch(e.to_string()))?;
        Ok(parsed.unwrap_or_default())
    }

    pub fn iter(&self) -> impl Iterator<Item = &PatchOperation> {
        self.operations.iter()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

impl From<Vec<PatchOperation>> for PatchDocument {
    fn from(operations: Vec<PatchOperation>) -> Self {
        Self::new(operations)
    }
}

/// Applies `patch` to a copy of `entity` and returns the copy.
///
/// Fails with `MissingPatch` for an empty document. Any failing operation
/// aborts the whole document and `entity` is left as it was.
pub fn apply_patch(schema: &EntitySchema, entity: &Entity, patch: &PatchDocument) -> QueryResult<Entity> {
    if patch.is_empty() {
        return Err(QueryError::MissingPatch);
    }
    debug!(
        "Applying {} patch operations to {} {}",
        patch.len(),
        entity.entity_type,
        entity.id
    );

    let mut working = entity.clone();
    for (index, op) in patch.iter().enumerate() {
        apply_operation(schema, &mut working, op).inspect_err(|e| {
            debug!("Patch operation {} ({} {}) rejected: {}", index, op.op, op.path, e);
        })?;
    }
    Ok(working)
}

fn resolve<'s>(schema: &'s EntitySchema, pointer: &str) -> QueryResult<FieldHandle<'s>> {
    let path = FieldPath::parse_pointer(pointer)?;
    Ok(schema.resolve(&path)?)
}

fn apply_operation(schema: &EntitySchema, entity: &mut Entity, op: &PatchOperation) -> QueryResult<()> {
    let target = resolve(schema, &op.path)?;
    match op.op {
        PatchKind::Add => target.insert(entity, op.required_value()?)?,
        PatchKind::Replace => target.replace(entity, op.required_value()?)?,
        PatchKind::Remove => {
            target.remove(entity)?;
        }
        PatchKind::Test => {
            let expected = op.required_value()?;
            if !test_matches(&target, entity, &expected) {
                let actual = target.get_json(entity).unwrap_or(Value::Null);
                return Err(QueryError::PatchTestFailed {
                    path: op.path.clone(),
                    expected: expected.to_string(),
                    actual: actual.to_string(),
                });
            }
        }
        PatchKind::Move | PatchKind::Copy => {
            let source = resolve(schema, op.required_from()?)?;
            if op.op == PatchKind::Move
                && target.path().len() > source.path().len()
                && target.path().starts_with(source.path())
            {
                return Err(QueryError::InvalidPatch(format!(
                    "cannot move {} into its own child {}",
                    source.path(),
                    target.path()
                )));
            }
            let value = source.get_json(entity).ok_or_else(|| {
                QueryError::InvalidPatch(format!("nothing to {} at {}", op.op, source.path()))
            })?;
            if op.op == PatchKind::Move {
                source.remove(entity)?;
            }
            target.insert(entity, value)?;
        }
    }
    Ok(())
}

/// Scalars compare as typed values, so `"3"` matches an integer 3. Objects
/// and collections compare in their canonical JSON form.
fn test_matches(target: &FieldHandle<'_>, entity: &Entity, expected: &Value) -> bool {
    if target.field_type().is_composite() {
        target
            .coerce_json(expected.clone())
            .is_ok_and(|exp| target.get_json(entity).unwrap_or(Value::Null) == exp)
    } else {
        FieldValue::from_json(target.def(), expected).is_ok_and(|exp| target.get(entity) == exp)
    }
}
