//! Field accessor: resolves a path against a schema into a typed handle that
//! reads and writes the field on any entity of that type.

use crate::schema::{conform_element, conform_value};
use crate::{
    Entity, EntitySchema, FieldDef, FieldPath, FieldType, FieldValue, ModelError, ModelResult,
    PathStep, ID_FIELD,
};
use serde_json::Value;
use std::sync::LazyLock;

static ID_DEF: LazyLock<FieldDef> = LazyLock::new(|| FieldDef::uuid(ID_FIELD));

/// What a resolved path points at.
#[derive(Debug, Clone, Copy)]
pub enum Slot<'s> {
    /// The entity identifier. Readable, never writable.
    Id,
    /// A declared field, possibly nested inside navigation objects or
    /// collection elements.
    Field(&'s FieldDef),
    /// An existing element of the given collection (`/Notes/2`).
    Element(&'s FieldDef),
    /// The position after the last element of the given collection (`/Notes/-`).
    Append(&'s FieldDef),
}

#[derive(Debug, Clone, Copy)]
enum Pos<'s> {
    Root,
    Field(&'s FieldDef),
    Element(&'s FieldDef),
}

enum WriteMode {
    Replace,
    Insert,
}

/// A resolved field of one entity type.
#[derive(Debug, Clone)]
pub struct FieldHandle<'s> {
    path: FieldPath,
    slot: Slot<'s>,
}

impl EntitySchema {
    /// Resolves a path one segment at a time. Names are matched exactly and
    /// case-sensitively; anything that does not exist is `UnknownField`.
    pub fn resolve(&self, path: &FieldPath) -> ModelResult<FieldHandle<'_>> {
        let unknown = || ModelError::UnknownField(path.to_string());
        let steps = path.steps();

        if let [PathStep::Field(name)] = steps {
            if name == ID_FIELD {
                return Ok(FieldHandle {
                    path: path.clone(),
                    slot: Slot::Id,
                });
            }
        }

        let mut pos = Pos::Root;
        for (i, step) in steps.iter().enumerate() {
            let last = i + 1 == steps.len();
            pos = match (pos, step) {
                (Pos::Root, PathStep::Field(name)) => Pos::Field(self.field(name).ok_or_else(unknown)?),
                (Pos::Element(c), PathStep::Field(name)) => {
                    Pos::Field(c.child(name).ok_or_else(unknown)?)
                }
                (Pos::Field(d), PathStep::Field(name)) if d.field_type == FieldType::Navigation => {
                    Pos::Field(d.child(name).ok_or_else(unknown)?)
                }
                (Pos::Field(d), PathStep::Index(_)) if d.field_type == FieldType::Collection => {
                    Pos::Element(d)
                }
                (Pos::Field(d), PathStep::Append) if d.field_type == FieldType::Collection && last => {
                    return Ok(FieldHandle {
                        path: path.clone(),
                        slot: Slot::Append(d),
                    });
                }
                _ => return Err(unknown()),
            };
        }

        let slot = match pos {
            Pos::Root => return Err(unknown()),
            Pos::Field(d) => Slot::Field(d),
            Pos::Element(c) => Slot::Element(c),
        };
        Ok(FieldHandle {
            path: path.clone(),
            slot,
        })
    }

    /// Resolves a dotted property name such as `Status` or `Patient.Name`.
    pub fn resolve_name(&self, name: &str) -> ModelResult<FieldHandle<'_>> {
        let path = FieldPath::parse_dotted(name)?;
        self.resolve(&path)
            .map_err(|_| ModelError::UnknownField(name.to_string()))
    }
}

impl<'s> FieldHandle<'s> {
    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    pub fn slot(&self) -> Slot<'s> {
        self.slot
    }

    /// Field definition behind the handle. Element and append slots return
    /// the definition of their collection.
    pub fn def(&self) -> &'s FieldDef {
        match self.slot {
            Slot::Id => &*ID_DEF,
            Slot::Field(d) | Slot::Element(d) | Slot::Append(d) => d,
        }
    }

    /// Type of the value the handle reads or writes. Collection elements are
    /// objects, so they report `Navigation`.
    pub fn field_type(&self) -> FieldType {
        match self.slot {
            Slot::Id => FieldType::Uuid,
            Slot::Field(d) => d.field_type,
            Slot::Element(_) | Slot::Append(_) => FieldType::Navigation,
        }
    }

    pub fn is_writable(&self) -> bool {
        !matches!(self.slot, Slot::Id)
    }

    /// True when the path goes through a collection index.
    pub fn crosses_collection(&self) -> bool {
        self.path
            .steps()
            .iter()
            .any(|s| matches!(s, PathStep::Index(_) | PathStep::Append))
    }

    /// Coerces a request string into this field's type.
    pub fn parse(&self, raw: &str) -> ModelResult<FieldValue> {
        match self.slot {
            Slot::Id | Slot::Field(_) => FieldValue::parse(self.def(), raw),
            Slot::Element(c) | Slot::Append(c) => Err(c.invalid(&raw)),
        }
    }

    /// Coerces a JSON value into the canonical stored form for this slot.
    pub fn coerce_json(&self, value: Value) -> ModelResult<Value> {
        let path = self.path.to_string();
        match self.slot {
            Slot::Id => Err(ModelError::ReadOnlyField(ID_FIELD.to_string())),
            Slot::Field(d) => conform_value(d, value, &path),
            Slot::Element(c) | Slot::Append(c) => conform_element(c, value, &path),
        }
    }

    /// Raw JSON at the path, or `None` when any segment is absent.
    pub fn get_json(&self, entity: &Entity) -> Option<Value> {
        if let Slot::Id = self.slot {
            return Some(Value::String(entity.id.to_string()));
        }
        let mut current = &entity.data;
        for step in self.path.steps() {
            current = match step {
                PathStep::Field(name) => current.get(name.as_str())?,
                PathStep::Index(i) => current.get(*i)?,
                PathStep::Append => return None,
            };
        }
        Some(current.clone())
    }

    /// Typed value at the path. Absent values and values reached through a
    /// null navigation read as `Null`.
    pub fn get(&self, entity: &Entity) -> FieldValue {
        match self.slot {
            Slot::Id => FieldValue::Uuid(entity.id.as_uuid()),
            // Stored data was conformed on write; anything unreadable is treated as absent.
            Slot::Field(d) => match self.get_json(entity) {
                None | Some(Value::Null) => FieldValue::Null,
                Some(json) => FieldValue::from_json(d, &json).unwrap_or(FieldValue::Null),
            },
            Slot::Element(_) => self
                .get_json(entity)
                .map(FieldValue::Composite)
                .unwrap_or(FieldValue::Null),
            Slot::Append(_) => FieldValue::Null,
        }
    }

    /// Writes a typed value, replacing what is there.
    pub fn set(&self, entity: &mut Entity, value: FieldValue) -> ModelResult<()> {
        self.replace(entity, value.to_json())
    }

    /// Replaces the value at the path. Collection elements must already exist.
    pub fn replace(&self, entity: &mut Entity, value: Value) -> ModelResult<()> {
        let value = self.coerce_json(value)?;
        self.write(entity, value, WriteMode::Replace)
    }

    /// Adds a value: fields are set, collection indices insert before the
    /// current element and `-` appends.
    pub fn insert(&self, entity: &mut Entity, value: Value) -> ModelResult<()> {
        let value = self.coerce_json(value)?;
        self.write(entity, value, WriteMode::Insert)
    }

    /// Clears a field to its type default, or deletes a collection element.
    /// Returns the previous value.
    pub fn remove(&self, entity: &mut Entity) -> ModelResult<Value> {
        let path = self.path.to_string();
        let def = match self.slot {
            Slot::Id => return Err(ModelError::ReadOnlyField(ID_FIELD.to_string())),
            Slot::Field(d) => Some(d),
            Slot::Element(_) | Slot::Append(_) => None,
        };
        let parent = self.parent_mut(&mut entity.data)?;

        match (self.last_step()?, def) {
            (PathStep::Field(name), Some(d)) => {
                let obj = parent
                    .as_object_mut()
                    .ok_or_else(|| ModelError::MissingParent(path.clone()))?;
                Ok(obj.insert(name.clone(), d.default_value()).unwrap_or(Value::Null))
            }
            (PathStep::Index(i), _) => {
                let arr = parent
                    .as_array_mut()
                    .ok_or_else(|| ModelError::MissingParent(path.clone()))?;
                if *i < arr.len() {
                    Ok(arr.remove(*i))
                } else {
                    Err(ModelError::IndexOutOfRange {
                        path,
                        index: *i,
                        len: arr.len(),
                    })
                }
            }
            _ => {
                let len = parent.as_array().map_or(0, Vec::len);
                Err(ModelError::IndexOutOfRange {
                    path,
                    index: len,
                    len,
                })
            }
        }
    }

    fn write(&self, entity: &mut Entity, value: Value, mode: WriteMode) -> ModelResult<()> {
        let path = self.path.to_string();
        let last = self.last_step()?;
        let parent = self.parent_mut(&mut entity.data)?;

        if let PathStep::Field(name) = last {
            let obj = parent
                .as_object_mut()
                .ok_or_else(|| ModelError::MissingParent(path.clone()))?;
            obj.insert(name.clone(), value);
            return Ok(());
        }

        let arr = parent
            .as_array_mut()
            .ok_or_else(|| ModelError::MissingParent(path.clone()))?;
        let len = arr.len();
        match (last, mode) {
            (PathStep::Index(i), WriteMode::Replace) if *i < len => arr[*i] = value,
            (PathStep::Index(i), WriteMode::Insert) if *i <= len => arr.insert(*i, value),
            (PathStep::Append, WriteMode::Insert) => arr.push(value),
            (PathStep::Index(i), _) => {
                return Err(ModelError::IndexOutOfRange {
                    path,
                    index: *i,
                    len,
                });
            }
            _ => {
                return Err(ModelError::IndexOutOfRange {
                    path,
                    index: len,
                    len,
                });
            }
        }
        Ok(())
    }

    fn last_step(&self) -> ModelResult<&PathStep> {
        self.path
            .steps()
            .last()
            .ok_or_else(|| ModelError::UnknownField(self.path.to_string()))
    }

    /// Walks to the container holding the final segment. Every intermediate
    /// object must exist and be non-null.
    fn parent_mut<'e>(&self, data: &'e mut Value) -> ModelResult<&'e mut Value> {
        let steps = self.path.steps();
        let mut current = data;
        for step in &steps[..steps.len().saturating_sub(1)] {
            current = match step {
                PathStep::Field(name) => match current.get_mut(name.as_str()) {
                    Some(v) if !v.is_null() => v,
                    _ => return Err(ModelError::MissingParent(self.path.to_string())),
                },
                PathStep::Index(i) => {
                    let arr = current
                        .as_array_mut()
                        .ok_or_else(|| ModelError::MissingParent(self.path.to_string()))?;
                    let len = arr.len();
                    arr.get_mut(*i).ok_or_else(|| ModelError::IndexOutOfRange {
                        path: self.path.to_string(),
                        index: *i,
                        len,
                    })?
                }
                PathStep::Append => return Err(ModelError::UnknownField(self.path.to_string())),
            };
        }
        Ok(current)
    }
}
