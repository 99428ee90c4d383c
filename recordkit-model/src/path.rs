//! Field paths.
//!
//! Filters and sorts name fields with dotted paths (`Patient.Name`); patch
//! documents use JSON pointers (`/Patient/Name`, `/Notes/0`, `/Notes/-`).
//! Both parse into the same [`FieldPath`].

use crate::{ModelError, ModelResult};
use std::fmt;

/// One segment of a field path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathStep {
    /// A named field.
    Field(String),
    /// A position inside a collection.
    Index(usize),
    /// The slot after the last collection element (`-`).
    Append,
}

/// A parsed path from an entity root to one of its fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    steps: Vec<PathStep>,
}

impl FieldPath {
    pub(crate) fn from_names(names: Vec<String>) -> Self {
        Self {
            steps: names.into_iter().map(PathStep::Field).collect(),
        }
    }

    /// Parses a dotted property name such as `Status` or `Patient.Name`.
    pub fn parse_dotted(name: &str) -> ModelResult<Self> {
        if name.is_empty() || name.split('.').any(str::is_empty) {
            return Err(ModelError::UnknownField(name.to_string()));
        }
        Ok(Self::from_names(name.split('.').map(str::to_string).collect()))
    }

    /// Parses a JSON pointer. The leading `/` is optional; `~1` and `~0`
    /// unescape to `/` and `~`.
    pub fn parse_pointer(pointer: &str) -> ModelResult<Self> {
        let trimmed = pointer.strip_prefix('/').unwrap_or(pointer);
        if trimmed.is_empty() {
            return Err(ModelError::UnknownField(pointer.to_string()));
        }

        let mut steps = Vec::new();
        for raw in trimmed.split('/') {
            if raw.is_empty() {
                return Err(ModelError::UnknownField(pointer.to_string()));
            }
            let segment = raw.replace("~1", "/").replace("~0", "~");
            let step = if segment == "-" {
                PathStep::Append
            } else if is_index(&segment) {
                PathStep::Index(
                    segment
                        .parse()
                        .map_err(|_| ModelError::UnknownField(pointer.to_string()))?,
                )
            } else {
                PathStep::Field(segment)
            };
            steps.push(step);
        }
        Ok(Self { steps })
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// True when `self` equals `prefix` or lies underneath it.
    pub fn starts_with(&self, prefix: &FieldPath) -> bool {
        self.steps.starts_with(&prefix.steps)
    }

    /// Dotted rendering, used in filter/sort error messages.
    pub fn dotted(&self) -> String {
        self.steps
            .iter()
            .map(|s| match s {
                PathStep::Field(name) => name.clone(),
                PathStep::Index(i) => i.to_string(),
                PathStep::Append => "-".to_string(),
            })
            .collect::<Vec<_>>()
            .join(".")
    }
}

// JSON pointer indices are decimal without leading zeros.
fn is_index(segment: &str) -> bool {
    !segment.is_empty()
        && segment.bytes().all(|b| b.is_ascii_digit())
        && (segment == "0" || !segment.starts_with('0'))
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            match step {
                PathStep::Field(name) => write!(f, "/{}", name.replace('~', "~0").replace('/', "~1"))?,
                PathStep::Index(i) => write!(f, "/{i}")?,
                PathStep::Append => f.write_str("/-")?,
            }
        }
        Ok(())
    }
}
