//! Key (uniqueness constraint) definitions.

use super::types::{Annotations, ConstraintName};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A key definition (single or composite).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyDef {
    /// Constraint names; the first one is canonical.
    #[serde(default)]
    pub names: Vec<ConstraintName>,
    /// Columns that must be unique together.
    pub unique_columns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default)]
    pub annotations: Annotations,
    #[serde(rename = "RID", default, skip_serializing_if = "Option::is_none")]
    pub rid: Option<String>,
}

impl KeyDef {
    /// Define a key over `columns`.
    pub fn new(name: ConstraintName, columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            names: vec![name],
            unique_columns: columns.into_iter().map(Into::into).collect(),
            comment: None,
            annotations: Annotations::new(),
            rid: None,
        }
    }

    /// Set the comment.
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Set an annotation.
    pub fn with_annotation(mut self, tag: impl Into<String>, value: Value) -> Self {
        self.annotations.insert(tag.into(), value);
        self
    }

    /// The canonical constraint name.
    pub fn name(&self) -> Option<&ConstraintName> {
        self.names.first()
    }

    /// Check if the key is known by `name`.
    pub fn has_name(&self, name: &ConstraintName) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// The sole column of a single-column key.
    pub fn single_column(&self) -> Option<&str> {
        match self.unique_columns.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }

    /// Check if the key covers exactly the given columns, in any order.
    pub fn covers(&self, columns: &[&str]) -> bool {
        self.unique_columns.len() == columns.len()
            && columns.iter().all(|c| self.unique_columns.iter().any(|u| u == c))
    }
}
