//! Foreign key definitions between tables.

use super::types::{Acls, Annotations, ColumnRef, ConstraintName, TableName};
use serde::{Deserialize, Serialize};

/// Behavior when a referenced row is updated or deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReferentialAction {
    /// Reject the change at the end of the statement.
    #[default]
    #[serde(rename = "NO ACTION")]
    NoAction,
    /// Reject the change immediately.
    #[serde(rename = "RESTRICT")]
    Restrict,
    /// Propagate the change to referencing rows.
    #[serde(rename = "CASCADE")]
    Cascade,
    /// Set referencing columns to NULL.
    #[serde(rename = "SET NULL")]
    SetNull,
    /// Set referencing columns to their defaults.
    #[serde(rename = "SET DEFAULT")]
    SetDefault,
}

/// A foreign key definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKeyDef {
    /// Constraint names; the first one is canonical.
    #[serde(default)]
    pub names: Vec<ConstraintName>,
    /// Referencing columns on the owning table.
    pub foreign_key_columns: Vec<ColumnRef>,
    /// Referenced columns, positionally matched to `foreign_key_columns`.
    pub referenced_columns: Vec<ColumnRef>,
    #[serde(default)]
    pub on_update: ReferentialAction,
    #[serde(default)]
    pub on_delete: ReferentialAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default)]
    pub annotations: Annotations,
    #[serde(default)]
    pub acls: Acls,
    #[serde(default)]
    pub acl_bindings: Acls,
    #[serde(rename = "RID", default, skip_serializing_if = "Option::is_none")]
    pub rid: Option<String>,
}

impl ForeignKeyDef {
    /// Define a foreign key from `columns` of `table` to `referenced` of `target`.
    pub fn new(
        name: ConstraintName,
        table: &TableName,
        columns: &[&str],
        target: &TableName,
        referenced: &[&str],
    ) -> Self {
        Self {
            names: vec![name],
            foreign_key_columns: columns.iter().map(|c| ColumnRef::new(table, *c)).collect(),
            referenced_columns: referenced.iter().map(|c| ColumnRef::new(target, *c)).collect(),
            on_update: ReferentialAction::default(),
            on_delete: ReferentialAction::default(),
            comment: None,
            annotations: Annotations::new(),
            acls: Acls::new(),
            acl_bindings: Acls::new(),
            rid: None,
        }
    }

    /// Set the delete behavior.
    pub fn with_on_delete(mut self, action: ReferentialAction) -> Self {
        self.on_delete = action;
        self
    }

    /// The canonical constraint name.
    pub fn name(&self) -> Option<&ConstraintName> {
        self.names.first()
    }

    /// Check if the foreign key is known by `name`.
    pub fn has_name(&self, name: &ConstraintName) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Names of the referencing columns.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.foreign_key_columns.iter().map(|c| c.column_name.as_str())
    }

    /// Check if `column` is one of the referencing columns.
    pub fn uses_column(&self, column: &str) -> bool {
        self.column_names().any(|c| c == column)
    }

    /// The sole referencing column of a single-column foreign key.
    pub fn single_column(&self) -> Option<&str> {
        match self.foreign_key_columns.as_slice() {
            [only] => Some(&only.column_name),
            _ => None,
        }
    }

    /// The referenced table.
    pub fn referenced_table(&self) -> Option<TableName> {
        self.referenced_columns.first().map(ColumnRef::table)
    }

    /// Check if this foreign key points at `table`.
    pub fn references(&self, table: &TableName) -> bool {
        self.referenced_columns.first().is_some_and(|c| c.is_in(table))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> ForeignKeyDef {
        ForeignKeyDef::new(
            ConstraintName::new("isa", "sample_dataset_fkey"),
            &TableName::new("isa", "sample"),
            &["dataset"],
            &TableName::new("isa", "dataset"),
            &["RID"],
        )
    }

    #[test]
    fn test_single_column_fkey() {
        let fk = sample();
        assert_eq!(fk.single_column(), Some("dataset"));
        assert!(fk.uses_column("dataset"));
        assert!(fk.references(&TableName::new("isa", "dataset")));
        assert_eq!(fk.referenced_table(), Some(TableName::new("isa", "dataset")));
    }

    #[test]
    fn test_action_serde() {
        let fk = sample().with_on_delete(ReferentialAction::SetNull);
        let value = serde_json::to_value(&fk).unwrap();
        assert_eq!(value["on_delete"], json!("SET NULL"));
        assert_eq!(value["on_update"], json!("NO ACTION"));
        assert_eq!(value["names"], json!([["isa", "sample_dataset_fkey"]]));
    }
}
