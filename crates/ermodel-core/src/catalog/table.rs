//! Table definitions and read-through table views.

use super::column::ColumnDef;
use super::foreign_key::ForeignKeyDef;
use super::key::KeyDef;
use super::model::Model;
use super::types::{Acls, Annotations, ConstraintName, TableName};
use crate::error::{ElementKind, Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

fn default_kind() -> String {
    "table".to_string()
}

/// A table definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDef {
    pub schema_name: String,
    pub table_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// `table` or `view`.
    #[serde(default = "default_kind")]
    pub kind: String,
    #[serde(default)]
    pub column_definitions: Vec<ColumnDef>,
    #[serde(default)]
    pub keys: Vec<KeyDef>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKeyDef>,
    #[serde(default)]
    pub annotations: Annotations,
    #[serde(default)]
    pub acls: Acls,
    #[serde(default)]
    pub acl_bindings: Acls,
    #[serde(rename = "RID", default, skip_serializing_if = "Option::is_none")]
    pub rid: Option<String>,
}

impl TableDef {
    /// Define a table with the system columns and the `RID` key.
    pub fn define(schema: impl Into<String>, table: impl Into<String>) -> Self {
        let schema = schema.into();
        let table = table.into();
        let rid_key = KeyDef::new(
            ConstraintName::new(&schema, format!("{table}_RIDkey1")),
            ["RID"],
        );
        Self {
            schema_name: schema,
            table_name: table,
            comment: None,
            kind: default_kind(),
            column_definitions: ColumnDef::system_columns(),
            keys: vec![rid_key],
            foreign_keys: Vec::new(),
            annotations: Annotations::new(),
            acls: Acls::new(),
            acl_bindings: Acls::new(),
            rid: None,
        }
    }

    pub fn with_column(mut self, column: ColumnDef) -> Self {
        self.column_definitions.push(column);
        self
    }

    pub fn with_key(mut self, key: KeyDef) -> Self {
        self.keys.push(key);
        self
    }

    pub fn with_foreign_key(mut self, fkey: ForeignKeyDef) -> Self {
        self.foreign_keys.push(fkey);
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn with_annotation(mut self, tag: impl Into<String>, value: Value) -> Self {
        self.annotations.insert(tag.into(), value);
        self
    }

    /// Qualified name of the table.
    pub fn name(&self) -> TableName {
        TableName::new(&self.schema_name, &self.table_name)
    }

    /// Check if the table has been created remotely.
    pub fn is_realized(&self) -> bool {
        self.rid.is_some()
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.column_definitions.iter().find(|c| c.name == name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut ColumnDef> {
        self.column_definitions.iter_mut().find(|c| c.name == name)
    }

    pub fn key(&self, name: &ConstraintName) -> Option<&KeyDef> {
        self.keys.iter().find(|k| k.has_name(name))
    }

    pub fn foreign_key(&self, name: &ConstraintName) -> Option<&ForeignKeyDef> {
        self.foreign_keys.iter().find(|fk| fk.has_name(name))
    }

    /// Look up a foreign key by its bare constraint name, ignoring the schema.
    pub fn foreign_key_named(&self, name: &str) -> Option<&ForeignKeyDef> {
        self.foreign_keys
            .iter()
            .find(|fk| fk.names.iter().any(|n| n.name == name))
    }
}

/// What a bare name or a constraint name resolves to on a table.
#[derive(Debug, Clone, Copy)]
pub enum Resolved<'a> {
    /// A column of the table.
    Column(&'a ColumnDef),
    /// A key of the table.
    Key(&'a KeyDef),
    /// An outgoing foreign key of the table.
    ForeignKey(&'a ForeignKeyDef),
    /// A foreign key of another table that references this one.
    ReferencedBy(TableView<'a>, &'a ForeignKeyDef),
    /// Nothing matched.
    NotFound,
}

/// Read-through view of a table inside a model snapshot.
///
/// The view borrows the snapshot, so lookups that cross to other tables
/// (incoming foreign keys, referenced tables) are always consistent with it.
#[derive(Debug, Clone, Copy)]
pub struct TableView<'a> {
    model: &'a Model,
    def: &'a TableDef,
}

impl<'a> TableView<'a> {
    pub fn new(model: &'a Model, def: &'a TableDef) -> Self {
        Self { model, def }
    }

    pub fn model(&self) -> &'a Model {
        self.model
    }

    pub fn def(&self) -> &'a TableDef {
        self.def
    }

    pub fn name(&self) -> TableName {
        self.def.name()
    }

    pub fn column(&self, name: &str) -> Option<&'a ColumnDef> {
        self.def.column(name)
    }

    pub fn contains_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn columns(&self) -> impl Iterator<Item = &'a ColumnDef> + 'a {
        self.def.column_definitions.iter()
    }

    pub fn key(&self, name: &ConstraintName) -> Option<&'a KeyDef> {
        self.def.key(name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &'a KeyDef> + 'a {
        self.def.keys.iter()
    }

    pub fn foreign_key(&self, name: &ConstraintName) -> Option<&'a ForeignKeyDef> {
        self.def.foreign_key(name)
    }

    pub fn foreign_keys(&self) -> impl Iterator<Item = &'a ForeignKeyDef> + 'a {
        self.def.foreign_keys.iter()
    }

    /// Foreign keys of any table in the snapshot that reference this table,
    /// paired with the table that owns them.
    pub fn referenced_by(&self) -> impl Iterator<Item = (TableView<'a>, &'a ForeignKeyDef)> + 'a {
        let model = self.model;
        let target = self.name();
        model.tables().flat_map(move |table| {
            let target = target.clone();
            table
                .foreign_keys
                .iter()
                .filter(move |fk| fk.references(&target))
                .map(move |fk| (TableView::new(model, table), fk))
        })
    }

    /// Find an incoming foreign key by constraint name.
    pub fn inbound(&self, name: &ConstraintName) -> Option<(TableView<'a>, &'a ForeignKeyDef)> {
        self.referenced_by().find(|(_, fk)| fk.has_name(name))
    }

    /// The table an outgoing foreign key points at.
    pub fn outbound_target(&self, fkey: &ForeignKeyDef) -> Result<TableView<'a>> {
        let target = fkey
            .referenced_table()
            .ok_or_else(|| Error::ConstraintViolation("foreign key without referenced columns".into()))?;
        self.model.table_view(&target)
    }

    /// Resolve a bare name: column first, then outgoing foreign key, then
    /// incoming foreign key. The first match wins.
    pub fn resolve_name(&self, name: &str) -> Resolved<'a> {
        if let Some(column) = self.column(name) {
            return Resolved::Column(column);
        }
        if let Some(fkey) = self.def.foreign_key_named(name) {
            return Resolved::ForeignKey(fkey);
        }
        match self
            .referenced_by()
            .find(|(_, fk)| fk.names.iter().any(|n| n.name == name))
        {
            Some((table, fkey)) => Resolved::ReferencedBy(table, fkey),
            None => Resolved::NotFound,
        }
    }

    /// Resolve a constraint name: key first, then outgoing foreign key, then
    /// incoming foreign key. The first match wins.
    pub fn resolve_constraint(&self, name: &ConstraintName) -> Resolved<'a> {
        if let Some(key) = self.key(name) {
            return Resolved::Key(key);
        }
        if let Some(fkey) = self.foreign_key(name) {
            return Resolved::ForeignKey(fkey);
        }
        match self.inbound(name) {
            Some((table, fkey)) => Resolved::ReferencedBy(table, fkey),
            None => Resolved::NotFound,
        }
    }

    /// Require a column to exist.
    pub fn require_column(&self, name: &str) -> Result<&'a ColumnDef> {
        self.column(name)
            .ok_or_else(|| Error::not_found(ElementKind::Column, format!("{}:{}", self.name(), name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ColumnType, SchemaDef};

    fn sample_model() -> Model {
        let dataset = TableDef::define("isa", "dataset")
            .with_column(ColumnDef::new("title", ColumnType::text()));
        let sample = TableDef::define("isa", "sample")
            .with_column(ColumnDef::new("dataset", ColumnType::text()))
            .with_foreign_key(ForeignKeyDef::new(
                ConstraintName::new("isa", "sample_dataset_fkey"),
                &TableName::new("isa", "sample"),
                &["dataset"],
                &TableName::new("isa", "dataset"),
                &["RID"],
            ));
        Model::new().with_schema(SchemaDef::new("isa").with_table(dataset).with_table(sample))
    }

    #[test]
    fn test_define_adds_system_columns() {
        let table = TableDef::define("isa", "dataset");
        assert!(table.column("RID").is_some());
        assert_eq!(table.keys.len(), 1);
        assert!(table
            .key(&ConstraintName::new("isa", "dataset_RIDkey1"))
            .is_some());
    }

    #[test]
    fn test_referenced_by() {
        let model = sample_model();
        let dataset = model.table_view(&TableName::new("isa", "dataset")).unwrap();
        let inbound: Vec<_> = dataset.referenced_by().collect();
        assert_eq!(inbound.len(), 1);
        assert_eq!(inbound[0].0.name(), TableName::new("isa", "sample"));
    }

    #[test]
    fn test_resolve_priority() {
        let model = sample_model();
        let sample = model.table_view(&TableName::new("isa", "sample")).unwrap();
        let dataset = model.table_view(&TableName::new("isa", "dataset")).unwrap();

        assert!(matches!(sample.resolve_name("dataset"), Resolved::Column(_)));
        assert!(matches!(
            sample.resolve_name("sample_dataset_fkey"),
            Resolved::ForeignKey(_)
        ));
        assert!(matches!(
            dataset.resolve_name("sample_dataset_fkey"),
            Resolved::ReferencedBy(..)
        ));
        assert!(matches!(dataset.resolve_name("missing"), Resolved::NotFound));
    }

    #[test]
    fn test_resolve_constraint() {
        let model = sample_model();
        let dataset = model.table_view(&TableName::new("isa", "dataset")).unwrap();
        assert!(matches!(
            dataset.resolve_constraint(&ConstraintName::new("isa", "dataset_RIDkey1")),
            Resolved::Key(_)
        ));
        assert!(matches!(
            dataset.resolve_constraint(&ConstraintName::new("other", "dataset_RIDkey1")),
            Resolved::NotFound
        ));
    }
}
