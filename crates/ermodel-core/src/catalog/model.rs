//! Model snapshot - the whole catalog schema at one point in time.

use super::column::ColumnDef;
use super::foreign_key::ForeignKeyDef;
use super::key::KeyDef;
use super::schema::{SchemaDef, SchemaView};
use super::table::{TableDef, TableView};
use super::types::{Acls, Annotations, ConstraintName, TableName};
use crate::error::{ElementKind, Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A snapshot of the catalog: schemas, tables, and their constraints.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Model {
    /// Schemas keyed by name.
    #[serde(default)]
    pub schemas: IndexMap<String, SchemaDef>,
    /// Catalog-level annotations.
    #[serde(default)]
    pub annotations: Annotations,
    /// Catalog-level ACLs.
    #[serde(default)]
    pub acls: Acls,
}

impl Model {
    /// Create an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a schema to the model.
    pub fn with_schema(mut self, schema: SchemaDef) -> Self {
        self.schemas.insert(schema.schema_name.clone(), schema);
        self
    }

    pub fn schema(&self, name: &str) -> Option<&SchemaDef> {
        self.schemas.get(name)
    }

    pub fn schema_mut(&mut self, name: &str) -> Option<&mut SchemaDef> {
        self.schemas.get_mut(name)
    }

    pub fn table(&self, name: &TableName) -> Option<&TableDef> {
        self.schema(&name.schema).and_then(|s| s.tables.get(&name.table))
    }

    pub fn table_mut(&mut self, name: &TableName) -> Option<&mut TableDef> {
        self.schema_mut(&name.schema)
            .and_then(|s| s.tables.get_mut(&name.table))
    }

    /// Get a read-through view of a schema, failing if it does not exist.
    pub fn schema_view(&self, name: &str) -> Result<SchemaView<'_>> {
        self.schema(name)
            .map(|def| SchemaView::new(self, def))
            .ok_or_else(|| Error::not_found(ElementKind::Schema, name))
    }

    /// Get a read-through view of a table, failing if it does not exist.
    pub fn table_view(&self, name: &TableName) -> Result<TableView<'_>> {
        self.table(name)
            .map(|def| TableView::new(self, def))
            .ok_or_else(|| Error::not_found(ElementKind::Table, name))
    }

    /// All tables of all schemas, in snapshot order.
    pub fn tables(&self) -> impl Iterator<Item = &TableDef> {
        self.schemas.values().flat_map(|s| s.tables.values())
    }

    fn require_schema_mut(&mut self, name: &str) -> Result<&mut SchemaDef> {
        self.schemas
            .get_mut(name)
            .ok_or_else(|| Error::not_found(ElementKind::Schema, name))
    }

    pub(crate) fn require_table_mut(&mut self, name: &TableName) -> Result<&mut TableDef> {
        self.table_mut(name)
            .ok_or_else(|| Error::not_found(ElementKind::Table, name))
    }

    /// Insert a schema, rejecting duplicates.
    pub fn insert_schema(&mut self, schema: SchemaDef) -> Result<()> {
        if self.schemas.contains_key(&schema.schema_name) {
            return Err(Error::ConstraintViolation(format!(
                "schema {} already exists",
                schema.schema_name
            )));
        }
        self.schemas.insert(schema.schema_name.clone(), schema);
        Ok(())
    }

    /// Insert a table into an existing schema, rejecting duplicates.
    pub fn insert_table(&mut self, table: TableDef) -> Result<()> {
        let schema = self.require_schema_mut(&table.schema_name)?;
        if schema.tables.contains_key(&table.table_name) {
            return Err(Error::ConstraintViolation(format!(
                "table {} already exists",
                table.name()
            )));
        }
        schema.tables.insert(table.table_name.clone(), table);
        Ok(())
    }

    /// Append a column to a table, rejecting duplicates.
    pub fn insert_column(&mut self, table: &TableName, column: ColumnDef) -> Result<()> {
        let def = self.require_table_mut(table)?;
        if def.column(&column.name).is_some() {
            return Err(Error::ConstraintViolation(format!(
                "column {}:{} already exists",
                table, column.name
            )));
        }
        def.column_definitions.push(column);
        Ok(())
    }

    /// Append a key to a table, rejecting duplicate names.
    pub fn insert_key(&mut self, table: &TableName, key: KeyDef) -> Result<()> {
        let def = self.require_table_mut(table)?;
        if let Some(name) = key.names.iter().find(|n| def.key(n).is_some()) {
            return Err(Error::ConstraintViolation(format!("key {name} already exists")));
        }
        def.keys.push(key);
        Ok(())
    }

    /// Append a foreign key to a table, rejecting duplicate names.
    pub fn insert_foreign_key(&mut self, table: &TableName, fkey: ForeignKeyDef) -> Result<()> {
        let def = self.require_table_mut(table)?;
        if let Some(name) = fkey.names.iter().find(|n| def.foreign_key(n).is_some()) {
            return Err(Error::ConstraintViolation(format!(
                "foreign key {name} already exists"
            )));
        }
        def.foreign_keys.push(fkey);
        Ok(())
    }

    pub fn remove_schema(&mut self, name: &str) -> Result<SchemaDef> {
        self.schemas
            .shift_remove(name)
            .ok_or_else(|| Error::not_found(ElementKind::Schema, name))
    }

    pub fn remove_table(&mut self, name: &TableName) -> Result<TableDef> {
        self.require_schema_mut(&name.schema)?
            .tables
            .shift_remove(&name.table)
            .ok_or_else(|| Error::not_found(ElementKind::Table, name))
    }

    pub fn remove_column(&mut self, table: &TableName, column: &str) -> Result<ColumnDef> {
        let def = self.require_table_mut(table)?;
        let pos = def
            .column_definitions
            .iter()
            .position(|c| c.name == column)
            .ok_or_else(|| Error::not_found(ElementKind::Column, format!("{table}:{column}")))?;
        Ok(def.column_definitions.remove(pos))
    }

    pub fn remove_key(&mut self, table: &TableName, name: &ConstraintName) -> Result<KeyDef> {
        let def = self.require_table_mut(table)?;
        let pos = def
            .keys
            .iter()
            .position(|k| k.has_name(name))
            .ok_or_else(|| Error::not_found(ElementKind::Key, name))?;
        Ok(def.keys.remove(pos))
    }

    pub fn remove_foreign_key(
        &mut self,
        table: &TableName,
        name: &ConstraintName,
    ) -> Result<ForeignKeyDef> {
        let def = self.require_table_mut(table)?;
        let pos = def
            .foreign_keys
            .iter()
            .position(|fk| fk.has_name(name))
            .ok_or_else(|| Error::not_found(ElementKind::ForeignKey, name))?;
        Ok(def.foreign_keys.remove(pos))
    }

    /// Copy the mutable metadata (comments, annotations, ACLs, nullability,
    /// defaults) of `other` onto the matching elements of this model.
    ///
    /// Every element of `other` must already exist here: structural changes
    /// go through the per-element create/delete calls, never through a merge.
    pub fn merge_metadata(&mut self, other: &Model) -> Result<()> {
        self.annotations = other.annotations.clone();
        self.acls = other.acls.clone();

        for (schema_name, schema) in &other.schemas {
            let target = self.require_schema_mut(schema_name)?;
            target.comment = schema.comment.clone();
            target.annotations = schema.annotations.clone();
            target.acls = schema.acls.clone();

            for table in schema.tables.values() {
                let name = table.name();
                let target = target
                    .tables
                    .get_mut(&table.table_name)
                    .ok_or_else(|| Error::not_found(ElementKind::Table, &name))?;
                merge_table(target, table)?;
            }
        }
        Ok(())
    }

    /// Serialize the model to catalog JSON.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Deserialize a model from catalog JSON.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| Error::Deserialization(e.to_string()))
    }
}

fn merge_table(target: &mut TableDef, source: &TableDef) -> Result<()> {
    let name = source.name();
    target.comment = source.comment.clone();
    target.annotations = source.annotations.clone();
    target.acls = source.acls.clone();
    target.acl_bindings = source.acl_bindings.clone();

    for column in &source.column_definitions {
        let existing = target.column_mut(&column.name).ok_or_else(|| {
            Error::not_found(ElementKind::Column, format!("{name}:{}", column.name))
        })?;
        existing.comment = column.comment.clone();
        existing.annotations = column.annotations.clone();
        existing.acls = column.acls.clone();
        existing.acl_bindings = column.acl_bindings.clone();
        existing.nullok = column.nullok;
        existing.default = column.default.clone();
        if !existing.is_realized() {
            existing.column_type = column.column_type.clone();
        }
    }

    for key in &source.keys {
        let existing = target
            .keys
            .iter_mut()
            .find(|k| key.names.iter().any(|n| k.has_name(n)))
            .ok_or_else(|| Error::not_found(ElementKind::Key, format!("{:?}", key.names)))?;
        existing.comment = key.comment.clone();
        existing.annotations = key.annotations.clone();
    }

    for fkey in &source.foreign_keys {
        let existing = target
            .foreign_keys
            .iter_mut()
            .find(|f| fkey.names.iter().any(|n| f.has_name(n)))
            .ok_or_else(|| {
                Error::not_found(ElementKind::ForeignKey, format!("{:?}", fkey.names))
            })?;
        existing.comment = fkey.comment.clone();
        existing.annotations = fkey.annotations.clone();
        existing.acls = fkey.acls.clone();
        existing.acl_bindings = fkey.acl_bindings.clone();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ColumnType;
    use serde_json::json;

    fn sample_model() -> Model {
        let dataset = TableDef::define("isa", "dataset")
            .with_column(ColumnDef::new("title", ColumnType::text()));
        Model::new().with_schema(SchemaDef::new("isa").with_table(dataset))
    }

    #[test]
    fn test_table_lookup() {
        let model = sample_model();
        assert!(model.table(&TableName::new("isa", "dataset")).is_some());
        assert!(model.table(&TableName::new("isa", "nope")).is_none());
        assert!(model.table_view(&TableName::new("vocab", "dataset")).is_err());
        assert_eq!(model.tables().count(), 1);
    }

    #[test]
    fn test_insert_rejects_duplicates() {
        let mut model = sample_model();
        let table = TableName::new("isa", "dataset");

        let err = model
            .insert_column(&table, ColumnDef::new("title", ColumnType::text()))
            .unwrap_err();
        assert!(matches!(err, Error::ConstraintViolation(_)));

        let err = model.insert_schema(SchemaDef::new("isa")).unwrap_err();
        assert!(matches!(err, Error::ConstraintViolation(_)));

        model
            .insert_column(&table, ColumnDef::new("description", ColumnType::markdown()))
            .unwrap();
        assert!(model.table(&table).unwrap().column("description").is_some());
    }

    #[test]
    fn test_remove_missing() {
        let mut model = sample_model();
        let table = TableName::new("isa", "dataset");
        let err = model.remove_column(&table, "nope").unwrap_err();
        assert!(matches!(
            err,
            Error::ReferenceNotFound {
                kind: ElementKind::Column,
                ..
            }
        ));
        assert!(model.remove_column(&table, "title").is_ok());
    }

    #[test]
    fn test_merge_metadata() {
        let mut stored = sample_model();
        let mut local = stored.clone();
        let table = TableName::new("isa", "dataset");
        local
            .table_mut(&table)
            .unwrap()
            .annotations
            .insert("tag:example".into(), json!({"x": 1}));

        stored.merge_metadata(&local).unwrap();
        assert_eq!(
            stored.table(&table).unwrap().annotations.get("tag:example"),
            Some(&json!({"x": 1}))
        );
    }

    #[test]
    fn test_merge_rejects_uncreated_elements() {
        let mut stored = sample_model();
        let mut local = stored.clone();
        local
            .insert_column(
                &TableName::new("isa", "dataset"),
                ColumnDef::new("extra", ColumnType::text()),
            )
            .unwrap();
        assert!(stored.merge_metadata(&local).is_err());
    }

    #[test]
    fn test_json_roundtrip() {
        let model = sample_model();
        let bytes = model.to_bytes().unwrap();
        let decoded = Model::from_bytes(&bytes).unwrap();
        assert_eq!(decoded, model);
    }
}
