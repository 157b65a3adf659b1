//! In-memory model store.

use super::ModelStore;
use crate::catalog::{
    ColumnDef, ConstraintName, ForeignKeyDef, KeyDef, Model, SchemaDef, TableDef, TableName,
};
use crate::error::{ElementKind, Error, Result};
use tracing::debug;

/// A store that keeps the snapshot in memory and numbers `RID`s itself.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    model: Model,
    next_rid: u64,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `model` as given. Elements without a `RID`
    /// stay unrealized.
    pub fn with_model(model: Model) -> Self {
        Self { model, next_rid: 0 }
    }

    /// Create a store holding `model` with every element realized.
    pub fn realized(model: Model) -> Self {
        let mut store = Self::new();
        store.load(model);
        store
    }

    pub(crate) fn from_parts(model: Model, next_rid: u64) -> Self {
        Self { model, next_rid }
    }

    pub(crate) fn next_rid(&self) -> u64 {
        self.next_rid
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Replace the snapshot, assigning a `RID` to every element lacking one.
    pub fn load(&mut self, mut model: Model) {
        for schema in model.schemas.values_mut() {
            self.realize_schema(schema);
        }
        self.model = model;
    }

    fn rid(&mut self) -> String {
        self.next_rid += 1;
        format!("1-{:04X}", self.next_rid)
    }

    fn assign(&mut self, rid: &mut Option<String>) {
        if rid.is_none() {
            *rid = Some(self.rid());
        }
    }

    fn realize_schema(&mut self, schema: &mut SchemaDef) {
        self.assign(&mut schema.rid);
        for table in schema.tables.values_mut() {
            self.realize_table(table);
        }
    }

    fn realize_table(&mut self, table: &mut TableDef) {
        self.assign(&mut table.rid);
        for column in &mut table.column_definitions {
            self.assign(&mut column.rid);
        }
        for key in &mut table.keys {
            self.assign(&mut key.rid);
        }
        for fkey in &mut table.foreign_keys {
            self.assign(&mut fkey.rid);
        }
    }

    fn require_table(&self, name: &TableName) -> Result<&TableDef> {
        self.model
            .table(name)
            .ok_or_else(|| Error::not_found(ElementKind::Table, name))
    }
}

fn check_columns<'c>(table: &TableDef, columns: impl IntoIterator<Item = &'c str>) -> Result<()> {
    for column in columns {
        if table.column(column).is_none() {
            return Err(Error::not_found(
                ElementKind::Column,
                format!("{}:{column}", table.name()),
            ));
        }
    }
    Ok(())
}

/// Check a foreign key of `table` against `table` itself and the snapshot.
fn check_foreign_key(model: &Model, table: &TableDef, fkey: &ForeignKeyDef) -> Result<()> {
    check_columns(table, fkey.column_names())?;
    if fkey.foreign_key_columns.len() != fkey.referenced_columns.len() {
        return Err(Error::ConstraintViolation(format!(
            "foreign key {} has mismatched column lists",
            fkey.name().map(ToString::to_string).unwrap_or_default()
        )));
    }
    let target_name = fkey.referenced_table().ok_or_else(|| {
        Error::ConstraintViolation("foreign key without referenced columns".to_string())
    })?;
    let target = if target_name == table.name() {
        table
    } else {
        model
            .table(&target_name)
            .ok_or_else(|| Error::not_found(ElementKind::Table, &target_name))?
    };
    check_columns(
        target,
        fkey.referenced_columns.iter().map(|c| c.column_name.as_str()),
    )
}

fn check_table(model: &Model, table: &TableDef) -> Result<()> {
    for key in &table.keys {
        check_columns(table, key.unique_columns.iter().map(String::as_str))?;
    }
    for fkey in &table.foreign_keys {
        check_foreign_key(model, table, fkey)?;
    }
    Ok(())
}

impl ModelStore for MemoryStore {
    fn fetch_model(&self) -> Result<Model> {
        Ok(self.model.clone())
    }

    fn apply(&mut self, model: &Model) -> Result<()> {
        self.model.merge_metadata(model)
    }

    fn create_schema(&mut self, mut schema: SchemaDef) -> Result<SchemaDef> {
        for table in schema.tables.values() {
            check_table(&self.model, table)?;
        }
        self.realize_schema(&mut schema);
        self.model.insert_schema(schema.clone())?;
        debug!(schema = %schema.schema_name, "created schema");
        Ok(schema)
    }

    fn create_table(&mut self, mut table: TableDef) -> Result<TableDef> {
        check_table(&self.model, &table)?;
        self.realize_table(&mut table);
        self.model.insert_table(table.clone())?;
        debug!(table = %table.name(), "created table");
        Ok(table)
    }

    fn create_column(&mut self, table: &TableName, mut column: ColumnDef) -> Result<ColumnDef> {
        self.require_table(table)?;
        self.assign(&mut column.rid);
        self.model.insert_column(table, column.clone())?;
        Ok(column)
    }

    fn create_key(&mut self, table: &TableName, mut key: KeyDef) -> Result<KeyDef> {
        check_columns(
            self.require_table(table)?,
            key.unique_columns.iter().map(String::as_str),
        )?;
        self.assign(&mut key.rid);
        self.model.insert_key(table, key.clone())?;
        Ok(key)
    }

    fn create_foreign_key(
        &mut self,
        table: &TableName,
        mut fkey: ForeignKeyDef,
    ) -> Result<ForeignKeyDef> {
        check_foreign_key(&self.model, self.require_table(table)?, &fkey)?;
        self.assign(&mut fkey.rid);
        self.model.insert_foreign_key(table, fkey.clone())?;
        Ok(fkey)
    }

    fn delete_schema(&mut self, name: &str) -> Result<()> {
        self.model.remove_schema(name).map(drop)
    }

    fn delete_table(&mut self, name: &TableName) -> Result<()> {
        self.model.remove_table(name).map(drop)
    }

    fn delete_column(&mut self, table: &TableName, column: &str) -> Result<()> {
        self.model.remove_column(table, column).map(drop)
    }

    fn delete_key(&mut self, table: &TableName, name: &ConstraintName) -> Result<()> {
        self.model.remove_key(table, name).map(drop)
    }

    fn delete_foreign_key(&mut self, table: &TableName, name: &ConstraintName) -> Result<()> {
        self.model.remove_foreign_key(table, name).map(drop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ColumnType;
    use serde_json::json;

    fn sample_store() -> MemoryStore {
        let model = Model::new().with_schema(
            SchemaDef::new("isa").with_table(
                TableDef::define("isa", "dataset")
                    .with_column(ColumnDef::new("title", ColumnType::text())),
            ),
        );
        MemoryStore::realized(model)
    }

    #[test]
    fn test_realized_assigns_rids() {
        let store = sample_store();
        let table = store.model().table(&TableName::new("isa", "dataset")).unwrap();
        assert!(table.is_realized());
        assert!(table.column_definitions.iter().all(ColumnDef::is_realized));
        assert!(store.model().schema("isa").unwrap().is_realized());
    }

    #[test]
    fn test_with_model_keeps_definitions_unrealized() {
        let store = MemoryStore::with_model(
            Model::new().with_schema(SchemaDef::new("isa").with_table(TableDef::define("isa", "t"))),
        );
        assert!(!store.model().table(&TableName::new("isa", "t")).unwrap().is_realized());
    }

    #[test]
    fn test_create_column_realizes() {
        let mut store = sample_store();
        let table = TableName::new("isa", "dataset");
        let column = store
            .create_column(&table, ColumnDef::new("size", ColumnType::int8()))
            .unwrap();
        assert!(column.is_realized());
        assert!(store.fetch_model().unwrap().table(&table).unwrap().column("size").is_some());

        let err = store
            .create_column(&table, ColumnDef::new("size", ColumnType::int8()))
            .unwrap_err();
        assert!(matches!(err, Error::ConstraintViolation(_)));
    }

    #[test]
    fn test_create_foreign_key_checks_target() {
        let mut store = sample_store();
        let table = TableName::new("isa", "dataset");
        let fkey = ForeignKeyDef::new(
            ConstraintName::new("isa", "dataset_title_fkey"),
            &table,
            &["title"],
            &TableName::new("isa", "missing"),
            &["RID"],
        );
        let err = store.create_foreign_key(&table, fkey).unwrap_err();
        assert!(matches!(err, Error::ReferenceNotFound { kind: ElementKind::Table, .. }));

        let key = KeyDef::new(ConstraintName::new("isa", "dataset_nope_key"), ["nope"]);
        let err = store.create_key(&table, key).unwrap_err();
        assert!(matches!(err, Error::ReferenceNotFound { kind: ElementKind::Column, .. }));
    }

    #[test]
    fn test_apply_merges_metadata_only() {
        let mut store = sample_store();
        let table = TableName::new("isa", "dataset");
        let mut model = store.fetch_model().unwrap();
        model
            .table_mut(&table)
            .unwrap()
            .annotations
            .insert("tag:example".to_string(), json!({"x": 1}));
        store.apply(&model).unwrap();
        assert_eq!(
            store.model().table(&table).unwrap().annotations.get("tag:example"),
            Some(&json!({"x": 1}))
        );

        let mut model = store.fetch_model().unwrap();
        model.insert_schema(SchemaDef::new("extra")).unwrap();
        assert!(store.apply(&model).is_err());
    }
}
