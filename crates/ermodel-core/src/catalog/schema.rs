//! Schema definitions.

use super::model::Model;
use super::table::{TableDef, TableView};
use super::types::{Acls, Annotations};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A schema: a named collection of tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDef {
    pub schema_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default)]
    pub annotations: Annotations,
    #[serde(default)]
    pub acls: Acls,
    /// Tables keyed by name.
    #[serde(default)]
    pub tables: IndexMap<String, TableDef>,
    #[serde(rename = "RID", default, skip_serializing_if = "Option::is_none")]
    pub rid: Option<String>,
}

impl SchemaDef {
    /// Define an empty schema.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            schema_name: name.into(),
            comment: None,
            annotations: Annotations::new(),
            acls: Acls::new(),
            tables: IndexMap::new(),
            rid: None,
        }
    }

    /// Add a table; its schema name is set to this schema.
    pub fn with_table(mut self, mut table: TableDef) -> Self {
        table.schema_name = self.schema_name.clone();
        self.tables.insert(table.table_name.clone(), table);
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

    pub fn table(&self, name: &str) -> Option<&TableDef> {
        self.tables.get(name)
    }

    /// Check if the schema has been created remotely.
    pub fn is_realized(&self) -> bool {
        self.rid.is_some()
    }
}

/// Read-through view of a schema inside a model snapshot.
#[derive(Debug, Clone, Copy)]
pub struct SchemaView<'a> {
    model: &'a Model,
    def: &'a SchemaDef,
}

impl<'a> SchemaView<'a> {
    pub fn new(model: &'a Model, def: &'a SchemaDef) -> Self {
        Self { model, def }
    }

    pub fn def(&self) -> &'a SchemaDef {
        self.def
    }

    pub fn name(&self) -> &'a str {
        &self.def.schema_name
    }

    pub fn table(&self, name: &str) -> Option<TableView<'a>> {
        let model = self.model;
        self.def.table(name).map(|def| TableView::new(model, def))
    }

    pub fn contains_table(&self, name: &str) -> bool {
        self.def.tables.contains_key(name)
    }

    pub fn tables(&self) -> impl Iterator<Item = TableView<'a>> + 'a {
        let model = self.model;
        self.def.tables.values().map(move |def| TableView::new(model, def))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_table_sets_schema_name() {
        let schema = SchemaDef::new("isa").with_table(TableDef::define("other", "dataset"));
        let table = schema.table("dataset").unwrap();
        assert_eq!(table.schema_name, "isa");
        assert!(schema.table("missing").is_none());
    }

    #[test]
    fn test_table_order_preserved() {
        let schema = SchemaDef::new("isa")
            .with_table(TableDef::define("isa", "zeta"))
            .with_table(TableDef::define("isa", "alpha"));
        let names: Vec<_> = schema.tables.keys().cloned().collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
    }

    #[test]
    fn test_schema_view_lookups() {
        let model = Model::new().with_schema(
            SchemaDef::new("isa")
                .with_table(TableDef::define("isa", "zeta"))
                .with_table(TableDef::define("isa", "alpha")),
        );
        let view = model.schema_view("isa").unwrap();
        assert_eq!(view.name(), "isa");
        assert!(view.contains_table("alpha"));
        assert!(view.table("missing").is_none());
        assert_eq!(view.table("zeta").unwrap().def().table_name, "zeta");
        assert_eq!(view.tables().count(), 2);
        assert!(model.schema_view("nope").is_err());
    }
}
