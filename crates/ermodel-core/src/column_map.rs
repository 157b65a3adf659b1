//! Column maps for copying, moving, and renaming slices of a table.
//!
//! A [`ColumnMap`] takes a per-column request (new name, overlaid type, or a
//! full definition) and derives the consistent set of destination columns,
//! keys, and foreign keys. Entries keep creation order: columns in source
//! table order, then keys, then foreign keys.

use crate::catalog::{
    ColumnDef, ColumnRef, ColumnType, ConstraintName, ForeignKeyDef, KeyDef, TableName, TableView,
};
use crate::error::{ElementKind, Error, Result};
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

/// Requested changes to one column's definition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnOverlay {
    pub name: Option<String>,
    pub column_type: Option<ColumnType>,
    pub nullok: Option<bool>,
    pub default: Option<Value>,
    pub comment: Option<String>,
}

/// How one source column maps to its destination.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnMapping {
    /// Keep the definition under a new name.
    Name(String),
    /// Keep the definition, overriding selected attributes.
    Overlay(ColumnOverlay),
    /// Use this definition as-is.
    Definition(ColumnDef),
}

impl ColumnMapping {
    pub fn name(name: impl Into<String>) -> Self {
        ColumnMapping::Name(name.into())
    }

    /// Rename and change the type in one step.
    pub fn retype(name: impl Into<String>, column_type: ColumnType) -> Self {
        ColumnMapping::Overlay(ColumnOverlay {
            name: Some(name.into()),
            column_type: Some(column_type),
            ..ColumnOverlay::default()
        })
    }

    fn resolve(&self, current: &ColumnDef) -> ColumnDef {
        match self {
            ColumnMapping::Name(name) => current.renamed(name),
            ColumnMapping::Overlay(overlay) => {
                let mut def =
                    current.renamed(overlay.name.as_deref().unwrap_or(current.name.as_str()));
                if let Some(column_type) = &overlay.column_type {
                    def.column_type = column_type.clone();
                }
                if let Some(nullok) = overlay.nullok {
                    def.nullok = nullok;
                }
                if let Some(default) = &overlay.default {
                    def.default = Some(default.clone());
                }
                if let Some(comment) = &overlay.comment {
                    def.comment = Some(comment.clone());
                }
                def
            }
            ColumnMapping::Definition(def) => def.clone(),
        }
    }
}

impl From<&str> for ColumnMapping {
    fn from(value: &str) -> Self {
        ColumnMapping::Name(value.to_string())
    }
}

impl From<ColumnDef> for ColumnMapping {
    fn from(value: ColumnDef) -> Self {
        ColumnMapping::Definition(value)
    }
}

/// Source identifier of a map entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MapKey {
    Column(String),
    Key(ConstraintName),
    ForeignKey(ConstraintName),
}

/// Destination definition of a map entry.
#[derive(Debug, Clone, PartialEq)]
pub enum MapTarget {
    Column(ColumnDef),
    Key(KeyDef),
    ForeignKey(ForeignKeyDef),
}

/// Correspondence between source and destination columns, keys, and
/// foreign keys.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMap {
    source: TableName,
    destination: TableName,
    entries: IndexMap<MapKey, MapTarget>,
}

impl ColumnMap {
    /// Build a map for `table`.
    ///
    /// With no `destination`, or a destination equal to the source table,
    /// the map describes an in-place rename and composite keys may be
    /// partially renamed. Otherwise a composite key or foreign key with only
    /// some of its columns selected is rejected.
    pub fn new<K: Into<String>>(
        table: TableView<'_>,
        mappings: impl IntoIterator<Item = (K, ColumnMapping)>,
        destination: Option<&TableName>,
    ) -> Result<Self> {
        let source = table.name();
        let destination = destination.cloned().unwrap_or_else(|| source.clone());
        let rename = destination == source;

        let mut requested: IndexMap<String, ColumnMapping> = mappings
            .into_iter()
            .map(|(name, mapping)| (name.into(), mapping))
            .collect();
        if let Some(missing) = requested.keys().find(|name| !table.contains_column(name)) {
            return Err(Error::not_found(
                ElementKind::Column,
                format!("{source}:{missing}"),
            ));
        }

        let mut entries = IndexMap::new();
        let mut names: HashMap<String, String> = HashMap::new();
        for column in table.columns() {
            let Some(mapping) = requested.shift_remove(&column.name) else {
                continue;
            };
            let def = mapping.resolve(column);
            if names.values().any(|n| *n == def.name) {
                return Err(Error::ConstraintViolation(format!(
                    "column {} is mapped more than once",
                    def.name
                )));
            }
            names.insert(column.name.clone(), def.name.clone());
            entries.insert(MapKey::Column(column.name.clone()), MapTarget::Column(def));
        }

        for key in table.keys() {
            let Some(label) = key.name() else { continue };
            let columns: Vec<&str> = key.unique_columns.iter().map(String::as_str).collect();
            let Some(columns) = translate(&columns, &names, rename, label)? else {
                continue;
            };
            let def = KeyDef {
                names: vec![ConstraintName::new(
                    &destination.schema,
                    format!("{}_{}_key", destination.table, columns.join("_")),
                )],
                unique_columns: columns,
                comment: key.comment.clone(),
                annotations: key.annotations.clone(),
                rid: None,
            };
            entries.insert(MapKey::Key(label.clone()), MapTarget::Key(def));
        }

        for fkey in table.foreign_keys() {
            let Some(label) = fkey.name() else { continue };
            let columns: Vec<&str> = fkey.column_names().collect();
            let Some(columns) = translate(&columns, &names, rename, label)? else {
                continue;
            };
            let def = ForeignKeyDef {
                names: vec![ConstraintName::new(
                    &destination.schema,
                    format!("{}_{}_fkey", destination.table, columns.join("_")),
                )],
                foreign_key_columns: columns
                    .iter()
                    .map(|c| ColumnRef::new(&destination, c.as_str()))
                    .collect(),
                rid: None,
                ..fkey.clone()
            };
            entries.insert(MapKey::ForeignKey(label.clone()), MapTarget::ForeignKey(def));
        }

        debug!(
            source = %source,
            destination = %destination,
            entries = entries.len(),
            "built column map"
        );
        Ok(Self {
            source,
            destination,
            entries,
        })
    }

    pub fn source(&self) -> &TableName {
        &self.source
    }

    pub fn destination(&self) -> &TableName {
        &self.destination
    }

    /// Check if the map renames within the source table.
    pub fn is_rename(&self) -> bool {
        self.source == self.destination
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MapKey, &MapTarget)> {
        self.entries.iter()
    }

    /// Destination definition of a source column.
    pub fn column(&self, source: &str) -> Option<&ColumnDef> {
        match self.entries.get(&MapKey::Column(source.to_string())) {
            Some(MapTarget::Column(def)) => Some(def),
            _ => None,
        }
    }

    /// Destination definition of a source key.
    pub fn key(&self, source: &ConstraintName) -> Option<&KeyDef> {
        match self.entries.get(&MapKey::Key(source.clone())) {
            Some(MapTarget::Key(def)) => Some(def),
            _ => None,
        }
    }

    /// Destination definition of a source foreign key.
    pub fn foreign_key(&self, source: &ConstraintName) -> Option<&ForeignKeyDef> {
        match self.entries.get(&MapKey::ForeignKey(source.clone())) {
            Some(MapTarget::ForeignKey(def)) => Some(def),
            _ => None,
        }
    }

    /// Columns as `(source name, destination definition)`, in source order.
    pub fn get_columns(&self) -> impl Iterator<Item = (&str, &ColumnDef)> {
        self.entries.iter().filter_map(|(k, v)| match (k, v) {
            (MapKey::Column(name), MapTarget::Column(def)) => Some((name.as_str(), def)),
            _ => None,
        })
    }

    /// Keys as `(source name, destination definition)`.
    pub fn get_keys(&self) -> impl Iterator<Item = (&ConstraintName, &KeyDef)> {
        self.entries.iter().filter_map(|(k, v)| match (k, v) {
            (MapKey::Key(name), MapTarget::Key(def)) => Some((name, def)),
            _ => None,
        })
    }

    /// Foreign keys as `(source name, destination definition)`.
    pub fn get_foreign_keys(&self) -> impl Iterator<Item = (&ConstraintName, &ForeignKeyDef)> {
        self.entries.iter().filter_map(|(k, v)| match (k, v) {
            (MapKey::ForeignKey(name), MapTarget::ForeignKey(def)) => Some((name, def)),
            _ => None,
        })
    }

    /// Source column name to destination column name.
    pub fn get_names(&self) -> IndexMap<String, String> {
        self.get_columns()
            .map(|(source, def)| (source.to_string(), def.name.clone()))
            .collect()
    }
}

/// Translate a constraint's columns, or `None` if none of them are mapped.
fn translate(
    columns: &[&str],
    names: &HashMap<String, String>,
    rename: bool,
    label: &ConstraintName,
) -> Result<Option<Vec<String>>> {
    let mapped = columns.iter().filter(|c| names.contains_key(**c)).count();
    if mapped == 0 {
        return Ok(None);
    }
    if mapped < columns.len() && !rename {
        return Err(Error::ConstraintViolation(format!(
            "constraint {label} would be split: only {mapped} of {} columns selected",
            columns.len()
        )));
    }
    Ok(Some(
        columns
            .iter()
            .map(|c| names.get(*c).cloned().unwrap_or_else(|| c.to_string()))
            .collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Model, SchemaDef, TableDef};
    use serde_json::json;

    fn sample_model() -> Model {
        let t = TableName::new("isa", "t");
        let other = TableName::new("isa", "other");
        let other_def = TableDef::define("isa", "other")
            .with_column(ColumnDef::new("a", ColumnType::text()))
            .with_column(ColumnDef::new("b", ColumnType::text()));
        let t_def = TableDef::define("isa", "t")
            .with_column(ColumnDef::new("x", ColumnType::int4()).with_comment("ex"))
            .with_column(ColumnDef::new("c1", ColumnType::text()))
            .with_column(ColumnDef::new("c2", ColumnType::text()))
            .with_column(ColumnDef::new("ref", ColumnType::text()))
            .with_key(KeyDef::new(ConstraintName::new("isa", "t_c1_c2_key"), ["c1", "c2"]))
            .with_foreign_key(
                ForeignKeyDef::new(
                    ConstraintName::new("isa", "t_ref_fkey"),
                    &t,
                    &["ref"],
                    &other,
                    &["RID"],
                )
                .with_on_delete(crate::catalog::ReferentialAction::Cascade),
            );
        Model::new().with_schema(SchemaDef::new("isa").with_table(other_def).with_table(t_def))
    }

    #[test]
    fn test_overlay_keeps_attributes() {
        let model = sample_model();
        let table = model.table_view(&TableName::new("isa", "t")).unwrap();
        let map = ColumnMap::new(
            table,
            [("x", ColumnMapping::retype("y", ColumnType::int8()))],
            None,
        )
        .unwrap();

        let def = map.column("x").unwrap();
        assert_eq!(def.name, "y");
        assert_eq!(def.column_type, ColumnType::int8());
        assert_eq!(def.comment.as_deref(), Some("ex"));
        assert!(map.is_rename());
    }

    #[test]
    fn test_order_follows_source_table() {
        let model = sample_model();
        let table = model.table_view(&TableName::new("isa", "t")).unwrap();
        let map = ColumnMap::new(
            table,
            [("ref", ColumnMapping::name("ref2")), ("x", ColumnMapping::name("x2"))],
            None,
        )
        .unwrap();

        let names: Vec<_> = map.get_names().into_iter().collect();
        assert_eq!(
            names,
            vec![("x".to_string(), "x2".to_string()), ("ref".to_string(), "ref2".to_string())]
        );
        let kinds: Vec<_> = map
            .iter()
            .map(|(k, _)| matches!(k, MapKey::Column(_)))
            .collect();
        assert_eq!(kinds, vec![true, true, false]);
    }

    #[test]
    fn test_foreign_key_translation() {
        let model = sample_model();
        let table = model.table_view(&TableName::new("isa", "t")).unwrap();
        let dest = TableName::new("isa", "copy");
        let map = ColumnMap::new(table, [("ref", ColumnMapping::name("ref"))], Some(&dest)).unwrap();

        let (source, fkey) = map.get_foreign_keys().next().unwrap();
        assert_eq!(source, &ConstraintName::new("isa", "t_ref_fkey"));
        assert_eq!(fkey.name(), Some(&ConstraintName::new("isa", "copy_ref_fkey")));
        assert!(fkey.foreign_key_columns[0].is_in(&dest));
        assert!(fkey.references(&TableName::new("isa", "other")));
        assert_eq!(fkey.on_delete, crate::catalog::ReferentialAction::Cascade);
        assert!(!map.is_rename());
    }

    #[test]
    fn test_partial_composite_rejected_on_move() {
        let model = sample_model();
        let table = model.table_view(&TableName::new("isa", "t")).unwrap();
        let dest = TableName::new("isa", "copy");
        let err = ColumnMap::new(table, [("c1", ColumnMapping::name("c1"))], Some(&dest)).unwrap_err();
        assert!(matches!(err, Error::ConstraintViolation(_)));
    }

    #[test]
    fn test_partial_composite_allowed_on_rename() {
        let model = sample_model();
        let table = model.table_view(&TableName::new("isa", "t")).unwrap();
        let map = ColumnMap::new(table, [("c1", ColumnMapping::name("c1_new"))], None).unwrap();

        let key = map.key(&ConstraintName::new("isa", "t_c1_c2_key")).unwrap();
        assert_eq!(key.unique_columns, vec!["c1_new", "c2"]);
        assert_eq!(key.name(), Some(&ConstraintName::new("isa", "t_c1_new_c2_key")));
    }

    #[test]
    fn test_unknown_column_rejected() {
        let model = sample_model();
        let table = model.table_view(&TableName::new("isa", "t")).unwrap();
        let err = ColumnMap::new(table, [("nope", ColumnMapping::name("x"))], None).unwrap_err();
        assert!(matches!(err, Error::ReferenceNotFound { .. }));
    }

    #[test]
    fn test_duplicate_destination_rejected() {
        let model = sample_model();
        let table = model.table_view(&TableName::new("isa", "t")).unwrap();
        let err = ColumnMap::new(
            table,
            [("c1", ColumnMapping::name("z")), ("c2", ColumnMapping::name("z"))],
            None,
        )
        .unwrap_err();
        assert!(matches!(err, Error::ConstraintViolation(_)));
    }

    #[test]
    fn test_definition_mapping_used_verbatim() {
        let model = sample_model();
        let table = model.table_view(&TableName::new("isa", "t")).unwrap();
        let def = ColumnDef::new("x_json", ColumnType::jsonb()).with_default(json!({}));
        let map = ColumnMap::new(table, [("x", ColumnMapping::from(def.clone()))], None).unwrap();
        assert_eq!(map.column("x"), Some(&def));
    }
}
