//! Catalog handle: a cached snapshot over a model store, with batched
//! metadata writes.
//!
//! Structural changes (create/delete) go to the store immediately and are
//! mirrored into the cached snapshot. Metadata changes (annotations,
//! comments, column types of unrealized columns) only touch the snapshot and
//! are sent to the store with one `apply` call when the outermost batch
//! commits, or right away when no batch is open.

use super::tag;
use super::types::Annotations;
use super::{
    ColumnDef, ColumnType, ConstraintName, ForeignKeyDef, KeyDef, Model, SchemaDef, SchemaView,
    TableDef, TableName, TableView,
};
use crate::column_map::{ColumnMap, ColumnMapping};
use crate::config::ModelConfig;
use crate::error::{ElementKind, Error, Result};
use crate::source::{RawSource, SourceKind, SourceResolver, SourceSpec, VisibleSources};
use crate::store::ModelStore;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

/// The element an annotation is attached to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotationTarget {
    Catalog,
    Schema(String),
    Table(TableName),
    Column(TableName, String),
}

impl AnnotationTarget {
    fn annotations_mut<'m>(&self, model: &'m mut Model) -> Result<&'m mut Annotations> {
        match self {
            AnnotationTarget::Catalog => Ok(&mut model.annotations),
            AnnotationTarget::Schema(name) => model
                .schema_mut(name)
                .map(|s| &mut s.annotations)
                .ok_or_else(|| Error::not_found(ElementKind::Schema, name)),
            AnnotationTarget::Table(name) => Ok(&mut model.require_table_mut(name)?.annotations),
            AnnotationTarget::Column(table, column) => model
                .require_table_mut(table)?
                .column_mut(column)
                .map(|c| &mut c.annotations)
                .ok_or_else(|| Error::not_found(ElementKind::Column, format!("{table}:{column}"))),
        }
    }
}

/// A handle on one catalog.
pub struct Catalog<S: ModelStore> {
    store: S,
    config: ModelConfig,
    /// Cached snapshot, fetched on first use.
    model: Option<Model>,
    batch_depth: usize,
    /// The snapshot has metadata changes not yet applied.
    dirty: bool,
    /// An inner batch was aborted; the outermost commit discards.
    aborted: bool,
}

impl<S: ModelStore> Catalog<S> {
    /// Create a handle with the default configuration.
    pub fn new(store: S) -> Self {
        Self::with_config(store, ModelConfig::default())
    }

    pub fn with_config(store: S, config: ModelConfig) -> Self {
        Self {
            store,
            config,
            model: None,
            batch_depth: 0,
            dirty: false,
            aborted: false,
        }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Give back the store. Unapplied metadata changes are lost.
    pub fn into_store(self) -> S {
        if self.dirty {
            warn!("dropping catalog handle with unapplied changes");
        }
        self.store
    }

    fn ensure_loaded(&mut self) -> Result<()> {
        if self.model.is_none() {
            self.model = Some(self.store.fetch_model()?);
            debug!("fetched model snapshot");
        }
        Ok(())
    }

    fn loaded(&self) -> Result<&Model> {
        self.model
            .as_ref()
            .ok_or_else(|| Error::OperationNotPermitted("model snapshot not loaded".to_string()))
    }

    fn loaded_mut(&mut self) -> Result<&mut Model> {
        self.ensure_loaded()?;
        self.model
            .as_mut()
            .ok_or_else(|| Error::OperationNotPermitted("model snapshot not loaded".to_string()))
    }

    /// The cached snapshot, including changes not yet applied.
    pub fn model(&mut self) -> Result<&Model> {
        self.ensure_loaded()?;
        self.loaded()
    }

    /// Drop the cached snapshot and fetch it again.
    pub fn refresh(&mut self) -> Result<()> {
        if self.batch_depth > 0 {
            return Err(Error::OperationNotPermitted(
                "cannot refresh inside a batch".to_string(),
            ));
        }
        self.discard();
        self.ensure_loaded()
    }

    pub fn schema(&mut self, name: &str) -> Result<SchemaView<'_>> {
        self.ensure_loaded()?;
        self.loaded()?.schema_view(name)
    }

    pub fn table(&mut self, name: &TableName) -> Result<TableView<'_>> {
        self.ensure_loaded()?;
        self.loaded()?.table_view(name)
    }

    pub fn schema_exists(&mut self, name: &str) -> Result<bool> {
        Ok(self.model()?.schema(name).is_some())
    }

    pub fn table_exists(&mut self, name: &TableName) -> Result<bool> {
        let model = self.model()?;
        if model.schema(&name.schema).is_none() {
            return Err(Error::not_found(ElementKind::Schema, &name.schema));
        }
        Ok(model.table(name).is_some())
    }

    pub fn column_exists(&mut self, table: &TableName, column: &str) -> Result<bool> {
        Ok(self.table(table)?.contains_column(column))
    }

    pub fn key_exists(&mut self, table: &TableName, name: &ConstraintName) -> Result<bool> {
        Ok(self.table(table)?.key(name).is_some())
    }

    pub fn foreign_key_exists(&mut self, table: &TableName, name: &ConstraintName) -> Result<bool> {
        Ok(self.table(table)?.foreign_key(name).is_some())
    }

    // Batching

    pub fn batch_depth(&self) -> usize {
        self.batch_depth
    }

    /// Open a batch. Metadata changes are held until the outermost batch
    /// commits.
    pub fn begin_batch(&mut self) -> Result<()> {
        self.ensure_loaded()?;
        self.batch_depth += 1;
        debug!(depth = self.batch_depth, "begin batch");
        Ok(())
    }

    /// Close a batch. Closing the outermost batch applies the held changes,
    /// unless an inner batch was aborted, in which case they are discarded.
    pub fn commit_batch(&mut self) -> Result<()> {
        if self.batch_depth == 0 {
            return Err(Error::OperationNotPermitted("no batch in progress".to_string()));
        }
        self.batch_depth -= 1;
        if self.batch_depth > 0 {
            return Ok(());
        }
        if std::mem::take(&mut self.aborted) {
            self.discard();
            return Err(Error::OperationNotPermitted(
                "an inner batch was aborted; changes discarded".to_string(),
            ));
        }
        self.flush()
    }

    /// Abandon a batch. Aborting the outermost batch discards the held
    /// changes. Structural changes already sent to the store are kept.
    pub fn abort_batch(&mut self) {
        if self.batch_depth == 0 {
            return;
        }
        self.batch_depth -= 1;
        if self.batch_depth > 0 {
            self.aborted = true;
            return;
        }
        self.aborted = false;
        self.discard();
    }

    /// Run `f` inside a batch: committed on success, aborted on error.
    pub fn with_batch<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.begin_batch()?;
        match f(self) {
            Ok(value) => {
                self.commit_batch()?;
                Ok(value)
            }
            Err(e) => {
                self.abort_batch();
                Err(e)
            }
        }
    }

    fn discard(&mut self) {
        if self.dirty {
            warn!("discarding unapplied metadata changes");
        }
        self.model = None;
        self.dirty = false;
    }

    fn flush(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        if let Some(model) = &self.model {
            if let Err(e) = self.store.apply(model) {
                self.discard();
                return Err(e);
            }
            info!("applied metadata changes");
        }
        self.dirty = false;
        Ok(())
    }

    /// Change the snapshot's metadata; applied now unless a batch is open.
    fn mutate<T>(&mut self, f: impl FnOnce(&mut Model) -> Result<T>) -> Result<T> {
        let value = f(self.loaded_mut()?)?;
        self.dirty = true;
        if self.batch_depth == 0 {
            self.flush()?;
        }
        Ok(value)
    }

    // Annotations

    pub fn set_annotation(&mut self, target: &AnnotationTarget, tag: &str, value: Value) -> Result<()> {
        self.mutate(|model| {
            target.annotations_mut(model)?.insert(tag.to_string(), value);
            Ok(())
        })
    }

    /// Remove an annotation, returning its old value.
    pub fn remove_annotation(&mut self, target: &AnnotationTarget, tag: &str) -> Result<Option<Value>> {
        self.mutate(|model| Ok(target.annotations_mut(model)?.shift_remove(tag)))
    }

    pub fn set_comment(&mut self, table: &TableName, comment: Option<String>) -> Result<()> {
        self.mutate(|model| {
            model.require_table_mut(table)?.comment = comment;
            Ok(())
        })
    }

    // Sources

    /// Load the visible sources of a table for reading.
    pub fn visible_sources(&mut self, table: &TableName, kind: SourceKind) -> Result<VisibleSources<'_>> {
        self.ensure_loaded()?;
        let view = self.loaded()?.table_view(table)?;
        VisibleSources::load(SourceResolver::new(view, &self.config), kind)
    }

    pub fn normalize_source(&mut self, table: &TableName, raw: &RawSource) -> Result<SourceSpec> {
        self.ensure_loaded()?;
        let view = self.loaded()?.table_view(table)?;
        SourceResolver::new(view, &self.config).normalize(raw)
    }

    pub fn validate_source(&mut self, table: &TableName, raw: &RawSource) -> Result<SourceSpec> {
        self.ensure_loaded()?;
        let view = self.loaded()?.table_view(table)?;
        SourceResolver::new(view, &self.config).validate(raw)
    }

    /// Edit a table's visible sources and write the result back. An edit
    /// that leaves no contexts removes the annotation.
    pub fn update_visible_sources<T>(
        &mut self,
        table: &TableName,
        kind: SourceKind,
        f: impl FnOnce(&mut VisibleSources<'_>) -> Result<T>,
    ) -> Result<T> {
        self.ensure_loaded()?;
        let (value, annotation, unchanged) = {
            let view = self.loaded()?.table_view(table)?;
            let mut sources = VisibleSources::load(SourceResolver::new(view, &self.config), kind)?;
            let value = f(&mut sources)?;
            let annotation = (!sources.is_empty()).then(|| sources.to_annotation());
            let unchanged = view.def().annotations.get(kind.tag()) == annotation.as_ref();
            (value, annotation, unchanged)
        };
        if unchanged {
            return Ok(value);
        }
        let target = AnnotationTarget::Table(table.clone());
        match annotation {
            Some(annotation) => self.set_annotation(&target, kind.tag(), annotation)?,
            None => {
                self.remove_annotation(&target, kind.tag())?;
            }
        }
        debug!(table = %table, tag = kind.tag(), "updated visible sources");
        Ok(value)
    }

    /// Apply `edit` to both visible-source annotations of `table`, skipping
    /// the ones it does not carry.
    fn edit_paths(&mut self, table: &TableName, edit: impl Fn(&mut VisibleSources<'_>)) -> Result<()> {
        for kind in [SourceKind::Columns, SourceKind::ForeignKeys] {
            let present = self
                .model()?
                .table(table)
                .is_some_and(|t| t.annotations.contains_key(kind.tag()));
            if present {
                self.update_visible_sources(table, kind, |sources| {
                    edit(sources);
                    Ok(())
                })?;
            }
        }
        Ok(())
    }

    fn purge_paths(&mut self, table: &TableName, name: &ConstraintName) -> Result<()> {
        self.edit_paths(table, |sources| sources.delete_paths_through(name))
    }

    // Definitions

    #[instrument(skip(self, schema), fields(name = %schema.schema_name))]
    pub fn create_schema(&mut self, schema: SchemaDef) -> Result<SchemaDef> {
        self.ensure_loaded()?;
        let created = self.store.create_schema(schema)?;
        self.loaded_mut()?.insert_schema(created.clone())?;
        info!("created schema");
        Ok(created)
    }

    #[instrument(skip(self, table), fields(name = %table.name()))]
    pub fn create_table(&mut self, table: TableDef) -> Result<TableDef> {
        self.ensure_loaded()?;
        let created = self.store.create_table(table)?;
        self.loaded_mut()?.insert_table(created.clone())?;
        info!("created table");
        Ok(created)
    }

    #[instrument(skip(self, column), fields(name = %column.name))]
    pub fn create_column(&mut self, table: &TableName, column: ColumnDef) -> Result<ColumnDef> {
        self.ensure_loaded()?;
        let created = self.store.create_column(table, column)?;
        self.loaded_mut()?.insert_column(table, created.clone())?;
        info!("created column");
        Ok(created)
    }

    #[instrument(skip(self, key))]
    pub fn create_key(&mut self, table: &TableName, key: KeyDef) -> Result<KeyDef> {
        self.ensure_loaded()?;
        let created = self.store.create_key(table, key)?;
        self.loaded_mut()?.insert_key(table, created.clone())?;
        info!(columns = ?created.unique_columns, "created key");
        Ok(created)
    }

    #[instrument(skip(self, fkey))]
    pub fn create_foreign_key(&mut self, table: &TableName, fkey: ForeignKeyDef) -> Result<ForeignKeyDef> {
        self.ensure_loaded()?;
        let created = self.store.create_foreign_key(table, fkey)?;
        self.loaded_mut()?.insert_foreign_key(table, created.clone())?;
        info!("created foreign key");
        Ok(created)
    }

    /// Delete a schema. Refused while tables of other schemas reference it.
    #[instrument(skip(self))]
    pub fn delete_schema(&mut self, name: &str) -> Result<()> {
        {
            let schema = self.schema(name)?;
            let outside = schema.tables().flat_map(|t| t.referenced_by()).find(|(from, _)| from.def().schema_name != name);
            if let Some((from, fkey)) = outside {
                return Err(Error::OperationNotPermitted(format!(
                    "schema {name} is referenced by {} from {}",
                    fkey.name().map(ToString::to_string).unwrap_or_default(),
                    from.name()
                )));
            }
        }
        self.store.delete_schema(name)?;
        self.loaded_mut()?.remove_schema(name)?;
        info!("deleted schema");
        Ok(())
    }

    /// Delete a table. Refused while other tables reference it.
    #[instrument(skip(self))]
    pub fn delete_table(&mut self, name: &TableName) -> Result<()> {
        let outbound: Vec<(TableName, ConstraintName)> = {
            let view = self.table(name)?;
            if let Some((from, fkey)) = view.referenced_by().find(|(from, _)| from.name() != *name) {
                return Err(Error::OperationNotPermitted(format!(
                    "table {name} is referenced by {} from {}",
                    fkey.name().map(ToString::to_string).unwrap_or_default(),
                    from.name()
                )));
            }
            view.foreign_keys()
                .filter_map(|fkey| Some((fkey.referenced_table()?, fkey.name()?.clone())))
                .filter(|(target, _)| target != name)
                .collect()
        };
        self.with_batch(|catalog| {
            for (target, fkey) in &outbound {
                catalog.purge_paths(target, fkey)?;
            }
            catalog.store.delete_table(name)?;
            catalog.loaded_mut()?.remove_table(name)?;
            Ok(())
        })?;
        info!("deleted table");
        Ok(())
    }

    /// Delete a column and drop it from the table's visible sources.
    /// Refused while a key or foreign key uses it.
    #[instrument(skip(self))]
    pub fn delete_column(&mut self, table: &TableName, column: &str) -> Result<()> {
        let annotated: Vec<SourceKind> = {
            let view = self.table(table)?;
            view.require_column(column)?;
            if let Some(key) = view.keys().find(|k| k.unique_columns.iter().any(|c| c == column)) {
                return Err(Error::OperationNotPermitted(format!(
                    "column {table}:{column} is used by key {}",
                    key.name().map(ToString::to_string).unwrap_or_default()
                )));
            }
            if let Some(fkey) = view.foreign_keys().find(|fk| fk.uses_column(column)) {
                return Err(Error::OperationNotPermitted(format!(
                    "column {table}:{column} is used by foreign key {}",
                    fkey.name().map(ToString::to_string).unwrap_or_default()
                )));
            }
            [SourceKind::Columns, SourceKind::ForeignKeys]
                .into_iter()
                .filter(|kind| view.def().annotations.contains_key(kind.tag()))
                .collect()
        };
        self.with_batch(|catalog| {
            for kind in annotated {
                catalog.update_visible_sources(table, kind, |sources| {
                    sources.delete_visible_source(&[column], &[]);
                    Ok(())
                })?;
            }
            catalog.drop_column(table, column)
        })
    }

    /// Delete a key. Refused while a foreign key references its columns.
    #[instrument(skip(self))]
    pub fn delete_key(&mut self, table: &TableName, name: &ConstraintName) -> Result<()> {
        {
            let view = self.table(table)?;
            let key = view
                .key(name)
                .ok_or_else(|| Error::not_found(ElementKind::Key, name))?;
            if let Some((from, _)) = key_reference(view, key) {
                return Err(Error::OperationNotPermitted(format!(
                    "key {name} is referenced from {}",
                    from.name()
                )));
            }
        }
        self.drop_key(table, name)
    }

    /// Delete a foreign key and every visible-source path through it.
    #[instrument(skip(self))]
    pub fn delete_foreign_key(&mut self, table: &TableName, name: &ConstraintName) -> Result<()> {
        let target = {
            let view = self.table(table)?;
            view.foreign_key(name)
                .ok_or_else(|| Error::not_found(ElementKind::ForeignKey, name))?
                .referenced_table()
        };
        self.with_batch(|catalog| {
            catalog.purge_paths(table, name)?;
            if let Some(target) = target.filter(|t| t != table) {
                catalog.purge_paths(&target, name)?;
            }
            catalog.drop_foreign_key(table, name)
        })
    }

    /// Change the type of a column that has not been created yet.
    pub fn alter_column_type(&mut self, table: &TableName, column: &str, column_type: ColumnType) -> Result<()> {
        self.mutate(|model| {
            let def = model
                .require_table_mut(table)?
                .column_mut(column)
                .ok_or_else(|| Error::not_found(ElementKind::Column, format!("{table}:{column}")))?;
            if def.is_realized() {
                return Err(Error::OperationNotPermitted(format!(
                    "column {table}:{column} already exists; its type cannot change"
                )));
            }
            def.column_type = column_type;
            Ok(())
        })
    }

    fn drop_column(&mut self, table: &TableName, column: &str) -> Result<()> {
        self.ensure_loaded()?;
        self.store.delete_column(table, column)?;
        self.loaded_mut()?.remove_column(table, column)?;
        info!(table = %table, column, "deleted column");
        Ok(())
    }

    fn drop_key(&mut self, table: &TableName, name: &ConstraintName) -> Result<()> {
        self.ensure_loaded()?;
        self.store.delete_key(table, name)?;
        self.loaded_mut()?.remove_key(table, name)?;
        info!(table = %table, key = %name, "deleted key");
        Ok(())
    }

    fn drop_foreign_key(&mut self, table: &TableName, name: &ConstraintName) -> Result<()> {
        self.ensure_loaded()?;
        self.store.delete_foreign_key(table, name)?;
        self.loaded_mut()?.remove_foreign_key(table, name)?;
        info!(table = %table, foreign_key = %name, "deleted foreign key");
        Ok(())
    }

    // Column-map operations

    fn create_from_map(&mut self, map: &ColumnMap) -> Result<()> {
        let destination = map.destination().clone();
        for (_, column) in map.get_columns() {
            self.create_column(&destination, column.clone())?;
        }
        for (_, key) in map.get_keys() {
            self.create_key(&destination, key.clone())?;
        }
        for (_, fkey) in map.get_foreign_keys() {
            self.create_foreign_key(&destination, fkey.clone())?;
        }
        Ok(())
    }

    /// Copy columns, with the keys and foreign keys they carry, into
    /// `destination`.
    #[instrument(skip(self, mappings))]
    pub fn copy_columns<K: Into<String>>(
        &mut self,
        table: &TableName,
        mappings: impl IntoIterator<Item = (K, ColumnMapping)>,
        destination: &TableName,
    ) -> Result<ColumnMap> {
        self.ensure_loaded()?;
        let map = {
            let model = self.loaded()?;
            model.table_view(destination)?;
            ColumnMap::new(model.table_view(table)?, mappings, Some(destination))?
        };
        self.with_batch(|catalog| catalog.create_from_map(&map))?;
        info!(columns = map.get_columns().count(), "copied columns");
        Ok(map)
    }

    /// Rename columns in place.
    ///
    /// New columns, keys, and foreign keys are created first, the table's
    /// visible sources are rewritten to use them, and then the old foreign
    /// keys, keys, and columns are deleted. Paths on referenced tables that
    /// follow a renamed foreign key are redirected to the new one.
    #[instrument(skip(self, mappings))]
    pub fn rename_columns<K: Into<String>>(
        &mut self,
        table: &TableName,
        mappings: impl IntoIterator<Item = (K, ColumnMapping)>,
    ) -> Result<ColumnMap> {
        self.ensure_loaded()?;
        let (map, annotations) = {
            let view = self.loaded()?.table_view(table)?;
            let map = ColumnMap::new(view, mappings, None)?;
            for (name, _) in map.get_keys() {
                let referenced = view.key(name).and_then(|key| key_reference(view, key));
                if let Some((from, _)) = referenced {
                    return Err(Error::OperationNotPermitted(format!(
                        "key {name} is referenced from {}",
                        from.name()
                    )));
                }
            }
            let resolver = SourceResolver::new(view, &self.config);
            let mut annotations = Vec::new();
            for kind in [SourceKind::Columns, SourceKind::ForeignKeys] {
                if view.def().annotations.contains_key(kind.tag()) {
                    let renamed = VisibleSources::load(resolver, kind)?.rename_columns(&map)?;
                    annotations.push((kind, renamed));
                }
            }
            (map, annotations)
        };
        let inbound: Vec<(TableName, ConstraintName, ConstraintName)> = map
            .get_foreign_keys()
            .filter_map(|(old, fkey)| Some((fkey.referenced_table()?, old.clone(), fkey.name()?.clone())))
            .filter(|(target, ..)| target != table)
            .collect();

        self.with_batch(|catalog| {
            catalog.create_from_map(&map)?;
            let target = AnnotationTarget::Table(table.clone());
            for (kind, value) in annotations {
                catalog.set_annotation(&target, kind.tag(), value)?;
            }
            for (referenced, old, new) in &inbound {
                catalog.edit_paths(referenced, |sources| sources.retarget_paths(old, new))?;
            }
            for (name, _) in map.get_foreign_keys() {
                catalog.drop_foreign_key(table, name)?;
            }
            for (name, _) in map.get_keys() {
                catalog.drop_key(table, name)?;
            }
            for (name, _) in map.get_columns() {
                catalog.drop_column(table, name)?;
            }
            Ok(())
        })?;
        info!(names = ?map.get_names(), "renamed columns");
        Ok(map)
    }

    /// Copy a table's definition, including its keys, foreign keys, and
    /// annotations, to a new table. Visible columns are rewritten for the
    /// copy's constraint names; visible foreign keys are not copied.
    #[instrument(skip(self))]
    pub fn copy_table(&mut self, table: &TableName, schema: &str, name: &str) -> Result<TableDef> {
        self.ensure_loaded()?;
        let destination = TableName::new(schema, name);
        let def = {
            let model = self.loaded()?;
            model.schema_view(schema)?;
            let view = model.table_view(table)?;
            let map = ColumnMap::new(
                view,
                view.columns()
                    .map(|c| (c.name.clone(), ColumnMapping::name(&c.name))),
                Some(&destination),
            )?;
            let source = view.def();
            let mut annotations = source.annotations.clone();
            annotations.shift_remove(tag::VISIBLE_FOREIGN_KEYS);
            if annotations.contains_key(tag::VISIBLE_COLUMNS) {
                let resolver = SourceResolver::new(view, &self.config);
                let renamed =
                    VisibleSources::load(resolver, SourceKind::Columns)?.rename_columns(&map)?;
                annotations.insert(tag::VISIBLE_COLUMNS.to_string(), renamed);
            }
            TableDef {
                schema_name: destination.schema.clone(),
                table_name: destination.table.clone(),
                comment: source.comment.clone(),
                kind: source.kind.clone(),
                column_definitions: map.get_columns().map(|(_, c)| c.clone()).collect(),
                keys: map.get_keys().map(|(_, k)| k.clone()).collect(),
                foreign_keys: map.get_foreign_keys().map(|(_, fk)| fk.clone()).collect(),
                annotations,
                acls: source.acls.clone(),
                acl_bindings: source.acl_bindings.clone(),
                rid: None,
            }
        };
        self.create_table(def)
    }
}

/// A foreign key referencing exactly the columns of `key`.
fn key_reference<'a>(
    view: TableView<'a>,
    key: &KeyDef,
) -> Option<(TableView<'a>, &'a ForeignKeyDef)> {
    view.referenced_by().find(|(_, fkey)| {
        let columns: Vec<&str> = fkey
            .referenced_columns
            .iter()
            .map(|c| c.column_name.as_str())
            .collect();
        key.covers(&columns)
    })
}
