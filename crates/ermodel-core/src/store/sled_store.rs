//! Sled-backed model store with versioned snapshots.

use super::{MemoryStore, ModelStore};
use crate::catalog::{
    ColumnDef, ConstraintName, ForeignKeyDef, KeyDef, Model, SchemaDef, TableDef, TableName,
};
use crate::error::Result;
use sled::{Db, Tree};
use tracing::info;

/// Tree name for model snapshots, keyed by big-endian version.
const MODEL_TREE: &str = "catalog:models";

/// Tree name for store metadata.
const META_TREE: &str = "catalog:meta";

/// Key for the current version in the meta tree.
const CURRENT_VERSION_KEY: &[u8] = b"current_version";

/// Key for the `RID` counter in the meta tree.
const NEXT_RID_KEY: &[u8] = b"next_rid";

fn read_u64(bytes: &[u8]) -> Option<u64> {
    <[u8; 8]>::try_from(bytes).ok().map(u64::from_be_bytes)
}

/// A model store that persists every change as a new snapshot version.
///
/// Version 0 is the empty model; each successful mutation or apply writes
/// version `n + 1`.
pub struct SledStore {
    /// Snapshot tree.
    model_tree: Tree,
    /// Metadata tree.
    meta_tree: Tree,
    /// Current version (cached).
    current_version: u64,
    /// Current snapshot.
    inner: MemoryStore,
}

impl SledStore {
    /// Open or create a store in the given sled database.
    pub fn open(db: &Db) -> Result<Self> {
        let model_tree = db.open_tree(MODEL_TREE)?;
        let meta_tree = db.open_tree(META_TREE)?;

        let current_version = meta_tree
            .get(CURRENT_VERSION_KEY)?
            .and_then(|bytes| read_u64(&bytes))
            .unwrap_or(0);
        let next_rid = meta_tree
            .get(NEXT_RID_KEY)?
            .and_then(|bytes| read_u64(&bytes))
            .unwrap_or(0);

        let mut store = Self {
            model_tree,
            meta_tree,
            current_version,
            inner: MemoryStore::new(),
        };
        if current_version > 0 {
            if let Some(model) = store.model_at_version(current_version)? {
                store.inner = MemoryStore::from_parts(model, next_rid);
            }
        }
        Ok(store)
    }

    /// Get the current version.
    pub fn current_version(&self) -> u64 {
        self.current_version
    }

    /// The current snapshot.
    pub fn model(&self) -> &Model {
        self.inner.model()
    }

    /// Get the snapshot stored at a specific version.
    pub fn model_at_version(&self, version: u64) -> Result<Option<Model>> {
        match self.model_tree.get(version.to_be_bytes())? {
            Some(bytes) => Ok(Some(Model::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    /// List all stored versions in ascending order.
    pub fn list_versions(&self) -> Result<Vec<u64>> {
        let mut versions = Vec::new();
        for result in self.model_tree.iter() {
            let (key, _) = result?;
            if let Some(version) = read_u64(&key) {
                versions.push(version);
            }
        }
        versions.sort_unstable();
        Ok(versions)
    }

    /// Replace the whole snapshot, realizing unrealized elements.
    /// Returns the new version.
    pub fn import(&mut self, model: Model) -> Result<u64> {
        self.inner.load(model);
        self.persist()
    }

    /// Flush pending writes to disk.
    pub fn flush(&self) -> Result<()> {
        self.model_tree.flush()?;
        self.meta_tree.flush()?;
        Ok(())
    }

    fn persist(&mut self) -> Result<u64> {
        let version = self.current_version + 1;
        self.model_tree
            .insert(version.to_be_bytes(), self.inner.model().to_bytes()?)?;
        self.meta_tree
            .insert(NEXT_RID_KEY, &self.inner.next_rid().to_be_bytes())?;
        self.meta_tree
            .insert(CURRENT_VERSION_KEY, &version.to_be_bytes())?;
        self.current_version = version;
        info!(version, "stored model version");
        Ok(version)
    }

    fn record<T>(&mut self, f: impl FnOnce(&mut MemoryStore) -> Result<T>) -> Result<T> {
        let value = f(&mut self.inner)?;
        self.persist()?;
        Ok(value)
    }
}

impl ModelStore for SledStore {
    fn fetch_model(&self) -> Result<Model> {
        self.inner.fetch_model()
    }

    fn apply(&mut self, model: &Model) -> Result<()> {
        self.record(|inner| inner.apply(model))
    }

    fn create_schema(&mut self, schema: SchemaDef) -> Result<SchemaDef> {
        self.record(|inner| inner.create_schema(schema))
    }

    fn create_table(&mut self, table: TableDef) -> Result<TableDef> {
        self.record(|inner| inner.create_table(table))
    }

    fn create_column(&mut self, table: &TableName, column: ColumnDef) -> Result<ColumnDef> {
        self.record(|inner| inner.create_column(table, column))
    }

    fn create_key(&mut self, table: &TableName, key: KeyDef) -> Result<KeyDef> {
        self.record(|inner| inner.create_key(table, key))
    }

    fn create_foreign_key(&mut self, table: &TableName, fkey: ForeignKeyDef) -> Result<ForeignKeyDef> {
        self.record(|inner| inner.create_foreign_key(table, fkey))
    }

    fn delete_schema(&mut self, name: &str) -> Result<()> {
        self.record(|inner| inner.delete_schema(name))
    }

    fn delete_table(&mut self, name: &TableName) -> Result<()> {
        self.record(|inner| inner.delete_table(name))
    }

    fn delete_column(&mut self, table: &TableName, column: &str) -> Result<()> {
        self.record(|inner| inner.delete_column(table, column))
    }

    fn delete_key(&mut self, table: &TableName, name: &ConstraintName) -> Result<()> {
        self.record(|inner| inner.delete_key(table, name))
    }

    fn delete_foreign_key(&mut self, table: &TableName, name: &ConstraintName) -> Result<()> {
        self.record(|inner| inner.delete_foreign_key(table, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ColumnType;

    fn sample_model() -> Model {
        Model::new().with_schema(
            SchemaDef::new("isa").with_table(
                TableDef::define("isa", "dataset")
                    .with_column(ColumnDef::new("title", ColumnType::text())),
            ),
        )
    }

    fn test_db() -> sled::Db {
        sled::Config::new().temporary(true).open().unwrap()
    }

    #[test]
    fn test_open_empty() {
        let db = test_db();
        let store = SledStore::open(&db).unwrap();
        assert_eq!(store.current_version(), 0);
        assert!(store.fetch_model().unwrap().schemas.is_empty());
        assert!(store.list_versions().unwrap().is_empty());
    }

    #[test]
    fn test_every_change_is_a_version() {
        let db = test_db();
        let mut store = SledStore::open(&db).unwrap();
        assert_eq!(store.import(sample_model()).unwrap(), 1);

        let table = TableName::new("isa", "dataset");
        store
            .create_column(&table, ColumnDef::new("size", ColumnType::int8()))
            .unwrap();
        assert_eq!(store.current_version(), 2);
        assert_eq!(store.list_versions().unwrap(), vec![1, 2]);

        let v1 = store.model_at_version(1).unwrap().unwrap();
        assert!(v1.table(&table).unwrap().column("size").is_none());
        let v2 = store.model_at_version(2).unwrap().unwrap();
        assert!(v2.table(&table).unwrap().column("size").is_some());
    }

    #[test]
    fn test_failed_change_is_not_recorded() {
        let db = test_db();
        let mut store = SledStore::open(&db).unwrap();
        store.import(sample_model()).unwrap();
        let table = TableName::new("isa", "dataset");
        assert!(store
            .create_column(&table, ColumnDef::new("title", ColumnType::text()))
            .is_err());
        assert_eq!(store.current_version(), 1);
    }

    #[test]
    fn test_persistence() {
        let dir = tempfile::tempdir().unwrap();
        let config = sled::Config::new().path(dir.path());
        let table = TableName::new("isa", "dataset");

        let rid = {
            let db = config.clone().open().unwrap();
            let mut store = SledStore::open(&db).unwrap();
            store.import(sample_model()).unwrap();
            store.flush().unwrap();
            store.model().table(&table).unwrap().rid.clone()
        };

        {
            let db = config.open().unwrap();
            let mut store = SledStore::open(&db).unwrap();
            assert_eq!(store.current_version(), 1);
            assert_eq!(store.model().table(&table).unwrap().rid, rid);

            let column = store
                .create_column(&table, ColumnDef::new("size", ColumnType::int8()))
                .unwrap();
            let others: Vec<_> = store
                .model()
                .table(&table)
                .unwrap()
                .column_definitions
                .iter()
                .filter(|c| c.name != "size")
                .filter_map(|c| c.rid.clone())
                .collect();
            assert!(!others.contains(column.rid.as_ref().unwrap()));
        }
    }
}
