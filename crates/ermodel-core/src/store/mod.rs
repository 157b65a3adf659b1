//! Backing stores for catalog snapshots.
//!
//! A [`ModelStore`] is the remote side of a catalog handle: it hands out the
//! current snapshot, realizes created elements with a server-assigned `RID`,
//! and persists metadata changes applied in one call.

mod memory;
mod sled_store;

pub use memory::MemoryStore;
pub use sled_store::SledStore;

use crate::catalog::{ColumnDef, ConstraintName, ForeignKeyDef, KeyDef, Model, SchemaDef, TableDef, TableName};
use crate::error::Result;

/// Storage for one catalog.
pub trait ModelStore {
    /// The current snapshot.
    fn fetch_model(&self) -> Result<Model>;

    /// Persist the metadata (comments, annotations, ACLs, nullability,
    /// defaults) of `model`. Structural differences are rejected.
    fn apply(&mut self, model: &Model) -> Result<()>;

    fn create_schema(&mut self, schema: SchemaDef) -> Result<SchemaDef>;
    fn create_table(&mut self, table: TableDef) -> Result<TableDef>;
    fn create_column(&mut self, table: &TableName, column: ColumnDef) -> Result<ColumnDef>;
    fn create_key(&mut self, table: &TableName, key: KeyDef) -> Result<KeyDef>;
    fn create_foreign_key(&mut self, table: &TableName, fkey: ForeignKeyDef) -> Result<ForeignKeyDef>;

    fn delete_schema(&mut self, name: &str) -> Result<()>;
    fn delete_table(&mut self, name: &TableName) -> Result<()>;
    fn delete_column(&mut self, table: &TableName, column: &str) -> Result<()>;
    fn delete_key(&mut self, table: &TableName, name: &ConstraintName) -> Result<()>;
    fn delete_foreign_key(&mut self, table: &TableName, name: &ConstraintName) -> Result<()>;
}
