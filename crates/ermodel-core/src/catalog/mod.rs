//! Catalog schema model.
//!
//! Definitions (`*Def`) mirror the catalog service's JSON layout. A [`Model`]
//! is one snapshot of them; [`SchemaView`] and [`TableView`] are read-through
//! views into a snapshot; [`Catalog`] is the batching handle over a store.

mod catalog;
mod column;
mod foreign_key;
mod key;
mod model;
mod schema;
mod table;
pub mod tag;
mod types;

pub use catalog::{AnnotationTarget, Catalog};
pub use column::{ColumnDef, SYSTEM_COLUMNS};
pub use foreign_key::{ForeignKeyDef, ReferentialAction};
pub use key::KeyDef;
pub use model::Model;
pub use schema::{SchemaDef, SchemaView};
pub use table::{Resolved, TableDef, TableView};
pub use types::{Acls, Annotations, ColumnRef, ColumnType, ConstraintName, TableName};
