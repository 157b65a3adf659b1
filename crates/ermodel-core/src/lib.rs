//! ermodel core - catalog schema model and visible-source annotations.
//!
//! This crate holds the in-memory catalog model, the engine that normalizes
//! and edits the visible-columns and visible-foreign-keys annotations, and
//! the stores a [`Catalog`] handle reads from and writes to.

pub mod catalog;
pub mod column_map;
pub mod config;
pub mod context;
pub mod error;
pub mod source;
pub mod store;

pub use catalog::{
    AnnotationTarget, Catalog, ColumnDef, ColumnType, ConstraintName, ForeignKeyDef, KeyDef,
    Model, SchemaDef, TableDef, TableName,
};
pub use column_map::{ColumnMap, ColumnMapping, ColumnOverlay};
pub use config::ModelConfig;
pub use context::{expand_context_set, Context};
pub use error::{ElementKind, Error, Result, SourceError};
pub use source::{Positions, RawSource, Source, SourceKind, SourceSpec, VisibleSources};
pub use store::{MemoryStore, ModelStore, SledStore};
