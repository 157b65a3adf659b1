//! Model configuration.

use crate::catalog::{tag, TableDef};
use crate::context::Context;
use serde_json::Value;

/// Default terminal column for synthesized relationship paths.
pub const DEFAULT_KEY_COLUMN: &str = "RID";

/// Default asset-annotation fields whose values name companion columns.
pub const DEFAULT_ASSET_ROLES: [&str; 4] = ["filename_column", "byte_count_column", "md5", "sha256"];

/// Configuration for source normalization and visible-source editing.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    /// Column read at the end of a synthesized outbound/inbound path.
    pub key_column: String,

    /// Fields of the asset annotation that name automatically-populated
    /// companion columns.
    pub asset_roles: Vec<String>,

    /// Contexts from which asset companion columns are kept out on insertion.
    pub suppressed_contexts: Vec<Context>,
}

impl ModelConfig {
    /// Create a configuration with the default settings.
    pub fn new() -> Self {
        Self {
            key_column: DEFAULT_KEY_COLUMN.to_string(),
            asset_roles: DEFAULT_ASSET_ROLES.iter().map(|s| s.to_string()).collect(),
            suppressed_contexts: vec![Context::Entry, Context::EntryEdit, Context::EntryCreate],
        }
    }

    /// Set the terminal key column.
    pub fn with_key_column(mut self, column: impl Into<String>) -> Self {
        self.key_column = column.into();
        self
    }

    /// Replace the asset companion roles.
    pub fn with_asset_roles(mut self, roles: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.asset_roles = roles.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the contexts in which asset companions are suppressed.
    pub fn with_suppressed_contexts(mut self, contexts: impl IntoIterator<Item = Context>) -> Self {
        self.suppressed_contexts = contexts.into_iter().collect();
        self
    }

    /// Check if `context` hides asset companion columns.
    pub fn suppresses(&self, context: Context) -> bool {
        self.suppressed_contexts.contains(&context)
    }

    /// Check if `column` is filled in automatically from an asset upload.
    ///
    /// A column is a companion when some asset column of `table` names it in
    /// one of the configured roles.
    pub fn is_asset_companion(&self, table: &TableDef, column: &str) -> bool {
        table
            .column_definitions
            .iter()
            .filter_map(|c| c.annotations.get(tag::ASSET))
            .filter_map(Value::as_object)
            .any(|asset| {
                self.asset_roles
                    .iter()
                    .any(|role| asset.get(role).and_then(Value::as_str) == Some(column))
            })
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ColumnDef, ColumnType};
    use serde_json::json;

    fn asset_table() -> TableDef {
        TableDef::define("isa", "file")
            .with_column(
                ColumnDef::new("URL", ColumnType::text()).with_annotation(
                    tag::ASSET,
                    json!({"byte_count_column": "Length", "md5": "MD5", "filename_column": "Filename"}),
                ),
            )
            .with_column(ColumnDef::new("Length", ColumnType::int8()))
            .with_column(ColumnDef::new("MD5", ColumnType::text()))
            .with_column(ColumnDef::new("Filename", ColumnType::text()))
            .with_column(ColumnDef::new("Notes", ColumnType::text()))
    }

    #[test]
    fn test_default_config() {
        let config = ModelConfig::default();
        assert_eq!(config.key_column, DEFAULT_KEY_COLUMN);
        assert_eq!(config.asset_roles.len(), 4);
        assert!(config.suppresses(Context::Entry));
        assert!(!config.suppresses(Context::Star));
    }

    #[test]
    fn test_asset_companion_detection() {
        let config = ModelConfig::default();
        let table = asset_table();
        assert!(config.is_asset_companion(&table, "Length"));
        assert!(config.is_asset_companion(&table, "MD5"));
        assert!(!config.is_asset_companion(&table, "Notes"));
        assert!(!config.is_asset_companion(&table, "URL"));
    }

    #[test]
    fn test_custom_roles() {
        let config = ModelConfig::new()
            .with_asset_roles(["byte_count_column"])
            .with_suppressed_contexts([Context::Entry]);
        let table = asset_table();
        assert!(config.is_asset_companion(&table, "Length"));
        assert!(!config.is_asset_companion(&table, "MD5"));
        assert!(!config.suppresses(Context::EntryEdit));
    }
}
