//! Column definitions.

use super::types::{Acls, Annotations, ColumnType};
use serde::{Deserialize, Serialize};
use serde_json::Value;

fn default_nullok() -> bool {
    true
}

/// Names of the system columns every table carries.
pub const SYSTEM_COLUMNS: [&str; 5] = ["RID", "RCT", "RMT", "RCB", "RMB"];

/// A column definition within a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    /// Column name (unique within table).
    pub name: String,
    /// Column data type.
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    /// Whether NULL is allowed.
    #[serde(default = "default_nullok")]
    pub nullok: bool,
    /// Default value if not provided.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Human-readable comment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default)]
    pub annotations: Annotations,
    #[serde(default)]
    pub acls: Acls,
    #[serde(default)]
    pub acl_bindings: Acls,
    /// Server-assigned identity; absent until the column is created remotely.
    #[serde(rename = "RID", default, skip_serializing_if = "Option::is_none")]
    pub rid: Option<String>,
}

impl ColumnDef {
    /// Define a new nullable column.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullok: true,
            default: None,
            comment: None,
            annotations: Annotations::new(),
            acls: Acls::new(),
            acl_bindings: Acls::new(),
            rid: None,
        }
    }

    /// The five system columns, in catalog order.
    pub fn system_columns() -> Vec<ColumnDef> {
        vec![
            ColumnDef::new("RID", ColumnType::ermrest_rid()).not_null(),
            ColumnDef::new("RCT", ColumnType::named("ermrest_rct")).not_null(),
            ColumnDef::new("RMT", ColumnType::named("ermrest_rmt")).not_null(),
            ColumnDef::new("RCB", ColumnType::named("ermrest_rcb")),
            ColumnDef::new("RMB", ColumnType::named("ermrest_rmb")),
        ]
    }

    /// Disallow NULL.
    pub fn not_null(mut self) -> Self {
        self.nullok = false;
        self
    }

    /// Set the default value.
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Set the comment.
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Set an annotation.
    pub fn with_annotation(mut self, tag: impl Into<String>, value: Value) -> Self {
        self.annotations.insert(tag.into(), value);
        self
    }

    /// Check if the column has been created remotely.
    pub fn is_realized(&self) -> bool {
        self.rid.is_some()
    }

    /// Check if this is one of the system columns.
    pub fn is_system(&self) -> bool {
        SYSTEM_COLUMNS.contains(&self.name.as_str())
    }

    /// A copy of this definition with a new name and no remote identity.
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rid: None,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_column_builder() {
        let col = ColumnDef::new("Title", ColumnType::text())
            .not_null()
            .with_default(json!("untitled"))
            .with_comment("Dataset title");

        assert_eq!(col.name, "Title");
        assert!(!col.nullok);
        assert_eq!(col.default, Some(json!("untitled")));
        assert!(!col.is_realized());
    }

    #[test]
    fn test_deserialize_catalog_json() {
        let col: ColumnDef = serde_json::from_value(json!({
            "RID": "1-ABCD",
            "name": "Species",
            "type": {"typename": "text"},
            "annotations": {"tag:misd.isi.edu,2015:display": {"name": "Species"}}
        }))
        .unwrap();

        assert!(col.nullok);
        assert!(col.is_realized());
        assert_eq!(col.annotations.len(), 1);
    }

    #[test]
    fn test_renamed_clears_identity() {
        let mut col = ColumnDef::new("a", ColumnType::int4()).with_comment("kept");
        col.rid = Some("1-0001".into());
        let renamed = col.renamed("b");
        assert_eq!(renamed.name, "b");
        assert_eq!(renamed.comment.as_deref(), Some("kept"));
        assert!(renamed.rid.is_none());
    }

    #[test]
    fn test_system_columns() {
        let cols = ColumnDef::system_columns();
        assert_eq!(cols.len(), SYSTEM_COLUMNS.len());
        assert!(cols.iter().all(ColumnDef::is_system));
    }
}
