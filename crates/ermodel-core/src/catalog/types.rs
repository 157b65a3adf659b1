//! Core type definitions for the catalog.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Annotation store of a model element, keyed by annotation tag.
pub type Annotations = serde_json::Map<String, serde_json::Value>;

/// Access control lists or ACL bindings, keyed by access mode or binding name.
pub type Acls = serde_json::Map<String, serde_json::Value>;

fn is_false(value: &bool) -> bool {
    !*value
}

/// Column data type as reported by the catalog service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnType {
    /// Type name (e.g. `text`, `int8`, `text[]`).
    pub typename: String,
    /// Whether this is an array type.
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_array: bool,
    /// Element type of an array or domain type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_type: Option<Box<ColumnType>>,
}

impl ColumnType {
    /// Create a scalar type by name.
    pub fn named(typename: impl Into<String>) -> Self {
        Self {
            typename: typename.into(),
            is_array: false,
            base_type: None,
        }
    }

    /// Create an array of `base`.
    pub fn array(base: ColumnType) -> Self {
        Self {
            typename: format!("{}[]", base.typename),
            is_array: true,
            base_type: Some(Box::new(base)),
        }
    }

    pub fn text() -> Self {
        Self::named("text")
    }

    pub fn markdown() -> Self {
        Self::named("markdown")
    }

    pub fn int4() -> Self {
        Self::named("int4")
    }

    pub fn int8() -> Self {
        Self::named("int8")
    }

    pub fn float8() -> Self {
        Self::named("float8")
    }

    pub fn boolean() -> Self {
        Self::named("boolean")
    }

    pub fn date() -> Self {
        Self::named("date")
    }

    pub fn timestamptz() -> Self {
        Self::named("timestamptz")
    }

    pub fn jsonb() -> Self {
        Self::named("jsonb")
    }

    /// Type of the system row identifier column.
    pub fn ermrest_rid() -> Self {
        Self::named("ermrest_rid")
    }
}

/// A `(schema, name)` constraint identifier.
///
/// Serialized as a 2-element JSON array, matching the catalog's `names` lists
/// and the legacy source notation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "(String, String)", into = "(String, String)")]
pub struct ConstraintName {
    /// Schema the constraint name lives in.
    pub schema: String,
    /// Constraint name.
    pub name: String,
}

impl ConstraintName {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }
}

impl From<(String, String)> for ConstraintName {
    fn from((schema, name): (String, String)) -> Self {
        Self { schema, name }
    }
}

impl From<ConstraintName> for (String, String) {
    fn from(value: ConstraintName) -> Self {
        (value.schema, value.name)
    }
}

impl fmt::Display for ConstraintName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.schema, self.name)
    }
}

/// Qualified table name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableName {
    /// Schema containing the table.
    pub schema: String,
    /// Table name.
    pub table: String,
}

impl TableName {
    pub fn new(schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
        }
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.schema, self.table)
    }
}

/// Fully qualified column reference used by foreign keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnRef {
    pub schema_name: String,
    pub table_name: String,
    pub column_name: String,
}

impl ColumnRef {
    pub fn new(table: &TableName, column: impl Into<String>) -> Self {
        Self {
            schema_name: table.schema.clone(),
            table_name: table.table.clone(),
            column_name: column.into(),
        }
    }

    /// The table this column belongs to.
    pub fn table(&self) -> TableName {
        TableName::new(&self.schema_name, &self.table_name)
    }

    /// Check if the column lives in `table`.
    pub fn is_in(&self, table: &TableName) -> bool {
        self.schema_name == table.schema && self.table_name == table.table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_constraint_name_serde() {
        let name = ConstraintName::new("isa", "t_fk1_fkey");
        let value = serde_json::to_value(&name).unwrap();
        assert_eq!(value, json!(["isa", "t_fk1_fkey"]));

        let back: ConstraintName = serde_json::from_value(value).unwrap();
        assert_eq!(back, name);
        assert_eq!(back.to_string(), "isa:t_fk1_fkey");
    }

    #[test]
    fn test_array_type() {
        let ty = ColumnType::array(ColumnType::text());
        assert_eq!(ty.typename, "text[]");
        assert!(ty.is_array);

        let value = serde_json::to_value(ColumnType::int8()).unwrap();
        assert_eq!(value, json!({"typename": "int8"}));
    }

    #[test]
    fn test_column_ref_table() {
        let table = TableName::new("isa", "dataset");
        let col = ColumnRef::new(&table, "RID");
        assert!(col.is_in(&table));
        assert_eq!(col.table(), table);
    }
}
