//! Source spec types and their JSON wire format.
//!
//! A source spec appears in three notations inside visible-source
//! annotations:
//!
//! | Notation  | Example                                                         |
//! |-----------|-----------------------------------------------------------------|
//! | name      | `"species"`                                                     |
//! | legacy    | `["isa", "sample_species_fkey"]`                                |
//! | canonical | `{"source": [{"outbound": ["isa", "sample_species_fkey"]}, "RID"]}` |
//!
//! [`RawSource`] carries any of the three; [`SourceSpec`] is the canonical
//! form produced by the resolver.

use crate::catalog::ConstraintName;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

/// Column name reported for specs that do not denote a single column.
pub const PSEUDO_COLUMN: &str = "pseudo_column";

/// One step of a relationship path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Hop {
    /// Follow a foreign key of the current table to the table it references.
    Outbound(ConstraintName),
    /// Follow a foreign key of another table back to the table that owns it.
    Inbound(ConstraintName),
}

impl Hop {
    /// The foreign key this hop follows.
    pub fn name(&self) -> &ConstraintName {
        match self {
            Hop::Outbound(name) | Hop::Inbound(name) => name,
        }
    }

    /// The same direction, following a different foreign key.
    pub fn with_name(&self, name: ConstraintName) -> Hop {
        match self {
            Hop::Outbound(_) => Hop::Outbound(name),
            Hop::Inbound(_) => Hop::Inbound(name),
        }
    }

    fn direction(&self) -> &'static str {
        match self {
            Hop::Outbound(_) => "outbound",
            Hop::Inbound(_) => "inbound",
        }
    }

    pub fn to_value(&self) -> Value {
        let name = self.name();
        let mut map = Map::new();
        map.insert(
            self.direction().to_string(),
            Value::Array(vec![
                Value::String(name.schema.clone()),
                Value::String(name.name.clone()),
            ]),
        );
        Value::Object(map)
    }

    /// Parse a hop descriptor: an object with a single `inbound` or
    /// `outbound` member holding a 2-element identifier.
    pub fn from_value(value: &Value) -> Result<Hop, String> {
        let map = value
            .as_object()
            .ok_or_else(|| format!("path element {value} is not a hop"))?;
        if map.len() != 1 {
            return Err(format!("hop {value} must have exactly one direction"));
        }
        let (direction, ident) = map
            .iter()
            .next()
            .ok_or_else(|| format!("hop {value} is empty"))?;
        let name = match ident.as_array().map(Vec::as_slice) {
            Some([Value::String(schema), Value::String(name)]) => ConstraintName::new(schema, name),
            _ => return Err(format!("hop {value} needs a [schema, name] identifier")),
        };
        match direction.as_str() {
            "outbound" => Ok(Hop::Outbound(name)),
            "inbound" => Ok(Hop::Inbound(name)),
            other => Err(format!("unknown hop direction {other:?}")),
        }
    }
}

impl fmt::Display for Hop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.direction(), self.name())
    }
}

/// What a source spec points at.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Source {
    /// A column of the table itself.
    Column(String),
    /// A relationship path, read at `column` of the table reached.
    Path { hops: Vec<Hop>, column: String },
    /// A named entry of the table's source-definitions annotation.
    Key(String),
}

impl Source {
    /// A one-hop outbound path.
    pub fn outbound(name: ConstraintName, column: impl Into<String>) -> Self {
        Source::Path {
            hops: vec![Hop::Outbound(name)],
            column: column.into(),
        }
    }

    /// A one-hop inbound path.
    pub fn inbound(name: ConstraintName, column: impl Into<String>) -> Self {
        Source::Path {
            hops: vec![Hop::Inbound(name)],
            column: column.into(),
        }
    }

    /// Wire value of a `source` member. `Key` sources have none.
    fn to_value(&self) -> Option<Value> {
        match self {
            Source::Column(name) => Some(Value::String(name.clone())),
            Source::Path { hops, column } => {
                let mut items: Vec<Value> = hops.iter().map(Hop::to_value).collect();
                items.push(Value::String(column.clone()));
                Some(Value::Array(items))
            }
            Source::Key(_) => None,
        }
    }

    /// Parse the value of a `source` member.
    pub fn parse(value: &Value) -> Result<Source, String> {
        match value {
            Value::String(name) => Ok(Source::Column(name.clone())),
            Value::Array(items) => {
                let (last, hops) = items
                    .split_last()
                    .ok_or_else(|| "empty source path".to_string())?;
                let column = last
                    .as_str()
                    .ok_or_else(|| format!("path must end in a column name, found {last}"))?;
                if column.is_empty() {
                    return Err("empty terminal column".to_string());
                }
                if hops.is_empty() {
                    return Ok(Source::Column(column.to_string()));
                }
                let hops = hops
                    .iter()
                    .map(Hop::from_value)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Source::Path {
                    hops,
                    column: column.to_string(),
                })
            }
            other => Err(format!("unsupported source {other}")),
        }
    }
}

/// A canonical source spec: the source plus display metadata
/// (`markdown_name`, `comment`, `open`, ...), kept in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSpec {
    pub source: Source,
    pub extra: Map<String, Value>,
}

impl SourceSpec {
    pub fn new(source: Source) -> Self {
        Self {
            source,
            extra: Map::new(),
        }
    }

    /// A spec for a column of the table itself.
    pub fn column(name: impl Into<String>) -> Self {
        Self::new(Source::Column(name.into()))
    }

    /// Attach a metadata member.
    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// The same metadata with a different source.
    pub fn with_source(&self, source: Source) -> Self {
        Self {
            source,
            extra: self.extra.clone(),
        }
    }

    pub fn markdown_name(&self) -> Option<&str> {
        self.extra.get("markdown_name").and_then(Value::as_str)
    }

    /// The foreign key of a one-hop outbound path.
    pub fn single_outbound(&self) -> Option<&ConstraintName> {
        match &self.source {
            Source::Path { hops, .. } => match hops.as_slice() {
                [Hop::Outbound(name)] => Some(name),
                _ => None,
            },
            _ => None,
        }
    }

    /// Check if any hop of the path follows `name`.
    pub fn passes_through(&self, name: &ConstraintName) -> bool {
        match &self.source {
            Source::Path { hops, .. } => hops.iter().any(|h| h.name() == name),
            _ => false,
        }
    }

    /// The same spec with each hop redirected to the foreign key `rename`
    /// returns for it. Hops it returns `None` for, the terminal column, and
    /// the metadata are kept.
    pub fn rename_hops(&self, rename: impl Fn(&ConstraintName) -> Option<ConstraintName>) -> Self {
        match &self.source {
            Source::Path { hops, column } => self.with_source(Source::Path {
                hops: hops
                    .iter()
                    .map(|hop| rename(hop.name()).map_or_else(|| hop.clone(), |name| hop.with_name(name)))
                    .collect(),
                column: column.clone(),
            }),
            _ => self.clone(),
        }
    }

    /// Parse a canonical object. Every hop must be a well-formed
    /// inbound/outbound descriptor.
    pub fn from_object(map: &Map<String, Value>) -> Result<Self, String> {
        let source = if let Some(value) = map.get("source") {
            Source::parse(value)?
        } else if let Some(value) = map.get("sourcekey") {
            let key = value
                .as_str()
                .ok_or_else(|| format!("sourcekey {value} is not a string"))?;
            Source::Key(key.to_string())
        } else {
            return Err("object has neither source nor sourcekey".to_string());
        };

        let extra = map
            .iter()
            .filter(|(k, _)| k.as_str() != "source" && k.as_str() != "sourcekey")
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Ok(Self { source, extra })
    }

    /// Render the canonical wire object.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        match self.source.to_value() {
            Some(value) => {
                map.insert("source".to_string(), value);
            }
            None => {
                if let Source::Key(key) = &self.source {
                    map.insert("sourcekey".to_string(), Value::String(key.clone()));
                }
            }
        }
        for (k, v) in &self.extra {
            map.insert(k.clone(), v.clone());
        }
        Value::Object(map)
    }
}

impl fmt::Display for SourceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_value())
    }
}

impl Serialize for SourceSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SourceSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = Map::deserialize(deserializer)?;
        SourceSpec::from_object(&map).map_err(serde::de::Error::custom)
    }
}

/// A source spec in any of the accepted notations.
#[derive(Debug, Clone, PartialEq)]
pub enum RawSource {
    /// A bare column or foreign key name.
    Name(String),
    /// A `[schema, constraint]` pair.
    Legacy(ConstraintName),
    /// An already canonical spec.
    Spec(SourceSpec),
}

impl RawSource {
    /// Classify a wire value.
    pub fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::String(name) => Ok(RawSource::Name(name.clone())),
            Value::Array(items) => match items.as_slice() {
                [Value::String(schema), Value::String(name)] => {
                    Ok(RawSource::Legacy(ConstraintName::new(schema, name)))
                }
                _ => Err(format!("{value} is not a [schema, name] pair")),
            },
            Value::Object(map) => SourceSpec::from_object(map).map(RawSource::Spec),
            other => Err(format!("unsupported source notation {other}")),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            RawSource::Name(name) => Value::String(name.clone()),
            RawSource::Legacy(name) => serde_json::json!([name.schema, name.name]),
            RawSource::Spec(spec) => spec.to_value(),
        }
    }
}

impl fmt::Display for RawSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_value())
    }
}

impl From<&str> for RawSource {
    fn from(value: &str) -> Self {
        RawSource::Name(value.to_string())
    }
}

impl From<String> for RawSource {
    fn from(value: String) -> Self {
        RawSource::Name(value)
    }
}

impl From<ConstraintName> for RawSource {
    fn from(value: ConstraintName) -> Self {
        RawSource::Legacy(value)
    }
}

impl From<SourceSpec> for RawSource {
    fn from(value: SourceSpec) -> Self {
        RawSource::Spec(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_outbound_path() {
        let spec: SourceSpec = serde_json::from_value(json!({
            "source": [{"outbound": ["isa", "t_fk1_fkey"]}, "RID"],
            "markdown_name": "Fk One"
        }))
        .unwrap();

        assert_eq!(
            spec.single_outbound(),
            Some(&ConstraintName::new("isa", "t_fk1_fkey"))
        );
        assert_eq!(spec.markdown_name(), Some("Fk One"));
    }

    #[test]
    fn test_to_value_puts_source_first() {
        let spec = SourceSpec::column("title").with_extra("comment", json!("Title"));
        let value = spec.to_value();
        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["source", "comment"]);
    }

    #[test]
    fn test_single_element_path_is_column() {
        let source = Source::parse(&json!(["title"])).unwrap();
        assert_eq!(source, Source::Column("title".into()));
    }

    #[test]
    fn test_malformed_paths_rejected() {
        assert!(Source::parse(&json!([])).is_err());
        assert!(Source::parse(&json!([{"outbound": ["isa"]}, "RID"])).is_err());
        assert!(Source::parse(&json!([{"outbound": ["isa", "a"], "inbound": ["isa", "b"]}, "RID"])).is_err());
        assert!(Source::parse(&json!([{"sideways": ["isa", "a"]}, "RID"])).is_err());
        assert!(Source::parse(&json!([{"outbound": ["isa", "a"]}])).is_err());
        assert!(Source::parse(&json!(42)).is_err());
    }

    #[test]
    fn test_sourcekey_spec() {
        let spec = SourceSpec::from_object(
            json!({"sourcekey": "search-box"}).as_object().unwrap(),
        )
        .unwrap();
        assert_eq!(spec.source, Source::Key("search-box".into()));
        assert_eq!(spec.to_value(), json!({"sourcekey": "search-box"}));
    }

    #[test]
    fn test_raw_source_notations() {
        assert_eq!(
            RawSource::from_value(&json!("title")).unwrap(),
            RawSource::Name("title".into())
        );
        assert_eq!(
            RawSource::from_value(&json!(["isa", "t_fk1_fkey"])).unwrap(),
            RawSource::Legacy(ConstraintName::new("isa", "t_fk1_fkey"))
        );
        assert!(matches!(
            RawSource::from_value(&json!({"source": "title"})).unwrap(),
            RawSource::Spec(_)
        ));
        assert!(RawSource::from_value(&json!(["isa"])).is_err());
        assert!(RawSource::from_value(&json!(true)).is_err());
    }

    #[test]
    fn test_passes_through() {
        let spec = SourceSpec::new(Source::Path {
            hops: vec![
                Hop::Inbound(ConstraintName::new("isa", "a_fkey")),
                Hop::Outbound(ConstraintName::new("isa", "b_fkey")),
            ],
            column: "RID".into(),
        });
        assert!(spec.passes_through(&ConstraintName::new("isa", "b_fkey")));
        assert!(!spec.passes_through(&ConstraintName::new("isa", "c_fkey")));
        assert!(spec.single_outbound().is_none());
    }
}
