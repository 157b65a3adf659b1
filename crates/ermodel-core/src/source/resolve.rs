//! Source spec normalization and validation against a table.

use super::spec::{Hop, RawSource, Source, SourceSpec, PSEUDO_COLUMN};
use crate::catalog::{tag, ConstraintName, ForeignKeyDef, Resolved, TableView};
use crate::column_map::ColumnMap;
use crate::config::ModelConfig;
use crate::error::{Error, Result, SourceError};
use serde_json::Value;
use std::fmt;
use tracing::debug;

/// Resolves source specs relative to one table of a model snapshot.
#[derive(Debug, Clone, Copy)]
pub struct SourceResolver<'a> {
    table: TableView<'a>,
    config: &'a ModelConfig,
}

impl<'a> SourceResolver<'a> {
    pub fn new(table: TableView<'a>, config: &'a ModelConfig) -> Self {
        Self { table, config }
    }

    pub fn table(&self) -> TableView<'a> {
        self.table
    }

    pub fn config(&self) -> &'a ModelConfig {
        self.config
    }

    fn error(&self, spec: impl fmt::Display, reason: impl Into<String>) -> Error {
        SourceError::new(self.table.name(), spec, reason).into()
    }

    fn path(&self, hop: Hop) -> Source {
        Source::Path {
            hops: vec![hop],
            column: self.config.key_column.clone(),
        }
    }

    /// Convert any notation into the canonical form.
    ///
    /// Bare names are tried as a column, then an outgoing foreign key, then
    /// an incoming foreign key. Legacy pairs are tried as a key, then an
    /// outgoing foreign key, then an incoming foreign key. Canonical specs
    /// pass through unchanged.
    pub fn normalize(&self, raw: &RawSource) -> Result<SourceSpec> {
        let source = match raw {
            RawSource::Name(name) => match self.table.resolve_name(name) {
                Resolved::Column(column) => Source::Column(column.name.clone()),
                Resolved::ForeignKey(fkey) => self.path(Hop::Outbound(matching_name(fkey, name)?)),
                Resolved::ReferencedBy(_, fkey) => {
                    self.path(Hop::Inbound(matching_name(fkey, name)?))
                }
                Resolved::Key(_) | Resolved::NotFound => {
                    return Err(self.error(raw, "no column or foreign key with this name"));
                }
            },
            RawSource::Legacy(name) => match self.table.resolve_constraint(name) {
                Resolved::Key(key) => match key.single_column() {
                    Some(column) => Source::Column(column.to_string()),
                    None => return Err(self.error(raw, "composite key has no single column")),
                },
                Resolved::ForeignKey(_) => self.path(Hop::Outbound(name.clone())),
                Resolved::ReferencedBy(..) => self.path(Hop::Inbound(name.clone())),
                Resolved::Column(_) | Resolved::NotFound => {
                    return Err(self.error(raw, "no key or foreign key with this name"));
                }
            },
            RawSource::Spec(spec) => return Ok(spec.clone()),
        };
        debug!(table = %self.table.name(), raw = %raw, "normalized source");
        Ok(SourceSpec::new(source))
    }

    /// Classify and normalize a wire value.
    pub fn normalize_value(&self, value: &Value) -> Result<SourceSpec> {
        let raw = RawSource::from_value(value).map_err(|reason| self.error(value, reason))?;
        self.normalize(&raw)
    }

    /// Normalize and then check every element of the spec against the
    /// snapshot: columns exist, each hop is a real foreign key reachable from
    /// the previous table, and the terminal column is a single-column key of
    /// the table where the path ends.
    pub fn validate(&self, raw: &RawSource) -> Result<SourceSpec> {
        let spec = self.normalize(raw)?;
        match &spec.source {
            Source::Column(column) => {
                if !self.table.contains_column(column) {
                    return Err(self.error(&spec, format!("no column {column}")));
                }
            }
            Source::Key(key) => {
                let defined = self
                    .table
                    .def()
                    .annotations
                    .get(tag::SOURCE_DEFINITIONS)
                    .and_then(|defs| defs.get("sources"))
                    .and_then(|sources| sources.get(key))
                    .is_some();
                if !defined {
                    return Err(self.error(&spec, format!("sourcekey {key} is not defined")));
                }
            }
            Source::Path { hops, column } => {
                let mut current = self.table;
                for (i, hop) in hops.iter().enumerate() {
                    let here = current;
                    current = match hop {
                        Hop::Inbound(name) => here.inbound(name).map(|(table, _)| table),
                        Hop::Outbound(name) => here
                            .foreign_key(name)
                            .and_then(|fkey| here.outbound_target(fkey).ok()),
                    }
                    .ok_or_else(|| {
                        self.error(&spec, format!("hop {i} ({hop}) not found from {}", here.name()))
                    })?;
                }
                if !current.contains_column(column) {
                    return Err(self.error(
                        &spec,
                        format!("no column {column} on {}", current.name()),
                    ));
                }
                if !current.keys().any(|key| key.covers(&[column.as_str()])) {
                    return Err(self.error(
                        &spec,
                        format!("column {column} is not a key of {}", current.name()),
                    ));
                }
            }
        }
        Ok(spec)
    }

    /// The column a spec displays, or [`PSEUDO_COLUMN`] when it denotes a
    /// path that cannot be renamed as a single column.
    pub fn column_name(&self, spec: &SourceSpec) -> String {
        match &spec.source {
            Source::Column(column) => column.clone(),
            Source::Path { .. } => spec
                .single_outbound()
                .and_then(|name| self.table.foreign_key(name))
                .and_then(ForeignKeyDef::single_column)
                .unwrap_or(PSEUDO_COLUMN)
                .to_string(),
            Source::Key(_) => PSEUDO_COLUMN.to_string(),
        }
    }

    /// The single-column outgoing foreign key whose sole column is `column`,
    /// if there is exactly one.
    pub fn outbound_for_column(&self, column: &str) -> Option<&'a ForeignKeyDef> {
        let mut candidates = self
            .table
            .foreign_keys()
            .filter(|fkey| fkey.single_column() == Some(column));
        match (candidates.next(), candidates.next()) {
            (Some(fkey), None) => Some(fkey),
            _ => None,
        }
    }

    /// Rewrite a column spec as the outbound path of its foreign key.
    pub fn to_outbound(&self, spec: &SourceSpec) -> Result<SourceSpec> {
        let Source::Column(column) = &spec.source else {
            return Err(self.error(spec, "not a column source"));
        };
        let fkey = self
            .outbound_for_column(column)
            .ok_or_else(|| self.error(spec, "column is not in exactly one single-column foreign key"))?;
        let name = canonical_name(fkey).ok_or_else(|| self.error(spec, "foreign key has no name"))?;
        Ok(spec.with_source(self.path(Hop::Outbound(name.clone()))))
    }

    /// Rewrite a one-hop outbound spec as a spec of its underlying column.
    pub fn to_column(&self, spec: &SourceSpec) -> Result<SourceSpec> {
        let name = spec
            .single_outbound()
            .ok_or_else(|| self.error(spec, "not a single outbound path"))?;
        let fkey = self
            .table
            .foreign_key(name)
            .ok_or_else(|| self.error(spec, format!("no foreign key {name}")))?;
        let column = fkey
            .single_column()
            .ok_or_else(|| self.error(spec, "composite foreign key has no single column"))?;
        Ok(spec.with_source(Source::Column(column.to_string())))
    }

    /// Rewrite a spec for the renames recorded in `map`.
    ///
    /// A mapped column whose foreign key is mapped too becomes an outbound
    /// path through the new foreign key. A mapped plain column takes its new
    /// name. In a path, every hop following a mapped foreign key is
    /// redirected and the terminal column is kept.
    pub fn rename(&self, spec: &SourceSpec, map: &ColumnMap) -> Result<SourceSpec> {
        let Source::Column(column) = &spec.source else {
            return Ok(spec.rename_hops(|name| map.foreign_key(name).and_then(canonical_name).cloned()));
        };
        let Some(new_column) = map.column(column) else {
            return Ok(spec.clone());
        };
        let retargeted = self
            .table
            .foreign_keys()
            .filter(|fkey| fkey.uses_column(column))
            .find_map(|fkey| fkey.names.iter().find_map(|n| map.foreign_key(n)));
        match retargeted {
            Some(new_fkey) => {
                let name = canonical_name(new_fkey)
                    .ok_or_else(|| self.error(spec, "renamed foreign key has no name"))?;
                Ok(spec.with_source(self.path(Hop::Outbound(name.clone()))))
            }
            None => Ok(spec.with_source(Source::Column(new_column.name.clone()))),
        }
    }
}

fn canonical_name(fkey: &ForeignKeyDef) -> Option<&ConstraintName> {
    fkey.name()
}

/// The constraint name of `fkey` whose bare name is `name`.
fn matching_name(fkey: &ForeignKeyDef, name: &str) -> Result<ConstraintName> {
    fkey.names
        .iter()
        .find(|n| n.name == name)
        .cloned()
        .ok_or_else(|| Error::ConstraintViolation(format!("foreign key lost name {name}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ColumnDef, ColumnType, KeyDef, Model, SchemaDef, TableDef, TableName};
    use crate::column_map::ColumnMapping;
    use serde_json::json;

    fn sample_model() -> Model {
        let t = TableName::new("myschema", "t");
        let other = TableName::new("myschema", "other");
        let child = TableName::new("myschema", "child");

        let other_def = TableDef::define("myschema", "other")
            .with_column(ColumnDef::new("name", ColumnType::text()))
            .with_column(ColumnDef::new("a", ColumnType::text()))
            .with_column(ColumnDef::new("b", ColumnType::text()))
            .with_key(KeyDef::new(ConstraintName::new("myschema", "other_a_b_key"), ["a", "b"]));
        let t_def = TableDef::define("myschema", "t")
            .with_column(ColumnDef::new("name", ColumnType::text()))
            .with_column(ColumnDef::new("fk1", ColumnType::text()))
            .with_column(ColumnDef::new("c1", ColumnType::text()))
            .with_column(ColumnDef::new("c2", ColumnType::text()))
            .with_key(KeyDef::new(ConstraintName::new("myschema", "t_name_key"), ["name"]))
            .with_key(KeyDef::new(ConstraintName::new("myschema", "t_c1_c2_key"), ["c1", "c2"]))
            .with_foreign_key(crate::catalog::ForeignKeyDef::new(
                ConstraintName::new("myschema", "t_fk1_fkey"),
                &t,
                &["fk1"],
                &other,
                &["RID"],
            ))
            .with_foreign_key(crate::catalog::ForeignKeyDef::new(
                ConstraintName::new("myschema", "t_c1_c2_fkey"),
                &t,
                &["c1", "c2"],
                &other,
                &["a", "b"],
            ));
        let child_def = TableDef::define("myschema", "child")
            .with_column(ColumnDef::new("parent", ColumnType::text()))
            .with_foreign_key(crate::catalog::ForeignKeyDef::new(
                ConstraintName::new("myschema", "child_parent_fkey"),
                &child,
                &["parent"],
                &t,
                &["RID"],
            ));
        Model::new().with_schema(
            SchemaDef::new("myschema")
                .with_table(other_def)
                .with_table(t_def)
                .with_table(child_def),
        )
    }

    fn with_resolver<T>(f: impl FnOnce(SourceResolver<'_>) -> T) -> T {
        let model = sample_model();
        let config = ModelConfig::default();
        let table = model.table_view(&TableName::new("myschema", "t")).unwrap();
        f(SourceResolver::new(table, &config))
    }

    #[test]
    fn test_legacy_to_canonical() {
        with_resolver(|r| {
            let spec = r
                .normalize(&RawSource::Legacy(ConstraintName::new("myschema", "t_fk1_fkey")))
                .unwrap();
            assert_eq!(
                spec.to_value(),
                json!({"source": [{"outbound": ["myschema", "t_fk1_fkey"]}, "RID"]})
            );
        });
    }

    #[test]
    fn test_normalize_name_priority() {
        with_resolver(|r| {
            assert_eq!(
                r.normalize(&"fk1".into()).unwrap(),
                SourceSpec::column("fk1")
            );
            let outbound = r.normalize(&"t_fk1_fkey".into()).unwrap();
            assert_eq!(
                outbound.single_outbound(),
                Some(&ConstraintName::new("myschema", "t_fk1_fkey"))
            );
            let inbound = r.normalize(&"child_parent_fkey".into()).unwrap();
            assert_eq!(
                inbound.source,
                Source::inbound(ConstraintName::new("myschema", "child_parent_fkey"), "RID")
            );
            assert!(matches!(
                r.normalize(&"missing".into()),
                Err(Error::SourceSpecInvalid(_))
            ));
        });
    }

    #[test]
    fn test_legacy_key_resolves_to_column() {
        with_resolver(|r| {
            let spec = r
                .normalize(&ConstraintName::new("myschema", "t_name_key").into())
                .unwrap();
            assert_eq!(spec, SourceSpec::column("name"));

            let err = r
                .normalize(&ConstraintName::new("myschema", "t_c1_c2_key").into())
                .unwrap_err();
            assert!(matches!(err, Error::SourceSpecInvalid(_)));
        });
    }

    #[test]
    fn test_normalize_is_idempotent() {
        with_resolver(|r| {
            let inputs: Vec<RawSource> = vec![
                "name".into(),
                "t_fk1_fkey".into(),
                ConstraintName::new("myschema", "t_fk1_fkey").into(),
                RawSource::from_value(&json!({"source": "c1", "markdown_name": "C1"})).unwrap(),
            ];
            for raw in inputs {
                let once = r.normalize(&raw).unwrap();
                let twice = r.normalize(&RawSource::Spec(once.clone())).unwrap();
                assert_eq!(once, twice);
            }
        });
    }

    #[test]
    fn test_three_notations_agree() {
        with_resolver(|r| {
            let by_name = r.normalize(&"t_fk1_fkey".into()).unwrap();
            let by_legacy = r
                .normalize(&ConstraintName::new("myschema", "t_fk1_fkey").into())
                .unwrap();
            let by_spec = r
                .normalize_value(&json!({"source": [{"outbound": ["myschema", "t_fk1_fkey"]}, "RID"]}))
                .unwrap();
            assert_eq!(by_name, by_legacy);
            assert_eq!(by_legacy, by_spec);
        });
    }

    #[test]
    fn test_validate_paths() {
        with_resolver(|r| {
            let good = json!({"source": [
                {"inbound": ["myschema", "child_parent_fkey"]},
                {"outbound": ["myschema", "child_parent_fkey"]},
                {"outbound": ["myschema", "t_fk1_fkey"]},
                "name"
            ]});
            let raw = RawSource::from_value(&good).unwrap();
            assert!(r.validate(&raw).is_ok());

            let broken = json!({"source": [{"outbound": ["myschema", "child_parent_fkey"]}, "RID"]});
            let err = r.validate(&RawSource::from_value(&broken).unwrap()).unwrap_err();
            assert!(err.to_string().contains("hop 0"));

            let bad_terminal = json!({"source": [{"outbound": ["myschema", "t_fk1_fkey"]}, "nope"]});
            assert!(r.validate(&RawSource::from_value(&bad_terminal).unwrap()).is_err());

            let not_key = json!({"source": [{"outbound": ["myschema", "t_fk1_fkey"]}, "name"]});
            let err = r.validate(&RawSource::from_value(&not_key).unwrap()).unwrap_err();
            assert!(err.to_string().contains("not a key"));

            let bad_column = json!({"source": "nope"});
            assert!(r.validate(&RawSource::from_value(&bad_column).unwrap()).is_err());
        });
    }

    #[test]
    fn test_validate_sourcekey() {
        let mut model = sample_model();
        let name = TableName::new("myschema", "t");
        model.table_mut(&name).unwrap().annotations.insert(
            tag::SOURCE_DEFINITIONS.into(),
            json!({"sources": {"fk1_name": {"source": [{"outbound": ["myschema", "t_fk1_fkey"]}, "name"]}}}),
        );
        let config = ModelConfig::default();
        let r = SourceResolver::new(model.table_view(&name).unwrap(), &config);
        assert!(r.validate(&RawSource::from_value(&json!({"sourcekey": "fk1_name"})).unwrap()).is_ok());
        assert!(r.validate(&RawSource::from_value(&json!({"sourcekey": "other"})).unwrap()).is_err());
    }

    #[test]
    fn test_column_name() {
        with_resolver(|r| {
            assert_eq!(r.column_name(&SourceSpec::column("name")), "name");
            let outbound = r.normalize(&"t_fk1_fkey".into()).unwrap();
            assert_eq!(r.column_name(&outbound), "fk1");
            let composite = r.normalize(&"t_c1_c2_fkey".into()).unwrap();
            assert_eq!(r.column_name(&composite), PSEUDO_COLUMN);
            let inbound = r.normalize(&"child_parent_fkey".into()).unwrap();
            assert_eq!(r.column_name(&inbound), PSEUDO_COLUMN);
        });
    }

    #[test]
    fn test_outbound_column_roundtrip() {
        with_resolver(|r| {
            let column = SourceSpec::column("fk1").with_extra("markdown_name", json!("Other"));
            let outbound = r.to_outbound(&column).unwrap();
            assert_eq!(outbound.markdown_name(), Some("Other"));
            assert_eq!(r.to_column(&outbound).unwrap(), column);

            assert!(r.to_outbound(&SourceSpec::column("name")).is_err());
            assert!(r.to_outbound(&SourceSpec::column("c1")).is_err());
            assert!(r.to_column(&SourceSpec::column("fk1")).is_err());
        });
    }

    #[test]
    fn test_rename_plain_column() {
        with_resolver(|r| {
            let map = ColumnMap::new(r.table(), [("name", ColumnMapping::name("title"))], None).unwrap();
            let renamed = r
                .rename(&SourceSpec::column("name").with_extra("comment", json!("c")), &map)
                .unwrap();
            assert_eq!(renamed.source, Source::Column("title".into()));
            assert_eq!(renamed.extra.get("comment"), Some(&json!("c")));
        });
    }

    #[test]
    fn test_rename_retargets_foreign_key() {
        with_resolver(|r| {
            let map = ColumnMap::new(r.table(), [("fk1", ColumnMapping::name("fk_one"))], None).unwrap();
            let new_fkey = ConstraintName::new("myschema", "t_fk_one_fkey");
            assert!(map.foreign_key(&ConstraintName::new("myschema", "t_fk1_fkey")).is_some());

            let renamed = r.rename(&SourceSpec::column("fk1"), &map).unwrap();
            assert_eq!(renamed.source, Source::outbound(new_fkey.clone(), "RID"));

            let outbound = r.normalize(&"t_fk1_fkey".into()).unwrap();
            let renamed = r.rename(&outbound, &map).unwrap();
            assert_eq!(renamed.source, Source::outbound(new_fkey, "RID"));
        });
    }

    #[test]
    fn test_rename_keeps_terminal_column() {
        with_resolver(|r| {
            let map = ColumnMap::new(r.table(), [("fk1", ColumnMapping::name("fk_one"))], None).unwrap();
            let spec = SourceSpec::new(Source::outbound(ConstraintName::new("myschema", "t_fk1_fkey"), "name"))
                .with_extra("markdown_name", json!("Other"));
            let renamed = r.rename(&spec, &map).unwrap();
            assert_eq!(
                renamed.to_value(),
                json!({
                    "source": [{"outbound": ["myschema", "t_fk_one_fkey"]}, "name"],
                    "markdown_name": "Other",
                })
            );
        });
    }

    #[test]
    fn test_rename_substitutes_each_hop() {
        with_resolver(|r| {
            let map = ColumnMap::new(r.table(), [("fk1", ColumnMapping::name("fk_one"))], None).unwrap();
            let spec = SourceSpec::new(Source::Path {
                hops: vec![
                    Hop::Outbound(ConstraintName::new("myschema", "t_fk1_fkey")),
                    Hop::Inbound(ConstraintName::new("myschema", "t_c1_c2_fkey")),
                    Hop::Outbound(ConstraintName::new("myschema", "t_fk1_fkey")),
                ],
                column: "b".into(),
            });
            let renamed = r.rename(&spec, &map).unwrap();
            assert_eq!(
                renamed.source,
                Source::Path {
                    hops: vec![
                        Hop::Outbound(ConstraintName::new("myschema", "t_fk_one_fkey")),
                        Hop::Inbound(ConstraintName::new("myschema", "t_c1_c2_fkey")),
                        Hop::Outbound(ConstraintName::new("myschema", "t_fk_one_fkey")),
                    ],
                    column: "b".into(),
                }
            );
        });
    }

    #[test]
    fn test_rename_leaves_unmapped_paths() {
        with_resolver(|r| {
            let map = ColumnMap::new(r.table(), [("name", ColumnMapping::name("title"))], None).unwrap();
            let inbound = r.normalize(&"child_parent_fkey".into()).unwrap();
            assert_eq!(r.rename(&inbound, &map).unwrap(), inbound);
        });
    }
}
