//! Command execution against a sled-backed model store.

use crate::config::{CliConfig, Command, KindArg};
use crate::error::CliError;
use crate::formatter::{Formatter, ValidationRow};
use ermodel_core::{
    Catalog, Model, ModelStore, Positions, RawSource, SledStore, SourceKind, TableName,
};
use serde_json::Value;
use std::path::Path;
use tracing::info;

fn open_store(config: &CliConfig) -> Result<(sled::Db, SledStore), CliError> {
    let db = sled::Config::new().path(&config.store_path).open()?;
    let store = SledStore::open(&db)?;
    Ok((db, store))
}

/// Read a source argument: JSON when it parses, otherwise a bare name.
fn parse_source(input: &str) -> Result<RawSource, CliError> {
    match serde_json::from_str::<Value>(input) {
        Ok(value) => RawSource::from_value(&value).map_err(CliError::Usage),
        Err(_) => Ok(RawSource::from(input)),
    }
}

/// Execute a command and return formatted output.
pub fn execute(
    config: &CliConfig,
    command: &Command,
    formatter: &dyn Formatter,
) -> Result<String, CliError> {
    let (_db, mut store) = open_store(config)?;
    match command {
        Command::Import { file } => import(&mut store, file, formatter),
        Command::Export { version } => {
            let model = match version {
                Some(version) => store.model_at_version(*version)?.ok_or_else(|| {
                    CliError::Usage(format!("version {version} does not exist"))
                })?,
                None => store.fetch_model()?,
            };
            Ok(serde_json::to_string_pretty(&model)?)
        }
        Command::Normalize {
            schema,
            table,
            source,
        } => {
            let raw = parse_source(source)?;
            let mut catalog = Catalog::with_config(store, config.model.clone());
            let spec = catalog.normalize_source(&TableName::new(schema, table), &raw)?;
            Ok(formatter.format_spec(&spec))
        }
        Command::Validate {
            schema,
            table,
            kind,
        } => {
            let kinds = match kind {
                Some(kind) => vec![SourceKind::from(*kind)],
                None => vec![SourceKind::Columns, SourceKind::ForeignKeys],
            };
            let mut catalog = Catalog::with_config(store, config.model.clone());
            let rows = validate(&mut catalog, &TableName::new(schema, table), &kinds)?;
            let output = formatter.format_validation(&rows);
            match rows.iter().filter(|row| row.error.is_some()).count() {
                0 => Ok(output),
                count => Err(CliError::Invalid {
                    count,
                    report: output,
                }),
            }
        }
        Command::Show {
            schema,
            table,
            kind,
        } => {
            let mut catalog = Catalog::with_config(store, config.model.clone());
            let sources =
                catalog.visible_sources(&TableName::new(schema, table), SourceKind::from(*kind))?;
            Ok(formatter.format_sources(&sources))
        }
        Command::Reorder {
            schema,
            table,
            positions,
            kind,
        } => reorder(
            Catalog::with_config(store, config.model.clone()),
            &TableName::new(schema, table),
            positions,
            *kind,
            formatter,
        ),
        Command::Versions => {
            let versions = store.list_versions()?;
            Ok(formatter.format_versions(&versions, store.current_version()))
        }
    }
}

fn import(store: &mut SledStore, file: &Path, formatter: &dyn Formatter) -> Result<String, CliError> {
    let bytes = std::fs::read(file)?;
    let model = Model::from_bytes(&bytes)?;
    let version = store.import(model)?;
    store.flush()?;
    info!(version, file = %file.display(), "imported model");
    Ok(formatter.format_message(&format!("imported {} as version {version}", file.display())))
}

fn validate(
    catalog: &mut Catalog<SledStore>,
    table: &TableName,
    kinds: &[SourceKind],
) -> Result<Vec<ValidationRow>, CliError> {
    let mut rows = Vec::new();
    for kind in kinds {
        let sources = catalog.visible_sources(table, *kind)?;
        let resolver = sources.resolver();
        for context in sources.contexts() {
            for (index, spec) in sources.sources(context).unwrap_or_default().iter().enumerate() {
                let error = resolver
                    .validate(&RawSource::Spec(spec.clone()))
                    .err()
                    .map(|e| e.to_string());
                rows.push(ValidationRow {
                    tag: kind.tag(),
                    context,
                    index,
                    source: spec.to_string(),
                    error,
                });
            }
        }
    }
    Ok(rows)
}

fn reorder(
    mut catalog: Catalog<SledStore>,
    table: &TableName,
    positions: &str,
    kind: KindArg,
    formatter: &dyn Formatter,
) -> Result<String, CliError> {
    let positions = Positions::from_value(&serde_json::from_str::<Value>(positions)?)?;
    let kind = SourceKind::from(kind);
    catalog.update_visible_sources(table, kind, |sources| sources.reorder(&positions))?;
    catalog.store().flush()?;
    let sources = catalog.visible_sources(table, kind)?;
    Ok(formatter.format_sources(&sources))
}
