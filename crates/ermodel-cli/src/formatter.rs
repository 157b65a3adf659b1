//! Output formatters for command results.

use clap::ValueEnum;
use comfy_table::{Cell, Table};
use ermodel_core::source::ContextValue;
use ermodel_core::{Context, SourceSpec, VisibleSources};
use serde_json::{json, Value};

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// ASCII table format
    Table,
    /// JSON format
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// One checked source.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationRow {
    pub tag: &'static str,
    pub context: Context,
    pub index: usize,
    pub source: String,
    pub error: Option<String>,
}

/// Trait for formatting output.
pub trait Formatter {
    /// Format the visible sources of a table.
    fn format_sources(&self, sources: &VisibleSources<'_>) -> String;

    /// Format a single normalized spec.
    fn format_spec(&self, spec: &SourceSpec) -> String;

    /// Format validation results.
    fn format_validation(&self, rows: &[ValidationRow]) -> String;

    /// Format the stored versions.
    fn format_versions(&self, versions: &[u64], current: u64) -> String;

    /// Format a simple message.
    fn format_message(&self, message: &str) -> String;
}

/// Create a formatter for the given output format.
pub fn create_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Table => Box::new(TableFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
    }
}

/// Table formatter using comfy-table.
pub struct TableFormatter;

impl Formatter for TableFormatter {
    fn format_sources(&self, sources: &VisibleSources<'_>) -> String {
        if sources.is_empty() {
            return format!("No {} annotation", sources.kind().tag());
        }
        let resolver = sources.resolver();
        let mut table = Table::new();
        table.set_header(vec!["Context", "#", "Column", "Source"]);

        for context in sources.contexts() {
            match sources.get(context) {
                Some(ContextValue::Alias(target)) => {
                    table.add_row(vec![
                        Cell::new(context),
                        Cell::new(""),
                        Cell::new(""),
                        Cell::new(format!("same as {target}")),
                    ]);
                }
                Some(value) => {
                    for (i, spec) in value.specs().unwrap_or_default().iter().enumerate() {
                        table.add_row(vec![
                            Cell::new(context),
                            Cell::new(i + 1),
                            Cell::new(resolver.column_name(spec)),
                            Cell::new(spec),
                        ]);
                    }
                }
                None => {}
            }
        }
        table.to_string()
    }

    fn format_spec(&self, spec: &SourceSpec) -> String {
        spec.to_string()
    }

    fn format_validation(&self, rows: &[ValidationRow]) -> String {
        if rows.is_empty() {
            return "No visible sources".to_string();
        }
        let mut table = Table::new();
        table.set_header(vec!["Annotation", "Context", "#", "Source", "Status"]);
        for row in rows {
            table.add_row(vec![
                Cell::new(row.tag),
                Cell::new(row.context),
                Cell::new(row.index + 1),
                Cell::new(&row.source),
                Cell::new(row.error.as_deref().unwrap_or("ok")),
            ]);
        }
        table.to_string()
    }

    fn format_versions(&self, versions: &[u64], current: u64) -> String {
        if versions.is_empty() {
            return "No versions".to_string();
        }
        let mut table = Table::new();
        table.set_header(vec!["Version", ""]);
        for version in versions {
            let marker = if *version == current { "current" } else { "" };
            table.add_row(vec![Cell::new(version), Cell::new(marker)]);
        }
        table.to_string()
    }

    fn format_message(&self, message: &str) -> String {
        message.to_string()
    }
}

/// JSON formatter.
pub struct JsonFormatter;

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string())
}

impl Formatter for JsonFormatter {
    fn format_sources(&self, sources: &VisibleSources<'_>) -> String {
        pretty(&sources.to_annotation())
    }

    fn format_spec(&self, spec: &SourceSpec) -> String {
        pretty(&spec.to_value())
    }

    fn format_validation(&self, rows: &[ValidationRow]) -> String {
        let rows: Vec<Value> = rows
            .iter()
            .map(|row| {
                json!({
                    "annotation": row.tag,
                    "context": row.context.as_str(),
                    "index": row.index,
                    "source": row.source,
                    "error": row.error,
                })
            })
            .collect();
        pretty(&Value::Array(rows))
    }

    fn format_versions(&self, versions: &[u64], current: u64) -> String {
        pretty(&json!({"current": current, "versions": versions}))
    }

    fn format_message(&self, message: &str) -> String {
        json!({"message": message}).to_string()
    }
}
