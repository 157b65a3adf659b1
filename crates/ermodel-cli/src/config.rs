//! Command-line arguments and the configuration derived from them.

use crate::formatter::OutputFormat;
use clap::{Parser, Subcommand, ValueEnum};
use ermodel_core::{ModelConfig, SourceKind};
use std::path::PathBuf;

/// Default store directory.
pub const DEFAULT_STORE_PATH: &str = "./ermodel-data";

/// Which visible-source annotation a command works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Columns,
    ForeignKeys,
}

impl From<KindArg> for SourceKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Columns => SourceKind::Columns,
            KindArg::ForeignKeys => SourceKind::ForeignKeys,
        }
    }
}

/// ermodel command-line interface
#[derive(Parser, Debug)]
#[command(name = "ermodel")]
#[command(version, about = "Inspect and edit catalog schema annotations", long_about = None)]
pub struct Args {
    /// Path to the model store directory.
    #[arg(short, long, default_value = DEFAULT_STORE_PATH)]
    pub store: PathBuf,

    /// Output format
    #[arg(long, default_value = "table", value_enum)]
    pub format: OutputFormat,

    /// Terminal column of synthesized relationship paths.
    #[arg(long)]
    pub key_column: Option<String>,

    /// Asset-annotation field naming a companion column (repeatable).
    /// Replaces the default roles when given.
    #[arg(long = "asset-role")]
    pub asset_roles: Vec<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Replace the stored model with a catalog JSON document.
    Import {
        file: PathBuf,
    },
    /// Print the stored model as catalog JSON.
    Export {
        /// Export an earlier version instead of the current one.
        #[arg(long)]
        version: Option<u64>,
    },
    /// Print the canonical form of a source spec.
    Normalize {
        schema: String,
        table: String,
        /// A column or constraint name, a `["schema", "name"]` pair, or a
        /// `{"source": ...}` object.
        source: String,
    },
    /// Check every visible source of a table against the model.
    Validate {
        schema: String,
        table: String,
        #[arg(long, value_enum)]
        kind: Option<KindArg>,
    },
    /// Show the visible sources of a table.
    Show {
        schema: String,
        table: String,
        #[arg(long, value_enum, default_value = "columns")]
        kind: KindArg,
    },
    /// Move visible sources after an anchor, e.g. `{"title": ["summary"]}`.
    Reorder {
        schema: String,
        table: String,
        positions: String,
        #[arg(long, value_enum, default_value = "columns")]
        kind: KindArg,
    },
    /// List stored model versions.
    Versions,
}

/// Resolved CLI configuration.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub store_path: PathBuf,
    pub format: OutputFormat,
    pub model: ModelConfig,
}

impl Args {
    /// Split the arguments into the configuration and the command to run.
    pub fn into_config(self) -> (CliConfig, Command) {
        let mut model = ModelConfig::new();
        if let Some(column) = self.key_column {
            model = model.with_key_column(column);
        }
        if !self.asset_roles.is_empty() {
            model = model.with_asset_roles(self.asset_roles);
        }
        let config = CliConfig {
            store_path: self.store,
            format: self.format,
            model,
        };
        (config, self.command)
    }
}
