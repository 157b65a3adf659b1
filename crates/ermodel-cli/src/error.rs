//! CLI error types.

use thiserror::Error;

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Model error.
    #[error(transparent)]
    Model(#[from] ermodel_core::Error),

    /// Store could not be opened.
    #[error("storage error: {0}")]
    Storage(#[from] sled::Error),

    /// File access error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON argument.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Argument that parses but makes no sense.
    #[error("{0}")]
    Usage(String),

    /// Some visible sources failed validation. `report` is the formatted
    /// validation output.
    #[error("{count} invalid source(s)")]
    Invalid { count: usize, report: String },
}
