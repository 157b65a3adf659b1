//! Core error types.

use std::fmt;
use thiserror::Error;

/// Kind of catalog element named by a failed lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// A schema.
    Schema,
    /// A table.
    Table,
    /// A column.
    Column,
    /// A key.
    Key,
    /// A foreign key.
    ForeignKey,
    /// A display context.
    Context,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementKind::Schema => write!(f, "schema"),
            ElementKind::Table => write!(f, "table"),
            ElementKind::Column => write!(f, "column"),
            ElementKind::Key => write!(f, "key"),
            ElementKind::ForeignKey => write!(f, "foreign key"),
            ElementKind::Context => write!(f, "context"),
        }
    }
}

/// A source spec that could not be normalized or validated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid source {spec} on table {table}: {reason}")]
pub struct SourceError {
    /// Qualified name of the table the spec was resolved against.
    pub table: String,
    /// The offending spec, rendered as JSON.
    pub spec: String,
    /// What went wrong.
    pub reason: String,
}

impl SourceError {
    /// Create a source error.
    pub fn new(
        table: impl fmt::Display,
        spec: impl fmt::Display,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            table: table.to_string(),
            spec: spec.to_string(),
            reason: reason.into(),
        }
    }
}

/// Core model errors.
#[derive(Debug, Error)]
pub enum Error {
    /// A named schema element does not exist.
    #[error("{kind} not found: {name}")]
    ReferenceNotFound {
        /// What kind of element was looked up.
        kind: ElementKind,
        /// The name that failed to resolve.
        name: String,
    },

    /// A source spec is malformed or points through a missing hop.
    #[error(transparent)]
    SourceSpecInvalid(#[from] SourceError),

    /// A definition duplicates an existing name or would break a composite constraint.
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    /// The requested mutation is refused in the current state.
    #[error("operation not permitted: {0}")]
    OperationNotPermitted(String),

    /// Storage layer error.
    #[error("storage error: {0}")]
    Storage(#[from] sled::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization error.
    #[error("deserialization error: {0}")]
    Deserialization(String),
}

impl Error {
    /// Shorthand for a [`Error::ReferenceNotFound`].
    pub fn not_found(kind: ElementKind, name: impl fmt::Display) -> Self {
        Error::ReferenceNotFound {
            kind,
            name: name.to_string(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = Error::not_found(ElementKind::ForeignKey, "isa:t_fk1_fkey");
        assert_eq!(err.to_string(), "foreign key not found: isa:t_fk1_fkey");
    }

    #[test]
    fn test_source_error_converts() {
        let err: Error = SourceError::new("isa:t", "\"nope\"", "no such column").into();
        assert!(matches!(err, Error::SourceSpecInvalid(_)));
        assert!(err.to_string().contains("no such column"));
    }
}
