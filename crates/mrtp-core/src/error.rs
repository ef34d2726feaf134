//! Error types for MRTP

use thiserror::Error;

/// Which kind of integrity constraint the database rejected a statement for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    Unique,
    PrimaryKey,
    ForeignKey,
    Trigger,
    NotNull,
    Check,
    Other,
}

impl ConstraintKind {
    /// Whether the failure means the record is still referenced elsewhere
    pub fn is_reference(&self) -> bool {
        matches!(self, Self::ForeignKey | Self::Trigger)
    }
}

/// Core error type for MRTP operations
#[derive(Error, Debug)]
pub enum MrtpError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(String),

    /// A statement violated a constraint.
    ///
    /// `columns` lists the `table.column` names reported by the engine, empty
    /// when the engine does not name them (foreign keys, triggers).
    #[error("Constraint violation: {message}")]
    Constraint {
        kind: ConstraintKind,
        columns: Vec<String>,
        message: String,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Other(String),
}

impl MrtpError {
    /// Constraint kind, if this is a constraint violation
    pub fn constraint_kind(&self) -> Option<ConstraintKind> {
        match self {
            Self::Constraint { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Whether this is a UNIQUE violation involving `column`.
    ///
    /// `column` may be bare (`short_name`) or qualified (`stations.short_name`).
    pub fn is_unique_violation_on(&self, column: &str) -> bool {
        match self {
            Self::Constraint {
                kind: ConstraintKind::Unique | ConstraintKind::PrimaryKey,
                columns,
                ..
            } => columns.iter().any(|c| {
                c == column || c.rsplit_once('.').is_some_and(|(_, bare)| bare == column)
            }),
            _ => false,
        }
    }

    /// Engine text without the variant prefix, used for user-facing messages
    pub fn engine_message(&self) -> String {
        match self {
            Self::Connection(msg) | Self::Query(msg) | Self::Configuration(msg) => msg.clone(),
            Self::Constraint { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Result type alias for MRTP operations
pub type Result<T> = std::result::Result<T, MrtpError>;
