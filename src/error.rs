//! Error types for the kvtable query engine

use std::collections::TryReserveError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TableError>;

#[derive(Error, Debug)]
pub enum TableError {
    // Missing catalog objects
    #[error("namespace does not exist: {0}")]
    NamespaceNotFound(String),

    #[error("table schema does not exist: {0}")]
    TableNotFound(String),

    #[error("column does not exist: {0}")]
    ColumnNotFound(String),

    #[error("{0} already exists")]
    AlreadyExists(String),

    #[error("incorrect {kind} name '{name}': {reason}")]
    InvalidName {
        kind: &'static str,
        name: String,
        reason: String,
    },

    // Parse failures
    #[error("table name must be namespace.table: {0}")]
    MalformedName(String),

    #[error("condition must be <col><op><value>: {0}")]
    MalformedCondition(String),

    #[error("invalid value for column '{column}' of type {expected}: {value}")]
    TypeMismatch {
        column: String,
        expected: &'static str,
        value: String,
    },

    // Query execution
    #[error("search cannot be done on non-indexed column: {0}")]
    NonIndexedEquality(String),

    #[error("query scan limit exceeded (max {limit} rows). Use indexed columns or add more specific conditions.")]
    ScanLimitExceeded { limit: usize },

    #[error("syntax error: {0}")]
    Syntax(String),

    #[error("out of memory: {0}")]
    OutOfMemory(String),

    // Store / configuration / persistence
    #[error("store error: {0}")]
    Store(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("snapshot error: {0}")]
    Snapshot(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TableError {
    pub(crate) fn syntax(msg: impl Into<String>) -> Self {
        TableError::Syntax(msg.into())
    }
}

impl From<bincode::Error> for TableError {
    fn from(err: bincode::Error) -> Self {
        TableError::Snapshot(err.to_string())
    }
}

impl From<TryReserveError> for TableError {
    fn from(err: TryReserveError) -> Self {
        TableError::OutOfMemory(err.to_string())
    }
}

impl From<serde_json::Error> for TableError {
    fn from(err: serde_json::Error) -> Self {
        TableError::Config(err.to_string())
    }
}
