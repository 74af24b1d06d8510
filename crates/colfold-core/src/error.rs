//! Typed errors for the enrichment engine.

use std::time::Duration;

use thiserror::Error;

/// Errors raised by the query-execution collaborator.
///
/// The engine never constructs these itself and never wraps them: whatever
/// the executor (or a caller-supplied list method) returns is handed back to
/// the caller of `enrich` as-is.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// Failed to reach the data source.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The data source rejected or failed the statement.
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// The statement did not complete within the executor's time limit.
    #[error("query timed out after {0:?}")]
    Timeout(Duration),

    /// A caller-supplied list method failed.
    #[error("list method failed: {0}")]
    ListMethodFailed(String),
}

/// A column configuration that lacks something the engine needs.
///
/// Returned by validation only. The engine logs these and skips the
/// configuration rather than failing the whole call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("column configuration has no parent column")]
    MissingParentColumn,

    #[error("column configuration for '{0}' has no target column name")]
    MissingColumnName(String),

    #[error("column '{0}' has neither a query nor a list method")]
    MissingQuery(String),

    #[error("column '{0}' has neither a display column nor an info parser")]
    MissingDisplay(String),

    #[error("unknown column configuration: {0}")]
    UnknownColumn(String),

    #[error("invalid column configuration: {0}")]
    Invalid(String),
}
