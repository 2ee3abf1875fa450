//! Error types for the CLI

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] quire::ConfigError),

    #[error("Database error at {path}: {source}")]
    Store {
        path: String,
        #[source]
        source: quire::sqlite::SqliteError,
    },

    #[error("Query error: {0}")]
    Query(#[from] quire::QueryError),

    #[error("--body is not valid JSON: {0}")]
    Body(#[source] serde_json::Error),

    /// The request ran but was answered with an error status.
    #[error("request failed with status {0}")]
    Status(u16),
}
