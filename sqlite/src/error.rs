//! Error types for the SQLite store

use quire_core::QueryError;
use rusqlite::ErrorCode;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SqliteError {
    /// The database file could not be opened
    #[error("failed to open database {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// A connection PRAGMA failed
    #[error("failed to apply `{pragma}`: {source}")]
    Pragma {
        pragma: String,
        #[source]
        source: rusqlite::Error,
    },

    /// Error reported by rusqlite
    #[error(transparent)]
    Rusqlite(#[from] rusqlite::Error),
}

impl SqliteError {
    /// Whether SQLite stopped the statement because it was interrupted.
    pub fn is_interrupted(&self) -> bool {
        let source = match self {
            SqliteError::Open { source, .. } | SqliteError::Pragma { source, .. } => source,
            SqliteError::Rusqlite(source) => source,
        };
        matches!(
            source.sqlite_error_code(),
            Some(ErrorCode::OperationInterrupted)
        )
    }
}

impl From<SqliteError> for QueryError {
    fn from(err: SqliteError) -> Self {
        if err.is_interrupted() {
            QueryError::Cancelled
        } else {
            QueryError::store(err)
        }
    }
}
