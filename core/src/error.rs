use thiserror::Error;

/// Boxed driver error carried by [`QueryError::Store`].
pub type StoreError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum QueryError {
    /// Malformed query-string syntax
    #[error("invalid parameter `{parameter}`: {message}")]
    Parse { parameter: String, message: String },

    /// A table or column name failed the identifier validator
    #[error("invalid identifier `{0}`")]
    InvalidIdentifier(String),

    /// Request body is not usable for the operation
    #[error("invalid request body: {0}")]
    InvalidBody(String),

    /// A referenced row does not exist
    #[error("foreign key constraint failed: {table}.{column} references non-existent {referenced}.id")]
    ForeignKeyViolation {
        table: String,
        column: String,
        referenced: String,
    },

    /// UPDATE or DELETE without filters while the full-table guard is on
    #[error(
        "refusing to modify every row of `{table}` without filters; pass confirmFullTableMutation=true"
    )]
    FullTableMutation { table: String },

    /// No remote procedure registered under this name
    #[error("unknown RPC function: {0}")]
    UnknownRpc(String),

    /// The request was cancelled before or while the statement ran
    #[error("query cancelled")]
    Cancelled,

    /// No connection became available within the acquire timeout
    #[error("timed out waiting for a database connection")]
    PoolTimeout,

    /// The pool was closed
    #[error("connection pool is closed")]
    PoolClosed,

    /// Error reported by the backing store
    #[error("store error: {0}")]
    Store(#[source] StoreError),
}

impl QueryError {
    pub fn parse(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    pub fn store(err: impl Into<StoreError>) -> Self {
        Self::Store(err.into())
    }

    /// HTTP status code this error maps to on the wire.
    pub const fn status(&self) -> u16 {
        match self {
            Self::Parse { .. }
            | Self::InvalidIdentifier(_)
            | Self::InvalidBody(_)
            | Self::ForeignKeyViolation { .. }
            | Self::FullTableMutation { .. } => 400,
            Self::UnknownRpc(_) => 404,
            Self::Cancelled => 408,
            Self::PoolTimeout | Self::PoolClosed => 503,
            Self::Store(_) => 500,
        }
    }

    /// Short machine-readable code used in error bodies.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Parse { .. } => "parse_error",
            Self::InvalidIdentifier(_) => "invalid_identifier",
            Self::InvalidBody(_) => "invalid_body",
            Self::ForeignKeyViolation { .. } => "foreign_key_violation",
            Self::FullTableMutation { .. } => "full_table_mutation",
            Self::UnknownRpc(_) => "unknown_rpc",
            Self::Cancelled => "cancelled",
            Self::PoolTimeout | Self::PoolClosed => "unavailable",
            Self::Store(_) => "internal_error",
        }
    }

    /// Message safe to return to a caller. Store errors are reduced to a
    /// generic message; their detail belongs in the logs.
    pub fn public_message(&self) -> String {
        match self {
            Self::Store(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }

    /// Whether the error was raised by the store rather than by validation.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Store(_))
    }
}

/// Result type for query operations
pub type Result<T> = std::result::Result<T, QueryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_hide_driver_text() {
        let err = QueryError::store("no such table: secrets");
        assert_eq!(err.status(), 500);
        assert_eq!(err.public_message(), "Internal server error");
        assert!(err.to_string().contains("no such table"));
    }

    #[test]
    fn foreign_key_message_names_column() {
        let err = QueryError::ForeignKeyViolation {
            table: "help_requests".into(),
            column: "user_id".into(),
            referenced: "users".into(),
        };
        assert_eq!(err.status(), 400);
        assert!(err.public_message().contains("help_requests.user_id"));
    }
}
