//! Error types for procedure execution

use procwire_core::MapError;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Category of a failure reported by a [`Connection`](crate::Connection).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatabaseErrorKind {
    /// Could not obtain or open a connection.
    Connection,
    /// Statement failed on the server (syntax, constraint, missing object...).
    Query,
    /// BEGIN/COMMIT/ROLLBACK failed, or a command referenced the wrong transaction.
    Transaction,
    /// A parameter could not be encoded for the driver.
    Encode,
    /// A returned column could not be decoded into a wire value.
    Decode,
}

impl fmt::Display for DatabaseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DatabaseErrorKind::Connection => "connection",
            DatabaseErrorKind::Query => "query",
            DatabaseErrorKind::Transaction => "transaction",
            DatabaseErrorKind::Encode => "encode",
            DatabaseErrorKind::Decode => "decode",
        };
        f.write_str(label)
    }
}

/// Failure reported by the underlying connection. The driver error is kept as
/// the source so callers can inspect it unchanged.
#[derive(Debug, Error)]
#[error("{kind} failed: {message}")]
pub struct DatabaseError {
    kind: DatabaseErrorKind,
    message: String,
    sqlstate: Option<String>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl DatabaseError {
    pub fn new(kind: DatabaseErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            sqlstate: None,
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn with_sqlstate(mut self, sqlstate: impl Into<String>) -> Self {
        self.sqlstate = Some(sqlstate.into());
        self
    }

    pub fn kind(&self) -> DatabaseErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Five-character SQLSTATE code, when the server supplied one.
    pub fn sqlstate(&self) -> Option<&str> {
        self.sqlstate.as_deref()
    }
}

/// Errors surfaced by the execution engine.
#[derive(Debug, Error)]
pub enum ProcError {
    #[error("Mapping error: {0}")]
    Mapping(#[from] MapError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("A transaction is required to execute {procedure}: its result sets are server-side cursors")]
    TransactionRequired { procedure: String },

    #[error("Procedure {procedure} returned {actual} cursor names, expected {expected}")]
    CursorCountMismatch {
        procedure: String,
        expected: usize,
        actual: usize,
    },

    #[error("Procedure {procedure} returned an invalid cursor name at position {position}")]
    InvalidCursorName { procedure: String, position: usize },

    #[error("The connection holding the ambient transaction is closed; {procedure} was not run")]
    TransactionLost { procedure: String },

    #[error("Procedure {procedure} timed out after {after:?}")]
    Timeout { procedure: String, after: Duration },

    #[error("Transaction state error: {reason}")]
    TransactionState { reason: String },
}

/// Result type alias for engine operations.
pub type ProcResult<T> = Result<T, ProcError>;

/// Result type alias for connection operations.
pub type DbResult<T> = Result<T, DatabaseError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_database_error_keeps_source_and_sqlstate() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset by peer");
        let err = DatabaseError::new(DatabaseErrorKind::Query, "insert failed")
            .with_sqlstate("23505")
            .with_source(io);
        assert_eq!(err.sqlstate(), Some("23505"));
        assert_eq!(err.kind(), DatabaseErrorKind::Query);
        assert!(err.source().unwrap().to_string().contains("reset by peer"));
        assert_eq!(err.to_string(), "query failed: insert failed");
    }

    #[test]
    fn test_transaction_required_names_procedure() {
        let err = ProcError::TransactionRequired {
            procedure: "sales.get_order".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("transaction is required"));
        assert!(msg.contains("sales.get_order"));
    }

    #[test]
    fn test_map_error_converts() {
        let err = ProcError::from(MapError::MissingColumn {
            column: "name".to_string(),
        });
        assert!(matches!(err, ProcError::Mapping(_)));
    }
}
