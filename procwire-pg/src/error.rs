//! Driver error conversion.
//!
//! Driver errors keep their source and SQLSTATE so callers can match on them.

use deadpool_postgres::{CreatePoolError, PoolError};
use procwire_engine::{DatabaseError, DatabaseErrorKind};

/// Convert a driver error raised while running `context`.
pub(crate) fn query_error(kind: DatabaseErrorKind, context: &str, err: tokio_postgres::Error) -> DatabaseError {
    tracing::debug!(error = ?err, context, "Database error");

    let (kind, message) = match err.as_db_error() {
        Some(db) => (kind, format!("{}: {}", context, db.message())),
        None if err.is_closed() => (
            DatabaseErrorKind::Connection,
            format!("{}: connection closed", context),
        ),
        None => (kind, format!("{}: {}", context, err)),
    };
    let sqlstate = err.code().map(|code| code.code().to_string());

    let mut error = DatabaseError::new(kind, message);
    if let Some(sqlstate) = sqlstate {
        error = error.with_sqlstate(sqlstate);
    }
    error.with_source(err)
}

/// Convert a failure to check a client out of the pool.
pub(crate) fn pool_error(err: PoolError) -> DatabaseError {
    tracing::debug!(error = ?err, "Connection pool error");

    let message = match &err {
        PoolError::Timeout(_) => "connection pool exhausted".to_string(),
        PoolError::Closed => "connection pool is closed".to_string(),
        other => format!("failed to acquire connection: {}", other),
    };
    DatabaseError::new(DatabaseErrorKind::Connection, message).with_source(err)
}

pub(crate) fn pool_build_error(err: CreatePoolError) -> DatabaseError {
    DatabaseError::new(
        DatabaseErrorKind::Connection,
        format!("failed to create pool: {}", err),
    )
    .with_source(err)
}

pub(crate) fn closed() -> DatabaseError {
    DatabaseError::new(DatabaseErrorKind::Connection, "connection is not open")
}
