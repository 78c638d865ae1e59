//! Ownership guards for the connection and transaction of one call.
//!
//! A call closes what it opens and never closes what it borrows. Both guards
//! record at acquisition time whether the resource was borrowed, and their
//! release is a no-op in that case.

use crate::command::{Command, TransactionId};
use crate::connection::{Connection, TransactionContext};
use crate::error::{ProcError, ProcResult};
use procwire_core::ProcedureName;

/// Whether this call opened the connection.
///
/// A call that joins a caller's transaction always holds a `Borrowed` lease:
/// the transaction lives on the caller's session, so [`acquire`](Self::acquire)
/// refuses to open a fresh one for it. A `Borrowed` [`TransactionScope`] and an
/// `Owned` lease never occur together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionLease {
    /// Opened by this call; closed when the call finishes.
    Owned,
    /// Already open (for instance held by a unit of work); left open.
    Borrowed,
}

impl ConnectionLease {
    /// Take the connection for one call.
    ///
    /// `joins_transaction` is true when the call runs inside an active ambient
    /// transaction. If the connection is closed in that case the session that
    /// held the transaction is gone, and the call fails with
    /// [`ProcError::TransactionLost`] instead of running outside it.
    pub async fn acquire<C: Connection>(
        connection: &mut C,
        joins_transaction: bool,
        procedure: &ProcedureName,
    ) -> ProcResult<Self> {
        if connection.is_open() {
            return Ok(ConnectionLease::Borrowed);
        }
        if joins_transaction {
            tracing::warn!(procedure = %procedure, "Ambient transaction's connection is closed");
            return Err(ProcError::TransactionLost {
                procedure: procedure.to_string(),
            });
        }
        connection.open().await?;
        tracing::debug!(procedure = %procedure, "Connection opened");
        Ok(ConnectionLease::Owned)
    }

    pub fn is_owned(&self) -> bool {
        matches!(self, ConnectionLease::Owned)
    }

    /// Release the lease, passing the call's outcome through.
    ///
    /// A close failure after a successful call becomes the call's error. A
    /// close failure after a failed call is logged and the original error wins.
    pub async fn release<C: Connection, T>(
        self,
        connection: &mut C,
        procedure: &ProcedureName,
        outcome: ProcResult<T>,
    ) -> ProcResult<T> {
        if let ConnectionLease::Borrowed = self {
            return outcome;
        }
        match (connection.close().await, outcome) {
            (Ok(()), outcome) => {
                tracing::debug!(procedure = %procedure, "Connection closed");
                outcome
            }
            (Err(e), Ok(_)) => Err(e.into()),
            (Err(e), Err(original)) => {
                tracing::warn!(
                    procedure = %procedure,
                    error = %e,
                    "Failed to close connection after failed call"
                );
                Err(original)
            }
        }
    }
}

/// The transaction commands of one call run in.
#[derive(Clone, Copy)]
pub enum TransactionScope<'a> {
    /// No transaction; single-result calls outside a unit of work.
    Unscoped,
    /// Begun by this call; committed on success, rolled back on failure.
    Local(TransactionId),
    /// Supplied by the caller; joined but never ended.
    Borrowed(&'a dyn TransactionContext),
}

impl std::fmt::Debug for TransactionScope<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionScope::Unscoped => f.write_str("Unscoped"),
            TransactionScope::Local(id) => f.debug_tuple("Local").field(id).finish(),
            TransactionScope::Borrowed(_) => f.write_str("Borrowed"),
        }
    }
}

impl<'a> TransactionScope<'a> {
    /// Join the ambient transaction if one is active, else run unscoped.
    pub fn join(ambient: Option<&'a dyn TransactionContext>) -> Self {
        match ambient {
            Some(context) if context.has_active_transaction() => TransactionScope::Borrowed(context),
            _ => TransactionScope::Unscoped,
        }
    }

    /// Join the ambient transaction if one is active, else begin a local one.
    pub async fn require<C: Connection>(
        connection: &mut C,
        ambient: &'a dyn TransactionContext,
        procedure: &ProcedureName,
    ) -> ProcResult<Self> {
        if ambient.has_active_transaction() {
            return Ok(TransactionScope::Borrowed(ambient));
        }
        let id = connection.begin().await?;
        tracing::debug!(procedure = %procedure, transaction = %id, "Local transaction started");
        Ok(TransactionScope::Local(id))
    }

    pub fn attach(&self, command: &mut Command) {
        match self {
            TransactionScope::Unscoped => {}
            TransactionScope::Local(id) => command.attach(*id),
            TransactionScope::Borrowed(context) => context.attach(command),
        }
    }

    pub fn is_borrowed(&self) -> bool {
        matches!(self, TransactionScope::Borrowed(_))
    }

    /// End a local transaction according to the call's outcome.
    pub async fn complete<C: Connection, T>(
        self,
        connection: &mut C,
        procedure: &ProcedureName,
        outcome: ProcResult<T>,
    ) -> ProcResult<T> {
        let TransactionScope::Local(id) = self else {
            return outcome;
        };
        match outcome {
            Ok(value) => {
                connection.commit(id).await?;
                tracing::debug!(procedure = %procedure, transaction = %id, "Local transaction committed");
                Ok(value)
            }
            Err(original) => {
                match connection.rollback(id).await {
                    Ok(()) => tracing::debug!(
                        procedure = %procedure,
                        transaction = %id,
                        "Local transaction rolled back"
                    ),
                    Err(e) => tracing::warn!(
                        procedure = %procedure,
                        transaction = %id,
                        error = %e,
                        "Failed to roll back local transaction"
                    ),
                }
                Err(original)
            }
        }
    }
}
