//! Collaborator contracts consumed by the engine.

use crate::command::{Command, TransactionId};
use crate::error::DbResult;
use async_trait::async_trait;
use procwire_core::DataRow;

/// A database connection able to run stored procedure commands.
///
/// Implementations own the driver session. Every async method is a
/// suspension point; dropping the future cancels the operation.
#[async_trait]
pub trait Connection: Send {
    fn is_open(&self) -> bool;

    async fn open(&mut self) -> DbResult<()>;

    async fn close(&mut self) -> DbResult<()>;

    /// Start a transaction on this connection.
    async fn begin(&mut self) -> DbResult<TransactionId>;

    async fn commit(&mut self, transaction: TransactionId) -> DbResult<()>;

    async fn rollback(&mut self, transaction: TransactionId) -> DbResult<()>;

    /// Run a command and return its rows.
    async fn query(&mut self, command: &Command) -> DbResult<Vec<DataRow>>;

    /// Run a command and return the affected row count.
    async fn execute(&mut self, command: &Command) -> DbResult<u64>;
}

/// Ambient transaction supplied by a caller (the unit of work).
///
/// The engine joins an active ambient transaction but never ends it.
pub trait TransactionContext: Send + Sync {
    fn has_active_transaction(&self) -> bool;

    /// Attach the active transaction to `command`.
    fn attach(&self, command: &mut Command);
}
