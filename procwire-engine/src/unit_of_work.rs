//! Unit of work: a connection plus an ambient transaction spanning several calls.

use crate::command::{Command, TransactionId};
use crate::connection::{Connection, TransactionContext};
use crate::error::{ProcError, ProcResult};
use crate::executor::{ProcOutput, ProcedureExecutor};
use procwire_core::StoredProcedure;

/// The ambient transaction of a [`UnitOfWork`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AmbientTransaction {
    active: Option<TransactionId>,
}

impl AmbientTransaction {
    pub fn id(&self) -> Option<TransactionId> {
        self.active
    }
}

impl TransactionContext for AmbientTransaction {
    fn has_active_transaction(&self) -> bool {
        self.active.is_some()
    }

    fn attach(&self, command: &mut Command) {
        if let Some(id) = self.active {
            command.attach(id);
        }
    }
}

/// Owns a connection and, between [`begin`](Self::begin) and
/// [`commit`](Self::commit)/[`rollback`](Self::rollback), a transaction that
/// every [`call`](Self::call) joins.
///
/// Calls made through the unit of work never close its connection or end its
/// transaction.
pub struct UnitOfWork<C: Connection> {
    connection: C,
    transaction: AmbientTransaction,
    opened_connection: bool,
}

impl<C: Connection> UnitOfWork<C> {
    pub fn new(connection: C) -> Self {
        Self {
            connection,
            transaction: AmbientTransaction::default(),
            opened_connection: false,
        }
    }

    pub fn has_active_transaction(&self) -> bool {
        self.transaction.has_active_transaction()
    }

    pub fn transaction(&self) -> &AmbientTransaction {
        &self.transaction
    }

    /// Begin the ambient transaction, opening the connection if needed.
    pub async fn begin(&mut self) -> ProcResult<TransactionId> {
        if let Some(id) = self.transaction.active {
            return Err(ProcError::TransactionState {
                reason: format!("transaction {} is already active", id),
            });
        }
        if !self.connection.is_open() {
            self.connection.open().await?;
            self.opened_connection = true;
        }
        let id = self.connection.begin().await?;
        self.transaction.active = Some(id);
        tracing::debug!(transaction = %id, "Unit of work started");
        Ok(id)
    }

    pub async fn commit(&mut self) -> ProcResult<()> {
        let id = self.take_active("commit")?;
        let result = self.connection.commit(id).await;
        tracing::debug!(transaction = %id, ok = result.is_ok(), "Unit of work committed");
        self.finish(result.map_err(ProcError::from)).await
    }

    pub async fn rollback(&mut self) -> ProcResult<()> {
        let id = self.take_active("roll back")?;
        let result = self.connection.rollback(id).await;
        tracing::debug!(transaction = %id, ok = result.is_ok(), "Unit of work rolled back");
        self.finish(result.map_err(ProcError::from)).await
    }

    /// Execute `P` inside this unit of work.
    pub async fn call<P: StoredProcedure>(
        &mut self,
        executor: &ProcedureExecutor,
        parameters: &P::Parameters,
    ) -> ProcResult<ProcOutput<P>> {
        let ambient: &dyn TransactionContext = &self.transaction;
        executor
            .execute::<P, C>(&mut self.connection, Some(ambient), parameters)
            .await
    }

    pub fn connection(&self) -> &C {
        &self.connection
    }

    pub fn connection_mut(&mut self) -> &mut C {
        &mut self.connection
    }

    pub fn into_inner(self) -> C {
        self.connection
    }

    fn take_active(&mut self, action: &str) -> ProcResult<TransactionId> {
        self.transaction
            .active
            .take()
            .ok_or_else(|| ProcError::TransactionState {
                reason: format!("no active transaction to {}", action),
            })
    }

    async fn finish(&mut self, outcome: ProcResult<()>) -> ProcResult<()> {
        if !std::mem::take(&mut self.opened_connection) {
            return outcome;
        }
        match (self.connection.close().await, outcome) {
            (Ok(()), outcome) => outcome,
            (Err(e), Ok(())) => Err(e.into()),
            (Err(e), Err(original)) => {
                tracing::warn!(error = %e, "Failed to close unit of work connection");
                Err(original)
            }
        }
    }
}
