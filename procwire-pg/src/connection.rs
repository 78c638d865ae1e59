//! PostgreSQL [`Connection`] over a deadpool client.

use crate::config::DbConfig;
use crate::error::{closed, pool_error, query_error};
use crate::param::PgParam;
use crate::row::convert_rows;
use crate::sql::render_call;
use async_trait::async_trait;
use deadpool_postgres::{Object, Pool};
use postgres_types::ToSql;
use procwire_core::DataRow;
use procwire_engine::{
    Command, CommandKind, Connection, DatabaseError, DatabaseErrorKind, DbResult, TransactionId,
};

/// A connection checked out of a pool on `open` and returned on `close`.
///
/// Transactions are plain `BEGIN`/`COMMIT`/`ROLLBACK` statements on the held
/// client, so the connection can outlive any one call and be shared by a
/// unit of work.
pub struct PgConnection {
    pool: Pool,
    client: Option<Object>,
    transaction: Option<TransactionId>,
    next_transaction: u64,
}

impl PgConnection {
    pub fn new(pool: Pool) -> Self {
        Self {
            pool,
            client: None,
            transaction: None,
            next_transaction: 0,
        }
    }

    /// Build a pool from `config` and wrap it.
    pub fn from_config(config: &DbConfig) -> DbResult<Self> {
        Ok(Self::new(config.create_pool()?))
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    pub fn current_transaction(&self) -> Option<TransactionId> {
        self.transaction
    }

    fn client(&self) -> DbResult<&Object> {
        self.client.as_ref().ok_or_else(closed)
    }

    fn check_transaction(&self, attached: Option<TransactionId>) -> DbResult<()> {
        match attached {
            Some(id) if self.transaction != Some(id) => Err(DatabaseError::new(
                DatabaseErrorKind::Transaction,
                format!("command is attached to {}, which is not active on this connection", id),
            )),
            _ => Ok(()),
        }
    }

    fn statement(command: &Command) -> String {
        match command.kind() {
            CommandKind::StoredProcedure { name, style } => {
                render_call(name, *style, command.parameters())
            }
            CommandKind::Text(sql) => sql.clone(),
        }
    }

    async fn run_batch(&self, sql: &str) -> DbResult<()> {
        self.client()?
            .batch_execute(sql)
            .await
            .map_err(|e| query_error(DatabaseErrorKind::Transaction, sql, e))
    }
}

fn bind(command: &Command) -> Vec<PgParam<'_>> {
    command
        .parameters()
        .iter()
        .map(|parameter| PgParam(&parameter.value))
        .collect()
}

#[async_trait]
impl Connection for PgConnection {
    fn is_open(&self) -> bool {
        self.client.as_ref().is_some_and(|client| !client.is_closed())
    }

    async fn open(&mut self) -> DbResult<()> {
        if self.is_open() {
            return Ok(());
        }
        // The transaction died with its session. A fresh client would run
        // later commands outside it.
        if let Some(id) = self.transaction {
            return Err(DatabaseError::new(
                DatabaseErrorKind::Transaction,
                format!("{} was lost with its session; close the connection before reopening", id),
            ));
        }
        let client = self.pool.get().await.map_err(pool_error)?;
        self.client = Some(client);
        Ok(())
    }

    async fn close(&mut self) -> DbResult<()> {
        if let Some(id) = self.transaction.take() {
            tracing::warn!(transaction = %id, "Closing connection with an open transaction; rolling back");
            let rollback = match &self.client {
                Some(client) => client.batch_execute("ROLLBACK").await,
                None => Ok(()),
            };
            if let Err(e) = rollback {
                // Detach so the session is not recycled into the pool.
                let _ = self.client.take().map(Object::take);
                return Err(query_error(DatabaseErrorKind::Transaction, "ROLLBACK", e));
            }
        }
        self.client = None;
        Ok(())
    }

    async fn begin(&mut self) -> DbResult<TransactionId> {
        if let Some(active) = self.transaction {
            return Err(DatabaseError::new(
                DatabaseErrorKind::Transaction,
                format!("{} is already active on this connection", active),
            ));
        }
        self.run_batch("BEGIN").await?;
        self.next_transaction += 1;
        let id = TransactionId(self.next_transaction);
        self.transaction = Some(id);
        Ok(id)
    }

    async fn commit(&mut self, transaction: TransactionId) -> DbResult<()> {
        self.check_transaction(Some(transaction))?;
        self.transaction = None;
        self.run_batch("COMMIT").await
    }

    async fn rollback(&mut self, transaction: TransactionId) -> DbResult<()> {
        self.check_transaction(Some(transaction))?;
        self.transaction = None;
        self.run_batch("ROLLBACK").await
    }

    async fn query(&mut self, command: &Command) -> DbResult<Vec<DataRow>> {
        self.check_transaction(command.transaction())?;
        let sql = Self::statement(command);
        let params = bind(command);
        let refs: Vec<&(dyn ToSql + Sync)> =
            params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();

        tracing::trace!(sql = %sql, parameters = refs.len(), "Running query");
        let rows = self
            .client()?
            .query(sql.as_str(), &refs)
            .await
            .map_err(|e| query_error(DatabaseErrorKind::Query, &sql, e))?;
        convert_rows(&rows)
    }

    async fn execute(&mut self, command: &Command) -> DbResult<u64> {
        self.check_transaction(command.transaction())?;
        let sql = Self::statement(command);
        let params = bind(command);
        let refs: Vec<&(dyn ToSql + Sync)> =
            params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();

        tracing::trace!(sql = %sql, parameters = refs.len(), "Executing statement");
        self.client()?
            .execute(sql.as_str(), &refs)
            .await
            .map_err(|e| query_error(DatabaseErrorKind::Query, &sql, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unconnected() -> PgConnection {
        // Building the pool does not connect; nothing listens on this port.
        let config = DbConfig {
            port: 1,
            ..DbConfig::default()
        };
        PgConnection::from_config(&config).unwrap()
    }

    #[tokio::test]
    async fn test_open_refuses_while_a_transaction_is_recorded() {
        let mut connection = unconnected();
        connection.transaction = Some(TransactionId(4));

        let err = connection.open().await.unwrap_err();
        assert_eq!(err.kind(), DatabaseErrorKind::Transaction);
        assert!(err.message().contains("tx-4"));
        assert!(connection.client.is_none());
        assert_eq!(connection.current_transaction(), Some(TransactionId(4)));
    }

    #[tokio::test]
    async fn test_close_clears_a_lost_transaction() {
        let mut connection = unconnected();
        connection.transaction = Some(TransactionId(4));

        connection.close().await.unwrap();
        assert_eq!(connection.current_transaction(), None);
        assert!(!connection.is_open());
    }

    #[test]
    fn test_command_for_another_transaction_is_rejected() {
        let mut connection = unconnected();
        connection.transaction = Some(TransactionId(2));

        assert!(connection.check_transaction(Some(TransactionId(2))).is_ok());
        assert!(connection.check_transaction(None).is_ok());
        let err = connection.check_transaction(Some(TransactionId(1))).unwrap_err();
        assert_eq!(err.kind(), DatabaseErrorKind::Transaction);
    }
}
