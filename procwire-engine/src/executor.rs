//! Stored procedure execution.
//!
//! Per call: `Idle → ConnectionOpened → CommandExecuted → ResultsDecoded* →
//! ConnectionClosedOrTransactionDeferred`, ending `Completed` or `Faulted`.
//!
//! Multi-result calls use the cursor handoff protocol: the procedure returns
//! one refcursor name per declared result slot, in declaration order, and each
//! cursor is read with `FETCH ALL FROM "<cursor>"` on the same connection and
//! inside the same transaction.

use crate::command::{self, Command};
use crate::config::ExecutorConfig;
use crate::connection::{Connection, TransactionContext};
use crate::error::{ProcError, ProcResult};
use crate::scope::{ConnectionLease, TransactionScope};
use procwire_core::{
    DataRow, MapperRegistries, ProcedureName, ResultMode, ResultSet, ResultSets, SqlValue,
    StoredProcedure,
};
use std::future::Future;
use std::sync::Arc;

/// Decoded output of procedure `P`.
pub type ProcOutput<P> = <<P as StoredProcedure>::Results as ResultSet>::Output;

/// Executes stored procedure descriptors against a [`Connection`].
#[derive(Debug, Clone)]
pub struct ProcedureExecutor {
    registries: Arc<MapperRegistries>,
    config: ExecutorConfig,
}

impl ProcedureExecutor {
    pub fn new(registries: Arc<MapperRegistries>, config: ExecutorConfig) -> Self {
        Self { registries, config }
    }

    /// Executor over the process-wide registries, configured from the environment.
    pub fn global() -> Self {
        Self::new(MapperRegistries::global(), ExecutorConfig::from_env())
    }

    pub fn registries(&self) -> &MapperRegistries {
        &self.registries
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Execute `P` with `parameters`.
    ///
    /// `ambient` is the caller's transaction context. Single-result and
    /// command calls join it when it is active. Multi-result calls require it
    /// to be supplied and begin a local transaction when it is not active.
    pub async fn execute<P, C>(
        &self,
        connection: &mut C,
        ambient: Option<&dyn TransactionContext>,
        parameters: &P::Parameters,
    ) -> ProcResult<ProcOutput<P>>
    where
        P: StoredProcedure,
        C: Connection,
    {
        let procedure = P::procedure_name();
        let mode = <P::Results as ResultSet>::MODE;
        tracing::debug!(procedure = %procedure, mode = ?mode, "Executing stored procedure");

        let result = match mode {
            ResultMode::Command | ResultMode::Single => {
                self.execute_single::<P, C>(connection, ambient, parameters, &procedure)
                    .await
            }
            ResultMode::Multi(count) => {
                self.execute_multi::<P, C>(connection, ambient, parameters, &procedure, count)
                    .await
            }
        };

        if let Err(e) = &result {
            tracing::debug!(procedure = %procedure, error = %e, "Stored procedure faulted");
        }
        result
    }

    fn build_command<P: StoredProcedure>(
        &self,
        procedure: &ProcedureName,
        parameters: &P::Parameters,
    ) -> ProcResult<Command> {
        let mapper = self.registries.parameters().resolve::<P::Parameters>()?;
        let mut command = Command::stored_procedure(procedure.clone(), P::STYLE);
        command.bind(mapper.map(parameters)?);
        Ok(command)
    }

    async fn execute_single<P, C>(
        &self,
        connection: &mut C,
        ambient: Option<&dyn TransactionContext>,
        parameters: &P::Parameters,
        procedure: &ProcedureName,
    ) -> ProcResult<ProcOutput<P>>
    where
        P: StoredProcedure,
        C: Connection,
    {
        let mut command = self.build_command::<P>(procedure, parameters)?;
        let scope = TransactionScope::join(ambient);
        scope.attach(&mut command);

        let lease = ConnectionLease::acquire(connection, scope.is_borrowed(), procedure).await?;
        let outcome = self
            .bounded(procedure, self.run_single::<P, C>(connection, &command, procedure))
            .await;
        command.clear_parameters();
        lease.release(connection, procedure, outcome).await
    }

    async fn run_single<P, C>(
        &self,
        connection: &mut C,
        command: &Command,
        procedure: &ProcedureName,
    ) -> ProcResult<ProcOutput<P>>
    where
        P: StoredProcedure,
        C: Connection,
    {
        let sets = match <P::Results as ResultSet>::MODE {
            ResultMode::Command => ResultSets::Affected(connection.execute(command).await?),
            _ => ResultSets::Rows(vec![connection.query(command).await?]),
        };
        tracing::debug!(procedure = %procedure, "Command executed");

        let output = <P::Results as ResultSet>::decode(sets, &self.registries)?;
        tracing::debug!(procedure = %procedure, "Results decoded");
        Ok(output)
    }

    async fn execute_multi<P, C>(
        &self,
        connection: &mut C,
        ambient: Option<&dyn TransactionContext>,
        parameters: &P::Parameters,
        procedure: &ProcedureName,
        count: usize,
    ) -> ProcResult<ProcOutput<P>>
    where
        P: StoredProcedure,
        C: Connection,
    {
        let ambient = ambient.ok_or_else(|| ProcError::TransactionRequired {
            procedure: procedure.to_string(),
        })?;
        let mut command = self.build_command::<P>(procedure, parameters)?;

        let lease =
            ConnectionLease::acquire(connection, ambient.has_active_transaction(), procedure)
                .await?;
        let scope = match TransactionScope::require(connection, ambient, procedure).await {
            Ok(scope) => scope,
            Err(e) => return lease.release(connection, procedure, Err(e)).await,
        };
        scope.attach(&mut command);

        let outcome = self
            .bounded(
                procedure,
                self.run_multi::<P, C>(connection, &command, &scope, procedure, count),
            )
            .await;
        command.clear_parameters();
        let outcome = scope.complete(connection, procedure, outcome).await;
        lease.release(connection, procedure, outcome).await
    }

    async fn run_multi<P, C>(
        &self,
        connection: &mut C,
        command: &Command,
        scope: &TransactionScope<'_>,
        procedure: &ProcedureName,
        count: usize,
    ) -> ProcResult<ProcOutput<P>>
    where
        P: StoredProcedure,
        C: Connection,
    {
        let rows = connection.query(command).await?;
        tracing::debug!(procedure = %procedure, "Command executed");

        let cursors = cursor_names(procedure, &rows, count)?;
        let close_after_fetch = scope.is_borrowed() && self.config.close_borrowed_cursors;

        let mut sets = Vec::with_capacity(count);
        for cursor in &cursors {
            let mut fetch = command::fetch_all(cursor);
            scope.attach(&mut fetch);
            let fetched = connection.query(&fetch).await?;
            tracing::trace!(
                procedure = %procedure,
                cursor = %cursor,
                rows = fetched.len(),
                "Cursor fetched"
            );
            sets.push(fetched);

            if close_after_fetch {
                let mut close = command::close_cursor(cursor);
                scope.attach(&mut close);
                connection.execute(&close).await?;
            }
        }

        let output = <P::Results as ResultSet>::decode(ResultSets::Rows(sets), &self.registries)?;
        tracing::debug!(procedure = %procedure, result_sets = count, "Results decoded");
        Ok(output)
    }

    async fn bounded<T>(
        &self,
        procedure: &ProcedureName,
        work: impl Future<Output = ProcResult<T>>,
    ) -> ProcResult<T> {
        match self.config.command_timeout {
            Some(limit) => tokio::time::timeout(limit, work)
                .await
                .map_err(|_| ProcError::Timeout {
                    procedure: procedure.to_string(),
                    after: limit,
                })?,
            None => work.await,
        }
    }
}

/// Read the cursor names returned by a multi-result procedure.
///
/// Accepts one column over `expected` rows (`RETURNS SETOF refcursor`) or
/// one row of `expected` columns (`OUT` refcursor parameters of a `CALL`).
fn cursor_names(
    procedure: &ProcedureName,
    rows: &[DataRow],
    expected: usize,
) -> ProcResult<Vec<String>> {
    let values: Vec<Option<&SqlValue>> = match rows {
        [row] if row.len() == expected => row.values().iter().map(Some).collect(),
        _ => rows.iter().map(|row| row.value_at(0)).collect(),
    };

    if values.len() != expected {
        return Err(ProcError::CursorCountMismatch {
            procedure: procedure.to_string(),
            expected,
            actual: values.len(),
        });
    }

    values
        .into_iter()
        .enumerate()
        .map(|(position, value)| match value {
            Some(SqlValue::Text(name)) if !name.is_empty() => Ok(name.clone()),
            _ => Err(ProcError::InvalidCursorName {
                procedure: procedure.to_string(),
                position,
            }),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use procwire_core::SqlNullType;

    fn name() -> ProcedureName {
        ProcedureName::new(None, "get_order_summary")
    }

    fn cursor_row(value: SqlValue) -> DataRow {
        DataRow::from_pairs([("get_order_summary", value)])
    }

    #[test]
    fn test_cursor_names_from_column() {
        let rows = vec![
            cursor_row(SqlValue::Text("cur_a".into())),
            cursor_row(SqlValue::Text("cur_b".into())),
        ];
        assert_eq!(cursor_names(&name(), &rows, 2).unwrap(), vec!["cur_a", "cur_b"]);
    }

    #[test]
    fn test_cursor_names_from_out_parameters() {
        let rows = vec![DataRow::from_pairs([
            ("header", SqlValue::Text("<unnamed portal 1>".into())),
            ("lines", SqlValue::Text("<unnamed portal 2>".into())),
        ])];
        assert_eq!(
            cursor_names(&name(), &rows, 2).unwrap(),
            vec!["<unnamed portal 1>", "<unnamed portal 2>"]
        );
    }

    #[test]
    fn test_cursor_count_mismatch_fails_fast() {
        let rows = vec![cursor_row(SqlValue::Text("cur_a".into()))];
        let err = cursor_names(&name(), &rows, 3).unwrap_err();
        assert!(matches!(
            err,
            ProcError::CursorCountMismatch { expected: 3, actual: 1, .. }
        ));
    }

    #[test]
    fn test_null_cursor_name_is_invalid() {
        let rows = vec![
            cursor_row(SqlValue::Text("cur_a".into())),
            cursor_row(SqlValue::Null(SqlNullType::Text)),
        ];
        let err = cursor_names(&name(), &rows, 2).unwrap_err();
        assert!(matches!(err, ProcError::InvalidCursorName { position: 1, .. }));
    }
}
