//! procwire Test Utilities
//!
//! Shared test infrastructure for the procwire workspace:
//! - A scripted in-memory [`Connection`] that records every command it sees
//! - Fixture records and descriptors, with mappers generated by `procwire-gen`
//! - Proptest generators for cursor names and fixture records

pub use procwire_core::{
    DataRow, FromRows, MapError, MapResult, MapperRegistries, Parameter, ParameterMapper,
    ResultMapper, SqlNullType, SqlValue, StoredProcedure, TableColumn, TableValue, ToSqlValue,
};
pub use procwire_engine::{
    Command, CommandKind, Connection, DatabaseError, DatabaseErrorKind, DbResult,
    ExecutorConfig, ProcError, ProcedureExecutor, TransactionId, UnitOfWork,
};

use async_trait::async_trait;
use std::collections::VecDeque;
use std::time::Duration;

// ============================================================================
// FAKE CONNECTION
// ============================================================================

/// One scripted reply, consumed by the next `query` or `execute`.
#[derive(Debug, Clone)]
pub enum Scripted {
    Rows(Vec<DataRow>),
    Affected(u64),
    Fail(DatabaseErrorKind, String),
}

/// Everything the fake connection was asked to do, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Open,
    Close,
    Begin(TransactionId),
    Commit(TransactionId),
    Rollback(TransactionId),
    Query(Command),
    Execute(Command),
}

/// In-memory connection driven by a script of replies.
///
/// `CLOSE <cursor>` commands succeed without consuming a scripted reply so
/// tests can script only the data they care about. When the script runs dry,
/// queries return no rows and executes report zero affected rows.
#[derive(Debug, Default)]
pub struct FakeConnection {
    open: bool,
    replies: VecDeque<Scripted>,
    events: Vec<Event>,
    next_transaction: u64,
    active: Option<TransactionId>,
    fail_commit: bool,
    delay: Option<Duration>,
}

impl FakeConnection {
    pub fn new() -> Self {
        Self::default()
    }

    /// A connection that is already open, as a unit of work would hold it.
    pub fn opened() -> Self {
        Self {
            open: true,
            ..Self::default()
        }
    }

    pub fn reply_rows(mut self, rows: Vec<DataRow>) -> Self {
        self.replies.push_back(Scripted::Rows(rows));
        self
    }

    pub fn reply_affected(mut self, count: u64) -> Self {
        self.replies.push_back(Scripted::Affected(count));
        self
    }

    pub fn reply_failure(mut self, kind: DatabaseErrorKind, message: impl Into<String>) -> Self {
        self.replies.push_back(Scripted::Fail(kind, message.into()));
        self
    }

    pub fn failing_commit(mut self) -> Self {
        self.fail_commit = true;
        self
    }

    /// Sleep before answering every query or execute.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Drop the session as a server-side termination would: the connection
    /// reports closed while its transaction is still recorded as active.
    pub fn lose_session(&mut self) {
        self.open = false;
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Commands issued through `query` or `execute`, in order.
    pub fn commands(&self) -> Vec<&Command> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::Query(command) | Event::Execute(command) => Some(command),
                _ => None,
            })
            .collect()
    }

    /// Statement text of every text command, in order.
    pub fn statements(&self) -> Vec<&str> {
        self.commands()
            .into_iter()
            .filter_map(|command| match command.kind() {
                CommandKind::Text(sql) => Some(sql.as_str()),
                CommandKind::StoredProcedure { .. } => None,
            })
            .collect()
    }

    pub fn count(&self, matches: impl Fn(&Event) -> bool) -> usize {
        self.events.iter().filter(|event| matches(event)).count()
    }

    pub fn active_transaction(&self) -> Option<TransactionId> {
        self.active
    }

    pub fn remaining_replies(&self) -> usize {
        self.replies.len()
    }

    fn ensure_open(&self) -> DbResult<()> {
        if self.open {
            Ok(())
        } else {
            Err(DatabaseError::new(DatabaseErrorKind::Connection, "connection is closed"))
        }
    }

    fn end_transaction(&mut self, transaction: TransactionId) -> DbResult<()> {
        self.ensure_open()?;
        if self.active != Some(transaction) {
            return Err(DatabaseError::new(
                DatabaseErrorKind::Transaction,
                format!("{} is not the active transaction", transaction),
            ));
        }
        self.active = None;
        Ok(())
    }

    async fn next_reply(&mut self) -> Option<Scripted> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.replies.pop_front()
    }
}

fn is_cursor_close(command: &Command) -> bool {
    matches!(command.kind(), CommandKind::Text(sql) if sql.starts_with("CLOSE "))
}

#[async_trait]
impl Connection for FakeConnection {
    fn is_open(&self) -> bool {
        self.open
    }

    async fn open(&mut self) -> DbResult<()> {
        if let Some(active) = self.active {
            return Err(DatabaseError::new(
                DatabaseErrorKind::Transaction,
                format!("{} was lost with its session; close before reopening", active),
            ));
        }
        self.open = true;
        self.events.push(Event::Open);
        Ok(())
    }

    async fn close(&mut self) -> DbResult<()> {
        self.open = false;
        self.active = None;
        self.events.push(Event::Close);
        Ok(())
    }

    async fn begin(&mut self) -> DbResult<TransactionId> {
        self.ensure_open()?;
        if let Some(active) = self.active {
            return Err(DatabaseError::new(
                DatabaseErrorKind::Transaction,
                format!("{} is already active", active),
            ));
        }
        self.next_transaction += 1;
        let id = TransactionId(self.next_transaction);
        self.active = Some(id);
        self.events.push(Event::Begin(id));
        Ok(id)
    }

    async fn commit(&mut self, transaction: TransactionId) -> DbResult<()> {
        if self.fail_commit {
            return Err(DatabaseError::new(
                DatabaseErrorKind::Transaction,
                "could not serialize access due to concurrent update",
            )
            .with_sqlstate("40001"));
        }
        self.end_transaction(transaction)?;
        self.events.push(Event::Commit(transaction));
        Ok(())
    }

    async fn rollback(&mut self, transaction: TransactionId) -> DbResult<()> {
        self.end_transaction(transaction)?;
        self.events.push(Event::Rollback(transaction));
        Ok(())
    }

    async fn query(&mut self, command: &Command) -> DbResult<Vec<DataRow>> {
        self.ensure_open()?;
        self.events.push(Event::Query(command.clone()));
        match self.next_reply().await {
            Some(Scripted::Rows(rows)) => Ok(rows),
            Some(Scripted::Affected(_)) | None => Ok(Vec::new()),
            Some(Scripted::Fail(kind, message)) => Err(DatabaseError::new(kind, message)),
        }
    }

    async fn execute(&mut self, command: &Command) -> DbResult<u64> {
        self.ensure_open()?;
        self.events.push(Event::Execute(command.clone()));
        if is_cursor_close(command) {
            return Ok(0);
        }
        match self.next_reply().await {
            Some(Scripted::Affected(count)) => Ok(count),
            Some(Scripted::Rows(rows)) => Ok(rows.len() as u64),
            None => Ok(0),
            Some(Scripted::Fail(kind, message)) => Err(DatabaseError::new(kind, message)),
        }
    }
}

/// Rows holding one cursor name each, as `RETURNS SETOF refcursor` yields them.
pub fn cursor_rows(names: &[&str]) -> Vec<DataRow> {
    names
        .iter()
        .map(|name| DataRow::from_pairs([("cursor", SqlValue::Text((*name).to_string()))]))
        .collect()
}

pub mod fixtures;
pub mod mappers;

// ============================================================================
// GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest generators.

    use super::fixtures::{ColumnSample, OrderHeaderView, OrderLine, ReplaceLinesParameters};
    use chrono::DateTime;
    use proptest::prelude::*;
    use rust_decimal::Decimal;
    use serde_json::{json, Value};
    use uuid::Uuid;

    /// Cursor names as PostgreSQL hands them out or as procedures name them.
    pub fn arb_cursor_name() -> impl Strategy<Value = String> {
        prop_oneof![
            "[a-z][a-z0-9_]{0,15}",
            (1u32..10_000).prop_map(|n| format!("<unnamed portal {}>", n)),
        ]
    }

    /// `count` distinct cursor names.
    pub fn arb_cursor_names(count: usize) -> impl Strategy<Value = Vec<String>> {
        prop::collection::hash_set(arb_cursor_name(), count)
            .prop_map(|names| names.into_iter().collect())
    }

    pub fn arb_order_header() -> impl Strategy<Value = OrderHeaderView> {
        "[A-Za-z0-9 ]{0,32}".prop_map(|name| OrderHeaderView { name })
    }

    pub fn arb_order_line() -> impl Strategy<Value = OrderLine> {
        ("[A-Z]{3}-[0-9]{4}", 1i32..1000).prop_map(|(sku, quantity)| OrderLine { sku, quantity })
    }

    pub fn arb_replace_lines() -> impl Strategy<Value = ReplaceLinesParameters> {
        (any::<i32>(), prop::collection::vec(arb_order_line(), 0..8))
            .prop_map(|(order_id, lines)| ReplaceLinesParameters { order_id, lines })
    }

    /// Small JSON documents: scalars and flat objects.
    pub fn arb_json_document() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::from),
            any::<i64>().prop_map(Value::from),
            "[a-z ]{0,12}".prop_map(Value::from),
            prop::collection::btree_map("[a-z]{1,6}", any::<i32>(), 0..4).prop_map(|map| json!(map)),
        ]
    }

    /// Samples whose float and temporal fields survive an exact round trip.
    pub fn arb_column_sample() -> impl Strategy<Value = ColumnSample> {
        let numbers = (
            any::<bool>(),
            any::<i16>(),
            any::<i32>(),
            any::<i64>(),
            -1.0e6f32..1.0e6f32,
            -1.0e12f64..1.0e12f64,
            (any::<i64>(), 0u32..10).prop_map(|(mantissa, scale)| Decimal::new(mantissa, scale)),
            any::<char>(),
        );
        let rest = (
            ".{0,24}",
            prop::collection::vec(any::<u8>(), 0..32),
            any::<u128>().prop_map(Uuid::from_u128),
            (0i64..3_000_000).prop_map(|hours| DateTime::from_timestamp(hours * 3_600, 0).unwrap_or_default()),
            arb_json_document(),
            prop::option::of("[a-z]{1,8}"),
            any::<i16>(),
        );
        (numbers, rest).prop_map(
            |(
                (flag, small, regular, big, single, double, amount, initial),
                (label, payload, id, instant, document, note, kind),
            )| ColumnSample {
                flag,
                small,
                regular,
                big,
                single,
                double,
                amount,
                initial,
                label,
                payload,
                id,
                day: instant.date_naive(),
                clock: instant.time(),
                stamp: instant.naive_utc(),
                instant,
                document,
                note,
                r#type: kind,
            },
        )
    }
}
