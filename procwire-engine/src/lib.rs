//! procwire Engine - Stored Procedure Execution
//!
//! Executes [`StoredProcedure`](procwire_core::StoredProcedure) descriptors
//! against any [`Connection`]:
//!
//! - `Results = ()`: command mode, returns the affected row count
//! - `Results = (A,)`: single-result mode, decodes the call's own rows
//! - `Results = (A, B, ...)`: multi-result mode over server-side cursors,
//!   valid only inside a transaction
//!
//! Connection and transaction ownership is tracked per call by
//! [`ConnectionLease`] and [`TransactionScope`]. The engine closes what it
//! opens and never closes what it borrows from a [`UnitOfWork`].

pub mod command;
pub mod config;
pub mod connection;
pub mod error;
pub mod executor;
pub mod scope;
pub mod unit_of_work;

pub use command::{quote_ident, Command, CommandKind, TransactionId};
pub use config::ExecutorConfig;
pub use connection::{Connection, TransactionContext};
pub use error::{DatabaseError, DatabaseErrorKind, DbResult, ProcError, ProcResult};
pub use executor::{ProcOutput, ProcedureExecutor};
pub use scope::{ConnectionLease, TransactionScope};
pub use unit_of_work::{AmbientTransaction, UnitOfWork};
