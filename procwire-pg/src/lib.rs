//! procwire PostgreSQL Backend
//!
//! [`PgConnection`] implements the engine's
//! [`Connection`](procwire_engine::Connection) over a `deadpool-postgres`
//! pool:
//!
//! - stored procedures are invoked with named arguments,
//!   `SELECT * FROM "schema"."name"("p" => $1)` or `CALL ...`
//! - wire values are coerced to the parameter types the server infers
//! - rows are decoded by column type into [`DataRow`](procwire_core::DataRow)s
//! - multi-result procedures return `refcursor` names that the engine fetches
//!   with `FETCH ALL FROM "<cursor>"`

pub mod config;
pub mod connection;
mod error;
pub mod param;
pub mod row;
pub mod sql;

pub use config::DbConfig;
pub use connection::PgConnection;
pub use param::PgParam;
pub use sql::{qualified_name, render_call};
