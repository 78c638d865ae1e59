//! Order-summary procedures and a record covering every scalar column type.
//!
//! Mappers for these records live in [`crate::mappers`], generated by
//! `procwire-gen` from this file (see `procwire.toml`).

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use procwire_core::{DataRow, InvocationStyle, MapperRegistries, SqlValue, StoredProcedure};
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderIdParameters {
    pub id: i32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderHeaderView {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineCountView {
    pub count: i32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderLine {
    pub sku: String,
    pub quantity: i32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplaceLinesParameters {
    pub order_id: i32,
    pub lines: Vec<OrderLine>,
}

/// One field of each scalar type, bound as parameters and read back as
/// columns of the same names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnSample {
    pub flag: bool,
    pub small: i16,
    pub regular: i32,
    pub big: i64,
    pub single: f32,
    pub double: f64,
    pub amount: Decimal,
    pub initial: char,
    pub label: String,
    pub payload: Vec<u8>,
    pub id: Uuid,
    pub day: NaiveDate,
    pub clock: NaiveTime,
    pub stamp: NaiveDateTime,
    pub instant: DateTime<Utc>,
    pub document: serde_json::Value,
    pub note: Option<String>,
    pub r#type: i16,
}

/// `get_order_summary(id)`: two cursors, header then line count.
pub struct GetOrderSummary;

impl StoredProcedure for GetOrderSummary {
    const NAME: &'static str = "get_order_summary";
    const SCHEMA: Option<&'static str> = Some("sales");
    type Parameters = OrderIdParameters;
    type Results = (OrderHeaderView, LineCountView);
}

/// `get_order_header(id)`: one result set.
pub struct GetOrderHeader;

impl StoredProcedure for GetOrderHeader {
    const NAME: &'static str = "get_order_header";
    type Parameters = OrderIdParameters;
    type Results = (OrderHeaderView,);
}

/// `list_order_headers()`: one result set, every row.
pub struct ListOrderHeaders;

impl StoredProcedure for ListOrderHeaders {
    const NAME: &'static str = "list_order_headers";
    type Parameters = ();
    type Results = (Vec<OrderHeaderView>,);
}

/// `search_order_headers(id)`: a NULL id matches every order.
pub struct SearchOrderHeaders;

impl StoredProcedure for SearchOrderHeaders {
    const NAME: &'static str = "search_order_headers";
    type Parameters = Option<OrderIdParameters>;
    type Results = (Vec<OrderHeaderView>,);
}

/// `replace_order_lines(order_id, lines)`: command.
pub struct ReplaceOrderLines;

impl StoredProcedure for ReplaceOrderLines {
    const NAME: &'static str = "replace_order_lines";
    const STYLE: InvocationStyle = InvocationStyle::Procedure;
    type Parameters = ReplaceLinesParameters;
    type Results = ();
}

/// `echo_column_sample(...)`: returns its arguments as one row.
pub struct EchoColumnSample;

impl StoredProcedure for EchoColumnSample {
    const NAME: &'static str = "echo_column_sample";
    type Parameters = ColumnSample;
    type Results = (ColumnSample,);
}

pub fn register_fixture_mappers(registries: &MapperRegistries) {
    crate::mappers::register_mappers(registries);
}

/// Fresh registries holding the fixture mappers.
pub fn fixture_registries() -> Arc<MapperRegistries> {
    let registries = MapperRegistries::new();
    register_fixture_mappers(&registries);
    Arc::new(registries)
}

pub fn header_row(name: &str) -> DataRow {
    DataRow::from_pairs([("name", SqlValue::Text(name.to_string()))])
}

pub fn count_row(count: i32) -> DataRow {
    DataRow::from_pairs([("count", SqlValue::I32(count))])
}
