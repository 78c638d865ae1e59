//! Wire value model shared by parameter and result mappers.
//!
//! `SqlValue` is the owned representation of a single value crossing the
//! database boundary. Generated mappers never talk to the driver directly:
//! parameters are encoded into `SqlValue`s through [`ToSqlValue`] and rows are
//! decoded out of them through [`FromSqlValue`]. The backend crate is the only
//! place that knows how a `SqlValue` maps onto the driver's own types.

use crate::error::{MapError, MapResult};
use crate::table::TableValue;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Type hint for NULL values so the backend can encode them with the right type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SqlNullType {
    Bool,
    I16,
    I32,
    I64,
    F32,
    F64,
    Decimal,
    Text,
    Bytes,
    Uuid,
    Date,
    Time,
    DateTime,
    DateTimeUtc,
    Json,
    Table,
}

impl SqlNullType {
    /// PostgreSQL type name used in diagnostics.
    pub fn pg_type_name(&self) -> &'static str {
        match self {
            SqlNullType::Bool => "bool",
            SqlNullType::I16 => "int2",
            SqlNullType::I32 => "int4",
            SqlNullType::I64 => "int8",
            SqlNullType::F32 => "float4",
            SqlNullType::F64 => "float8",
            SqlNullType::Decimal => "numeric",
            SqlNullType::Text => "text",
            SqlNullType::Bytes => "bytea",
            SqlNullType::Uuid => "uuid",
            SqlNullType::Date => "date",
            SqlNullType::Time => "time",
            SqlNullType::DateTime => "timestamp",
            SqlNullType::DateTimeUtc => "timestamptz",
            SqlNullType::Json => "jsonb",
            SqlNullType::Table => "jsonb",
        }
    }
}

/// A single owned value crossing the database boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// NULL with type hint for correct encoding.
    Null(SqlNullType),
    Bool(bool),
    /// 16-bit signed integer (smallint).
    I16(i16),
    /// 32-bit signed integer (int).
    I32(i32),
    /// 64-bit signed integer (bigint).
    I64(i64),
    /// 32-bit floating point (real).
    F32(f32),
    /// 64-bit floating point (double precision).
    F64(f64),
    Decimal(Decimal),
    Text(String),
    Bytes(Vec<u8>),
    Uuid(Uuid),
    Date(NaiveDate),
    Time(NaiveTime),
    /// Timestamp without time zone.
    DateTime(NaiveDateTime),
    /// Timestamp with time zone, normalized to UTC.
    DateTimeUtc(DateTime<Utc>),
    Json(JsonValue),
    /// Tabular parameter built from a nested record or a collection of records.
    Table(TableValue),
}

impl SqlValue {
    /// True for `SqlValue::Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null(_))
    }

    /// The type hint this value would carry if it were NULL.
    pub fn null_type(&self) -> SqlNullType {
        match self {
            SqlValue::Null(t) => *t,
            SqlValue::Bool(_) => SqlNullType::Bool,
            SqlValue::I16(_) => SqlNullType::I16,
            SqlValue::I32(_) => SqlNullType::I32,
            SqlValue::I64(_) => SqlNullType::I64,
            SqlValue::F32(_) => SqlNullType::F32,
            SqlValue::F64(_) => SqlNullType::F64,
            SqlValue::Decimal(_) => SqlNullType::Decimal,
            SqlValue::Text(_) => SqlNullType::Text,
            SqlValue::Bytes(_) => SqlNullType::Bytes,
            SqlValue::Uuid(_) => SqlNullType::Uuid,
            SqlValue::Date(_) => SqlNullType::Date,
            SqlValue::Time(_) => SqlNullType::Time,
            SqlValue::DateTime(_) => SqlNullType::DateTime,
            SqlValue::DateTimeUtc(_) => SqlNullType::DateTimeUtc,
            SqlValue::Json(_) => SqlNullType::Json,
            SqlValue::Table(_) => SqlNullType::Table,
        }
    }

    /// Short type label used in mismatch errors ("null" for NULLs).
    pub fn type_label(&self) -> &'static str {
        match self {
            SqlValue::Null(_) => "null",
            other => other.null_type().pg_type_name(),
        }
    }

    /// JSON rendering used when a value is embedded in a tabular parameter.
    ///
    /// Decimals, byte strings and temporal values are rendered as strings in
    /// the textual input format PostgreSQL accepts for their column type.
    pub fn to_json(&self) -> JsonValue {
        match self {
            SqlValue::Null(_) => JsonValue::Null,
            SqlValue::Bool(v) => JsonValue::Bool(*v),
            SqlValue::I16(v) => JsonValue::from(*v),
            SqlValue::I32(v) => JsonValue::from(*v),
            SqlValue::I64(v) => JsonValue::from(*v),
            SqlValue::F32(v) => JsonValue::from(*v),
            SqlValue::F64(v) => JsonValue::from(*v),
            SqlValue::Decimal(v) => JsonValue::String(v.to_string()),
            SqlValue::Text(v) => JsonValue::String(v.clone()),
            SqlValue::Bytes(v) => JsonValue::String(format!("\\x{}", hex::encode(v))),
            SqlValue::Uuid(v) => JsonValue::String(v.to_string()),
            SqlValue::Date(v) => JsonValue::String(v.to_string()),
            SqlValue::Time(v) => JsonValue::String(v.to_string()),
            SqlValue::DateTime(v) => {
                JsonValue::String(v.format("%Y-%m-%dT%H:%M:%S%.6f").to_string())
            }
            SqlValue::DateTimeUtc(v) => JsonValue::String(v.to_rfc3339()),
            SqlValue::Json(v) => v.clone(),
            SqlValue::Table(t) => t.to_json(),
        }
    }
}

// ============================================================================
// ENCODING
// ============================================================================

/// Encode a Rust value into a [`SqlValue`].
///
/// Implemented for every scalar type a generated parameter mapper may bind.
pub trait ToSqlValue {
    /// Type hint used when the value (or a column of this type) is NULL.
    const NULL_TYPE: SqlNullType;

    fn to_sql_value(&self) -> SqlValue;
}

macro_rules! impl_to_sql_copy {
    ($($ty:ty => $variant:ident),+ $(,)?) => {
        $(
            impl ToSqlValue for $ty {
                const NULL_TYPE: SqlNullType = SqlNullType::$variant;

                fn to_sql_value(&self) -> SqlValue {
                    SqlValue::$variant(*self)
                }
            }
        )+
    };
}

macro_rules! impl_to_sql_clone {
    ($($ty:ty => $variant:ident),+ $(,)?) => {
        $(
            impl ToSqlValue for $ty {
                const NULL_TYPE: SqlNullType = SqlNullType::$variant;

                fn to_sql_value(&self) -> SqlValue {
                    SqlValue::$variant(self.clone())
                }
            }
        )+
    };
}

impl_to_sql_copy! {
    bool => Bool,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    f32 => F32,
    f64 => F64,
    Decimal => Decimal,
    Uuid => Uuid,
    NaiveDate => Date,
    NaiveTime => Time,
    NaiveDateTime => DateTime,
    DateTime<Utc> => DateTimeUtc,
}

impl_to_sql_clone! {
    String => Text,
    Vec<u8> => Bytes,
    JsonValue => Json,
}

impl ToSqlValue for char {
    const NULL_TYPE: SqlNullType = SqlNullType::Text;

    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Text(self.to_string())
    }
}

impl<T: ToSqlValue> ToSqlValue for Option<T> {
    const NULL_TYPE: SqlNullType = T::NULL_TYPE;

    fn to_sql_value(&self) -> SqlValue {
        match self {
            Some(value) => value.to_sql_value(),
            None => SqlValue::Null(T::NULL_TYPE),
        }
    }
}

// ============================================================================
// DECODING
// ============================================================================

/// Decode a [`SqlValue`] read from `column` into a Rust value.
///
/// Integer and floating point targets accept narrower source widths. A NULL
/// only decodes into `Option<T>`.
pub trait FromSqlValue: Sized {
    fn from_sql_value(value: &SqlValue, column: &str) -> MapResult<Self>;
}

fn mismatch(column: &str, expected: &'static str, value: &SqlValue) -> MapError {
    MapError::TypeMismatch {
        column: column.to_string(),
        expected,
        actual: value.type_label(),
    }
}

macro_rules! impl_from_sql {
    ($ty:ty, $label:literal, |$v:ident| { $($pat:pat => $conv:expr),+ $(,)? }) => {
        impl FromSqlValue for $ty {
            fn from_sql_value(value: &SqlValue, column: &str) -> MapResult<Self> {
                match value {
                    $($pat => Ok($conv),)+
                    other => Err(mismatch(column, $label, other)),
                }
            }
        }
    };
}

impl_from_sql!(bool, "bool", |v| { SqlValue::Bool(v) => *v });
impl_from_sql!(i16, "int2", |v| { SqlValue::I16(v) => *v });
impl_from_sql!(i32, "int4", |v| {
    SqlValue::I16(v) => i32::from(*v),
    SqlValue::I32(v) => *v,
});
impl_from_sql!(i64, "int8", |v| {
    SqlValue::I16(v) => i64::from(*v),
    SqlValue::I32(v) => i64::from(*v),
    SqlValue::I64(v) => *v,
});
impl_from_sql!(f32, "float4", |v| { SqlValue::F32(v) => *v });
impl_from_sql!(f64, "float8", |v| {
    SqlValue::F32(v) => f64::from(*v),
    SqlValue::F64(v) => *v,
});
impl_from_sql!(Decimal, "numeric", |v| {
    SqlValue::Decimal(v) => *v,
    SqlValue::I16(v) => Decimal::from(*v),
    SqlValue::I32(v) => Decimal::from(*v),
    SqlValue::I64(v) => Decimal::from(*v),
});
impl_from_sql!(String, "text", |v| { SqlValue::Text(v) => v.clone() });
impl_from_sql!(Vec<u8>, "bytea", |v| { SqlValue::Bytes(v) => v.clone() });
impl_from_sql!(Uuid, "uuid", |v| { SqlValue::Uuid(v) => *v });
impl_from_sql!(NaiveDate, "date", |v| { SqlValue::Date(v) => *v });
impl_from_sql!(NaiveTime, "time", |v| { SqlValue::Time(v) => *v });
impl_from_sql!(NaiveDateTime, "timestamp", |v| { SqlValue::DateTime(v) => *v });
impl_from_sql!(DateTime<Utc>, "timestamptz", |v| {
    SqlValue::DateTimeUtc(v) => *v,
    SqlValue::DateTime(v) => v.and_utc(),
});
impl_from_sql!(JsonValue, "jsonb", |v| { SqlValue::Json(v) => v.clone() });

impl FromSqlValue for char {
    fn from_sql_value(value: &SqlValue, column: &str) -> MapResult<Self> {
        match value {
            SqlValue::Text(text) => {
                let mut chars = text.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(c),
                    _ => Err(MapError::Conversion {
                        column: column.to_string(),
                        reason: format!("expected a single character, got {:?}", text),
                    }),
                }
            }
            other => Err(mismatch(column, "char", other)),
        }
    }
}

impl<T: FromSqlValue> FromSqlValue for Option<T> {
    fn from_sql_value(value: &SqlValue, column: &str) -> MapResult<Self> {
        match value {
            SqlValue::Null(_) => Ok(None),
            other => T::from_sql_value(other, column).map(Some),
        }
    }
}
