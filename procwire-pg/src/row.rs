//! Row decoding: `tokio_postgres::Row` into [`DataRow`].

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use postgres_types::{FromSql, Type};
use procwire_core::{DataRow, SqlNullType, SqlValue};
use procwire_engine::{DatabaseError, DatabaseErrorKind, DbResult};
use rust_decimal::Decimal;
use std::error::Error;
use std::sync::Arc;
use tokio_postgres::Row;
use uuid::Uuid;

/// Column value read as its raw text, for `refcursor`, enums and other
/// types whose binary format is UTF-8 text.
struct RawText(String);

impl<'a> FromSql<'a> for RawText {
    fn from_sql(_ty: &Type, raw: &'a [u8]) -> Result<Self, Box<dyn Error + Sync + Send>> {
        Ok(RawText(std::str::from_utf8(raw)?.to_string()))
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }
}

/// Convert every row of a result set. Column names are shared between rows.
pub fn convert_rows(rows: &[Row]) -> DbResult<Vec<DataRow>> {
    let Some(first) = rows.first() else {
        return Ok(Vec::new());
    };
    let columns: Arc<[String]> = first
        .columns()
        .iter()
        .map(|column| column.name().to_string())
        .collect();

    rows.iter()
        .map(|row| {
            let values = (0..row.len())
                .map(|idx| convert_value(row, idx))
                .collect::<DbResult<Vec<_>>>()?;
            DataRow::new(Arc::clone(&columns), values)
                .map_err(|e| DatabaseError::new(DatabaseErrorKind::Decode, e.to_string()))
        })
        .collect()
}

/// Decode one column, choosing the wire value by the column's type.
fn convert_value(row: &Row, idx: usize) -> DbResult<SqlValue> {
    let ty = row.columns()[idx].type_();
    let value = match ty.name() {
        "bool" => get::<bool>(row, idx, SqlValue::Bool, SqlNullType::Bool),
        "int2" => get::<i16>(row, idx, SqlValue::I16, SqlNullType::I16),
        "int4" => get::<i32>(row, idx, SqlValue::I32, SqlNullType::I32),
        "int8" => get::<i64>(row, idx, SqlValue::I64, SqlNullType::I64),
        "oid" => get::<u32>(row, idx, |v| SqlValue::I64(i64::from(v)), SqlNullType::I64),
        "float4" => get::<f32>(row, idx, SqlValue::F32, SqlNullType::F32),
        "float8" => get::<f64>(row, idx, SqlValue::F64, SqlNullType::F64),
        "numeric" => get::<Decimal>(row, idx, SqlValue::Decimal, SqlNullType::Decimal),
        "text" | "varchar" | "bpchar" | "name" | "citext" => {
            get::<String>(row, idx, SqlValue::Text, SqlNullType::Text)
        }
        "bytea" => get::<Vec<u8>>(row, idx, SqlValue::Bytes, SqlNullType::Bytes),
        "uuid" => get::<Uuid>(row, idx, SqlValue::Uuid, SqlNullType::Uuid),
        "date" => get::<NaiveDate>(row, idx, SqlValue::Date, SqlNullType::Date),
        "time" => get::<NaiveTime>(row, idx, SqlValue::Time, SqlNullType::Time),
        "timestamp" => get::<NaiveDateTime>(row, idx, SqlValue::DateTime, SqlNullType::DateTime),
        "timestamptz" => {
            get::<DateTime<Utc>>(row, idx, SqlValue::DateTimeUtc, SqlNullType::DateTimeUtc)
        }
        "json" | "jsonb" => get::<serde_json::Value>(row, idx, SqlValue::Json, SqlNullType::Json),
        _ => get::<RawText>(row, idx, |v| SqlValue::Text(v.0), SqlNullType::Text),
    };

    value.map_err(|e| {
        DatabaseError::new(
            DatabaseErrorKind::Decode,
            format!(
                "cannot decode column {} of type {}",
                row.columns()[idx].name(),
                ty.name()
            ),
        )
        .with_source(e)
    })
}

fn get<'a, T: FromSql<'a>>(
    row: &'a Row,
    idx: usize,
    wrap: impl FnOnce(T) -> SqlValue,
    null: SqlNullType,
) -> Result<SqlValue, tokio_postgres::Error> {
    Ok(row
        .try_get::<_, Option<T>>(idx)?
        .map(wrap)
        .unwrap_or(SqlValue::Null(null)))
}
