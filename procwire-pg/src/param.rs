//! Parameter encoding.
//!
//! [`PgParam`] encodes a [`SqlValue`] as whatever type the server inferred
//! for the placeholder. Named-argument calls let the server pick the
//! parameter types from the procedure signature, so the wire value is
//! coerced: integers widen or narrow (checked), floats and decimals convert,
//! and tables travel as `jsonb`.

use bytes::{BufMut, BytesMut};
use postgres_types::{to_sql_checked, IsNull, ToSql, Type};
use procwire_core::SqlValue;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::error::Error;

type EncodeResult = Result<IsNull, Box<dyn Error + Sync + Send>>;

/// A borrowed [`SqlValue`] bound as a statement parameter.
#[derive(Debug)]
pub struct PgParam<'a>(pub &'a SqlValue);

impl ToSql for PgParam<'_> {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> EncodeResult {
        match self.0 {
            SqlValue::Null(_) => Ok(IsNull::Yes),
            SqlValue::Bool(v) => match ty.name() {
                "bool" => v.to_sql(ty, out),
                _ => encode_text(&v.to_string(), ty, out),
            },
            SqlValue::I16(v) => encode_integer(i64::from(*v), ty, out),
            SqlValue::I32(v) => encode_integer(i64::from(*v), ty, out),
            SqlValue::I64(v) => encode_integer(*v, ty, out),
            SqlValue::F32(v) => encode_float(f64::from(*v), ty, out),
            SqlValue::F64(v) => encode_float(*v, ty, out),
            SqlValue::Decimal(v) => encode_decimal(v, ty, out),
            SqlValue::Text(v) => encode_text(v, ty, out),
            SqlValue::Bytes(v) => v.as_slice().to_sql(ty, out),
            SqlValue::Uuid(v) => match ty.name() {
                "uuid" => v.to_sql(ty, out),
                _ => encode_text(&v.to_string(), ty, out),
            },
            SqlValue::Date(v) => v.to_sql(ty, out),
            SqlValue::Time(v) => v.to_sql(ty, out),
            SqlValue::DateTime(v) => match ty.name() {
                "timestamptz" => v.and_utc().to_sql(ty, out),
                _ => v.to_sql(ty, out),
            },
            SqlValue::DateTimeUtc(v) => match ty.name() {
                "timestamp" => v.naive_utc().to_sql(ty, out),
                _ => v.to_sql(ty, out),
            },
            SqlValue::Json(v) => encode_json(v, ty, out),
            SqlValue::Table(table) => encode_json(&table.to_json(), ty, out),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

fn encode_integer(v: i64, ty: &Type, out: &mut BytesMut) -> EncodeResult {
    match ty.name() {
        "int2" => i16::try_from(v)?.to_sql(ty, out),
        "int4" => i32::try_from(v)?.to_sql(ty, out),
        "int8" => v.to_sql(ty, out),
        "oid" => u32::try_from(v)?.to_sql(ty, out),
        "float4" => (v as f32).to_sql(ty, out),
        "float8" => (v as f64).to_sql(ty, out),
        "numeric" => Decimal::from(v).to_sql(ty, out),
        "bool" => (v != 0).to_sql(ty, out),
        _ if is_textual(ty) => encode_text(&v.to_string(), ty, out),
        other => Err(format!("cannot encode an integer as {}", other).into()),
    }
}

fn encode_float(v: f64, ty: &Type, out: &mut BytesMut) -> EncodeResult {
    match ty.name() {
        "float4" => (v as f32).to_sql(ty, out),
        "float8" => v.to_sql(ty, out),
        "numeric" => Decimal::try_from(v)?.to_sql(ty, out),
        _ if is_textual(ty) => encode_text(&v.to_string(), ty, out),
        other => Err(format!("cannot encode a float as {}", other).into()),
    }
}

fn encode_decimal(v: &Decimal, ty: &Type, out: &mut BytesMut) -> EncodeResult {
    match ty.name() {
        "numeric" => v.to_sql(ty, out),
        "float4" => v.to_f32().ok_or("decimal out of float4 range")?.to_sql(ty, out),
        "float8" => v.to_f64().ok_or("decimal out of float8 range")?.to_sql(ty, out),
        "int2" | "int4" | "int8" if v.fract().is_zero() => {
            let whole = v.to_i64().ok_or("decimal out of int8 range")?;
            encode_integer(whole, ty, out)
        }
        _ if is_textual(ty) => encode_text(&v.to_string(), ty, out),
        other => Err(format!("cannot encode a decimal as {}", other).into()),
    }
}

fn encode_json(v: &serde_json::Value, ty: &Type, out: &mut BytesMut) -> EncodeResult {
    match ty.name() {
        "json" | "jsonb" => v.to_sql(ty, out),
        _ if is_textual(ty) => encode_text(&v.to_string(), ty, out),
        other => Err(format!("cannot encode json as {}", other).into()),
    }
}

/// Text goes out verbatim for textual types (including `refcursor` and
/// enums, whose binary format is their text), and is parsed for the rest.
fn encode_text(v: &str, ty: &Type, out: &mut BytesMut) -> EncodeResult {
    match ty.name() {
        "json" | "jsonb" => serde_json::from_str::<serde_json::Value>(v)?.to_sql(ty, out),
        "uuid" => uuid::Uuid::parse_str(v)?.to_sql(ty, out),
        "bytea" => v.as_bytes().to_sql(ty, out),
        _ if is_textual(ty) => {
            out.put_slice(v.as_bytes());
            Ok(IsNull::No)
        }
        other => Err(format!("cannot encode text as {}", other).into()),
    }
}

fn is_textual(ty: &Type) -> bool {
    matches!(
        ty.name(),
        "text" | "varchar" | "bpchar" | "name" | "citext" | "refcursor" | "unknown"
    ) || matches!(ty.kind(), postgres_types::Kind::Enum(_))
}
