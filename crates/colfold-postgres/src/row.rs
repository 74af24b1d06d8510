//! Conversion of `PgRow`s into core rows.

use colfold_core::{Row, Value};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sqlx::postgres::{PgRow, Postgres};
use sqlx::types::Uuid;
use sqlx::{Column, Decode, Row as _, Type, TypeInfo};
use tracing::debug;

/// How a Postgres column is decoded into a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    Numeric,
    Bool,
    Text,
    Date,
    Timestamp,
    TimestampTz,
    Json,
    Uuid,
    Unsupported,
}

/// Map a Postgres type name (as reported by `PgTypeInfo::name`) to a kind.
///
/// Types without a decoder here (arrays, `BYTEA`, user-defined types) come
/// back as `Null`; cast them to `text` in the query to keep them.
pub fn pg_type_kind(type_name: &str) -> ValueKind {
    match type_name.to_uppercase().as_str() {
        "INT2" | "SMALLINT" => ValueKind::Int16,
        "INT4" | "INT" | "INTEGER" => ValueKind::Int32,
        "INT8" | "BIGINT" => ValueKind::Int64,
        "FLOAT4" | "REAL" => ValueKind::Float32,
        "FLOAT8" | "DOUBLE PRECISION" => ValueKind::Float64,
        "NUMERIC" | "DECIMAL" => ValueKind::Numeric,
        "BOOL" | "BOOLEAN" => ValueKind::Bool,
        "TEXT" | "VARCHAR" | "BPCHAR" | "CHAR" | "NAME" | "CITEXT" => ValueKind::Text,
        "DATE" => ValueKind::Date,
        "TIMESTAMP" => ValueKind::Timestamp,
        "TIMESTAMPTZ" => ValueKind::TimestampTz,
        "JSON" | "JSONB" => ValueKind::Json,
        "UUID" => ValueKind::Uuid,
        other => {
            debug!("No decoder for PostgreSQL type '{}', reading as NULL", other);
            ValueKind::Unsupported
        }
    }
}

fn get<T>(row: &PgRow, i: usize) -> Option<T>
where
    T: for<'r> Decode<'r, Postgres> + Type<Postgres>,
{
    row.try_get::<Option<T>, _>(i).ok().flatten()
}

fn decode_column(row: &PgRow, i: usize, kind: ValueKind) -> Value {
    let value = match kind {
        ValueKind::Int16 => get::<i16>(row, i).map(|v| Value::Int(i64::from(v))),
        ValueKind::Int32 => get::<i32>(row, i).map(|v| Value::Int(i64::from(v))),
        ValueKind::Int64 => get::<i64>(row, i).map(Value::Int),
        ValueKind::Float32 => get::<f32>(row, i).map(|v| Value::Float(f64::from(v))),
        ValueKind::Float64 => get::<f64>(row, i).map(Value::Float),
        ValueKind::Numeric => get::<Decimal>(row, i).map(decimal_to_value),
        ValueKind::Bool => get::<bool>(row, i).map(Value::Bool),
        ValueKind::Text => get::<String>(row, i).map(Value::Text),
        ValueKind::Date => get::<chrono::NaiveDate>(row, i).map(|d| Value::Text(d.to_string())),
        ValueKind::Timestamp => {
            get::<chrono::NaiveDateTime>(row, i).map(|t| Value::Text(t.to_string()))
        }
        ValueKind::TimestampTz => {
            get::<chrono::DateTime<chrono::Utc>>(row, i).map(|t| Value::Text(t.to_rfc3339()))
        }
        ValueKind::Json => get::<serde_json::Value>(row, i).map(|j| Value::Text(j.to_string())),
        ValueKind::Uuid => get::<Uuid>(row, i).map(|u| Value::Text(u.to_string())),
        ValueKind::Unsupported => None,
    };
    value.unwrap_or(Value::Null)
}

/// NUMERIC reads as a float so `42` and `42.00` correlate with integer keys.
/// Values outside the `f64` range keep their exact text.
fn decimal_to_value(d: Decimal) -> Value {
    match d.to_f64() {
        Some(f) if f.is_finite() => Value::Float(f),
        _ => Value::Text(d.to_string()),
    }
}

/// Convert a `PgRow` into a [`Row`] keyed by column name.
pub fn pg_row_to_row(row: &PgRow) -> Row {
    row.columns()
        .iter()
        .map(|col| {
            let kind = pg_type_kind(col.type_info().name());
            (col.name().to_string(), decode_column(row, col.ordinal(), kind))
        })
        .collect()
}
