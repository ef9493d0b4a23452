//! Row -> `CellValue` decoding for the supported drivers.
//!
//! The column's runtime type decides the decode. Types without a faithful
//! display form (binary, geometry, intervals, ...) are rejected instead of
//! being rendered as garbage.

use crate::domain::error::{AppError, Result};
use crate::domain::query_result::CellValue;
use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::sqlite::SqliteRow;
use sqlx::types::Uuid;
use sqlx::{Column, Row, TypeInfo, ValueRef};

fn unsupported<R: Row>(row: &R, index: usize, type_name: &str) -> AppError {
    let column = row
        .columns()
        .get(index)
        .map(|c| c.name().to_string())
        .unwrap_or_else(|| format!("#{index}"));
    AppError::UnsupportedValue(format!(
        "column '{}' has unsupported type {}",
        column, type_name
    ))
}

/// NUMERIC keeps integers integral; everything else becomes a float.
fn numeric_cell(value: BigDecimal) -> Result<CellValue> {
    let text = value.to_string();
    if let Ok(int) = text.parse::<i64>() {
        return Ok(CellValue::Integer(int));
    }
    text.parse::<f64>()
        .map(CellValue::Float)
        .map_err(|_| AppError::UnsupportedValue(format!("numeric value {} out of range", text)))
}

pub fn column_names<R: Row>(row: &R) -> Vec<String> {
    row.columns().iter().map(|c| c.name().to_string()).collect()
}

/// How a Postgres column is decoded, keyed by the driver's runtime type name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PgCellKind {
    Bool,
    Int2,
    Int4,
    Int8,
    Float4,
    Float8,
    Numeric,
    Text,
    Uuid,
    Time,
    Date,
    Timestamp,
    TimestampTz,
    Json,
}

/// `CHAR` is `char(n)`/`bpchar`; the single-byte internal type is `"CHAR"` and stays unsupported.
fn pg_cell_kind(type_name: &str) -> Option<PgCellKind> {
    let kind = match type_name.to_uppercase().as_str() {
        "BOOL" => PgCellKind::Bool,
        "INT2" => PgCellKind::Int2,
        "INT4" => PgCellKind::Int4,
        "INT8" => PgCellKind::Int8,
        "FLOAT4" => PgCellKind::Float4,
        "FLOAT8" => PgCellKind::Float8,
        "NUMERIC" => PgCellKind::Numeric,
        "TEXT" | "VARCHAR" | "CHAR" | "NAME" => PgCellKind::Text,
        "UUID" => PgCellKind::Uuid,
        "TIME" => PgCellKind::Time,
        "DATE" => PgCellKind::Date,
        "TIMESTAMP" => PgCellKind::Timestamp,
        "TIMESTAMPTZ" => PgCellKind::TimestampTz,
        "JSON" | "JSONB" => PgCellKind::Json,
        _ => return None,
    };
    Some(kind)
}

pub fn decode_pg_cell(row: &PgRow, index: usize) -> Result<CellValue> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(CellValue::Null);
    }
    let type_name = raw.type_info().name().to_string();
    let Some(kind) = pg_cell_kind(&type_name) else {
        return Err(unsupported(row, index, &type_name));
    };

    let value = match kind {
        PgCellKind::Bool => CellValue::Bool(row.try_get(index)?),
        PgCellKind::Int2 => CellValue::Integer(row.try_get::<i16, _>(index)?.into()),
        PgCellKind::Int4 => CellValue::Integer(row.try_get::<i32, _>(index)?.into()),
        PgCellKind::Int8 => CellValue::Integer(row.try_get(index)?),
        PgCellKind::Float4 => CellValue::Float(row.try_get::<f32, _>(index)?.into()),
        PgCellKind::Float8 => CellValue::Float(row.try_get(index)?),
        PgCellKind::Numeric => numeric_cell(row.try_get(index)?)?,
        PgCellKind::Text => CellValue::Text(row.try_get(index)?),
        PgCellKind::Uuid => CellValue::Text(row.try_get::<Uuid, _>(index)?.to_string()),
        PgCellKind::Time => CellValue::Text(row.try_get::<NaiveTime, _>(index)?.to_string()),
        PgCellKind::Date => CellValue::Date(row.try_get::<NaiveDate, _>(index)?),
        PgCellKind::Timestamp => CellValue::Timestamp(row.try_get::<NaiveDateTime, _>(index)?),
        PgCellKind::TimestampTz => {
            CellValue::TimestampTz(row.try_get::<DateTime<Utc>, _>(index)?.fixed_offset())
        }
        PgCellKind::Json => {
            CellValue::Text(row.try_get::<serde_json::Value, _>(index)?.to_string())
        }
    };
    Ok(value)
}

pub fn decode_sqlite_cell(row: &SqliteRow, index: usize) -> Result<CellValue> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(CellValue::Null);
    }
    let type_name = raw.type_info().name().to_uppercase();

    let value = match type_name.as_str() {
        "NULL" => CellValue::Null,
        "BOOLEAN" => CellValue::Bool(row.try_get(index)?),
        "INTEGER" => CellValue::Integer(row.try_get(index)?),
        "REAL" => CellValue::Float(row.try_get(index)?),
        "NUMERIC" => match row.try_get::<i64, _>(index) {
            Ok(int) => CellValue::Integer(int),
            Err(_) => CellValue::Float(row.try_get(index)?),
        },
        "TEXT" => CellValue::Text(row.try_get(index)?),
        // SQLite stores dates as text; keep the text if it is not ISO shaped.
        "DATE" => match row.try_get::<NaiveDate, _>(index) {
            Ok(date) => CellValue::Date(date),
            Err(_) => CellValue::Text(row.try_get(index)?),
        },
        "DATETIME" => match row.try_get::<NaiveDateTime, _>(index) {
            Ok(ts) => CellValue::Timestamp(ts),
            Err(_) => CellValue::Text(row.try_get(index)?),
        },
        other => return Err(unsupported(row, index, other)),
    };
    Ok(value)
}

pub fn decode_pg_row(row: &PgRow) -> Result<Vec<CellValue>> {
    (0..row.len()).map(|i| decode_pg_cell(row, i)).collect()
}

pub fn decode_sqlite_row(row: &SqliteRow) -> Result<Vec<CellValue>> {
    (0..row.len()).map(|i| decode_sqlite_cell(row, i)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::types::Oid;
    use sqlx::postgres::PgTypeInfo;
    use std::str::FromStr;

    fn pg_name(oid: u32) -> String {
        PgTypeInfo::with_oid(Oid(oid)).name().to_string()
    }

    #[test]
    fn test_pg_character_types_decode_as_text() {
        // text, varchar, char(n), name
        for oid in [25, 1043, 1042, 19] {
            assert_eq!(pg_cell_kind(&pg_name(oid)), Some(PgCellKind::Text), "oid {}", oid);
        }
    }

    #[test]
    fn test_pg_uuid_time_and_temporal_types_are_supported() {
        assert_eq!(pg_cell_kind(&pg_name(2950)), Some(PgCellKind::Uuid));
        assert_eq!(pg_cell_kind(&pg_name(1083)), Some(PgCellKind::Time));
        assert_eq!(pg_cell_kind(&pg_name(1082)), Some(PgCellKind::Date));
        assert_eq!(pg_cell_kind(&pg_name(1114)), Some(PgCellKind::Timestamp));
        assert_eq!(pg_cell_kind(&pg_name(1184)), Some(PgCellKind::TimestampTz));
        assert_eq!(pg_cell_kind(&pg_name(1700)), Some(PgCellKind::Numeric));
    }

    #[test]
    fn test_pg_binary_and_internal_char_are_unsupported() {
        // bytea, internal single-byte "char"
        assert_eq!(pg_cell_kind(&pg_name(17)), None);
        assert_eq!(pg_cell_kind(&pg_name(18)), None);
    }

    #[test]
    fn test_numeric_integral_stays_integer() {
        let value = BigDecimal::from_str("42").unwrap();
        assert_eq!(numeric_cell(value).unwrap(), CellValue::Integer(42));
    }

    #[test]
    fn test_numeric_fraction_becomes_float() {
        let value = BigDecimal::from_str("1250.75").unwrap();
        assert_eq!(numeric_cell(value).unwrap(), CellValue::Float(1250.75));
    }
}
