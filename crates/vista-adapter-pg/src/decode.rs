//! Conversion of text-format Postgres rows into result records.
//!
//! Rows are read over the simple query protocol, so every value arrives as
//! its text representation. Types with a natural record value are decoded by
//! OID; everything else is kept as text.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{Column, Row, ValueRef};
use vista_core::{ResultRecord, Value};

// Builtin type OIDs from pg_type.dat.
const BOOL: u32 = 16;
const BYTEA: u32 = 17;
const INT8: u32 = 20;
const INT2: u32 = 21;
const INT4: u32 = 23;
const JSON: u32 = 114;
const FLOAT4: u32 = 700;
const FLOAT8: u32 = 701;
const MONEY: u32 = 790;
const DATE: u32 = 1082;
const TIMESTAMP: u32 = 1114;
const TIMESTAMPTZ: u32 = 1184;
const NUMERIC: u32 = 1700;
const JSONB: u32 = 3802;

/// Zip the row's column names with its decoded values, in column order.
pub fn record_from_row(row: &PgRow) -> Result<ResultRecord, sqlx::Error> {
    let mut record = ResultRecord::new();
    for (index, column) in row.columns().iter().enumerate() {
        record.insert(column.name(), decode_value(row, index)?);
    }
    Ok(record)
}

fn decode_value(row: &PgRow, index: usize) -> Result<Value, sqlx::Error> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let type_info = raw.type_info().into_owned();
    let oid = type_info.oid().map(|oid| oid.0);

    let value = match oid {
        Some(BOOL) => Value::Bool(row.try_get(index)?),
        Some(INT2) => Value::Int(row.try_get::<i16, _>(index)?.into()),
        Some(INT4) => Value::Int(row.try_get::<i32, _>(index)?.into()),
        Some(INT8) => Value::Int(row.try_get(index)?),
        Some(FLOAT4) => Value::Float(row.try_get::<f32, _>(index)?.into()),
        Some(FLOAT8) => Value::Float(row.try_get(index)?),
        Some(NUMERIC) | Some(MONEY) => number_or_text(text(row, index)?),
        Some(JSON) | Some(JSONB) => Value::Json(row.try_get::<serde_json::Value, _>(index)?),
        Some(oid @ (TIMESTAMPTZ | TIMESTAMP | DATE)) => {
            temporal_or_text(oid, text(row, index)?)
        }
        Some(BYTEA) => Value::Bytes(row.try_get(index)?),
        _ => {
            tracing::trace!(column = index, ?oid, "decoding as text");
            Value::String(text(row, index)?)
        }
    };
    Ok(value)
}

fn text(row: &PgRow, index: usize) -> Result<String, sqlx::Error> {
    row.try_get_unchecked::<String, _>(index)
}

/// Date and time text as a UTC timestamp when it parses, else the text.
///
/// Expects `DateStyle` ISO, which sqlx sets on connect. `infinity`,
/// `-infinity` and BC dates have no timestamp value and stay text.
pub fn temporal_or_text(oid: u32, text: String) -> Value {
    let parsed = match oid {
        TIMESTAMPTZ => DateTime::parse_from_str(&text, "%Y-%m-%d %H:%M:%S%.f%#z")
            .ok()
            .map(|ts| ts.with_timezone(&Utc)),
        TIMESTAMP => NaiveDateTime::parse_from_str(&text, "%Y-%m-%d %H:%M:%S%.f")
            .ok()
            .map(|ts| ts.and_utc()),
        DATE => NaiveDate::parse_from_str(&text, "%Y-%m-%d")
            .ok()
            .map(|d| d.and_time(NaiveTime::MIN).and_utc()),
        _ => None,
    };
    match parsed {
        Some(ts) => Value::Timestamp(ts),
        None => Value::String(text),
    }
}

/// Numeric and money text as a float when it parses, else the text itself.
pub fn number_or_text(text: String) -> Value {
    if let Ok(n) = text.parse::<f64>() {
        return Value::Float(n);
    }
    match money(&text) {
        Some(n) => Value::Float(n),
        None => Value::String(text),
    }
}

/// Money in the `C`/`en_US` monetary format: `$1,234.50`, `-$1,234.50` or
/// `($1,234.50)`. Any other locale format is left alone.
fn money(text: &str) -> Option<f64> {
    let mut s = text.trim();
    let mut negative = false;
    if let Some(inner) = s.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        negative = true;
        s = inner.trim();
    }
    if let Some(rest) = s.strip_prefix('-') {
        if negative {
            return None;
        }
        negative = true;
        s = rest;
    }
    let s = s.strip_prefix('$')?;

    let (int, frac) = match s.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (s, None),
    };
    let mut groups = int.split(',');
    let first = groups.next()?;
    let grouped = int.contains(',');
    if first.is_empty() || (grouped && first.len() > 3) || !all_digits(first) {
        return None;
    }
    let mut digits = first.to_string();
    for group in groups {
        if group.len() != 3 || !all_digits(group) {
            return None;
        }
        digits.push_str(group);
    }
    if let Some(frac) = frac {
        if frac.is_empty() || !all_digits(frac) {
            return None;
        }
        digits.push('.');
        digits.push_str(frac);
    }

    let n: f64 = digits.parse().ok()?;
    Some(if negative { -n } else { n })
}

fn all_digits(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_digit())
}
