//! Parsing of `--where` filters into qualifiers.
//!
//! A filter is `<column> <operator> [value]`. The value is typed by the host
//! type of the column it applies to, so `age > 30` becomes an integer
//! qualifier and `name = 'Ada'` a string one.

use anyhow::{Context, bail};
use chrono::{DateTime, NaiveDate, Utc};
use vista_core::{HostType, Operator, QualValue, Qualifier};
use vista_runtime::VirtualTable;

/// Operator spellings, longest first so prefixes never shadow each other.
const OPERATORS: &[(&str, Operator)] = &[
    ("IS NOT NULL", Operator::IsNotNull),
    ("IS NULL", Operator::IsNull),
    ("NOT ILIKE", Operator::NotILike),
    ("NOT LIKE", Operator::NotLike),
    ("ILIKE", Operator::ILike),
    ("LIKE", Operator::Like),
    ("!~~*", Operator::NotILike),
    ("~~*", Operator::ILike),
    ("!~~", Operator::NotLike),
    ("~~", Operator::Like),
    ("<=", Operator::LtEq),
    (">=", Operator::GtEq),
    ("!=", Operator::NotEq),
    ("<>", Operator::NotEq),
    ("=", Operator::Eq),
    ("<", Operator::Lt),
    (">", Operator::Gt),
];

/// Parse every filter against `table`.
pub fn parse_all(table: &VirtualTable, filters: &[String]) -> anyhow::Result<Vec<Qualifier>> {
    filters
        .iter()
        .map(|f| parse(table, f).with_context(|| format!("invalid filter '{}'", f)))
        .collect()
}

pub fn parse(table: &VirtualTable, filter: &str) -> anyhow::Result<Qualifier> {
    let filter = filter.trim();
    let split = filter
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '$'))
        .unwrap_or(filter.len());
    let (column, rest) = filter.split_at(split);
    if column.is_empty() {
        bail!("expected a column name");
    }

    let Some(col) = table.get_column(column) else {
        bail!("table '{}' has no column '{}'", table.name, column);
    };

    let (operator, value) = split_operator(rest.trim_start())?;
    if let Some(key) = table.get_key_column(column) {
        if !key.accepts(operator) {
            bail!("column '{}' does not accept operator {}", column, operator);
        }
    }

    if operator.is_unary() {
        if !value.is_empty() {
            bail!("unexpected value after {}", operator);
        }
        return Ok(Qualifier::unary(column, operator));
    }
    if value.is_empty() {
        bail!("missing value after {}", operator);
    }

    Ok(Qualifier::new(column, operator, typed_value(col.host_type, value)?))
}

fn split_operator(rest: &str) -> anyhow::Result<(Operator, &str)> {
    for (spelling, operator) in OPERATORS {
        let Some(head) = rest.get(..spelling.len()) else {
            continue;
        };
        if !head.eq_ignore_ascii_case(spelling) {
            continue;
        }
        let tail = &rest[spelling.len()..];
        // Word operators must end at a word boundary: `LIKE` is not `LIKELY`.
        let is_word = spelling.starts_with(|c: char| c.is_ascii_alphabetic());
        if is_word && tail.starts_with(|c: char| c.is_ascii_alphanumeric() || c == '_') {
            continue;
        }
        return Ok((*operator, tail.trim()));
    }
    bail!("expected an operator, found '{}'", rest)
}

fn typed_value(host_type: HostType, raw: &str) -> anyhow::Result<QualValue> {
    let value = match host_type {
        HostType::String => QualValue::String(unquote(raw).to_string()),
        HostType::Inet | HostType::Cidr => QualValue::Inet(unquote(raw).to_string()),
        HostType::Bool => match raw.to_ascii_lowercase().as_str() {
            "true" | "t" => QualValue::Bool(true),
            "false" | "f" => QualValue::Bool(false),
            _ => bail!("expected a boolean, found '{}'", raw),
        },
        HostType::Int => QualValue::Int(
            raw.parse()
                .with_context(|| format!("expected an integer, found '{}'", raw))?,
        ),
        HostType::Double => QualValue::Double(
            raw.parse()
                .with_context(|| format!("expected a number, found '{}'", raw))?,
        ),
        HostType::Json => QualValue::Json(
            serde_json::from_str(unquote(raw)).context("expected a JSON document")?,
        ),
        HostType::Timestamp => QualValue::Timestamp(parse_timestamp(unquote(raw))?),
        HostType::Unknown => bail!("column type cannot be filtered"),
    };
    Ok(value)
}

/// RFC 3339 timestamps, or a bare date taken as midnight UTC.
fn parse_timestamp(raw: &str) -> anyhow::Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("expected an RFC 3339 timestamp or a date, found '{}'", raw))?;
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .context("date out of range")
}

/// Strip one pair of enclosing single quotes, leaving the inside untouched.
fn unquote(raw: &str) -> &str {
    raw.strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .unwrap_or(raw)
}
