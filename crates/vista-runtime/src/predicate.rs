//! Rendering of filter qualifiers into a SQL `WHERE` fragment.
//!
//! Column identifiers are emitted as-is: they come from introspected schema
//! metadata. [`Verbatim`] quotes string-like literals without escaping
//! embedded quotes, so a value such as `O'Brien` produces broken (or injected)
//! SQL. [`Escaped`] doubles embedded quotes instead.

use chrono::SecondsFormat;
use vista_core::{QualValue, Qualifier};

/// Emitted for values the renderer has no literal syntax for. The resulting
/// statement is rejected by the database instead of silently losing a filter.
pub const INVALID_LITERAL: &str = "<INVALID>";

pub trait PredicateRenderer: Send + Sync {
    /// SQL literal for one qualifier value.
    fn render_literal(&self, value: &QualValue) -> String;

    /// Render qualifiers, ANDed in input order, without the `WHERE` keyword.
    /// No qualifiers render as an empty string.
    fn render(&self, quals: &[Qualifier]) -> String {
        quals
            .iter()
            .map(|qual| match &qual.value {
                None => format!("{} {}", qual.column, qual.operator),
                Some(value) => format!(
                    "{} {} {}",
                    qual.column,
                    qual.operator,
                    self.render_literal(value)
                ),
            })
            .collect::<Vec<_>>()
            .join(" AND ")
    }
}

/// Quotes string literals without escaping.
#[derive(Debug, Clone, Copy, Default)]
pub struct Verbatim;

impl PredicateRenderer for Verbatim {
    fn render_literal(&self, value: &QualValue) -> String {
        render_with(value, |s| format!("'{}'", s))
    }
}

/// Quotes string literals and doubles any embedded single quote.
#[derive(Debug, Clone, Copy, Default)]
pub struct Escaped;

impl PredicateRenderer for Escaped {
    fn render_literal(&self, value: &QualValue) -> String {
        render_with(value, |s| format!("'{}'", s.replace('\'', "''")))
    }
}

fn render_with(value: &QualValue, quote: impl Fn(&str) -> String) -> String {
    match value {
        QualValue::Bool(b) => b.to_string(),
        QualValue::Int(n) => n.to_string(),
        QualValue::Double(f) => f.to_string(),
        QualValue::Inet(addr) => quote(addr),
        QualValue::Json(v) => quote(&v.to_string()),
        QualValue::String(s) => quote(s),
        QualValue::Timestamp(ts) => quote(&ts.to_rfc3339_opts(SecondsFormat::Secs, true)),
        QualValue::List(_) => INVALID_LITERAL.to_string(),
    }
}
