//! Filter predicates supplied by the host and the records streamed back.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::json;
use std::fmt;
use std::str::FromStr;

/// Comparison operator of a filter predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Like,
    NotLike,
    ILike,
    NotILike,
    IsNull,
    IsNotNull,
}

impl Operator {
    /// Every operator the database can evaluate.
    pub const ALL: &'static [Operator] = &[
        Operator::Eq,
        Operator::NotEq,
        Operator::Lt,
        Operator::LtEq,
        Operator::Gt,
        Operator::GtEq,
        Operator::Like,
        Operator::NotLike,
        Operator::ILike,
        Operator::NotILike,
        Operator::IsNull,
        Operator::IsNotNull,
    ];

    /// SQL text of the operator.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::NotEq => "!=",
            Operator::Lt => "<",
            Operator::LtEq => "<=",
            Operator::Gt => ">",
            Operator::GtEq => ">=",
            Operator::Like => "~~",
            Operator::NotLike => "!~~",
            Operator::ILike => "~~*",
            Operator::NotILike => "!~~*",
            Operator::IsNull => "IS NULL",
            Operator::IsNotNull => "IS NOT NULL",
        }
    }

    /// Whether the operator is written without a right-hand value.
    pub fn is_unary(&self) -> bool {
        matches!(self, Operator::IsNull | Operator::IsNotNull)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl Serialize for Operator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_sql())
    }
}

impl FromStr for Operator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let op = match s.trim().to_ascii_uppercase().as_str() {
            "=" => Operator::Eq,
            "!=" | "<>" => Operator::NotEq,
            "<" => Operator::Lt,
            "<=" => Operator::LtEq,
            ">" => Operator::Gt,
            ">=" => Operator::GtEq,
            "~~" | "LIKE" => Operator::Like,
            "!~~" | "NOT LIKE" => Operator::NotLike,
            "~~*" | "ILIKE" => Operator::ILike,
            "!~~*" | "NOT ILIKE" => Operator::NotILike,
            "IS NULL" => Operator::IsNull,
            "IS NOT NULL" => Operator::IsNotNull,
            other => return Err(format!("unknown operator '{}'", other)),
        };
        Ok(op)
    }
}

/// Typed literal of a filter predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum QualValue {
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
    /// Address or network in text form, e.g. `10.0.0.0/8`.
    Inet(String),
    Json(serde_json::Value),
    Timestamp(DateTime<Utc>),
    /// Set of values from an `IN`-style plan; not translatable.
    List(Vec<QualValue>),
}

impl QualValue {
    /// The value as a plain string, for qualifiers that carry text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            QualValue::String(s) | QualValue::Inet(s) => Some(s),
            _ => None,
        }
    }
}

/// One filter condition on a column. A request's qualifiers are ANDed.
#[derive(Debug, Clone, PartialEq)]
pub struct Qualifier {
    pub column: String,
    pub operator: Operator,
    pub value: Option<QualValue>,
}

impl Qualifier {
    pub fn new(column: impl Into<String>, operator: Operator, value: QualValue) -> Self {
        Self {
            column: column.into(),
            operator,
            value: Some(value),
        }
    }

    /// A qualifier without a value, e.g. `IS NULL`.
    pub fn unary(column: impl Into<String>, operator: Operator) -> Self {
        Self {
            column: column.into(),
            operator,
            value: None,
        }
    }
}

/// A native value read from a result row.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    Json(serde_json::Value),
    Timestamp(DateTime<Utc>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// JSON rendering used when a row is wrapped into a single JSON value.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => json!(b),
            Value::Int(n) => json!(n),
            Value::Float(f) => json!(f),
            Value::String(s) => json!(s),
            Value::Bytes(b) => json!(hex_bytes(b)),
            Value::Json(v) => v.clone(),
            Value::Timestamp(ts) => json!(ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        }
    }
}

fn hex_bytes(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(2 + bytes.len() * 2);
    out.push_str("\\x");
    for b in bytes {
        out.push_str(&format!("{:02x}", b));
    }
    out
}

/// One result row: column names paired with values in the order the
/// database reported them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultRecord {
    fields: Vec<(String, Value)>,
}

impl ResultRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field. A repeated column name replaces the earlier value.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Value of a column; `None` when the record has no such column.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn to_json(&self) -> serde_json::Value {
        let obj = self
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_json()))
            .collect();
        serde_json::Value::Object(obj)
    }
}

impl FromIterator<(String, Value)> for ResultRecord {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut record = ResultRecord::new();
        for (name, value) in iter {
            record.insert(name, value);
        }
        record
    }
}

impl Serialize for ResultRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, &value.to_json())?;
        }
        map.end()
    }
}
