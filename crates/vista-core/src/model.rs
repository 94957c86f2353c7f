//! Schema model produced by introspection and the host's scalar types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Native column type category as reported by the database catalog.
///
/// This is a closed set: a new database type is supported by adding a
/// variant here and a row to [`crate::map_type`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NativeType {
    Binary,
    Bit,
    Enum,
    String,
    Uuid,
    Boolean,
    Decimal,
    Float,
    Currency,
    Integer,
    Json,
    Time,
    Interval,
    Network(NetworkKind),
    Spatial,
    TextSearch,
    Array,
    Serial,
    ObjectId,
    Range,
    UserDefined,
    Xml,
    Unsupported,
}

/// Subtype of a network address column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkKind {
    /// Host address, optionally with a netmask (`inet`).
    Host,
    /// Network block (`cidr`).
    Block,
    /// Any other network type, e.g. a MAC address.
    Other(String),
}

/// Native type of a column plus the raw type text for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnTypeDescriptor {
    pub native: NativeType,
    pub raw: String,
}

impl ColumnTypeDescriptor {
    pub fn new(native: NativeType, raw: impl Into<String>) -> Self {
        Self {
            native,
            raw: raw.into(),
        }
    }
}

/// The host engine's scalar column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HostType {
    String,
    Bool,
    Double,
    Int,
    Json,
    Timestamp,
    Inet,
    Cidr,
    /// Cannot be represented; the column is dropped.
    Unknown,
}

impl HostType {
    pub fn as_str(&self) -> &'static str {
        match self {
            HostType::String => "STRING",
            HostType::Bool => "BOOL",
            HostType::Double => "DOUBLE",
            HostType::Int => "INT",
            HostType::Json => "JSON",
            HostType::Timestamp => "TIMESTAMP",
            HostType::Inet => "INET",
            HostType::Cidr => "CIDR",
            HostType::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for HostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A column as discovered in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnModel {
    pub name: String,
    pub column_type: ColumnTypeDescriptor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl ColumnModel {
    pub fn new(name: impl Into<String>, column_type: ColumnTypeDescriptor) -> Self {
        Self {
            name: name.into(),
            column_type,
            comment: None,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Host type this column maps to.
    pub fn host_type(&self) -> HostType {
        crate::map_type(&self.column_type)
    }
}

/// A table as discovered in the catalog, columns in ordinal order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableModel {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default)]
    pub columns: Vec<ColumnModel>,
}

impl TableModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            comment: None,
            columns: Vec::new(),
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn with_column(mut self, column: ColumnModel) -> Self {
        self.columns.push(column);
        self
    }

    pub fn get_column(&self, name: &str) -> Option<&ColumnModel> {
        self.columns.iter().find(|c| c.name == name)
    }
}
