//! Virtual table synthesis.
//!
//! Each introspected table becomes one [`VirtualTable`]. Columns whose native
//! type has no host representation are dropped. Every kept column is a key
//! column accepting every operator, since all filtering is pushed down to the
//! database.

use serde::Serialize;
use vista_core::{HostType, Operator, TableModel};

/// How rows of a virtual table are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    /// `SELECT *` on the database table of the same name.
    Dynamic,
    /// Runs the SQL text supplied in the `query` qualifier.
    RawQuery,
}

/// Whether the host must supply a qualifier on a key column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Requirement {
    Optional,
    Required,
}

/// Column exposed to the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VirtualColumn {
    pub name: String,
    pub host_type: HostType,
    pub description: String,
}

/// Column the host may filter on, with the operators it may use.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyColumn {
    pub name: String,
    pub operators: Vec<Operator>,
    pub require: Requirement,
}

impl KeyColumn {
    pub fn accepts(&self, operator: Operator) -> bool {
        self.operators.contains(&operator)
    }
}

/// Table descriptor published to the host. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VirtualTable {
    pub name: String,
    pub description: String,
    pub columns: Vec<VirtualColumn>,
    pub key_columns: Vec<KeyColumn>,
    pub kind: TableKind,
}

impl VirtualTable {
    pub fn get_column(&self, name: &str) -> Option<&VirtualColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn get_key_column(&self, name: &str) -> Option<&KeyColumn> {
        self.key_columns.iter().find(|k| k.name == name)
    }
}

/// Build the virtual table for one introspected table.
pub fn synthesize(table: &TableModel) -> VirtualTable {
    let mut columns = Vec::with_capacity(table.columns.len());
    let mut key_columns = Vec::with_capacity(table.columns.len());

    for col in &table.columns {
        let host_type = col.host_type();
        if host_type == HostType::Unknown {
            tracing::warn!(
                table = %table.name,
                column = %col.name,
                raw_type = %col.column_type.raw,
                "unknown type, skipping column"
            );
            continue;
        }

        columns.push(VirtualColumn {
            name: col.name.clone(),
            host_type,
            description: col.comment.clone().unwrap_or_default(),
        });
        key_columns.push(KeyColumn {
            name: col.name.clone(),
            operators: Operator::ALL.to_vec(),
            require: Requirement::Optional,
        });
    }

    tracing::debug!(
        table = %table.name,
        columns = columns.len(),
        dropped = table.columns.len() - columns.len(),
        "synthesized table"
    );

    VirtualTable {
        name: table.name.clone(),
        description: table.comment.clone().unwrap_or_default(),
        columns,
        key_columns,
        kind: TableKind::Dynamic,
    }
}

/// The fixed table that forwards a literal SQL string to the database.
pub fn raw_query_table(name: &str) -> VirtualTable {
    VirtualTable {
        name: name.to_string(),
        description: "Makes a raw SQL query (as a string) and returns any results as a single \
                      JSONB column. Use for more complex queries"
            .to_string(),
        columns: vec![
            VirtualColumn {
                name: "query".to_string(),
                host_type: HostType::String,
                description: "The query that will be forwarded to the Postgres DB".to_string(),
            },
            VirtualColumn {
                name: "data".to_string(),
                host_type: HostType::Json,
                description: "The resultset, all wrapped in a JSONB column".to_string(),
            },
        ],
        key_columns: vec![KeyColumn {
            name: "query".to_string(),
            operators: vec![Operator::Eq],
            require: Requirement::Required,
        }],
        kind: TableKind::RawQuery,
    }
}
