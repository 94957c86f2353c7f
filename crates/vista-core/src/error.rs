//! Error kinds surfaced by catalog building and per-query execution.

use thiserror::Error;

use crate::config::ConfigError;

/// Boxed cause carried by the connection, introspection and query kinds.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors that can occur while building a catalog or listing a table.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or invalid connection configuration.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The database could not be opened or reached.
    #[error("can't connect to DB: {source}")]
    Connection {
        #[source]
        source: BoxError,
    },

    /// Catalog metadata could not be read.
    #[error("error inspecting schema {schema}: {source}")]
    Introspection {
        schema: String,
        #[source]
        source: BoxError,
    },

    /// The database rejected a statement or failed mid-scan.
    #[error("error while making query \"{query}\": {source}")]
    Query {
        query: String,
        #[source]
        source: BoxError,
    },

    /// A list request named a table that is not in the catalog.
    #[error("table not found: {name}")]
    UnknownTable { name: String },

    /// A required key column was not supplied with an `=` predicate.
    #[error("table {table} requires an equality qualifier on column {column}")]
    MissingQualifier { table: String, column: String },
}

impl Error {
    pub fn connection(source: impl Into<BoxError>) -> Self {
        Error::Connection {
            source: source.into(),
        }
    }

    pub fn introspection(schema: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Error::Introspection {
            schema: schema.into(),
            source: source.into(),
        }
    }

    pub fn query(query: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Error::Query {
            query: query.into(),
            source: source.into(),
        }
    }
}
