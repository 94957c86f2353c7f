//! The per-connection catalog of virtual tables.
//!
//! [`Catalog::build`] runs once per connection: it resolves the configuration,
//! introspects the schema, keeps the tables matched by the configured patterns
//! and registers the raw-query table. The result is read-only and can be shared
//! across concurrent list requests.

use futures::{StreamExt, TryStreamExt};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use vista_core::{ConnectionConfig, Error, Operator, Qualifier, Result, TableModel};

use crate::adapter::{DataSource, RecordStream};
use crate::executor;
use crate::pattern::TablePattern;
use crate::predicate::{Escaped, PredicateRenderer, Verbatim};
use crate::sink::RowSink;
use crate::synthesize::{TableKind, VirtualTable, raw_query_table, synthesize};

/// Name of the fixed raw-query table. It replaces any discovered table of
/// the same name.
pub const RAW_QUERY_TABLE: &str = "raw_query";

pub struct Catalog {
    tables: BTreeMap<String, VirtualTable>,
    schema: String,
    connection_string: String,
    source: Arc<dyn DataSource>,
    renderer: Box<dyn PredicateRenderer>,
}

impl Catalog {
    /// Introspect the configured schema and build the catalog.
    ///
    /// Any failure aborts the build; a partial catalog is never returned.
    pub async fn build(config: &ConnectionConfig, source: Arc<dyn DataSource>) -> Result<Self> {
        let connection_string = config.connection_string()?;
        Self::build_with(config, connection_string, source).await
    }

    /// Like [`Catalog::build`] with an already resolved connection string.
    pub async fn build_with(
        config: &ConnectionConfig,
        connection_string: String,
        source: Arc<dyn DataSource>,
    ) -> Result<Self> {
        let schema = config.validated_schema_name()?.to_string();
        let patterns = config.tables_to_expose();

        let discovered = match source.introspect(&connection_string, &schema).await {
            Ok(tables) => tables,
            Err(e) => {
                tracing::error!(%schema, error = %e, "failed to introspect schema");
                return Err(e);
            }
        };

        let tables = register_tables(&discovered, &patterns);
        tracing::info!(
            %schema,
            discovered = discovered.len(),
            registered = tables.len(),
            "built table catalog"
        );

        let renderer: Box<dyn PredicateRenderer> = if config.escape_string_literals {
            Box::new(Escaped)
        } else {
            Box::new(Verbatim)
        };

        Ok(Self {
            tables,
            schema,
            connection_string,
            source,
            renderer,
        })
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn get(&self, name: &str) -> Option<&VirtualTable> {
        self.tables.get(name)
    }

    /// Registered tables in name order.
    pub fn tables(&self) -> impl Iterator<Item = &VirtualTable> {
        self.tables.values()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// The statement a list request on `table` would run.
    pub fn sql_for(&self, table: &str, quals: &[Qualifier]) -> Result<String> {
        let vt = self.lookup(table)?;
        match vt.kind {
            TableKind::Dynamic => Ok(executor::select_statement(
                &self.schema,
                &vt.name,
                &self.renderer.render(quals),
            )),
            TableKind::RawQuery => raw_query_text(vt, quals),
        }
    }

    /// Stream the rows of a list request on `table`.
    pub fn stream(&self, table: &str, quals: &[Qualifier]) -> Result<RecordStream> {
        let vt = self.lookup(table)?;
        tracing::debug!(table = %vt.name, ?quals, schema = %self.schema, "list table");

        match vt.kind {
            TableKind::Dynamic => {
                let where_clause = self.renderer.render(quals);
                Ok(executor::execute(
                    self.source.as_ref(),
                    &self.connection_string,
                    &self.schema,
                    &vt.name,
                    &where_clause,
                ))
            }
            TableKind::RawQuery => {
                let query = raw_query_text(vt, quals)?;
                Ok(
                    executor::execute_raw(self.source.as_ref(), &self.connection_string, query)
                        .boxed(),
                )
            }
        }
    }

    /// Push every row of a list request into `sink`.
    ///
    /// Returns the number of rows pushed. Rows pushed before an error stay
    /// pushed. When the sink declines a row the stream, and with it the
    /// database connection, is dropped.
    pub async fn list<S>(&self, table: &str, quals: &[Qualifier], sink: &mut S) -> Result<u64>
    where
        S: RowSink + ?Sized,
    {
        let mut rows = self.stream(table, quals)?;
        let mut count = 0;
        while let Some(record) = rows.try_next().await? {
            count += 1;
            if !sink.push(record) {
                tracing::debug!(%table, count, "sink stopped list");
                break;
            }
        }
        Ok(count)
    }

    fn lookup(&self, table: &str) -> Result<&VirtualTable> {
        self.tables.get(table).ok_or_else(|| Error::UnknownTable {
            name: table.to_string(),
        })
    }
}

impl fmt::Debug for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Catalog")
            .field("schema", &self.schema)
            .field("tables", &self.tables.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// Select and synthesize the tables matched by `patterns`.
///
/// Patterns are tried in order; a table is claimed by the first pattern that
/// matches it and never registered twice. Invalid patterns match nothing.
/// The raw-query table is always added last.
pub fn register_tables(
    discovered: &[TableModel],
    patterns: &[String],
) -> BTreeMap<String, VirtualTable> {
    let mut tables = BTreeMap::new();

    for glob in patterns {
        let pattern = match TablePattern::new(glob) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(pattern = %glob, error = %e, "ignoring invalid table pattern");
                continue;
            }
        };

        for table in discovered {
            if tables.contains_key(&table.name) {
                continue;
            }
            if !pattern.matches(&table.name) {
                tracing::debug!(pattern = %pattern.as_str(), table = %table.name, "no match");
                continue;
            }
            tables.insert(table.name.clone(), synthesize(table));
        }
    }

    tables.insert(RAW_QUERY_TABLE.to_string(), raw_query_table(RAW_QUERY_TABLE));
    tables
}

fn raw_query_text(vt: &VirtualTable, quals: &[Qualifier]) -> Result<String> {
    quals
        .iter()
        .find(|q| q.column == "query" && q.operator == Operator::Eq)
        .and_then(|q| q.value.as_ref())
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| Error::MissingQualifier {
            table: vt.name.clone(),
            column: "query".to_string(),
        })
}
