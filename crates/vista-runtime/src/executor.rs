//! Statement construction for list requests.

use async_stream::try_stream;
use futures::{Stream, TryStreamExt};
use vista_core::{ResultRecord, Result, Value};

use crate::adapter::{DataSource, RecordStream};

/// `SELECT * FROM schema.table`, with ` WHERE ...` only for a non-empty
/// fragment.
pub fn select_statement(schema: &str, table: &str, where_clause: &str) -> String {
    let mut query = format!("SELECT * FROM {}.{}", schema, table);
    if !where_clause.is_empty() {
        query.push_str(" WHERE ");
        query.push_str(where_clause);
    }
    query
}

/// Stream the rows of `schema.table` matching `where_clause`.
pub fn execute(
    source: &dyn DataSource,
    connection_string: &str,
    schema: &str,
    table: &str,
    where_clause: &str,
) -> RecordStream {
    let query = select_statement(schema, table, where_clause);
    tracing::debug!(%query, "executing list query");
    source.query(connection_string, query)
}

/// Run a literal SQL string and wrap its whole result set into one record
/// with a `query` column echoing the SQL and a `data` column holding a JSON
/// array of row objects.
pub fn execute_raw(
    source: &dyn DataSource,
    connection_string: &str,
    query: String,
) -> impl Stream<Item = Result<ResultRecord>> + Send + 'static {
    tracing::debug!(%query, "executing raw query");
    let rows = source.query(connection_string, query.clone());
    try_stream! {
        let mut rows = rows;
        let mut data = Vec::new();
        while let Some(row) = rows.try_next().await? {
            data.push(row.to_json());
        }

        let mut record = ResultRecord::new();
        record.insert("query", Value::String(query));
        record.insert("data", Value::Json(serde_json::Value::Array(data)));
        yield record;
    }
}
