//! Postgres data source for Vista.
//!
//! Every call opens its own connection and closes it when done: introspection
//! once per catalog build, and one connection per streamed query.

use async_stream::try_stream;
use async_trait::async_trait;
use futures::{Stream, StreamExt, TryStreamExt};
use sqlx::{Connection, Executor, PgConnection};
use vista_core::{Error, ResultRecord, Result, TableModel};
use vista_runtime::{DataSource, RecordStream};

pub mod classify;
pub mod decode;
pub mod introspect;

/// [`DataSource`] backed by a live Postgres server.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresSource;

impl PostgresSource {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DataSource for PostgresSource {
    async fn introspect(&self, connection_string: &str, schema: &str) -> Result<Vec<TableModel>> {
        introspect::introspect_schema(connection_string, schema).await
    }

    fn query(&self, connection_string: &str, sql: String) -> RecordStream {
        query_rows(connection_string.to_string(), sql).boxed()
    }
}

/// How often the server checks that a query's client is still connected.
/// Dropping a stream closes the socket without a cancel request, so this
/// bounds how long an abandoned statement keeps running. Postgres 14+.
pub const CONNECTION_CHECK_INTERVAL: &str = "1s";

/// Stream the rows of `sql` from a dedicated connection.
///
/// The statement is sent verbatim over the simple query protocol. Dropping the
/// stream drops the connection, abandoning the scan; the server stops the
/// statement at its next client connection check.
pub fn query_rows(
    database_url: String,
    sql: String,
) -> impl Stream<Item = Result<ResultRecord>> + Send + 'static {
    try_stream! {
        let mut conn = PgConnection::connect(&database_url)
            .await
            .map_err(Error::connection)?;
        watch_client_connection(&mut conn).await;

        {
            let mut rows = sqlx::raw_sql(&sql).fetch(&mut conn);
            while let Some(row) = rows
                .try_next()
                .await
                .map_err(|e| Error::query(sql.as_str(), e))?
            {
                let record = decode::record_from_row(&row)
                    .map_err(|e| Error::query(sql.as_str(), e))?;
                yield record;
            }
        }

        if let Err(e) = conn.close().await {
            tracing::debug!(error = %e, "error closing query connection");
        }
    }
}

async fn watch_client_connection(conn: &mut PgConnection) {
    let set = format!(
        "SET client_connection_check_interval = '{}'",
        CONNECTION_CHECK_INTERVAL
    );
    if let Err(e) = conn.execute(sqlx::raw_sql(&set)).await {
        tracing::debug!(error = %e, "server does not support client connection checks");
    }
}
