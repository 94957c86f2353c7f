use async_trait::async_trait;
use futures::stream::BoxStream;
use vista_core::{ResultRecord, Result, TableModel};

/// Finite, non-restartable stream of rows. Iteration stops at the first error.
pub type RecordStream = BoxStream<'static, Result<ResultRecord>>;

#[async_trait]
pub trait DataSource: Send + Sync {
    /// Read catalog metadata for every table of `schema`.
    async fn introspect(&self, connection_string: &str, schema: &str) -> Result<Vec<TableModel>>;

    /// Run `sql` on a fresh connection and stream its rows.
    ///
    /// The connection must be released when the stream ends, fails or is
    /// dropped. Dropping only closes the client side: a statement already
    /// running on the server is not cancelled unless the source arranges it.
    fn query(&self, connection_string: &str, sql: String) -> RecordStream;
}
