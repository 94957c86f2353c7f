//! Commands that run, or show, a list request.
//!
//! Rows are printed as JSON lines on stdout. Logs go to stderr, so the output
//! can be piped straight into `jq`.

use crate::filter;
use anyhow::Context;
use std::io::{self, Write};
use vista_core::{Operator, QualValue, Qualifier, ResultRecord};
use vista_runtime::{Catalog, RAW_QUERY_TABLE};

pub async fn list(
    catalog: &Catalog,
    table: &str,
    filters: &[String],
    limit: Option<u64>,
) -> anyhow::Result<()> {
    let quals = qualifiers(catalog, table, filters)?;
    run(catalog, table, &quals, limit).await
}

pub fn sql(catalog: &Catalog, table: &str, filters: &[String]) -> anyhow::Result<()> {
    let quals = qualifiers(catalog, table, filters)?;
    println!("{}", catalog.sql_for(table, &quals)?);
    Ok(())
}

/// Prints the `data` column of the raw-query record: a JSON array with one
/// object per result row.
pub async fn raw(catalog: &Catalog, query: String) -> anyhow::Result<()> {
    let quals = [Qualifier::new("query", Operator::Eq, QualValue::String(query))];

    let mut data = None;
    catalog
        .list(RAW_QUERY_TABLE, &quals, &mut |record: ResultRecord| {
            data = record.get("data").map(|v| v.to_json());
            false
        })
        .await?;

    let data = data.context("Raw query returned no result")?;
    println!("{}", serde_json::to_string_pretty(&data)?);
    Ok(())
}

fn qualifiers(catalog: &Catalog, table: &str, filters: &[String]) -> anyhow::Result<Vec<Qualifier>> {
    let vt = catalog
        .get(table)
        .with_context(|| format!("Table '{}' is not exposed", table))?;
    filter::parse_all(vt, filters)
}

async fn run(
    catalog: &Catalog,
    table: &str,
    quals: &[Qualifier],
    limit: Option<u64>,
) -> anyhow::Result<()> {
    let mut printer = JsonLines::new(io::stdout().lock(), limit);

    // Dropping the list future on Ctrl-C drops the row stream and closes the
    // database connection with it.
    let finished = tokio::select! {
        res = catalog.list(table, quals, &mut printer) => Some(res?),
        _ = tokio::signal::ctrl_c() => None,
    };
    if finished.is_none() {
        tracing::warn!(%table, rows = printer.written, "interrupted");
    }

    if let Some(err) = printer.error.take() {
        return Err(err).context("Failed to write rows");
    }
    tracing::info!(%table, rows = printer.written, "list finished");
    Ok(())
}

/// Writes records as JSON lines, stopping at `limit` rows or the first write
/// error.
struct JsonLines<W> {
    out: W,
    limit: Option<u64>,
    written: u64,
    error: Option<io::Error>,
}

impl<W: Write> JsonLines<W> {
    fn new(out: W, limit: Option<u64>) -> Self {
        Self {
            out,
            limit,
            written: 0,
            error: None,
        }
    }

    fn write(&mut self, record: &ResultRecord) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, record)?;
        self.out.write_all(b"\n")
    }
}

impl<W: Write> vista_runtime::RowSink for JsonLines<W> {
    fn push(&mut self, record: ResultRecord) -> bool {
        if self.limit.is_some_and(|l| self.written >= l) {
            return false;
        }
        if let Err(e) = self.write(&record) {
            self.error = Some(e);
            return false;
        }
        self.written += 1;
        self.limit.is_none_or(|l| self.written < l)
    }
}
