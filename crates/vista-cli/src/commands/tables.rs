//! Catalog inspection commands.
//!
//! - `tables` prints one line per registered virtual table
//! - `describe` prints a table descriptor as JSON

use anyhow::Context;
use vista_runtime::{Catalog, Requirement, VirtualTable};

pub fn list(catalog: &Catalog) {
    if catalog.is_empty() {
        println!("No tables exposed from schema '{}'.", catalog.schema());
        return;
    }

    println!("Tables in schema '{}':", catalog.schema());
    for table in catalog.tables() {
        println!("{}", summary_line(table));
    }
}

pub fn describe(catalog: &Catalog, name: &str) -> anyhow::Result<()> {
    let table = catalog
        .get(name)
        .with_context(|| format!("Table '{}' is not exposed", name))?;
    println!("{}", serde_json::to_string_pretty(table)?);
    Ok(())
}

fn summary_line(table: &VirtualTable) -> String {
    let required: Vec<&str> = table
        .key_columns
        .iter()
        .filter(|k| k.require == Requirement::Required)
        .map(|k| k.name.as_str())
        .collect();

    let mut line = format!("  {} ({} columns)", table.name, table.columns.len());
    if !required.is_empty() {
        line.push_str(&format!(" requires: {}", required.join(", ")));
    }
    if !table.description.is_empty() {
        line.push_str(&format!(" - {}", table.description));
    }
    line
}
