use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use vista_adapter_pg::PostgresSource;
use vista_core::ConnectionConfig;
use vista_runtime::Catalog;

mod commands;
mod filter;

#[derive(Parser, Debug)]
#[command(name = "vista", version, about = "Query a Postgres schema as virtual tables")]
struct Cli {
    /// Connection config file (YAML).
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Database URL; overrides connection_string from the config file.
    #[arg(long, env = "DATABASE_URL", hide_env_values = true, global = true)]
    database_url: Option<String>,

    /// Schema to expose; overrides the config file.
    #[arg(long, global = true)]
    schema: Option<String>,

    /// Table name pattern to expose (repeatable); overrides the config file.
    #[arg(long = "table", global = true)]
    tables: Vec<String>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the registered virtual tables.
    Tables,

    /// Show the columns and key columns of one table.
    Describe { table: String },

    /// Stream the rows of a table as JSON lines.
    List {
        table: String,

        /// Filter such as "age >= 18" or "deleted_at is null" (repeatable).
        #[arg(long = "where", short = 'w')]
        filters: Vec<String>,

        /// Stop after this many rows.
        #[arg(long)]
        limit: Option<u64>,
    },

    /// Print the SQL a list request would run.
    Sql {
        table: String,

        #[arg(long = "where", short = 'w')]
        filters: Vec<String>,
    },

    /// Run a literal SQL query through the raw_query table.
    Raw { query: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    tracing::debug!(?config, "loaded configuration");

    let catalog = Catalog::build(&config, Arc::new(PostgresSource::new()))
        .await
        .context("failed to build table catalog")?;

    match cli.cmd {
        Command::Tables => commands::tables::list(&catalog),
        Command::Describe { table } => commands::tables::describe(&catalog, &table)?,
        Command::List {
            table,
            filters,
            limit,
        } => commands::query::list(&catalog, &table, &filters, limit).await?,
        Command::Sql { table, filters } => commands::query::sql(&catalog, &table, &filters)?,
        Command::Raw { query } => commands::query::raw(&catalog, query).await?,
    }

    Ok(())
}

fn load_config(cli: &Cli) -> anyhow::Result<ConnectionConfig> {
    let mut config = match &cli.config {
        Some(path) => ConnectionConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {:?}", path))?,
        None => ConnectionConfig::default(),
    };

    if let Some(url) = &cli.database_url {
        config.connection_string = Some(url.clone());
    }
    if let Some(schema) = &cli.schema {
        config.schema = Some(schema.clone());
    }
    if !cli.tables.is_empty() {
        config.tables_to_expose = cli.tables.clone();
    }
    Ok(config)
}
