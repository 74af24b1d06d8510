//! colfold CLI - enrich query results with concatenated child columns

mod columns;
mod config;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colfold_core::{
    build_correlated_subquery, contains_pattern, Bindings, ConcatEnricher, EnrichOptions,
    QueryExecutor, SqlRequest, Table,
};
use colfold_postgres::PgExecutor;
use serde_json::json;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use config::CliConfig;

#[derive(Parser)]
#[command(name = "colfold")]
#[command(about = "Enrich query results with concatenated values from related tables")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a primary query and enrich its rows
    Enrich {
        /// Primary SQL query
        #[arg(short, long)]
        query: String,

        /// Path to the column configuration JSON file
        #[arg(short, long)]
        columns: PathBuf,

        /// Database URL (defaults to DATABASE_URL)
        #[arg(long)]
        database_url: Option<String>,

        /// Maximum keys per batch (defaults to COLFOLD_MAX_BATCH_SIZE)
        #[arg(long)]
        batch_size: Option<usize>,
    },

    /// Print the correlated sub-query predicate for a configured column
    Subquery {
        /// Path to the column configuration JSON file
        #[arg(short, long)]
        columns: PathBuf,

        /// Target column name of the configuration to filter on
        #[arg(long)]
        column: String,

        /// Value matched with LIKE against the filter column
        #[arg(long)]
        value: String,

        /// Wrap the value as a substring pattern
        #[arg(long)]
        wildcard: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries JSON.
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = CliConfig::from_env()?;

    match cli.command {
        Commands::Enrich {
            query,
            columns,
            database_url,
            batch_size,
        } => {
            run_enrich(&config, &query, &columns, database_url, batch_size).await?;
        }
        Commands::Subquery {
            columns,
            column,
            value,
            wildcard,
        } => {
            print_subquery(&columns, &column, &value, wildcard)?;
        }
    }

    Ok(())
}

async fn run_enrich(
    config: &CliConfig,
    query: &str,
    columns_path: &PathBuf,
    database_url: Option<String>,
    batch_size: Option<usize>,
) -> Result<()> {
    let columns = columns::load_columns(columns_path)?;
    info!("Loaded {} column configurations from {:?}", columns.len(), columns_path);

    let database_url = database_url
        .or_else(|| config.database_url.clone())
        .context("No database URL: pass --database-url or set DATABASE_URL")?;
    let mut executor = PgExecutor::connect(&database_url, config.max_connections).await?;
    if let Some(secs) = config.query_timeout_secs {
        executor = executor.with_statement_timeout(Duration::from_secs(secs));
    }

    let rows = executor
        .query(&SqlRequest::new(query, vec![]))
        .await
        .context("Primary query failed")?;
    let mut table = Table::from_rows(rows);
    info!("Primary query returned {} rows", table.len());

    let options = EnrichOptions {
        max_batch_size: batch_size.unwrap_or(config.max_batch_size),
    };
    let enricher = ConcatEnricher::with_options(executor, options);
    enricher.enrich(&mut table, &columns).await?;
    enricher.executor().close().await;

    println!("{}", serde_json::to_string_pretty(table.rows())?);
    Ok(())
}

fn print_subquery(columns_path: &PathBuf, column: &str, value: &str, wildcard: bool) -> Result<()> {
    let columns = columns::load_columns(columns_path)?;
    let column = columns::find_column(&columns, column)?;

    let pattern = if wildcard {
        contains_pattern(value)
    } else {
        value.to_string()
    };
    let mut bindings = Bindings::new();
    let predicate = build_correlated_subquery(pattern, column, &mut bindings);

    let output = json!({
        "predicate": predicate,
        "params": bindings.params(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
