//! sqlhint - print SQL completion suggestions for a query and cursor
//!
//! Metadata comes from a TOML fixture describing catalogs, schemas, tables
//! and columns; see [`sqlhint::metadata::MetadataFixture`].

use anyhow::{Context, Result};
use clap::Parser;
use sqlhint::completer::{SuggestionEngine, narrow, word_before_offset};
use sqlhint::config::{self, Settings};
use sqlhint::sql::{CursorPosition, end_position, position_to_offset};
use sqlhint::suggest::SuggestionItem;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// sqlhint - clause-aware SQL completion
#[derive(Parser, Debug)]
#[command(name = "sqlhint")]
#[command(about = "Suggest SQL completions at a cursor position", long_about = None)]
#[command(version)]
struct Args {
    /// Query text (reads from stdin if not provided)
    #[arg(value_name = "QUERY")]
    query: Option<String>,

    /// Metadata fixture describing catalogs, schemas, tables and columns
    #[arg(short, long, value_name = "FILE")]
    metadata: PathBuf,

    /// Cursor line, 1-indexed (defaults to the end of the query)
    #[arg(short, long, requires = "column")]
    line: Option<usize>,

    /// Cursor column, 1-indexed
    #[arg(short, long, requires = "line")]
    column: Option<usize>,

    /// Print every suggestion for the clause instead of those matching the word before the cursor
    #[arg(short, long)]
    all: bool,

    /// Print suggestions as JSON
    #[arg(long)]
    json: bool,

    /// Complete a dotted table reference (e.g. `main.` or `main.default`) instead of the query
    #[arg(long, value_name = "TOKEN")]
    table_ref: Option<String>,

    /// Settings file (defaults to ~/.sqlhint/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let settings = match &args.config {
        Some(path) => config::load_settings_from(path),
        None => config::load_settings(),
    }
    .context("failed to load settings")?;
    init_tracing(&settings);

    let engine = SuggestionEngine::from_fixture(&args.metadata, &settings)
        .with_context(|| format!("failed to load metadata from {}", args.metadata.display()))?;

    let items = match &args.table_ref {
        Some(token) => engine.complete_table_reference(token).await,
        None => {
            let query = read_query(args.query.as_deref())?;
            let position = match (args.line, args.column) {
                (Some(line), Some(column)) => CursorPosition::new(line, column),
                _ => end_position(&query),
            };
            engine.refresh(&query, position).await;
            tracing::debug!(clause = %engine.current_clause(), "suggesting");

            let items = engine.get_suggestions();
            if args.all {
                items
            } else {
                let offset = position_to_offset(&query, position);
                narrow(items, word_before_offset(&query, offset))
            }
        }
    };

    print_items(&items, args.json)
}

fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn read_query(query: Option<&str>) -> Result<String> {
    match query {
        Some(query) => Ok(query.to_string()),
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read query from stdin")?;
            Ok(buf.trim_end_matches('\n').to_string())
        }
    }
}

fn print_items(items: &[SuggestionItem], json: bool) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if json {
        serde_json::to_writer_pretty(&mut out, items)?;
        writeln!(out)?;
    } else {
        for item in items {
            writeln!(out, "{:<40} {}", item.label, item.detail)?;
        }
    }
    Ok(())
}
