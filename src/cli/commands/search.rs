use anyhow::{Context, Result};
use clap::Args;
use std::time::Instant;

use super::{build_retriever, open_store, resolve_top_k};
use crate::cli::output::get_formatter;
use crate::models::{Config, OutputFormat};

#[derive(Debug, Args)]
pub struct SearchArgs {
    #[arg(required = true, help = "Search query text")]
    pub query: String,

    #[arg(long, short = 'k', help = "Maximum number of chunks to return")]
    pub top_k: Option<usize>,
}

pub async fn handle_search(
    args: SearchArgs,
    config: &Config,
    format: OutputFormat,
    verbose: bool,
) -> Result<()> {
    let query = args.query.trim();
    if query.is_empty() {
        anyhow::bail!("search query cannot be empty");
    }

    let top_k = resolve_top_k(config, args.top_k)?;
    let api_key = config.require_api_key()?;
    let formatter = get_formatter(format);
    let start_time = Instant::now();

    if verbose {
        eprintln!("Query: \"{query}\"");
        eprintln!("  Top-k: {top_k}");
        eprintln!("  Collection: {}", config.store.collection);
    }

    let store = open_store(config)?;
    let retriever = build_retriever(config, api_key, store)?;
    let results = retriever
        .search(query, top_k)
        .await
        .context("search failed")?;

    if verbose {
        eprintln!("  Total: {}ms", start_time.elapsed().as_millis());
        eprintln!();
    }

    print!("{}", formatter.format_search_results(&results));

    Ok(())
}
