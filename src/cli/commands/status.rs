use anyhow::{Context, Result};

use crate::cli::output::get_formatter;
use crate::models::{Config, OutputFormat};
use crate::services::{DATABASE_FILE, SqliteStore, collection_stats};

pub async fn handle_status(config: &Config, format: OutputFormat, _verbose: bool) -> Result<()> {
    let formatter = get_formatter(format);

    // Don't create the store just to report that it is empty.
    let db_path = config.store.persist_directory.join(DATABASE_FILE);
    let store = if db_path.exists() {
        SqliteStore::open(&config.store.persist_directory)
    } else {
        SqliteStore::open_in_memory()
    }
    .context("failed to open vector store")?;

    let stats = collection_stats(&store, config)
        .await
        .context("failed to read collection statistics")?;

    print!("{}", formatter.format_status(&stats));

    if !stats.exists || stats.total_chunks == 0 {
        eprintln!();
        eprintln!(
            "Hint: knowledge base not built. Run: mindshift ingest {}",
            config.ingest.documents_dir.display()
        );
    }

    Ok(())
}
