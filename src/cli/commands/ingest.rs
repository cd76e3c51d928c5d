//! Ingest command implementation.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};

use super::open_store;
use crate::cli::output::get_formatter;
use crate::models::{Config, OutputFormat};
use crate::services::{OpenAiEmbedder, RagPipeline};

#[derive(Debug, Args)]
pub struct IngestArgs {
    /// Documents directory (defaults to the configured one)
    pub dir: Option<PathBuf>,

    #[arg(long, help = "Maximum chunk length in characters")]
    pub chunk_size: Option<usize>,

    #[arg(long, help = "Overlap between consecutive chunks in characters")]
    pub chunk_overlap: Option<usize>,

    #[arg(long, short = 'c', help = "Collection name")]
    pub collection: Option<String>,

    #[arg(long, help = "Directory holding the vector store")]
    pub persist_dir: Option<PathBuf>,
}

impl IngestArgs {
    fn apply(&self, config: &mut Config) {
        if let Some(ref dir) = self.dir {
            config.ingest.documents_dir = dir.clone();
        }
        if let Some(size) = self.chunk_size {
            config.ingest.chunk_size = size;
        }
        if let Some(overlap) = self.chunk_overlap {
            config.ingest.chunk_overlap = overlap;
        }
        if let Some(ref name) = self.collection {
            config.store.collection = name.clone();
        }
        if let Some(ref dir) = self.persist_dir {
            config.store.persist_directory = dir.clone();
        }
    }
}

pub async fn handle_ingest(
    args: IngestArgs,
    config: &Config,
    format: OutputFormat,
    verbose: bool,
) -> Result<()> {
    let mut config = config.clone();
    args.apply(&mut config);
    config.validate().context("invalid ingestion settings")?;

    let api_key = config.require_api_key()?;
    let formatter = get_formatter(format);

    if verbose {
        eprintln!("Documents: {}", config.ingest.documents_dir.display());
        eprintln!("  Collection: {}", config.store.collection);
        eprintln!("  Persist dir: {}", config.store.persist_directory.display());
        eprintln!(
            "  Chunk size/overlap: {}/{}",
            config.ingest.chunk_size, config.ingest.chunk_overlap
        );
        eprintln!("  Embedding model: {}", config.openai.embedding_model);
    }

    let embedder = OpenAiEmbedder::new(&config.openai, api_key)
        .context("failed to create embedding client")?;
    let store = open_store(&config)?;

    let pb = if format == OutputFormat::Text {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({eta})",
                )
                .context("invalid progress template")?
                .progress_chars("#>-"),
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    let mut pipeline =
        RagPipeline::new(&config, Arc::new(embedder), store).with_progress(pb.clone());

    let result = pipeline.run(&config.ingest.documents_dir).await;
    pb.finish_and_clear();

    let report = result.context("ingestion failed")?;
    print!("{}", formatter.format_ingest_report(&report));

    Ok(())
}
