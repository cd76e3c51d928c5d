mod ask;
mod chat;
mod config;
mod ingest;
mod search;
mod status;

pub use ask::AskArgs;
pub use chat::ChatArgs;
pub use config::ConfigCommand;
pub use ingest::IngestArgs;
pub use search::SearchArgs;

pub use ask::handle_ask;
pub use chat::handle_chat;
pub use config::handle_config;
pub use ingest::handle_ingest;
pub use search::handle_search;
pub use status::handle_status;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::warn;

use crate::models::Config;
use crate::services::{
    Coach, OpenAiCompletion, OpenAiEmbedder, Retriever, SqliteStore, VectorStore,
};

/// Resolve a `--top-k` override against the configured default.
fn resolve_top_k(config: &Config, top_k: Option<usize>) -> Result<usize> {
    let top_k = top_k.unwrap_or(config.retrieval.top_k);
    if top_k == 0 {
        anyhow::bail!("top-k must be at least 1");
    }
    Ok(top_k)
}

fn open_store(config: &Config) -> Result<Arc<SqliteStore>> {
    let store = SqliteStore::open(&config.store.persist_directory).with_context(|| {
        format!(
            "failed to open vector store at {}",
            config.store.persist_directory.display()
        )
    })?;
    Ok(Arc::new(store))
}

fn build_retriever(config: &Config, api_key: &str, store: Arc<SqliteStore>) -> Result<Retriever> {
    let embedder = OpenAiEmbedder::new(&config.openai, api_key)
        .context("failed to create embedding client")?;
    Ok(Retriever::new(
        Arc::new(embedder),
        store,
        config.store.collection.clone(),
    ))
}

/// Everything needed to answer beliefs against the persisted collection.
async fn build_coach(config: &Config, top_k: usize) -> Result<Coach> {
    let api_key = config.require_api_key()?;
    let completion = OpenAiCompletion::new(&config.openai, api_key)
        .context("failed to create completion client")?;

    let store = open_store(config)?;
    if let Ok(0) = store.count(&config.store.collection).await {
        warn!(
            collection = %config.store.collection,
            "knowledge base is empty; run `mindshift ingest` first"
        );
    }

    let retriever = build_retriever(config, api_key, store)?;
    Ok(Coach::new(retriever, Arc::new(completion), top_k))
}
