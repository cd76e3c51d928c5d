//! Query-time similarity retrieval.

use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use crate::error::QueryError;
use crate::models::{SearchResult, SearchResults};
use crate::services::{Embedder, VectorStore};
use crate::utils::has_text;

/// Embeds a query and returns the most similar stored chunks.
///
/// Holds no state beyond its handles; each call is independent.
#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    collection: String,
}

impl Retriever {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            embedder,
            store,
            collection: collection.into(),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Ranked chunks for `query`, best first, at most `top_k`.
    pub async fn retrieve(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<SearchResult>, QueryError> {
        if !has_text(query) {
            return Err(QueryError::InvalidQuery("query is empty".to_string()));
        }

        let vector = self.embedder.embed_query(query).await?;
        let results = self.store.query(&self.collection, &vector, top_k).await?;

        debug!(
            collection = %self.collection,
            top_k,
            retrieved = results.len(),
            "retrieved chunks"
        );
        Ok(results)
    }

    /// Like [`retrieve`](Self::retrieve), timed and wrapped for display.
    pub async fn search(&self, query: &str, top_k: usize) -> Result<SearchResults, QueryError> {
        let start = Instant::now();
        let results = self.retrieve(query, top_k).await?;
        Ok(SearchResults::new(
            query.to_string(),
            results,
            start.elapsed().as_millis() as u64,
        ))
    }
}
