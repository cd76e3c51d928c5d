//! Vector store abstraction layer.
//!
//! A store holds named collections of (chunk text, vector, metadata) records
//! and answers top-k similarity queries against them.

mod sqlite;

pub use sqlite::{DATABASE_FILE, SqliteStore};

use async_trait::async_trait;
use serde::Serialize;

use crate::error::VectorStoreError;
use crate::models::{DocumentChunk, SearchResult};

/// Collection information
#[derive(Debug, Clone, Serialize)]
pub struct CollectionInfo {
    pub name: String,
    pub points_count: u64,
    /// Vector dimension, fixed by the first upsert
    pub dimension: Option<usize>,
    pub created_at: String,
}

/// Abstract trait for vector store operations.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create the collection if it doesn't exist.
    async fn create_collection(&self, collection: &str) -> Result<(), VectorStoreError>;

    /// Delete the collection and all its records. Returns whether it existed.
    async fn delete_collection(&self, collection: &str) -> Result<bool, VectorStoreError>;

    /// Drop every record and recreate the collection empty.
    async fn reset_collection(&self, collection: &str) -> Result<(), VectorStoreError>;

    /// Atomically drop `target` and rename `source` to take its place.
    async fn replace_collection(
        &self,
        source: &str,
        target: &str,
    ) -> Result<(), VectorStoreError>;

    /// Insert or replace chunks (matched by chunk id) with their embeddings.
    async fn upsert(
        &self,
        collection: &str,
        chunks: &[DocumentChunk],
    ) -> Result<(), VectorStoreError>;

    /// Return at most `top_k` records, most similar first.
    async fn query(
        &self,
        collection: &str,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>, VectorStoreError>;

    /// Number of stored records. A missing collection counts as empty.
    async fn count(&self, collection: &str) -> Result<u64, VectorStoreError>;

    /// Returns None if the collection doesn't exist.
    async fn collection_info(
        &self,
        collection: &str,
    ) -> Result<Option<CollectionInfo>, VectorStoreError>;
}

/// Cosine similarity of two equal-length vectors. Zero vectors score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }
}
