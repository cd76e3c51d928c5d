use tracing::debug;

use crate::error::IngestError;
use crate::models::DocumentChunk;
use crate::services::{Embedder, VectorStore};

/// Embed one batch of chunks and store them. Drains `chunks`.
pub async fn process_batch(
    embedder: &dyn Embedder,
    store: &dyn VectorStore,
    collection: &str,
    chunks: &mut Vec<DocumentChunk>,
) -> Result<usize, IngestError> {
    if chunks.is_empty() {
        return Ok(0);
    }

    let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
    let embeddings = embedder.embed_documents(&texts).await?;

    if embeddings.len() != chunks.len() {
        return Err(IngestError::EmbeddingCountMismatch {
            chunks: chunks.len(),
            vectors: embeddings.len(),
        });
    }

    for (chunk, embedding) in chunks.iter_mut().zip(embeddings) {
        chunk.embedding = embedding;
    }

    let batch = std::mem::take(chunks);
    store.upsert(collection, &batch).await?;

    debug!(collection, stored = batch.len(), "stored batch");
    Ok(batch.len())
}
