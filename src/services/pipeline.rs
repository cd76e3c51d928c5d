//! One-shot ingestion build.
//!
//! The build always starts from an empty collection and walks
//! `Uninitialized -> StoreReady -> DocumentsLoaded -> IndexBuilt -> QueryReady`.
//!
//! Records are written to a staging collection next to the live one. The live
//! collection is only replaced, in one transaction, once the build finishes,
//! so a failed or interrupted build never leaves a half-filled index behind.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use indicatif::ProgressBar;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{IngestError, VectorStoreError};
use crate::loaders::{DocumentLoader, LoadOutcome, SkippedFile};
use crate::models::{Config, Document, DocumentChunk};
use crate::services::{Embedder, Retriever, TextChunker, VectorStore, process_batch};

const STAGING_SUFFIX: &str = ".building";

/// Name of the collection a build of `collection` writes into.
pub fn staging_collection(collection: &str) -> String {
    format!("{collection}{STAGING_SUFFIX}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Uninitialized,
    StoreReady,
    DocumentsLoaded,
    IndexBuilt,
    QueryReady,
}

impl PipelineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineState::Uninitialized => "uninitialized",
            PipelineState::StoreReady => "store_ready",
            PipelineState::DocumentsLoaded => "documents_loaded",
            PipelineState::IndexBuilt => "index_built",
            PipelineState::QueryReady => "query_ready",
        }
    }
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Chunk length statistics, in characters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChunkStats {
    pub count: usize,
    pub avg_chars: f64,
    pub min_chars: usize,
    pub max_chars: usize,
}

impl ChunkStats {
    pub fn from_chunks(chunks: &[DocumentChunk]) -> Self {
        if chunks.is_empty() {
            return Self::default();
        }
        let lengths: Vec<usize> = chunks.iter().map(DocumentChunk::char_len).collect();
        let total: usize = lengths.iter().sum();
        Self {
            count: lengths.len(),
            avg_chars: total as f64 / lengths.len() as f64,
            min_chars: lengths.iter().copied().min().unwrap_or(0),
            max_chars: lengths.iter().copied().max().unwrap_or(0),
        }
    }
}

/// Summary of a completed build.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub collection: String,
    pub documents_dir: PathBuf,
    pub documents_loaded: usize,
    pub files_skipped: usize,
    pub chunks_created: usize,
    pub collection_count: u64,
    pub chunk_stats: ChunkStats,
    pub duration_ms: u64,
}

/// Drives the build sequence against one collection.
pub struct RagPipeline {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    collection: String,
    staging: String,
    loader: DocumentLoader,
    chunker: TextChunker,
    batch_size: usize,
    progress: Option<ProgressBar>,

    state: PipelineState,
    documents_dir: PathBuf,
    documents: Vec<Document>,
    skipped: Vec<SkippedFile>,
    chunk_stats: ChunkStats,
}

impl RagPipeline {
    pub fn new(config: &Config, embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>) -> Self {
        Self {
            embedder,
            store,
            collection: config.store.collection.clone(),
            staging: staging_collection(&config.store.collection),
            loader: DocumentLoader::new(&config.ingest),
            chunker: TextChunker::new(&config.ingest),
            batch_size: (config.openai.batch_size as usize).max(1),
            progress: None,
            state: PipelineState::Uninitialized,
            documents_dir: config.ingest.documents_dir.clone(),
            documents: Vec::new(),
            skipped: Vec::new(),
            chunk_stats: ChunkStats::default(),
        }
    }

    /// Report embedding progress on this bar (one tick per chunk).
    pub fn with_progress(mut self, bar: ProgressBar) -> Self {
        self.progress = Some(bar);
        self
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Collection the current build writes into until it is swapped in.
    pub fn staging(&self) -> &str {
        &self.staging
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    fn expect_state(&self, expected: PipelineState) -> Result<(), IngestError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(IngestError::InvalidState {
                expected: expected.as_str(),
                actual: self.state.as_str(),
            })
        }
    }

    /// Empty the staging collection. Every build starts here.
    pub async fn setup_store(&mut self) -> Result<(), IngestError> {
        self.state = PipelineState::Uninitialized;
        self.documents.clear();
        self.skipped.clear();
        self.chunk_stats = ChunkStats::default();

        self.store.reset_collection(&self.staging).await?;
        self.state = PipelineState::StoreReady;
        Ok(())
    }

    /// Load every usable document from `dir`.
    pub async fn load_documents(&mut self, dir: &Path) -> Result<usize, IngestError> {
        self.expect_state(PipelineState::StoreReady)?;

        let outcome = self.loader.load_directory(dir)?;
        self.accept_documents(dir, outcome)
    }

    fn accept_documents(&mut self, dir: &Path, outcome: LoadOutcome) -> Result<usize, IngestError> {
        self.expect_state(PipelineState::StoreReady)?;

        for skipped in &outcome.skipped {
            info!(path = %skipped.path.display(), reason = %skipped.reason, "skipped file");
        }
        info!(documents = outcome.documents.len(), "documents loaded");

        self.documents_dir = dir.to_path_buf();
        self.documents = outcome.documents;
        self.skipped = outcome.skipped;
        self.state = PipelineState::DocumentsLoaded;
        Ok(self.documents.len())
    }

    /// Chunk, embed and store every loaded document.
    pub async fn build_index(&mut self) -> Result<usize, IngestError> {
        self.expect_state(PipelineState::DocumentsLoaded)?;

        let chunks: Vec<DocumentChunk> = self
            .documents
            .iter()
            .flat_map(|doc| self.chunker.chunk(doc))
            .collect();

        self.chunk_stats = ChunkStats::from_chunks(&chunks);
        info!(
            chunks = self.chunk_stats.count,
            avg_chars = self.chunk_stats.avg_chars,
            min_chars = self.chunk_stats.min_chars,
            max_chars = self.chunk_stats.max_chars,
            "created chunks"
        );

        if let Some(bar) = &self.progress {
            bar.set_length(chunks.len() as u64);
        }

        let mut stored = 0;
        for batch in chunks.chunks(self.batch_size) {
            let mut batch = batch.to_vec();
            stored += process_batch(
                self.embedder.as_ref(),
                self.store.as_ref(),
                &self.staging,
                &mut batch,
            )
            .await?;
            if let Some(bar) = &self.progress {
                bar.set_position(stored as u64);
            }
        }

        info!(collection = %self.staging, records = stored, "stored chunks");
        self.state = PipelineState::IndexBuilt;
        Ok(stored)
    }

    /// Swap the built index in place of the live collection and hand out a retriever.
    pub async fn finish(&mut self) -> Result<Retriever, IngestError> {
        self.expect_state(PipelineState::IndexBuilt)?;

        let count = self.store.count(&self.staging).await?;
        if count as usize != self.chunk_stats.count {
            warn!(
                expected = self.chunk_stats.count,
                actual = count,
                "collection count differs from chunks created"
            );
        }

        self.store
            .replace_collection(&self.staging, &self.collection)
            .await?;
        info!(collection = %self.collection, records = count, "collection replaced");

        self.state = PipelineState::QueryReady;
        Ok(self.retriever())
    }

    /// A retriever over this pipeline's collection.
    pub fn retriever(&self) -> Retriever {
        Retriever::new(self.embedder.clone(), self.store.clone(), self.collection.clone())
    }

    /// Run the whole build.
    ///
    /// The directory is scanned before the store is touched, so a missing or
    /// empty directory leaves the live collection as it was. Any later failure
    /// drops the staging collection; the live one is only ever replaced whole.
    pub async fn run(&mut self, dir: &Path) -> Result<IngestReport, IngestError> {
        let start = Instant::now();

        let outcome = match self.loader.load_directory(dir) {
            Ok(outcome) => outcome,
            Err(e) => {
                self.state = PipelineState::Uninitialized;
                return Err(e.into());
            }
        };

        if let Err(e) = self.run_steps(dir, outcome).await {
            self.state = PipelineState::Uninitialized;
            if let Err(cleanup) = self.store.delete_collection(&self.staging).await {
                warn!(error = %cleanup, "failed to remove staging collection");
            }
            return Err(e);
        }

        let collection_count = self.store.count(&self.collection).await?;
        let report = IngestReport {
            collection: self.collection.clone(),
            documents_dir: self.documents_dir.clone(),
            documents_loaded: self.documents.len(),
            files_skipped: self.skipped.len(),
            chunks_created: self.chunk_stats.count,
            collection_count,
            chunk_stats: self.chunk_stats.clone(),
            duration_ms: start.elapsed().as_millis() as u64,
        };

        info!(
            documents = report.documents_loaded,
            chunks = report.chunks_created,
            count = report.collection_count,
            duration_ms = report.duration_ms,
            "ingestion complete"
        );
        Ok(report)
    }

    async fn run_steps(&mut self, dir: &Path, outcome: LoadOutcome) -> Result<(), IngestError> {
        self.setup_store().await?;
        self.accept_documents(dir, outcome)?;
        self.build_index().await?;
        self.finish().await?;
        Ok(())
    }
}

/// Collection statistics for `status`.
#[derive(Debug, Clone, Serialize)]
pub struct CollectionStats {
    pub collection: String,
    pub persist_directory: PathBuf,
    pub exists: bool,
    pub total_chunks: u64,
    pub dimension: Option<usize>,
    pub created_at: Option<String>,
    pub embedding_model: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

pub async fn collection_stats(
    store: &dyn VectorStore,
    config: &Config,
) -> Result<CollectionStats, VectorStoreError> {
    let info = store.collection_info(&config.store.collection).await?;

    Ok(CollectionStats {
        collection: config.store.collection.clone(),
        persist_directory: config.store.persist_directory.clone(),
        exists: info.is_some(),
        total_chunks: info.as_ref().map_or(0, |i| i.points_count),
        dimension: info.as_ref().and_then(|i| i.dimension),
        created_at: info.map(|i| i.created_at),
        embedding_model: config.openai.embedding_model.clone(),
        chunk_size: config.ingest.chunk_size,
        chunk_overlap: config.ingest.chunk_overlap,
    })
}
