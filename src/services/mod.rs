mod batch;
mod chunker;
mod coach;
mod completion;
mod embedding;
mod openai;
mod pipeline;
pub mod prompt;
mod retriever;
mod vector_store;

pub use batch::process_batch;
pub use chunker::{DEFAULT_SEPARATORS, TextChunker};
pub use coach::{Coach, apology};
pub use completion::{CompletionModel, OpenAiCompletion};
pub use embedding::{Embedder, OpenAiEmbedder};
pub use pipeline::{
    ChunkStats, CollectionStats, IngestReport, PipelineState, RagPipeline, collection_stats,
    staging_collection,
};
pub use retriever::Retriever;
pub use vector_store::{
    CollectionInfo, DATABASE_FILE, SqliteStore, VectorStore, cosine_similarity,
};
