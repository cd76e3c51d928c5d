mod config;
mod document;
mod file_type;
mod search;

pub use config::{
    Config, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, DEFAULT_COLLECTION,
    DEFAULT_COMPLETION_MODEL, DEFAULT_DOCUMENTS_DIR, DEFAULT_EMBEDDING_MODEL,
    DEFAULT_OPENAI_BASE_URL, DEFAULT_PERSIST_DIR, DEFAULT_TOP_K, IngestConfig, OpenAiConfig,
    RetrievalConfig, StoreConfig,
};
pub use document::{ChunkMetadata, Document, DocumentChunk, DocumentMetadata};
pub use file_type::FileType;
pub use search::{CoachReply, OutputFormat, SearchResult, SearchResults};
