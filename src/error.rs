//! Error types for the MindShift coaching pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Errors related to configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("invalid value for {key}: {value}")]
    InvalidEnvValue { key: String, value: String },

    #[error("OPENAI_API_KEY is not set; add it to the environment or a .env file")]
    MissingApiKey,
}

/// Errors raised while reading documents from disk.
#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("documents directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {message}", path.display())]
    ParseError { path: PathBuf, message: String },

    #[error("no extractor registered for .{0} files")]
    Unsupported(String),

    #[error("directory walk error: {0}")]
    WalkError(String),

    #[error("no valid documents found in {}", .0.display())]
    NoDocuments(PathBuf),
}

/// Errors related to embedding operations.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("failed to connect to embedding service: {0}")]
    ConnectionError(String),

    #[error("embedding service error: {0}")]
    ServerError(String),

    #[error("embedding request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("invalid embedding response: {0}")]
    InvalidResponse(String),

    #[error("embedding timeout")]
    Timeout,
}

/// Errors related to the language-model completion service.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("failed to connect to completion service: {0}")]
    ConnectionError(String),

    #[error("completion service error: {0}")]
    ServerError(String),

    #[error("completion request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("invalid completion response: {0}")]
    InvalidResponse(String),

    #[error("completion timeout")]
    Timeout,
}

/// Errors related to vector store operations.
#[derive(Debug, Error)]
pub enum VectorStoreError {
    #[error("failed to open vector store: {0}")]
    ConnectionError(String),

    #[error("collection not found: {0}")]
    CollectionNotFound(String),

    #[error("collection error: {0}")]
    CollectionError(String),

    #[error("upsert error: {0}")]
    UpsertError(String),

    #[error("search error: {0}")]
    SearchError(String),

    #[error("delete error: {0}")]
    DeleteError(String),

    #[error("dimension mismatch: collection expects {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("store lock poisoned")]
    LockPoisoned,
}

/// Errors raised by the one-shot ingestion build.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Loader(#[from] LoaderError),

    #[error("embedding error: {0}")]
    EmbeddingError(#[from] EmbeddingError),

    #[error("vector store error: {0}")]
    VectorStoreError(#[from] VectorStoreError),

    #[error("embedding count mismatch: {chunks} chunks, {vectors} vectors")]
    EmbeddingCountMismatch { chunks: usize, vectors: usize },

    #[error("pipeline is {actual}, expected {expected}")]
    InvalidState {
        expected: &'static str,
        actual: &'static str,
    },
}

/// Errors raised while answering a single query.
///
/// These never escape the responder: they are rendered into the reply text.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("embedding error: {0}")]
    EmbeddingError(#[from] EmbeddingError),

    #[error("vector store error: {0}")]
    VectorStoreError(#[from] VectorStoreError),

    #[error("completion error: {0}")]
    CompletionError(#[from] CompletionError),

    #[error("no relevant context was retrieved for the query")]
    EmptyRetrieval,

    #[error("invalid query: {0}")]
    InvalidQuery(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_carry_detail() {
        let err = QueryError::from(EmbeddingError::ConnectionError(
            "connection refused".to_string(),
        ));
        assert!(err.to_string().contains("connection refused"));

        let err = IngestError::from(LoaderError::NoDocuments(PathBuf::from("./som_documents")));
        assert_eq!(
            err.to_string(),
            "no valid documents found in ./som_documents"
        );
    }

    #[test]
    fn test_dimension_mismatch_message() {
        let err = VectorStoreError::DimensionMismatch {
            expected: 3,
            actual: 4,
        };
        assert_eq!(
            err.to_string(),
            "dimension mismatch: collection expects 3, got 4"
        );
    }
}
