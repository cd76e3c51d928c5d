//! Retrieval models for queries, ranked results and coaching replies.

use serde::{Deserialize, Serialize};

use super::document::ChunkMetadata;

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// Machine-parseable JSON format
    Json,
    /// Documentation-friendly Markdown format
    Markdown,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            _ => Err(format!("unknown output format: {}", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

/// A single retrieved chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// Matching chunk ID
    pub chunk_id: String,

    /// Cosine similarity to the query vector
    pub score: f32,

    /// Chunk content
    pub content: String,

    /// Metadata inherited from the parent document
    pub metadata: ChunkMetadata,
}

impl SearchResult {
    /// Location hint: file name and chunk position.
    pub fn location(&self) -> String {
        format!(
            "{} (chunk {}/{})",
            self.metadata.filename,
            self.metadata.chunk_index + 1,
            self.metadata.total_chunks
        )
    }
}

/// Ranked retrieval result for one query, best match first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResults {
    /// Query that was executed
    pub query: String,

    /// Matching results
    pub results: Vec<SearchResult>,

    /// Query execution time in milliseconds
    pub duration_ms: u64,
}

impl SearchResults {
    pub fn new(query: String, results: Vec<SearchResult>, duration_ms: u64) -> Self {
        Self {
            query,
            results,
            duration_ms,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }
}

/// The outcome of one coaching turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoachReply {
    /// The user's stated belief, verbatim
    pub belief: String,

    /// Generated coaching text, or the apology message on failure
    pub reply: String,

    /// Files the retrieved context came from, in retrieval order
    pub sources: Vec<String>,

    /// False when `reply` is an apology
    pub success: bool,
}
