//! Recursive text chunking with overlap.
//!
//! Text is split on the coarsest separator present (paragraph, line, space,
//! then single characters), pieces shorter than the chunk size are merged
//! greedily, and each new chunk starts with the trailing pieces of the
//! previous one, up to the overlap length. Lengths are counted in chars.

use std::collections::VecDeque;

use tracing::warn;

use crate::models::{Document, DocumentChunk, IngestConfig};
use crate::utils::char_len;

/// Separators in priority order. The empty separator splits into characters.
pub const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Text chunker that splits documents into overlapping chunks.
#[derive(Debug, Clone)]
pub struct TextChunker {
    /// Maximum chunk length in characters
    chunk_size: usize,
    /// Overlap between consecutive chunks in characters
    overlap: usize,
    separators: Vec<String>,
}

impl TextChunker {
    /// Create a new text chunker with the given configuration.
    pub fn new(config: &IngestConfig) -> Self {
        Self::with_sizes(config.chunk_size, config.chunk_overlap)
    }

    /// Create a chunker with explicit sizes. `overlap` is clamped below `chunk_size`.
    pub fn with_sizes(chunk_size: usize, overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            overlap: overlap.min(chunk_size - 1),
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Create a chunker with default settings.
    pub fn with_defaults() -> Self {
        Self::new(&IngestConfig::default())
    }

    /// Replace the separator list (highest priority first).
    pub fn with_separators(mut self, separators: Vec<String>) -> Self {
        self.separators = separators;
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Chunk a document, preserving order and recording offsets.
    pub fn chunk(&self, document: &Document) -> Vec<DocumentChunk> {
        let content = &document.content;
        if content.is_empty() {
            return Vec::new();
        }

        let pieces = self.split_text(content);
        let total_chunks = pieces.len() as u32;

        let mut chunks = Vec::with_capacity(pieces.len());
        let mut index = 0usize;
        let mut previous_len = 0usize;

        for (idx, piece) in pieces.into_iter().enumerate() {
            let search_from = (index + previous_len).saturating_sub(self.overlap);
            index = find_char_offset(content, &piece, search_from).unwrap_or(search_from);
            previous_len = char_len(&piece);

            chunks.push(DocumentChunk::from_document(
                document,
                piece,
                idx as u32,
                total_chunks,
                index as u64,
                (index + previous_len) as u64,
            ));
        }

        chunks
    }

    /// Split raw text into chunk strings.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &self.separators)
    }

    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        let mut separator = separators.last().map(String::as_str).unwrap_or("");
        let mut finer: &[String] = &[];

        for (i, candidate) in separators.iter().enumerate() {
            if candidate.is_empty() {
                separator = "";
                break;
            }
            if text.contains(candidate.as_str()) {
                separator = candidate;
                finer = &separators[i + 1..];
                break;
            }
        }

        let mut chunks = Vec::new();
        let mut fitting: Vec<&str> = Vec::new();

        for piece in split_keeping_separator(text, separator) {
            if char_len(piece) < self.chunk_size {
                fitting.push(piece);
                continue;
            }

            if !fitting.is_empty() {
                chunks.extend(self.merge_pieces(&fitting));
                fitting.clear();
            }

            if finer.is_empty() {
                // Nothing finer to split on; this piece overflows as-is.
                let trimmed = piece.trim();
                if !trimmed.is_empty() {
                    chunks.push(trimmed.to_string());
                }
            } else {
                chunks.extend(self.split_recursive(piece, finer));
            }
        }

        if !fitting.is_empty() {
            chunks.extend(self.merge_pieces(&fitting));
        }

        chunks
    }

    fn merge_pieces(&self, pieces: &[&str]) -> Vec<String> {
        let mut merged = Vec::new();
        let mut window: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for &piece in pieces {
            let len = char_len(piece);

            if total + len > self.chunk_size {
                if total > self.chunk_size {
                    warn!(
                        size = total,
                        limit = self.chunk_size,
                        "created a chunk longer than the chunk size"
                    );
                }
                if !window.is_empty() {
                    if let Some(chunk) = join_window(&window) {
                        merged.push(chunk);
                    }
                    while total > self.overlap || (total + len > self.chunk_size && total > 0) {
                        match window.pop_front() {
                            Some(front) => total -= char_len(front),
                            None => break,
                        }
                    }
                }
            }

            window.push_back(piece);
            total += len;
        }

        if let Some(chunk) = join_window(&window) {
            merged.push(chunk);
        }

        merged
    }
}

/// Split on `separator`, attaching each separator to the piece that follows it.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return text
            .char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect();
    }

    let mut pieces = Vec::new();
    let mut start = 0;
    for (idx, _) in text.match_indices(separator) {
        if idx > start {
            pieces.push(&text[start..idx]);
        }
        start = idx;
    }
    pieces.push(&text[start..]);
    pieces.retain(|p| !p.is_empty());
    pieces
}

fn join_window(window: &VecDeque<&str>) -> Option<String> {
    let joined: String = window.iter().copied().collect();
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Char offset of `needle` in `haystack`, searching from char offset `from`.
fn find_char_offset(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    let from_byte = haystack
        .char_indices()
        .nth(from)
        .map_or(haystack.len(), |(b, _)| b);

    let found = haystack[from_byte..]
        .find(needle)
        .map(|b| from_byte + b)
        .or_else(|| haystack.find(needle))?;

    Some(haystack[..found].chars().count())
}
