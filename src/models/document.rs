use std::path::Path;

use serde::{Deserialize, Serialize};

use super::file_type::FileType;

/// A loaded source document. Immutable once created by a loader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub content: String,
    pub checksum: String,
    pub metadata: DocumentMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub filename: String,
    pub file_type: FileType,
    pub source: String,
    pub size_bytes: u64,
}

/// Metadata stored alongside every chunk in the vector store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub document_id: String,
    pub filename: String,
    pub file_type: FileType,
    pub source: String,
    pub chunk_index: u32,
    pub total_chunks: u32,
    /// Character offsets of the chunk within the parent document.
    pub start_offset: u64,
    pub end_offset: u64,
}

/// A bounded slice of a document: the unit of embedding, storage and retrieval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub id: String,
    pub content: String,
    pub metadata: ChunkMetadata,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub embedding: Vec<f32>,
}

impl Document {
    pub fn generate_id(source: &str) -> String {
        use sha2::{Digest, Sha256};
        let hash = Sha256::digest(source.as_bytes());
        hex::encode(&hash[..16])
    }

    pub fn new(content: String, path: &Path, file_type: FileType, checksum: String) -> Self {
        let source = path.to_string_lossy().to_string();
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| source.clone());
        let metadata = DocumentMetadata {
            filename,
            file_type,
            size_bytes: content.len() as u64,
            source: source.clone(),
        };
        Self {
            id: Self::generate_id(&source),
            content,
            checksum,
            metadata,
        }
    }

    /// Length of the text in characters.
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}

impl DocumentChunk {
    pub fn generate_id(document_id: &str, chunk_index: u32) -> String {
        use uuid::Uuid;
        let name = format!("{}:{}", document_id, chunk_index);
        Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()).to_string()
    }

    pub fn from_document(
        document: &Document,
        content: String,
        chunk_index: u32,
        total_chunks: u32,
        start_offset: u64,
        end_offset: u64,
    ) -> Self {
        let id = Self::generate_id(&document.id, chunk_index);
        Self {
            id,
            content,
            metadata: ChunkMetadata {
                document_id: document.id.clone(),
                filename: document.metadata.filename.clone(),
                file_type: document.metadata.file_type,
                source: document.metadata.source.clone(),
                chunk_index,
                total_chunks,
                start_offset,
                end_offset,
            },
            embedding: Vec::new(),
        }
    }

    /// Length of the chunk text in characters.
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_generate_id() {
        let id = Document::generate_id("som_documents/01_intent.docx");
        assert_eq!(id.len(), 32);
        assert_eq!(id, Document::generate_id("som_documents/01_intent.docx"));
    }

    #[test]
    fn test_chunk_generate_id() {
        let id = DocumentChunk::generate_id("abc123", 5);
        assert_eq!(id.len(), 36);
        assert!(id.chars().filter(|c| *c == '-').count() == 4);
        let id2 = DocumentChunk::generate_id("abc123", 5);
        assert_eq!(id, id2);
        let id3 = DocumentChunk::generate_id("abc123", 6);
        assert_ne!(id, id3);
    }

    #[test]
    fn test_document_new_metadata() {
        let doc = Document::new(
            "I am not good enough.".to_string(),
            Path::new("docs/belief.txt"),
            FileType::Txt,
            "checksum".to_string(),
        );
        assert_eq!(doc.metadata.filename, "belief.txt");
        assert_eq!(doc.metadata.file_type, FileType::Txt);
        assert_eq!(doc.metadata.source, "docs/belief.txt");
        assert_eq!(doc.char_len(), 21);
    }

    #[test]
    fn test_chunk_inherits_metadata() {
        let doc = Document::new(
            "content".to_string(),
            Path::new("a.docx"),
            FileType::Docx,
            "c".to_string(),
        );
        let chunk = DocumentChunk::from_document(&doc, "content".to_string(), 0, 1, 0, 7);
        assert_eq!(chunk.metadata.document_id, doc.id);
        assert_eq!(chunk.metadata.filename, "a.docx");
        assert_eq!(chunk.metadata.file_type, FileType::Docx);
        assert!(chunk.embedding.is_empty());
    }
}
