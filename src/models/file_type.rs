//! File type model for tracking how a document was extracted.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Type of a source document, selected by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// UTF-8 plain text (`.txt`)
    Txt,
    /// Office Open XML word-processor document (`.docx`)
    Docx,
}

impl FileType {
    /// All supported file types.
    pub const ALL: [FileType; 2] = [FileType::Txt, FileType::Docx];

    /// Lowercase extension without the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            FileType::Txt => "txt",
            FileType::Docx => "docx",
        }
    }

    /// Detect the file type from a path's extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl std::str::FromStr for FileType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "txt" => Ok(FileType::Txt),
            "docx" => Ok(FileType::Docx),
            other => Err(format!("unsupported file type: {}", other)),
        }
    }
}
