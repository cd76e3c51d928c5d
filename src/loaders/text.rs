//! Plain-text extractor.

use std::path::Path;

use super::DocumentExtractor;
use crate::error::LoaderError;
use crate::models::FileType;
use crate::utils::read_file_content;

/// Reads `.txt` files as UTF-8.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

impl DocumentExtractor for PlainTextExtractor {
    fn file_type(&self) -> FileType {
        FileType::Txt
    }

    fn extract(&self, path: &Path, max_size: u64) -> Result<String, LoaderError> {
        read_file_content(path, max_size).map_err(|source| LoaderError::ReadError {
            path: path.to_path_buf(),
            source,
        })
    }
}
