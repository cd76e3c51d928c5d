//! Document loaders.
//!
//! Each supported file type has an extractor registered under its extension.
//! A file whose extension has no extractor is skipped, never fatal.

mod docx;
mod text;

pub use docx::{DocxExtractor, parse_paragraphs};
pub use text::PlainTextExtractor;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::LoaderError;
use crate::models::{Document, FileType, IngestConfig};
use crate::utils::{calculate_checksum, char_len, has_text, is_hidden};

/// Extracts the text of one file type.
pub trait DocumentExtractor: Send + Sync {
    /// The file type this extractor handles.
    fn file_type(&self) -> FileType;

    /// Extract the textual content of the file at `path`.
    fn extract(&self, path: &Path, max_size: u64) -> Result<String, LoaderError>;
}

/// Extractors keyed by lowercase file extension.
#[derive(Default)]
pub struct ExtractorRegistry {
    extractors: BTreeMap<String, Box<dyn DocumentExtractor>>,
}

impl ExtractorRegistry {
    /// Registry with no extractors.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry with every built-in extractor.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(PlainTextExtractor));
        registry.register(Box::new(DocxExtractor));
        registry
    }

    pub fn register(&mut self, extractor: Box<dyn DocumentExtractor>) {
        let ext = extractor.file_type().extension().to_string();
        self.extractors.insert(ext, extractor);
    }

    pub fn get(&self, extension: &str) -> Option<&dyn DocumentExtractor> {
        self.extractors
            .get(&extension.to_lowercase())
            .map(AsRef::as_ref)
    }

    pub fn supported_extensions(&self) -> Vec<&str> {
        self.extractors.keys().map(String::as_str).collect()
    }
}

/// A file that was found but produced no document.
#[derive(Debug, Clone)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Result of scanning a documents directory.
#[derive(Debug, Default)]
pub struct LoadOutcome {
    pub documents: Vec<Document>,
    pub skipped: Vec<SkippedFile>,
}

/// Loads every supported document from a directory.
pub struct DocumentLoader {
    registry: ExtractorRegistry,
    recursive: bool,
    exclude_patterns: Vec<glob::Pattern>,
    max_file_size: u64,
}

impl DocumentLoader {
    pub fn new(config: &IngestConfig) -> Self {
        let exclude_patterns = config
            .exclude_patterns
            .iter()
            .filter_map(|p| match glob::Pattern::new(p) {
                Ok(pattern) => Some(pattern),
                Err(e) => {
                    warn!(pattern = %p, error = %e, "ignoring invalid exclude pattern");
                    None
                }
            })
            .collect();

        Self {
            registry: ExtractorRegistry::with_defaults(),
            recursive: config.recursive,
            exclude_patterns,
            max_file_size: config.max_file_size,
        }
    }

    /// Replace the extractor registry.
    pub fn with_registry(mut self, registry: ExtractorRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Collect candidate files in sorted path order.
    pub fn collect_files(&self, dir: &Path) -> Result<Vec<PathBuf>, LoaderError> {
        if !dir.is_dir() {
            return Err(LoaderError::DirectoryNotFound(dir.to_path_buf()));
        }

        let max_depth = if self.recursive { usize::MAX } else { 1 };
        let mut files = Vec::new();

        for entry in WalkDir::new(dir)
            .max_depth(max_depth)
            .follow_links(false)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| LoaderError::WalkError(e.to_string()))?;
            let path = entry.path();

            if !entry.file_type().is_file() || is_hidden(path) {
                continue;
            }

            let path_str = path.to_string_lossy();
            if self.exclude_patterns.iter().any(|p| p.matches(&path_str)) {
                debug!(path = %path.display(), "excluded by pattern");
                continue;
            }

            files.push(path.to_path_buf());
        }

        Ok(files)
    }

    /// Load one file. Returns `Ok(None)` when the file has no non-blank text.
    pub fn load_file(&self, path: &Path) -> Result<Option<Document>, LoaderError> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        let extractor = self
            .registry
            .get(&ext)
            .ok_or_else(|| LoaderError::Unsupported(ext.clone()))?;

        let content = extractor.extract(path, self.max_file_size)?;
        if !has_text(&content) {
            return Ok(None);
        }

        let checksum = calculate_checksum(&content);
        Ok(Some(Document::new(
            content,
            path,
            extractor.file_type(),
            checksum,
        )))
    }

    /// Load every supported document in `dir`.
    ///
    /// Per-file failures are logged and skipped. A missing directory or an
    /// empty result is an error.
    pub fn load_directory(&self, dir: &Path) -> Result<LoadOutcome, LoaderError> {
        info!(dir = %dir.display(), "loading documents");

        let mut outcome = LoadOutcome::default();

        for path in self.collect_files(dir)? {
            match self.load_file(&path) {
                Ok(Some(document)) => {
                    info!(
                        file = %document.metadata.filename,
                        chars = char_len(&document.content),
                        "loaded document"
                    );
                    outcome.documents.push(document);
                }
                Ok(None) => {
                    info!(path = %path.display(), "skipping file with no text");
                    outcome.skipped.push(SkippedFile {
                        path,
                        reason: "no extractable text".to_string(),
                    });
                }
                Err(LoaderError::Unsupported(ext)) => {
                    debug!(path = %path.display(), extension = %ext, "unsupported file type");
                    outcome.skipped.push(SkippedFile {
                        path,
                        reason: format!("unsupported file type .{ext}"),
                    });
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to load document");
                    outcome.skipped.push(SkippedFile {
                        path,
                        reason: e.to_string(),
                    });
                }
            }
        }

        if outcome.documents.is_empty() {
            return Err(LoaderError::NoDocuments(dir.to_path_buf()));
        }

        info!(
            documents = outcome.documents.len(),
            skipped = outcome.skipped.len(),
            "finished loading documents"
        );
        Ok(outcome)
    }
}
