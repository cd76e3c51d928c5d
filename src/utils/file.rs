//! File utilities for document loading.

use sha2::{Digest, Sha256};
use std::fs;
use std::io::Read;
use std::path::Path;

/// Calculate SHA-256 checksum of content.
pub fn calculate_checksum(content: &str) -> String {
    let hash = Sha256::digest(content.as_bytes());
    hex::encode(hash)
}

/// Read file bytes with a size limit.
pub fn read_file_bytes(path: &Path, max_size: u64) -> std::io::Result<Vec<u8>> {
    let metadata = fs::metadata(path)?;

    if metadata.len() > max_size {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!(
                "file exceeds maximum size: {} > {}",
                metadata.len(),
                max_size
            ),
        ));
    }

    let mut buffer = Vec::with_capacity(metadata.len() as usize);
    fs::File::open(path)?.read_to_end(&mut buffer)?;
    Ok(buffer)
}

/// Read file content as UTF-8 with a size limit.
pub fn read_file_content(path: &Path, max_size: u64) -> std::io::Result<String> {
    let bytes = read_file_bytes(path, max_size)?;
    String::from_utf8(bytes)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
}

/// Dotfiles (leading `.`) are never documents.
pub fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_calculate_checksum() {
        let checksum = calculate_checksum("hello world");
        assert_eq!(checksum.len(), 64);
        assert_eq!(checksum, calculate_checksum("hello world"));
    }

    #[test]
    fn test_read_file_content_respects_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.txt");
        fs::write(&path, "x".repeat(100)).unwrap();

        assert!(read_file_content(&path, 10).is_err());
        assert_eq!(read_file_content(&path, 100).unwrap().len(), 100);
    }

    #[test]
    fn test_read_file_content_rejects_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.txt");
        fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();

        let err = read_file_content(&path, 1024).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_is_hidden() {
        assert!(is_hidden(&PathBuf::from("docs/.DS_Store")));
        assert!(!is_hidden(&PathBuf::from("docs/01_intent.docx")));
    }
}
