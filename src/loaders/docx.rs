//! Word-processor (`.docx`) extractor.
//!
//! A `.docx` file is a ZIP archive; the body lives in `word/document.xml`
//! as a sequence of `<w:p>` paragraphs made of `<w:r>` runs holding `<w:t>`
//! text.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::Event;
use zip::ZipArchive;

use super::DocumentExtractor;
use crate::error::LoaderError;
use crate::models::FileType;

const DOCUMENT_XML: &str = "word/document.xml";

/// Extracts paragraph text from `.docx` files.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocxExtractor;

impl DocumentExtractor for DocxExtractor {
    fn file_type(&self) -> FileType {
        FileType::Docx
    }

    fn extract(&self, path: &Path, max_size: u64) -> Result<String, LoaderError> {
        let parse_err = |message: String| LoaderError::ParseError {
            path: path.to_path_buf(),
            message,
        };

        let size = std::fs::metadata(path)
            .map_err(|source| LoaderError::ReadError {
                path: path.to_path_buf(),
                source,
            })?
            .len();
        if size > max_size {
            return Err(parse_err(format!(
                "file exceeds maximum size: {} > {}",
                size, max_size
            )));
        }

        let file = File::open(path).map_err(|source| LoaderError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        let mut archive =
            ZipArchive::new(file).map_err(|e| parse_err(format!("not a DOCX archive: {e}")))?;

        let xml = {
            let entry = archive
                .by_name(DOCUMENT_XML)
                .map_err(|e| parse_err(format!("missing {DOCUMENT_XML}: {e}")))?;
            if entry.size() > max_size {
                return Err(parse_err(format!(
                    "{DOCUMENT_XML} exceeds maximum size: {} > {}",
                    entry.size(),
                    max_size
                )));
            }

            // The declared size can lie; never inflate past the limit.
            let mut content = String::new();
            entry
                .take(max_size.saturating_add(1))
                .read_to_string(&mut content)
                .map_err(|source| LoaderError::ReadError {
                    path: path.to_path_buf(),
                    source,
                })?;
            if content.len() as u64 > max_size {
                return Err(parse_err(format!(
                    "{DOCUMENT_XML} exceeds maximum size of {max_size} bytes"
                )));
            }
            content
        };

        let paragraphs = parse_paragraphs(&xml).map_err(|e| parse_err(e.to_string()))?;

        Ok(paragraphs
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

/// Parse `word/document.xml` into paragraph texts, in document order.
///
/// Paragraphs are returned untrimmed; blank ones are kept.
pub fn parse_paragraphs(xml: &str) -> Result<Vec<String>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();

    let mut paragraphs = Vec::new();
    // Text boxes nest paragraphs inside paragraphs.
    let mut open: Vec<String> = Vec::new();
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"w:p" => open.push(String::new()),
                b"w:t" => in_text = true,
                _ => {}
            },
            Event::Empty(e) => {
                if let Some(current) = open.last_mut() {
                    match e.name().as_ref() {
                        b"w:tab" => current.push('\t'),
                        b"w:br" | b"w:cr" => current.push('\n'),
                        _ => {}
                    }
                }
            }
            Event::Text(t) if in_text => {
                let text = t.unescape()?;
                if let Some(current) = open.last_mut() {
                    current.push_str(&text);
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => {
                    if let Some(paragraph) = open.pop() {
                        paragraphs.push(paragraph);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(paragraphs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    const BODY: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p><w:r><w:t>Intent</w:t></w:r></w:p>
    <w:p><w:r><w:t xml:space="preserve">  Every behavior has a </w:t></w:r><w:r><w:t>positive intention.</w:t></w:r></w:p>
    <w:p/>
    <w:p><w:r><w:t>   </w:t></w:r></w:p>
    <w:p><w:r><w:t>Ask &amp; listen</w:t><w:br/><w:t>then reframe</w:t></w:r></w:p>
  </w:body>
</w:document>"#;

    fn write_docx(path: &Path, document_xml: &str) {
        let file = File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        zip.start_file(DOCUMENT_XML, SimpleFileOptions::default())
            .unwrap();
        zip.write_all(document_xml.as_bytes()).unwrap();
        zip.finish().unwrap();
    }

    #[test]
    fn test_parse_paragraphs() {
        let paragraphs = parse_paragraphs(BODY).unwrap();
        assert_eq!(paragraphs.len(), 4);
        assert_eq!(paragraphs[0], "Intent");
        assert_eq!(
            paragraphs[1],
            "  Every behavior has a positive intention."
        );
        assert_eq!(paragraphs[2], "   ");
        assert_eq!(paragraphs[3], "Ask & listen\nthen reframe");
    }

    #[test]
    fn test_extract_docx() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("01_intent.docx");
        write_docx(&path, BODY);

        let text = DocxExtractor.extract(&path, 1024 * 1024).unwrap();
        assert_eq!(
            text,
            "Intent\nEvery behavior has a positive intention.\nAsk & listen\nthen reframe"
        );
    }

    #[test]
    fn test_extract_missing_document_xml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.docx");
        let file = File::create(&path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        zip.start_file("docProps/core.xml", SimpleFileOptions::default())
            .unwrap();
        zip.write_all(b"<cp:coreProperties/>").unwrap();
        zip.finish().unwrap();

        let err = DocxExtractor.extract(&path, 1024 * 1024).unwrap_err();
        assert!(matches!(err, LoaderError::ParseError { .. }));
    }

    #[test]
    fn test_extract_limits_inflated_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bomb.docx");
        let paragraph = format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", "a".repeat(50_000));
        let xml = BODY.replace("<w:p/>", &paragraph);

        let file = File::create(&path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
        zip.start_file(DOCUMENT_XML, options).unwrap();
        zip.write_all(xml.as_bytes()).unwrap();
        zip.finish().unwrap();

        let archive_size = std::fs::metadata(&path).unwrap().len();
        let limit = 8 * 1024;
        assert!(archive_size < limit, "archive is {archive_size} bytes");

        let err = DocxExtractor.extract(&path, limit).unwrap_err();
        assert!(matches!(err, LoaderError::ParseError { .. }));
        assert!(err.to_string().contains("exceeds maximum size"));

        assert!(DocxExtractor.extract(&path, 1024 * 1024).is_ok());
    }

    #[test]
    fn test_extract_not_a_zip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.docx");
        std::fs::write(&path, "plain text pretending").unwrap();

        let err = DocxExtractor.extract(&path, 1024).unwrap_err();
        assert!(err.to_string().contains("not a DOCX archive"));
    }
}
