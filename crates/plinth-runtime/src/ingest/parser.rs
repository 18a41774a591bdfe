//! Text extraction, selected by MIME type.
//!
//! Parsers must not silently lose content: extraction that yields no text is
//! an error, and MIME types without a registered parser fail the source with
//! a clear message.

use std::io::{Cursor, Read};

use bytes::Bytes;

use crate::TRACING_TARGET;
use crate::error::{RuntimeError, RuntimeResult};

/// Document formats the ingestion pipeline can extract text from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// PDF documents.
    Pdf,
    /// HTML and XML, stripped to text.
    Html,
    /// CSV, row-preserving.
    Csv,
    /// OOXML word processing (`.docx`).
    Docx,
    /// OOXML spreadsheets (`.xlsx`).
    Xlsx,
    /// OOXML presentations (`.pptx`).
    Pptx,
    /// OpenDocument formats (`.odt`, `.ods`, `.odp`).
    OpenDocument,
    /// Plain text and markdown, passed through.
    Text,
}

impl DocumentFormat {
    /// Selects a format for a MIME type.
    pub fn from_mime(mime_type: &str) -> Option<Self> {
        let mime = mime_type
            .split(';')
            .next()
            .unwrap_or(mime_type)
            .trim()
            .to_ascii_lowercase();

        match mime.as_str() {
            "application/pdf" => Some(Self::Pdf),
            "text/html" | "application/xhtml+xml" | "text/xml" | "application/xml" => {
                Some(Self::Html)
            }
            "text/csv" => Some(Self::Csv),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
                Some(Self::Docx)
            }
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" => {
                Some(Self::Xlsx)
            }
            "application/vnd.openxmlformats-officedocument.presentationml.presentation" => {
                Some(Self::Pptx)
            }
            "application/vnd.oasis.opendocument.text"
            | "application/vnd.oasis.opendocument.spreadsheet"
            | "application/vnd.oasis.opendocument.presentation" => Some(Self::OpenDocument),
            _ if mime.starts_with("text/") => Some(Self::Text),
            "application/json" => Some(Self::Text),
            _ => None,
        }
    }
}

/// Extracts text from a document, selecting the parser by MIME type.
pub fn parse_document(mime_type: &str, content: &Bytes) -> RuntimeResult<String> {
    let format = DocumentFormat::from_mime(mime_type)
        .ok_or_else(|| RuntimeError::UnsupportedMime(mime_type.to_string()))?;

    let text = match format {
        DocumentFormat::Pdf => parse_pdf(content)?,
        DocumentFormat::Html => parse_html(content)?,
        DocumentFormat::Csv => parse_csv(content)?,
        DocumentFormat::Docx => parse_zip_xml(content, &["word/document.xml"])?,
        DocumentFormat::Xlsx => parse_zip_xml(content, &["xl/sharedStrings.xml"])?,
        DocumentFormat::Pptx => parse_zip_prefix(content, "ppt/slides/slide")?,
        DocumentFormat::OpenDocument => parse_zip_xml(content, &["content.xml"])?,
        DocumentFormat::Text => String::from_utf8_lossy(content).into_owned(),
    };

    let text = text.trim().to_string();
    if text.is_empty() {
        return Err(RuntimeError::parse(format!(
            "no text content extracted from {mime_type} document"
        )));
    }

    tracing::debug!(
        target: TRACING_TARGET,
        mime_type = %mime_type,
        chars = text.len(),
        "Extracted document text"
    );

    Ok(text)
}

fn parse_pdf(content: &Bytes) -> RuntimeResult<String> {
    pdf_extract::extract_text_from_mem(content)
        .map_err(|e| RuntimeError::parse(format!("pdf extraction failed: {e}")))
}

fn parse_html(content: &Bytes) -> RuntimeResult<String> {
    Ok(html2text::from_read(content.as_ref(), 120))
}

/// Renders CSV as one line per record so chunking keeps rows intact.
fn parse_csv(content: &Bytes) -> RuntimeResult<String> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_ref());

    let mut lines = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| RuntimeError::parse(format!("csv parse failed: {e}")))?;
        lines.push(record.iter().collect::<Vec<_>>().join(", "));
    }

    Ok(lines.join("\n"))
}

/// Extracts text from named XML entries of a zip container.
fn parse_zip_xml(content: &Bytes, entries: &[&str]) -> RuntimeResult<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(content.as_ref()))
        .map_err(|e| RuntimeError::parse(format!("invalid document container: {e}")))?;

    let mut text = String::new();
    for entry in entries {
        let mut file = archive
            .by_name(entry)
            .map_err(|e| RuntimeError::parse(format!("missing container entry {entry}: {e}")))?;

        let mut xml = String::new();
        file.read_to_string(&mut xml)
            .map_err(|e| RuntimeError::parse(format!("unreadable container entry: {e}")))?;

        text.push_str(&xml_text(&xml)?);
    }

    Ok(text)
}

/// Extracts text from every zip entry under a prefix (slide XML files).
fn parse_zip_prefix(content: &Bytes, prefix: &str) -> RuntimeResult<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(content.as_ref()))
        .map_err(|e| RuntimeError::parse(format!("invalid document container: {e}")))?;

    let names: Vec<String> = archive
        .file_names()
        .filter(|name| name.starts_with(prefix) && name.ends_with(".xml"))
        .map(String::from)
        .collect();

    let mut text = String::new();
    for name in names {
        let mut file = archive
            .by_name(&name)
            .map_err(|e| RuntimeError::parse(format!("missing container entry {name}: {e}")))?;

        let mut xml = String::new();
        file.read_to_string(&mut xml)
            .map_err(|e| RuntimeError::parse(format!("unreadable container entry: {e}")))?;

        text.push_str(&xml_text(&xml)?);
        text.push('\n');
    }

    Ok(text)
}

/// Collects character data from an XML document, inserting line breaks at
/// paragraph boundaries.
fn xml_text(xml: &str) -> RuntimeResult<String> {
    use quick_xml::Reader;
    use quick_xml::events::Event;

    let mut reader = Reader::from_str(xml);
    let mut out = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Text(t)) => {
                let unescaped = t
                    .unescape()
                    .map_err(|e| RuntimeError::parse(format!("xml unescape failed: {e}")))?;
                out.push_str(&unescaped);
            }
            Ok(Event::End(end)) => {
                // Word, OpenDocument, and DrawingML paragraph containers.
                if matches!(end.name().as_ref(), b"w:p" | b"text:p" | b"a:p") {
                    out.push('\n');
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(RuntimeError::parse(format!("xml parse failed: {e}"))),
            _ => {}
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn selects_format_by_mime() {
        assert_eq!(
            DocumentFormat::from_mime("application/pdf"),
            Some(DocumentFormat::Pdf)
        );
        assert_eq!(
            DocumentFormat::from_mime("text/markdown; charset=utf-8"),
            Some(DocumentFormat::Text)
        );
        assert_eq!(DocumentFormat::from_mime("application/octet-stream"), None);
    }

    #[test]
    fn unsupported_mime_fails_with_message() {
        let err = parse_document("application/x-archive", &Bytes::from_static(b"x")).unwrap_err();
        assert!(matches!(err, RuntimeError::UnsupportedMime(_)));
        assert!(err.to_string().contains("application/x-archive"));
    }

    #[test]
    fn passthrough_text() {
        let text = parse_document("text/plain", &Bytes::from_static(b"hello world")).unwrap();
        assert_eq!(text, "hello world");
    }

    #[test]
    fn empty_document_is_an_error() {
        let err = parse_document("text/plain", &Bytes::from_static(b"   ")).unwrap_err();
        assert!(matches!(err, RuntimeError::Parse(_)));
    }

    #[test]
    fn strips_html() {
        let html = Bytes::from_static(
            b"<html><body><h1>Refunds</h1><p>Full refunds within 30 days.</p></body></html>",
        );
        let text = parse_document("text/html", &html).unwrap();
        assert!(text.contains("Refunds"));
        assert!(text.contains("Full refunds within 30 days."));
        assert!(!text.contains("<p>"));
    }

    #[test]
    fn preserves_csv_rows() {
        let csv = Bytes::from_static(b"name,city\nada,london\ngrace,new york\n");
        let text = parse_document("text/csv", &csv).unwrap();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "ada, london");
        assert_eq!(lines[2], "grace, new york");
    }

    #[test]
    fn extracts_docx_paragraphs() {
        let xml = r#"<?xml version="1.0"?>
            <w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
              <w:body>
                <w:p><w:r><w:t>The capital of Freedonia is Sylvania.</w:t></w:r></w:p>
                <w:p><w:r><w:t>Second paragraph.</w:t></w:r></w:p>
              </w:body>
            </w:document>"#;

        let mut buffer = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut buffer);
            writer
                .start_file("word/document.xml", zip::write::SimpleFileOptions::default())
                .unwrap();
            writer.write_all(xml.as_bytes()).unwrap();
            writer.finish().unwrap();
        }

        let text = parse_document(
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            &Bytes::from(buffer.into_inner()),
        )
        .unwrap();

        assert!(text.contains("The capital of Freedonia is Sylvania."));
        let first = text.find("Sylvania").unwrap();
        let second = text.find("Second paragraph").unwrap();
        assert!(first < second);
    }
}
