//! Text extraction from uploaded files.
//!
//! Extraction turns raw bytes into [`Page`]s. It is the only place where a
//! whole document can be rejected: a corrupt or unsupported file yields
//! [`RagError::ExtractionError`] and the ingestion pipeline leaves the name
//! retryable.
//!
//! - [`PdfExtractor`] - one page per PDF page, via `lopdf`
//! - [`PlainTextExtractor`] - UTF-8 text, pages separated by form feeds
//! - [`AutoExtractor`] - picks one of the above from magic bytes or extension

use tracing::{debug, warn};

use crate::document::Page;
use crate::error::{RagError, Result};

/// Converts raw document bytes into ordered pages.
pub trait TextExtractor: Send + Sync {
    /// Extract the pages of document `name` from `bytes`.
    ///
    /// Every returned page has `source == name` and a zero-based
    /// `page_index` in document order.
    fn extract(&self, name: &str, bytes: &[u8]) -> Result<Vec<Page>>;
}

fn extraction_error(document: &str, message: impl Into<String>) -> RagError {
    RagError::ExtractionError { document: document.to_string(), message: message.into() }
}

/// Extracts text page by page from PDF files.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractor;

impl TextExtractor for PdfExtractor {
    fn extract(&self, name: &str, bytes: &[u8]) -> Result<Vec<Page>> {
        let doc = lopdf::Document::load_mem(bytes)
            .map_err(|e| extraction_error(name, format!("failed to load PDF: {e}")))?;

        if doc.is_encrypted() {
            return Err(extraction_error(name, "encrypted PDFs are not supported"));
        }

        let page_numbers: Vec<u32> = doc.get_pages().into_keys().collect();
        if page_numbers.is_empty() {
            return Err(extraction_error(name, "PDF has no pages"));
        }

        let pages = page_numbers
            .iter()
            .enumerate()
            .map(|(page_index, &number)| {
                // A single unreadable page (odd font encoding, image-only
                // content) does not invalidate the rest of the document.
                let text = doc.extract_text(&[number]).unwrap_or_else(|e| {
                    warn!(
                        document = name,
                        page = number,
                        error = %e,
                        "page text extraction failed"
                    );
                    String::new()
                });
                Page { text, page_index, source: name.to_string() }
            })
            .collect::<Vec<_>>();

        debug!(document = name, page_count = pages.len(), "extracted PDF");
        Ok(pages)
    }
}

/// Reads UTF-8 text files. Form feed characters (`\x0c`) start a new page.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, name: &str, bytes: &[u8]) -> Result<Vec<Page>> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| extraction_error(name, format!("file is not valid UTF-8: {e}")))?;

        Ok(text
            .split('\u{c}')
            .enumerate()
            .map(|(page_index, page)| Page {
                text: page.to_string(),
                page_index,
                source: name.to_string(),
            })
            .collect())
    }
}

/// Dispatches to [`PdfExtractor`] or [`PlainTextExtractor`].
///
/// Files starting with `%PDF-` or named `*.pdf` are parsed as PDF; `*.txt`,
/// `*.md` and `*.markdown` as plain text. Anything else is rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoExtractor {
    pdf: PdfExtractor,
    text: PlainTextExtractor,
}

impl AutoExtractor {
    /// Create an extractor that handles PDF and plain-text uploads.
    pub fn new() -> Self {
        Self::default()
    }
}

impl TextExtractor for AutoExtractor {
    fn extract(&self, name: &str, bytes: &[u8]) -> Result<Vec<Page>> {
        let extension = name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase());

        if bytes.starts_with(b"%PDF-") || extension.as_deref() == Some("pdf") {
            return self.pdf.extract(name, bytes);
        }

        match extension.as_deref() {
            Some("txt" | "md" | "markdown") => self.text.extract(name, bytes),
            _ => Err(extraction_error(name, "unsupported file type")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_splits_pages_on_form_feed() {
        let pages = PlainTextExtractor.extract("notes.txt", b"one\x0ctwo").unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[1].text, "two");
        assert_eq!(pages[1].page_index, 1);
        assert!(pages.iter().all(|p| p.source == "notes.txt"));
    }

    #[test]
    fn invalid_utf8_is_an_extraction_error() {
        let err = PlainTextExtractor.extract("bad.txt", &[0xff, 0xfe, 0x00]).unwrap_err();
        assert!(matches!(
            err,
            RagError::ExtractionError { ref document, .. } if document == "bad.txt"
        ));
    }

    #[test]
    fn corrupt_pdf_is_an_extraction_error() {
        let err = AutoExtractor::new().extract("broken.pdf", b"not a valid pdf").unwrap_err();
        assert!(matches!(err, RagError::ExtractionError { .. }));
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let err = AutoExtractor::new().extract("image.png", b"\x89PNG").unwrap_err();
        assert!(err.to_string().contains("unsupported file type"));
    }

    #[test]
    fn markdown_is_read_as_text() {
        let pages = AutoExtractor::new().extract("README.MD", b"# Title").unwrap();
        assert_eq!(pages[0].text, "# Title");
    }
}
