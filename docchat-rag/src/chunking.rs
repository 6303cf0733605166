//! Page chunking.
//!
//! This module provides the [`Chunker`] trait and [`FixedSizeChunker`], a
//! sliding-window splitter: every window holds at most `chunk_size`
//! characters and starts `chunk_overlap` characters before the previous
//! window ended. Windows are produced lazily by [`Windows`], which can be
//! cloned to restart from the same position.

use std::collections::HashMap;

use crate::document::{Chunk, Page};
use crate::error::{RagError, Result};

/// A strategy for splitting a page into chunks.
///
/// Implementations return chunks tagged with the page's source document and
/// page index. Embeddings are attached later by the index manager.
pub trait Chunker: Send + Sync {
    /// Split a page into chunks.
    ///
    /// Returns an empty `Vec` if the page has no text.
    fn chunk(&self, page: &Page) -> Vec<Chunk>;
}

/// Splits text into fixed-size character windows with overlap.
///
/// Chunk IDs are generated as `{source}:{page_index}:{chunk_index}`. Each
/// chunk carries `source` and `page` metadata for provenance.
///
/// # Example
///
/// ```rust
/// use docchat_rag::FixedSizeChunker;
///
/// let chunker = FixedSizeChunker::new(4, 1).unwrap();
/// let windows: Vec<&str> = chunker.windows("abcdefghij").collect();
/// assert_eq!(windows, ["abcd", "defg", "ghij"]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedSizeChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl FixedSizeChunker {
    /// Create a new `FixedSizeChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size` - maximum number of characters per chunk
    /// * `chunk_overlap` - number of characters shared by consecutive chunks
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if `chunk_size` is zero or
    /// `chunk_overlap >= chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(RagError::ConfigError("chunk_size must be greater than zero".to_string()));
        }
        if chunk_overlap >= chunk_size {
            return Err(RagError::ConfigError(format!(
                "chunk_overlap ({chunk_overlap}) must be less than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self { chunk_size, chunk_overlap })
    }

    /// Maximum number of characters per chunk.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Number of characters shared by consecutive chunks.
    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Lazily split `text` into overlapping windows.
    pub fn windows<'a>(&self, text: &'a str) -> Windows<'a> {
        Windows {
            text,
            start: 0,
            size: self.chunk_size,
            step: self.chunk_size - self.chunk_overlap,
            done: false,
        }
    }
}

impl Chunker for FixedSizeChunker {
    fn chunk(&self, page: &Page) -> Vec<Chunk> {
        // Whitespace-only windows carry nothing worth embedding.
        self.windows(&page.text)
            .filter(|window| !window.trim().is_empty())
            .enumerate()
            .map(|(i, text)| {
                let metadata = HashMap::from([
                    ("source".to_string(), page.source.clone()),
                    ("page".to_string(), page.page_index.to_string()),
                ]);
                Chunk {
                    id: format!("{}:{}:{i}", page.source, page.page_index),
                    text: text.to_string(),
                    source: page.source.clone(),
                    page_index: page.page_index,
                    chunk_index: i,
                    metadata,
                }
            })
            .collect()
    }
}

/// Iterator over the overlapping windows of a text.
///
/// Created by [`FixedSizeChunker::windows`]. Positions are counted in
/// characters, so multi-byte text is never split inside a code point.
#[derive(Debug, Clone)]
pub struct Windows<'a> {
    text: &'a str,
    /// Byte offset where the next window begins.
    start: usize,
    size: usize,
    step: usize,
    done: bool,
}

impl<'a> Iterator for Windows<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.done || self.start >= self.text.len() {
            return None;
        }

        let rest = &self.text[self.start..];
        let end = byte_offset(rest, self.size);
        if end == rest.len() {
            self.done = true;
        } else {
            self.start += byte_offset(rest, self.step);
        }
        Some(&rest[..end])
    }
}

/// Byte offset of the `chars`-th character of `s`, or `s.len()` past the end.
fn byte_offset(s: &str, chars: usize) -> usize {
    s.char_indices().nth(chars).map(|(i, _)| i).unwrap_or(s.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(text: &str) -> Page {
        Page { text: text.to_string(), page_index: 2, source: "A.pdf".to_string() }
    }

    #[test]
    fn empty_text_produces_no_windows() {
        let chunker = FixedSizeChunker::new(10, 2).unwrap();
        assert_eq!(chunker.windows("").count(), 0);
        assert!(chunker.chunk(&page("")).is_empty());
    }

    #[test]
    fn short_text_is_a_single_window() {
        let chunker = FixedSizeChunker::new(500, 100).unwrap();
        let windows: Vec<_> = chunker.windows("Paris is the capital of France.").collect();
        assert_eq!(windows, ["Paris is the capital of France."]);
    }

    #[test]
    fn exact_fit_has_no_redundant_tail() {
        let chunker = FixedSizeChunker::new(5, 2).unwrap();
        let windows: Vec<_> = chunker.windows("abcdefgh").collect();
        assert_eq!(windows, ["abcde", "defgh"]);
    }

    #[test]
    fn windows_are_restartable() {
        let chunker = FixedSizeChunker::new(3, 1).unwrap();
        let mut windows = chunker.windows("abcdefg");
        windows.next();
        let restarted = windows.clone();
        assert_eq!(windows.collect::<Vec<_>>(), restarted.collect::<Vec<_>>());
    }

    #[test]
    fn multibyte_characters_are_counted_once() {
        let chunker = FixedSizeChunker::new(2, 1).unwrap();
        let windows: Vec<_> = chunker.windows("가나다").collect();
        assert_eq!(windows, ["가나", "나다"]);
    }

    #[test]
    fn chunks_carry_provenance() {
        let chunker = FixedSizeChunker::new(4, 1).unwrap();
        let chunks = chunker.chunk(&page("abcdefghij"));
        assert_eq!(chunks.len(), 3);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.source, "A.pdf");
            assert_eq!(chunk.page_index, 2);
            assert_eq!(chunk.chunk_index, i);
            assert_eq!(chunk.id, format!("A.pdf:2:{i}"));
            assert_eq!(chunk.metadata.get("source").map(String::as_str), Some("A.pdf"));
        }
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        assert!(FixedSizeChunker::new(0, 0).is_err());
        assert!(FixedSizeChunker::new(10, 10).is_err());
        assert!(FixedSizeChunker::new(10, 9).is_ok());
    }
}
