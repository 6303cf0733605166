//! Configuration for the document chat pipeline.

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Configuration parameters for ingestion, retrieval, and answering.
///
/// Deserializable so hosts can load it from a file; missing fields fall back
/// to the defaults below. Use [`ChatConfig::builder`] or
/// [`ChatConfig::validate`] before handing a config to a session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChatConfig {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Number of overlapping characters between consecutive chunks.
    pub chunk_overlap: usize,
    /// Number of chunks embedded and stored per batch.
    pub batch_size: usize,
    /// Number of embedding batches that may be in flight at once.
    pub embed_concurrency: usize,
    /// Number of top results to return from vector search.
    pub top_k: usize,
    /// Minimum similarity score for results. `None` keeps every result.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity_threshold: Option<f32>,
    /// Maximum passages placed into a prompt.
    pub max_context_passages: usize,
    /// Byte budget for the assembled context.
    pub max_context_bytes: usize,
    /// Question/answer exchanges kept in conversation memory.
    pub max_history_exchanges: usize,
    /// Timeout applied by network-backed services, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 100,
            batch_size: 30,
            embed_concurrency: 1,
            top_k: 10,
            similarity_threshold: None,
            max_context_passages: 3,
            max_context_bytes: 8000,
            max_history_exchanges: 50,
            request_timeout_secs: 60,
        }
    }
}

impl ChatConfig {
    /// Create a new builder for constructing a [`ChatConfig`].
    pub fn builder() -> ChatConfigBuilder {
        ChatConfigBuilder::default()
    }

    /// Maximum number of turns kept in conversation memory (two per exchange).
    pub fn max_history_turns(&self) -> usize {
        self.max_history_exchanges * 2
    }

    /// Check that the parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if:
    /// - `chunk_size == 0` or `chunk_overlap >= chunk_size`
    /// - `batch_size`, `embed_concurrency`, `top_k`, `max_context_passages`
    ///   or `max_context_bytes` is zero
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(RagError::ConfigError("chunk_size must be greater than zero".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::ConfigError(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        let positive = [
            ("batch_size", self.batch_size),
            ("embed_concurrency", self.embed_concurrency),
            ("top_k", self.top_k),
            ("max_context_passages", self.max_context_passages),
            ("max_context_bytes", self.max_context_bytes),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(RagError::ConfigError(format!("{name} must be greater than zero")));
            }
        }
        Ok(())
    }
}

/// Builder for constructing a validated [`ChatConfig`].
#[derive(Debug, Clone, Default)]
pub struct ChatConfigBuilder {
    config: ChatConfig,
}

impl ChatConfigBuilder {
    /// Set the maximum chunk size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the number of chunks per embedding batch.
    pub fn batch_size(mut self, size: usize) -> Self {
        self.config.batch_size = size;
        self
    }

    /// Set how many embedding batches may run concurrently.
    pub fn embed_concurrency(mut self, concurrency: usize) -> Self {
        self.config.embed_concurrency = concurrency;
        self
    }

    /// Set the number of top results to return from vector search.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the minimum similarity threshold for filtering results.
    pub fn similarity_threshold(mut self, threshold: f32) -> Self {
        self.config.similarity_threshold = Some(threshold);
        self
    }

    /// Set the maximum number of passages placed into a prompt.
    pub fn max_context_passages(mut self, passages: usize) -> Self {
        self.config.max_context_passages = passages;
        self
    }

    /// Set the byte budget for the assembled context.
    pub fn max_context_bytes(mut self, bytes: usize) -> Self {
        self.config.max_context_bytes = bytes;
        self
    }

    /// Set the number of exchanges kept in conversation memory.
    pub fn max_history_exchanges(mut self, exchanges: usize) -> Self {
        self.config.max_history_exchanges = exchanges;
        self
    }

    /// Set the network request timeout in seconds.
    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    /// Build the [`ChatConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// See [`ChatConfig::validate`].
    pub fn build(self) -> Result<ChatConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
