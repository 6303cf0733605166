//! Batched index construction and retrieval.
//!
//! The [`IndexManager`] embeds chunks in fixed-size batches and hands them to
//! the [`VectorStore`]. A failing batch (embedding error, short embedding
//! response, or store error) is recorded in the [`AddReport`] and skipped;
//! the remaining batches are still processed. The first successful batch
//! creates the index, later ones append to it.
//!
//! Embedding calls for several batches may be in flight at once
//! (`embed_concurrency`), but results are applied to the store strictly in
//! batch order so retrieval ties stay deterministic.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::document::{Chunk, IndexEntry, RetrievedPassage};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

/// Outcome of embedding and storing a single batch.
#[derive(Debug)]
pub struct BatchOutcome {
    /// Zero-based position of the batch within the `add_chunks` call.
    pub batch: usize,
    /// Number of chunks in the batch.
    pub chunk_count: usize,
    /// `Ok` if the batch is in the index, otherwise the cause of the failure.
    pub result: Result<()>,
}

/// Aggregate result of [`IndexManager::add_chunks`].
#[derive(Debug, Default)]
pub struct AddReport {
    /// Per-batch outcomes in batch order.
    pub batches: Vec<BatchOutcome>,
}

impl AddReport {
    /// Number of batches that were stored.
    pub fn succeeded(&self) -> usize {
        self.batches.iter().filter(|b| b.result.is_ok()).count()
    }

    /// Number of batches that were skipped.
    pub fn failed(&self) -> usize {
        self.batches.len() - self.succeeded()
    }

    /// Number of chunks that made it into the index.
    pub fn stored_chunks(&self) -> usize {
        self.batches.iter().filter(|b| b.result.is_ok()).map(|b| b.chunk_count).sum()
    }

    /// Failed batches with their causes.
    pub fn failures(&self) -> impl Iterator<Item = (usize, &RagError)> {
        self.batches.iter().filter_map(|b| b.result.as_ref().err().map(|e| (b.batch, e)))
    }
}

/// Owns the session's similarity index.
pub struct IndexManager {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    batch_size: usize,
    embed_concurrency: usize,
    similarity_threshold: Option<f32>,
    initialized: bool,
    entry_count: usize,
}

impl IndexManager {
    /// Create a manager over an empty store.
    ///
    /// `batch_size` and `embed_concurrency` are clamped to at least 1.
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        batch_size: usize,
        embed_concurrency: usize,
    ) -> Self {
        Self {
            embedder,
            store,
            batch_size: batch_size.max(1),
            embed_concurrency: embed_concurrency.max(1),
            similarity_threshold: None,
            initialized: false,
            entry_count: 0,
        }
    }

    /// Drop retrieved passages scoring below `threshold`.
    pub fn with_similarity_threshold(mut self, threshold: Option<f32>) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    /// Whether at least one batch has been stored.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Number of entries stored through this manager.
    pub fn entry_count(&self) -> usize {
        self.entry_count
    }

    /// Embed and store `chunks` in batches, isolating per-batch failures.
    pub async fn add_chunks(&mut self, chunks: Vec<Chunk>) -> AddReport {
        let batches: Vec<Vec<Chunk>> =
            chunks.chunks(self.batch_size).map(<[Chunk]>::to_vec).collect();
        let batch_count = batches.len();
        let embedder = Arc::clone(&self.embedder);

        // `buffered` yields results in input order regardless of completion order.
        let mut embedded = stream::iter(batches.into_iter().enumerate())
            .map(|(batch, chunks)| {
                let embedder = Arc::clone(&embedder);
                async move {
                    let result = embed_batch(embedder.as_ref(), &chunks).await;
                    (batch, chunks, result)
                }
            })
            .buffered(self.embed_concurrency);

        let mut report = AddReport::default();
        while let Some((batch, chunks, embeddings)) = embedded.next().await {
            let chunk_count = chunks.len();
            let result = match embeddings {
                Ok(embeddings) => self.store_batch(chunks, embeddings).await,
                Err(e) => Err(e),
            };

            match &result {
                Ok(()) => debug!(batch, chunk_count, "stored batch"),
                Err(e) => warn!(batch, chunk_count, error = %e, "skipping failed batch"),
            }
            report.batches.push(BatchOutcome { batch, chunk_count, result });
        }

        // The store started empty, so it must hold exactly what was written here.
        match self.store.len().await {
            Ok(len) if len != self.entry_count => {
                warn!(store_len = len, written = self.entry_count, "vector store size mismatch")
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "could not read vector store size"),
        }

        info!(
            batches = batch_count,
            succeeded = report.succeeded(),
            failed = report.failed(),
            stored_chunks = report.stored_chunks(),
            index_len = self.entry_count,
            "index update finished"
        );
        report
    }

    async fn store_batch(&mut self, chunks: Vec<Chunk>, embeddings: Vec<Vec<f32>>) -> Result<()> {
        let entries: Vec<IndexEntry> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| IndexEntry { chunk, embedding })
            .collect();
        let count = entries.len();

        if self.initialized {
            self.store.append(entries).await?;
        } else {
            self.store.create(entries).await?;
            self.initialized = true;
        }
        self.entry_count += count;
        Ok(())
    }

    /// Build a retrieval handle returning at most `k` passages per query.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::NoIndex`] if no batch has ever been stored.
    pub fn build_retriever(&self, k: usize) -> Result<Retriever> {
        if !self.initialized {
            return Err(RagError::NoIndex);
        }
        Ok(Retriever {
            embedder: Arc::clone(&self.embedder),
            store: Arc::clone(&self.store),
            top_k: k,
            similarity_threshold: self.similarity_threshold,
        })
    }
}

async fn embed_batch(embedder: &dyn EmbeddingProvider, chunks: &[Chunk]) -> Result<Vec<Vec<f32>>> {
    let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
    let embeddings = embedder.embed_batch(&texts).await?;
    if embeddings.len() != chunks.len() {
        return Err(RagError::EmbeddingError {
            provider: embedder.name().to_string(),
            message: format!(
                "expected {} embeddings, received {}",
                chunks.len(),
                embeddings.len()
            ),
        });
    }
    Ok(embeddings)
}

/// Similarity search over the index, bound to a top-k parameter.
///
/// Created by [`IndexManager::build_retriever`].
#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    top_k: usize,
    similarity_threshold: Option<f32>,
}

impl Retriever {
    /// Maximum number of passages returned per query.
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Return the passages most similar to `text`, best first.
    ///
    /// A blank query or an empty index yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns the embedding or store error if the query cannot be run.
    pub async fn query(&self, text: &str) -> Result<Vec<RetrievedPassage>> {
        if text.trim().is_empty() || self.top_k == 0 {
            return Ok(Vec::new());
        }

        let embedding = self.embedder.embed(text).await?;
        let mut passages = self.store.search(&embedding, self.top_k).await?;
        if let Some(threshold) = self.similarity_threshold {
            passages.retain(|p| p.score >= threshold);
        }

        debug!(result_count = passages.len(), top_k = self.top_k, "retrieval completed");
        Ok(passages)
    }
}
