//! In-memory vector store using cosine similarity.
//!
//! This module provides [`InMemoryVectorStore`], an append-only index backed
//! by a `Vec` behind a `tokio::sync::RwLock`. It holds everything for the
//! lifetime of the session and searches by brute force.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::document::{IndexEntry, RetrievedPassage};
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

const BACKEND: &str = "InMemory";

/// An in-memory vector store using cosine similarity for search.
///
/// The index is `None` until [`create`](VectorStore::create) succeeds, which
/// mirrors an external store whose first write builds the index. Entries are
/// kept in insertion order so that ties are ranked first-ingested first.
///
/// # Example
///
/// ```rust,ignore
/// use docchat_rag::{InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::new();
/// store.create(entries).await?;
/// ```
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    entries: RwLock<Option<Vec<IndexEntry>>>,
}

impl InMemoryVectorStore {
    /// Create a new, uninitialized in-memory vector store.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if the lengths differ, either vector has zero magnitude, or
/// a component is not finite.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    let similarity = dot / (norm_a * norm_b);
    // Zero-magnitude or non-finite vectors score as unrelated.
    if similarity.is_finite() { similarity } else { 0.0 }
}

fn store_error(message: impl Into<String>) -> RagError {
    RagError::VectorStoreError { backend: BACKEND.to_string(), message: message.into() }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn create(&self, entries: Vec<IndexEntry>) -> Result<()> {
        let mut index = self.entries.write().await;
        if index.is_some() {
            return Err(store_error("index already exists"));
        }
        *index = Some(entries);
        Ok(())
    }

    async fn append(&self, entries: Vec<IndexEntry>) -> Result<()> {
        let mut index = self.entries.write().await;
        let stored = index.as_mut().ok_or_else(|| store_error("index has not been created"))?;
        stored.extend(entries);
        Ok(())
    }

    async fn search(&self, embedding: &[f32], top_k: usize) -> Result<Vec<RetrievedPassage>> {
        let index = self.entries.read().await;
        let Some(stored) = index.as_ref() else {
            return Ok(Vec::new());
        };

        let mut scored: Vec<RetrievedPassage> = stored
            .iter()
            .map(|entry| RetrievedPassage {
                chunk: entry.chunk.clone(),
                score: cosine_similarity(&entry.embedding, embedding),
            })
            .collect();

        // `sort_by` is stable, so equal scores stay in insertion order.
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(top_k);
        Ok(scored)
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.entries.read().await.as_ref().map_or(0, Vec::len))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::document::Chunk;

    fn entry(id: &str, embedding: Vec<f32>) -> IndexEntry {
        IndexEntry {
            chunk: Chunk {
                id: id.to_string(),
                text: format!("text of {id}"),
                source: "doc.txt".to_string(),
                page_index: 0,
                chunk_index: 0,
                metadata: HashMap::new(),
            },
            embedding,
        }
    }

    #[tokio::test]
    async fn append_before_create_fails() {
        let store = InMemoryVectorStore::new();
        let err = store.append(vec![entry("a", vec![1.0])]).await.unwrap_err();
        assert!(matches!(err, RagError::VectorStoreError { .. }));
    }

    #[tokio::test]
    async fn create_twice_fails() {
        let store = InMemoryVectorStore::new();
        store.create(vec![entry("a", vec![1.0])]).await.unwrap();
        assert!(store.create(vec![entry("b", vec![1.0])]).await.is_err());
        assert_eq!(store.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn uncreated_index_searches_empty() {
        let store = InMemoryVectorStore::new();
        assert!(store.search(&[1.0, 0.0], 5).await.unwrap().is_empty());
        assert_eq!(store.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn ties_keep_insertion_order() {
        let store = InMemoryVectorStore::new();
        store.create(vec![entry("first", vec![1.0, 0.0])]).await.unwrap();
        store
            .append(vec![entry("second", vec![2.0, 0.0]), entry("other", vec![0.0, 1.0])])
            .await
            .unwrap();

        let results = store.search(&[1.0, 0.0], 10).await.unwrap();
        let ids: Vec<&str> = results.iter().map(|r| r.chunk.id.as_str()).collect();
        assert_eq!(ids, ["first", "second", "other"]);
    }

    #[tokio::test]
    async fn non_finite_embeddings_rank_last() {
        let store = InMemoryVectorStore::new();
        store
            .create(vec![
                entry("nan", vec![f32::NAN, 1.0]),
                entry("close", vec![1.0, 0.1]),
                entry("inf", vec![f32::INFINITY, 0.0]),
            ])
            .await
            .unwrap();

        let results = store.search(&[1.0, 0.0], 10).await.unwrap();
        let ids: Vec<&str> = results.iter().map(|r| r.chunk.id.as_str()).collect();
        assert_eq!(ids, ["close", "nan", "inf"]);
        assert!(results.iter().all(|r| r.score.is_finite()));
    }

    #[tokio::test]
    async fn search_is_bounded_by_top_k() {
        let store = InMemoryVectorStore::new();
        let entries = (0..5).map(|i| entry(&i.to_string(), vec![1.0, i as f32])).collect();
        store.create(entries).await.unwrap();
        assert_eq!(store.search(&[1.0, 0.0], 2).await.unwrap().len(), 2);
    }
}
