//! Vector store trait for the session's append-only similarity index.

use async_trait::async_trait;

use crate::document::{IndexEntry, RetrievedPassage};
use crate::error::Result;

/// A storage backend for embedded chunks with similarity search.
///
/// The store models an index that is created once and then only grows:
/// [`create`](VectorStore::create) is the first write and
/// [`append`](VectorStore::append) every later one. Entries are never
/// updated or removed. Every failure is reported as
/// [`RagError::VectorStoreError`](crate::RagError::VectorStoreError).
///
/// # Example
///
/// ```rust,ignore
/// use docchat_rag::{InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::new();
/// store.create(first_batch).await?;
/// store.append(second_batch).await?;
/// let passages = store.search(&query_embedding, 10).await?;
/// ```
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Initialize the index with its first entries.
    ///
    /// Fails if the index has already been created.
    async fn create(&self, entries: Vec<IndexEntry>) -> Result<()>;

    /// Append entries to an existing index, preserving their order.
    ///
    /// Fails if the index has not been created yet.
    async fn append(&self, entries: Vec<IndexEntry>) -> Result<()>;

    /// Search for the `top_k` entries most similar to `embedding`.
    ///
    /// Returns results ordered by descending similarity score; equal scores
    /// keep insertion order. An empty or uncreated index yields no results.
    async fn search(&self, embedding: &[f32], top_k: usize) -> Result<Vec<RetrievedPassage>>;

    /// Number of entries currently stored.
    async fn len(&self) -> Result<usize>;
}
