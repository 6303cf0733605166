//! Property tests for in-memory vector store search ordering.

use std::collections::HashMap;

use docchat_rag::document::{Chunk, IndexEntry};
use docchat_rag::inmemory::InMemoryVectorStore;
use docchat_rag::vectorstore::VectorStore;
use proptest::prelude::*;

/// Generate a non-zero L2-normalized embedding of the given dimension.
fn arb_normalized_embedding(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    proptest::collection::vec(-1.0f32..1.0f32, dim).prop_filter_map(
        "non-zero embedding",
        |mut v| {
            let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm < 1e-8 {
                return None;
            }
            for val in &mut v {
                *val /= norm;
            }
            Some(v)
        },
    )
}

fn entry(i: usize, text: String, embedding: Vec<f32>) -> IndexEntry {
    IndexEntry {
        chunk: Chunk {
            id: format!("doc.pdf:0:{i}"),
            text,
            source: "doc.pdf".to_string(),
            page_index: 0,
            chunk_index: i,
            metadata: HashMap::new(),
        },
        embedding,
    }
}

fn arb_entries(dim: usize) -> impl Strategy<Value = Vec<IndexEntry>> {
    proptest::collection::vec(("[a-z ]{5,30}", arb_normalized_embedding(dim)), 1..20).prop_map(
        |items| {
            items
                .into_iter()
                .enumerate()
                .map(|(i, (text, embedding))| entry(i, text, embedding))
                .collect()
        },
    )
}

/// Search returns at most `top_k` results, by descending cosine similarity,
/// whether the entries arrived through `create` alone or `create` + `append`.
mod prop_inmemory_search_ordering {
    use super::*;

    const DIM: usize = 16;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn results_ordered_descending_and_bounded_by_top_k(
            entries in arb_entries(DIM),
            query in arb_normalized_embedding(DIM),
            top_k in 1usize..25,
            split in 0usize..20,
        ) {
            let count = entries.len();
            let rt = tokio::runtime::Runtime::new().unwrap();
            let results = rt.block_on(async {
                let store = InMemoryVectorStore::new();
                let mut entries = entries;
                let tail = entries.split_off(split.min(count));
                store.create(entries).await.unwrap();
                store.append(tail).await.unwrap();
                assert_eq!(store.len().await.unwrap(), count);
                store.search(&query, top_k).await.unwrap()
            });

            prop_assert!(results.len() <= top_k);
            prop_assert_eq!(results.len(), top_k.min(count));

            for window in results.windows(2) {
                prop_assert!(
                    window[0].score >= window[1].score,
                    "results not in descending order: {} < {}",
                    window[0].score,
                    window[1].score,
                );
            }
        }

        /// Identical embeddings come back in insertion order.
        #[test]
        fn ties_resolve_to_insertion_order(
            embedding in arb_normalized_embedding(DIM),
            copies in 2usize..10,
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let results = rt.block_on(async {
                let store = InMemoryVectorStore::new();
                let entries =
                    (0..copies).map(|i| entry(i, format!("copy {i}"), embedding.clone())).collect();
                store.create(entries).await.unwrap();
                store.search(&embedding, copies).await.unwrap()
            });

            let order: Vec<usize> = results.iter().map(|r| r.chunk.chunk_index).collect();
            prop_assert_eq!(order, (0..copies).collect::<Vec<_>>());
        }
    }
}
