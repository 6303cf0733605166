//! Deterministic stand-ins for the external services.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use docchat_rag::{
    ChatConfig, ChatSession, Chunk, EmbeddingProvider, GenerationService, IndexEntry,
    InMemoryVectorStore, Page, RagError, Result, RetrievedPassage, TextExtractor, VectorStore,
};

/// Embeds text as letter frequencies plus a constant bias dimension.
#[derive(Default)]
pub struct LetterEmbedder {
    /// Batches containing a text with this marker fail.
    pub poison: Option<String>,
    pub batch_calls: AtomicUsize,
}

impl LetterEmbedder {
    pub fn poisoned(marker: &str) -> Self {
        Self { poison: Some(marker.to_string()), ..Self::default() }
    }

    fn vector(text: &str) -> Vec<f32> {
        let mut v = vec![0.0; 27];
        v[26] = 1.0;
        for c in text.chars().filter(char::is_ascii_alphabetic) {
            v[(c.to_ascii_lowercase() as u8 - b'a') as usize] += 1.0;
        }
        v
    }
}

#[async_trait]
impl EmbeddingProvider for LetterEmbedder {
    fn name(&self) -> &str {
        "letters"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(Self::vector(text))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        if self.poison.as_ref().is_some_and(|m| texts.iter().any(|t| t.contains(m.as_str()))) {
            return Err(RagError::EmbeddingError {
                provider: "letters".to_string(),
                message: "quota exceeded".to_string(),
            });
        }
        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }

    fn dimensions(&self) -> usize {
        27
    }
}

/// Wraps [`InMemoryVectorStore`] and remembers every chunk it accepted.
#[derive(Default)]
pub struct RecordingStore {
    inner: InMemoryVectorStore,
    stored: Mutex<Vec<Chunk>>,
    /// Zero-based write call that fails, if any.
    pub fail_on_write: Option<usize>,
    writes: AtomicUsize,
}

impl RecordingStore {
    pub fn failing_on_write(n: usize) -> Self {
        Self { fail_on_write: Some(n), ..Self::default() }
    }

    pub fn stored_texts(&self) -> Vec<String> {
        self.stored.lock().unwrap().iter().map(|c| c.text.clone()).collect()
    }

    pub fn stored_ids(&self) -> Vec<String> {
        self.stored.lock().unwrap().iter().map(|c| c.id.clone()).collect()
    }

    fn check_write(&self) -> Result<()> {
        let n = self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_on_write == Some(n) {
            return Err(RagError::VectorStoreError {
                backend: "recording".to_string(),
                message: "disk full".to_string(),
            });
        }
        Ok(())
    }

    fn record(&self, entries: &[IndexEntry]) {
        self.stored.lock().unwrap().extend(entries.iter().map(|e| e.chunk.clone()));
    }
}

#[async_trait]
impl VectorStore for RecordingStore {
    async fn create(&self, entries: Vec<IndexEntry>) -> Result<()> {
        self.check_write()?;
        self.record(&entries);
        self.inner.create(entries).await
    }

    async fn append(&self, entries: Vec<IndexEntry>) -> Result<()> {
        self.check_write()?;
        self.record(&entries);
        self.inner.append(entries).await
    }

    async fn search(&self, embedding: &[f32], top_k: usize) -> Result<Vec<RetrievedPassage>> {
        self.inner.search(embedding, top_k).await
    }

    async fn len(&self) -> Result<usize> {
        self.inner.len().await
    }
}

/// Replies with the context section of the prompt and records every prompt.
#[derive(Default)]
pub struct EchoGenerator {
    pub prompts: Mutex<Vec<String>>,
    pub fail: bool,
}

impl EchoGenerator {
    pub fn failing() -> Self {
        Self { fail: true, ..Self::default() }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationService for EchoGenerator {
    fn name(&self) -> &str {
        "echo"
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if self.fail {
            return Err(RagError::GenerationError {
                provider: "echo".to_string(),
                message: "invalid API key".to_string(),
            });
        }
        let context = prompt
            .split_once("Relevant documents:\n")
            .map(|(_, rest)| rest.split("\n\n").next().unwrap_or_default())
            .unwrap_or_default();
        Ok(format!("Echo: {context}"))
    }
}

/// Treats the upload as UTF-8 text; `%CORRUPT` content fails extraction.
pub struct TextOnlyExtractor;

impl TextExtractor for TextOnlyExtractor {
    fn extract(&self, name: &str, bytes: &[u8]) -> Result<Vec<Page>> {
        if bytes.starts_with(b"%CORRUPT") {
            return Err(RagError::ExtractionError {
                document: name.to_string(),
                message: "failed to load PDF".to_string(),
            });
        }
        let text = String::from_utf8_lossy(bytes).into_owned();
        Ok(vec![Page { text, page_index: 0, source: name.to_string() }])
    }
}

pub fn chunk(id: &str, text: &str) -> Chunk {
    Chunk {
        id: id.to_string(),
        text: text.to_string(),
        source: "doc.txt".to_string(),
        page_index: 0,
        chunk_index: 0,
        metadata: HashMap::new(),
    }
}

pub struct Fixture {
    pub session: ChatSession,
    pub embedder: Arc<LetterEmbedder>,
    pub store: Arc<RecordingStore>,
    pub generator: Arc<EchoGenerator>,
}

pub fn fixture_with(
    embedder: LetterEmbedder,
    store: RecordingStore,
    generator: EchoGenerator,
) -> Fixture {
    build_fixture(ChatConfig::default(), embedder, store, generator)
}

pub fn fixture_with_config(config: ChatConfig, embedder: LetterEmbedder) -> Fixture {
    build_fixture(config, embedder, RecordingStore::default(), EchoGenerator::default())
}

fn build_fixture(
    config: ChatConfig,
    embedder: LetterEmbedder,
    store: RecordingStore,
    generator: EchoGenerator,
) -> Fixture {
    let embedder = Arc::new(embedder);
    let store = Arc::new(store);
    let generator = Arc::new(generator);
    let session = ChatSession::builder()
        .config(config)
        .embedding_provider(embedder.clone())
        .vector_store(store.clone())
        .generation_service(generator.clone())
        .extractor(Arc::new(TextOnlyExtractor))
        .build()
        .unwrap();
    Fixture { session, embedder, store, generator }
}

pub fn fixture() -> Fixture {
    fixture_with(LetterEmbedder::default(), RecordingStore::default(), EchoGenerator::default())
}
