//! Session state and the serialized entry points the host calls.
//!
//! [`SessionState`] is everything one user interaction accumulates: the
//! names already ingested, the index, conversation memory, and the chat
//! display log. [`ChatSession`] owns it behind a `tokio::sync::Mutex` so that
//! ingestion, answering, and reset never interleave.
//!
//! # Example
//!
//! ```rust,ignore
//! use docchat_rag::{ChatConfig, ChatSession, InMemoryVectorStore, Upload};
//!
//! let session = ChatSession::builder()
//!     .config(ChatConfig::default())
//!     .embedding_provider(Arc::new(embedder))
//!     .vector_store(Arc::new(InMemoryVectorStore::new()))
//!     .generation_service(Arc::new(generator))
//!     .build()?;
//!
//! session.ingest(&[Upload::new("A.pdf", bytes)]).await;
//! let answer = session.answer("What is the capital of France?").await;
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::info;

use crate::chunking::{Chunker, FixedSizeChunker};
use crate::config::ChatConfig;
use crate::context::ContextAssembler;
use crate::document::{ChatMessage, Upload};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::extract::{AutoExtractor, TextExtractor};
use crate::generation::GenerationService;
use crate::index::IndexManager;
use crate::ingest::{IngestReport, IngestionPipeline};
use crate::memory::ConversationMemory;
use crate::orchestrator::{Answer, AnswerOrchestrator};
use crate::vectorstore::VectorStore;

/// Counters shown by the host's status display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionStatus {
    /// Number of documents ingested this session.
    pub ingested_files: usize,
    /// Number of messages in the chat display log.
    pub chat_messages: usize,
    /// Number of turns in conversation memory.
    pub memory_turns: usize,
    /// Number of chunks in the index.
    pub indexed_chunks: usize,
}

/// Mutable state of one chat session.
pub struct SessionState {
    ingested: Vec<String>,
    ingested_names: HashSet<String>,
    index: IndexManager,
    memory: ConversationMemory,
    chat_log: Vec<ChatMessage>,
}

impl SessionState {
    /// Fresh state with nothing ingested.
    pub fn new(index: IndexManager, memory: ConversationMemory) -> Self {
        Self {
            ingested: Vec::new(),
            ingested_names: HashSet::new(),
            index,
            memory,
            chat_log: Vec::new(),
        }
    }

    /// Whether a document with this name has already been ingested.
    pub fn is_ingested(&self, name: &str) -> bool {
        self.ingested_names.contains(name)
    }

    pub(crate) fn mark_ingested(&mut self, name: String) {
        if self.ingested_names.insert(name.clone()) {
            self.ingested.push(name);
        }
    }

    /// Ingested document names in ingestion order.
    pub fn ingested_files(&self) -> &[String] {
        &self.ingested
    }

    pub fn index(&self) -> &IndexManager {
        &self.index
    }

    pub fn index_mut(&mut self) -> &mut IndexManager {
        &mut self.index
    }

    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut ConversationMemory {
        &mut self.memory
    }

    /// Every message shown to the user, oldest first.
    pub fn chat_log(&self) -> &[ChatMessage] {
        &self.chat_log
    }

    pub(crate) fn push_chat(&mut self, message: ChatMessage) {
        self.chat_log.push(message);
    }

    /// Clear the conversation; ingested documents and the index are kept.
    pub fn reset(&mut self) {
        self.memory.clear();
        self.chat_log.clear();
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            ingested_files: self.ingested.len(),
            chat_messages: self.chat_log.len(),
            memory_turns: self.memory.len(),
            indexed_chunks: self.index.entry_count(),
        }
    }
}

/// A document chat session: ingestion, answering, and reset over one
/// [`SessionState`], serialized by a mutex.
///
/// Construct one via [`ChatSession::builder()`].
pub struct ChatSession {
    state: Mutex<SessionState>,
    pipeline: IngestionPipeline,
    orchestrator: AnswerOrchestrator,
}

impl ChatSession {
    /// Create a new [`ChatSessionBuilder`].
    pub fn builder() -> ChatSessionBuilder {
        ChatSessionBuilder::default()
    }

    /// Ingest uploads, skipping names already seen. See [`IngestionPipeline::ingest`].
    pub async fn ingest(&self, uploads: &[Upload]) -> IngestReport {
        let mut state = self.state.lock().await;
        self.pipeline.ingest(&mut state, uploads).await
    }

    /// Answer a question. Never fails; errors become the reply text.
    pub async fn answer(&self, question: &str) -> Answer {
        let mut state = self.state.lock().await;
        self.orchestrator.answer(&mut state, question).await
    }

    /// Clear conversation memory and the chat log.
    pub async fn reset(&self) {
        let mut state = self.state.lock().await;
        state.reset();
        info!("conversation reset");
    }

    pub async fn status(&self) -> SessionStatus {
        self.state.lock().await.status()
    }

    /// Ingested document names in ingestion order.
    pub async fn ingested_files(&self) -> Vec<String> {
        self.state.lock().await.ingested_files().to_vec()
    }

    /// A copy of the chat display log.
    pub async fn chat_log(&self) -> Vec<ChatMessage> {
        self.state.lock().await.chat_log().to_vec()
    }
}

/// Builder for constructing a [`ChatSession`].
///
/// The embedding provider, vector store, and generation service are
/// required. The config defaults to [`ChatConfig::default`], the extractor
/// to [`AutoExtractor`], and the chunker to a [`FixedSizeChunker`] built
/// from the config.
#[derive(Default)]
pub struct ChatSessionBuilder {
    config: Option<ChatConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    vector_store: Option<Arc<dyn VectorStore>>,
    generation_service: Option<Arc<dyn GenerationService>>,
    extractor: Option<Arc<dyn TextExtractor>>,
    chunker: Option<Arc<dyn Chunker>>,
}

impl ChatSessionBuilder {
    /// Set the session configuration.
    pub fn config(mut self, config: ChatConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the vector store backend. It must be empty.
    pub fn vector_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.vector_store = Some(store);
        self
    }

    /// Set the text-generation backend.
    pub fn generation_service(mut self, service: Arc<dyn GenerationService>) -> Self {
        self.generation_service = Some(service);
        self
    }

    /// Override the document text extractor.
    pub fn extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    /// Override the page chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Build the [`ChatSession`], validating the config and required fields.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if a required field is missing or
    /// the config is invalid.
    pub fn build(self) -> Result<ChatSession> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::ConfigError("embedding_provider is required".to_string()))?;
        let vector_store = self
            .vector_store
            .ok_or_else(|| RagError::ConfigError("vector_store is required".to_string()))?;
        let generation_service = self
            .generation_service
            .ok_or_else(|| RagError::ConfigError("generation_service is required".to_string()))?;
        let extractor = self.extractor.unwrap_or_else(|| Arc::new(AutoExtractor::new()));
        let chunker = match self.chunker {
            Some(chunker) => chunker,
            None => Arc::new(FixedSizeChunker::new(config.chunk_size, config.chunk_overlap)?),
        };

        let index = IndexManager::new(
            embedding_provider,
            vector_store,
            config.batch_size,
            config.embed_concurrency,
        )
        .with_similarity_threshold(config.similarity_threshold);
        let memory = ConversationMemory::new(config.max_history_turns());

        let orchestrator = AnswerOrchestrator::new(
            generation_service,
            ContextAssembler::new(config.max_context_passages, config.max_context_bytes),
            config.top_k,
            config.max_history_turns(),
        );

        Ok(ChatSession {
            state: Mutex::new(SessionState::new(index, memory)),
            pipeline: IngestionPipeline::new(extractor, chunker),
            orchestrator,
        })
    }
}
