//! # docchat-rag
//!
//! Retrieval-augmented question answering over documents uploaded during a
//! chat session.
//!
//! ## Overview
//!
//! Uploaded files are extracted into pages, split into overlapping chunks,
//! embedded in batches and stored in an append-only similarity index. Each
//! question is answered by retrieving the closest chunks, packing the best of
//! them into a byte-budgeted context, and sending that context together with
//! recent conversation turns to a text-generation backend.
//!
//! - [`ChatSession`] - the entry point: ingest, answer, reset, status
//! - [`IngestionPipeline`] - dedup by name, extract, chunk, index
//! - [`IndexManager`] / [`Retriever`] - batched indexing and top-k search
//! - [`ContextAssembler`] - passage packing under a byte budget
//! - [`ConversationMemory`] - bounded turn log
//! - [`AnswerOrchestrator`] - prompt composition and generation
//!
//! External collaborators sit behind traits: [`TextExtractor`],
//! [`EmbeddingProvider`], [`VectorStore`] and [`GenerationService`].
//! [`InMemoryVectorStore`] and [`AutoExtractor`] are always available; the
//! OpenAI services require the `openai` feature (enabled by default).
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use docchat_rag::openai::{OpenAIChatGenerator, OpenAIEmbeddingProvider};
//! use docchat_rag::{ChatSession, InMemoryVectorStore, Upload};
//!
//! let session = ChatSession::builder()
//!     .embedding_provider(Arc::new(OpenAIEmbeddingProvider::from_env()?))
//!     .vector_store(Arc::new(InMemoryVectorStore::new()))
//!     .generation_service(Arc::new(OpenAIChatGenerator::from_env()?))
//!     .build()?;
//!
//! session.ingest(&[Upload::new("report.pdf", std::fs::read("report.pdf")?)]).await;
//! println!("{}", session.answer("What are the key findings?").await.text);
//! ```

pub mod chunking;
pub mod config;
pub mod context;
pub mod document;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod generation;
pub mod index;
pub mod ingest;
pub mod inmemory;
pub mod memory;
pub mod orchestrator;
pub mod session;
pub mod vectorstore;

#[cfg(feature = "openai")]
pub mod openai;

pub use chunking::{Chunker, FixedSizeChunker, Windows};
pub use config::{ChatConfig, ChatConfigBuilder};
pub use context::{AssembledContext, ContextAssembler};
pub use document::{
    ChatMessage, Chunk, ConversationTurn, Document, IndexEntry, Page, RetrievedPassage, Role,
    Upload,
};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use extract::{AutoExtractor, PdfExtractor, PlainTextExtractor, TextExtractor};
pub use generation::GenerationService;
pub use index::{AddReport, BatchOutcome, IndexManager, Retriever};
pub use ingest::{IngestReport, IngestionPipeline};
pub use inmemory::InMemoryVectorStore;
pub use memory::ConversationMemory;
pub use orchestrator::{
    Answer, AnswerOrchestrator, AnswerOutcome, NO_INDEX_REPLY, compose_prompt, error_reply,
    no_relevant_documents_reply,
};
pub use session::{ChatSession, ChatSessionBuilder, SessionState, SessionStatus};
pub use vectorstore::VectorStore;
