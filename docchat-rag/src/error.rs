//! Error types for the `docchat-rag` crate.

use thiserror::Error;

/// Errors that can occur while ingesting documents or answering questions.
///
/// None of these are fatal to the process. Extraction and per-batch index
/// errors are collected into reports; generation and retrieval errors are
/// turned into user-visible replies by the answer orchestrator.
#[derive(Debug, Error)]
pub enum RagError {
    /// A document could not be turned into pages (corrupt or unsupported input).
    #[error("Extraction error ({document}): {message}")]
    ExtractionError {
        /// The name of the uploaded document.
        document: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the vector store backend.
    #[error("Vector store error ({backend}): {message}")]
    VectorStoreError {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// The text-generation backend failed (auth, quota, transport, malformed response).
    #[error("Generation error ({provider}): {message}")]
    GenerationError {
        /// The generation provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// No index exists yet because nothing has been ingested successfully.
    #[error("no documents have been indexed yet")]
    NoIndex,

    /// A configuration or credential validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
