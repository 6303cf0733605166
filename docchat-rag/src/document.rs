//! Data types for uploads, pages, chunks, index entries, and conversation turns.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A file handed over by the host: its display name and raw bytes.
///
/// The name is the document identity for the whole session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    /// Unique document name (usually the file name).
    pub name: String,
    /// Raw file content.
    pub bytes: Vec<u8>,
}

impl Upload {
    /// Create an upload from a name and its content.
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self { name: name.into(), bytes: bytes.into() }
    }
}

/// One page of extracted document text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page {
    /// The extracted text of the page.
    pub text: String,
    /// Zero-based position of the page in its document.
    pub page_index: usize,
    /// Name of the owning document.
    pub source: String,
}

/// A document after extraction: a name and its ordered pages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Unique document name.
    pub name: String,
    /// Pages in document order.
    pub pages: Vec<Page>,
}

/// A bounded span of page text, the unit stored in the index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Identifier of the form `{source}:{page_index}:{chunk_index}`.
    pub id: String,
    /// The text content of the chunk.
    pub text: String,
    /// Name of the document this chunk came from.
    pub source: String,
    /// Page the chunk was cut from.
    pub page_index: usize,
    /// Position of the chunk within its page.
    pub chunk_index: usize,
    /// Provenance metadata (`source`, `page`).
    pub metadata: HashMap<String, String>,
}

/// A [`Chunk`] together with its embedding vector, as held by the index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexEntry {
    /// The stored chunk.
    pub chunk: Chunk,
    /// The vector embedding for the chunk text.
    pub embedding: Vec<f32>,
}

/// A retrieved [`Chunk`] paired with a relevance score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedPassage {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// The similarity score (higher is more relevant).
    pub score: f32,
}

/// Who produced a conversation turn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => f.write_str("User"),
            Role::Assistant => f.write_str("Assistant"),
        }
    }
}

/// One role-tagged message in the conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConversationTurn {
    pub role: Role,
    pub text: String,
}

impl ConversationTurn {
    /// A turn spoken by the user.
    pub fn user(text: impl Into<String>) -> Self {
        Self { role: Role::User, text: text.into() }
    }

    /// A turn produced by the assistant.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self { role: Role::Assistant, text: text.into() }
    }
}

impl fmt::Display for ConversationTurn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.role, self.text)
    }
}

/// An entry of the chat display log shown to the user.
///
/// Unlike conversation memory, the display log is never trimmed and also
/// contains replies that were not fed back into prompts.
pub type ChatMessage = ConversationTurn;
