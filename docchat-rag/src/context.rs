//! Prompt context assembly under a byte budget.

use crate::document::RetrievedPassage;

/// Text assembled from retrieved passages.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AssembledContext {
    /// Concatenated `[Passage i]` blocks.
    pub text: String,
    /// Whether a passage was left out because it did not fit the budget.
    pub truncated: bool,
    /// Number of passages included in `text`.
    pub used_count: usize,
}

impl AssembledContext {
    /// `true` when no passage made it into the context.
    pub fn is_empty(&self) -> bool {
        self.used_count == 0
    }
}

/// Concatenates the best passages into labeled blocks within a byte budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextAssembler {
    max_passages: usize,
    max_bytes: usize,
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self { max_passages: 3, max_bytes: 8000 }
    }
}

impl ContextAssembler {
    /// Create an assembler taking at most `max_passages` passages and
    /// `max_bytes` bytes of block text.
    pub fn new(max_passages: usize, max_bytes: usize) -> Self {
        Self { max_passages, max_bytes }
    }

    /// Build the context from passages in ranked order.
    ///
    /// Blocks are `"[Passage i]\n<text>\n\n"` with `i` starting at 1. Assembly
    /// stops at the first block that would push the running length past the
    /// budget; later passages are not tried.
    pub fn assemble(&self, passages: &[RetrievedPassage]) -> AssembledContext {
        let mut context = AssembledContext::default();

        for (i, passage) in passages.iter().take(self.max_passages).enumerate() {
            let block = format!("[Passage {}]\n{}\n\n", i + 1, passage.chunk.text);
            if context.text.len() + block.len() > self.max_bytes {
                context.truncated = true;
                break;
            }
            context.text.push_str(&block);
            context.used_count = i + 1;
        }

        context
    }
}
