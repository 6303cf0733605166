//! Text-generation service trait used to answer questions.

use async_trait::async_trait;

use crate::error::Result;

/// A backend that turns a fully composed prompt into a reply.
///
/// Failures of any kind (auth, quota, transport, malformed response) are
/// reported as [`RagError::GenerationError`](crate::RagError::GenerationError).
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Short backend label used in logs and error messages.
    fn name(&self) -> &str;

    /// Generate a reply for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String>;
}
