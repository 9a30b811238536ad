use async_trait::async_trait;

use super::types::EmbeddingVector;
use crate::core::errors::ApiError;

/// Uniform surface over the configured inference backend.
///
/// Implementations make exactly one outbound attempt per call; callers
/// decide whether a failure degrades or aborts.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Chat completion with a single system and user turn.
    ///
    /// Returns the first choice's content, which may be empty.
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        temperature: f32,
    ) -> Result<String, ApiError>;

    /// Embeds `text`. Never returns an empty vector.
    async fn embed(&self, text: &str) -> Result<EmbeddingVector, ApiError>;
}
