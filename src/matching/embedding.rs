use std::sync::Arc;

use crate::core::errors::ApiError;
use crate::llm::{EmbeddingVector, InferenceClient};

/// Turns text into the vector the store's index was built with.
///
/// Every call re-embeds; a content-hash cache would sit here if cost ever
/// matters.
#[derive(Clone)]
pub struct EmbeddingProducer {
    client: Arc<dyn InferenceClient>,
}

impl EmbeddingProducer {
    pub fn new(client: Arc<dyn InferenceClient>) -> Self {
        Self { client }
    }

    pub async fn produce(&self, text: &str) -> Result<EmbeddingVector, ApiError> {
        let vector = self.client.embed(text).await?;
        tracing::debug!(dimension = vector.dimension(), "embedding produced");
        Ok(vector)
    }
}
