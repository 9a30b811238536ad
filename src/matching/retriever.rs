use std::sync::Arc;

use crate::core::errors::ApiError;
use crate::llm::EmbeddingVector;
use crate::matching::types::{MatchCandidate, MAX_TOP_K, MIN_TOP_K};
use crate::store::PostStore;

/// Thin adapter over the store's nearest-neighbour search.
#[derive(Clone)]
pub struct CandidateRetriever {
    store: Arc<dyn PostStore>,
}

impl CandidateRetriever {
    pub fn new(store: Arc<dyn PostStore>) -> Self {
        Self { store }
    }

    /// Returns at most `top_k` candidates (clamped to `[1, 10]`) in store order.
    pub async fn retrieve(
        &self,
        query_embedding: &EmbeddingVector,
        top_k: usize,
    ) -> Result<Vec<MatchCandidate>, ApiError> {
        let top_k = top_k.clamp(MIN_TOP_K, MAX_TOP_K);

        let mut candidates = self
            .store
            .match_found_posts(query_embedding, top_k)
            .await
            .map_err(|err| match err {
                ApiError::Retrieval(_) => err,
                other => ApiError::Retrieval(other.to_string()),
            })?;

        candidates.truncate(top_k);
        if candidates.windows(2).any(|pair| pair[0].score < pair[1].score) {
            tracing::warn!("Store returned candidates out of score order; keeping store order");
        }
        Ok(candidates)
    }
}
