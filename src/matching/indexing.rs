use std::sync::Arc;

use super::embedding::EmbeddingProducer;
use super::types::{IndexJob, IndexOutcome};
use crate::core::config::RateRule;
use crate::core::errors::ApiError;
use crate::llm::InferenceClient;
use crate::ratelimit::{rate_key, RateDecision, RateGovernor, INDEX_CAPABILITY};
use crate::store::{IdentityResolver, PostStore};

const UNKNOWN_LOCATION: &str = "未知";

/// Text embedded for a post: title, description and location on
/// separate lines.
pub fn assemble_document(job: &IndexJob) -> String {
    let location = job
        .location
        .as_deref()
        .map(str::trim)
        .filter(|location| !location.is_empty())
        .unwrap_or(UNKNOWN_LOCATION);
    format!("{}\n{}\n地点:{}", job.title, job.description, location)
}

/// Computes and stores the searchable vector of a newly published post.
#[derive(Clone)]
pub struct IndexingPipeline {
    governor: Arc<RateGovernor>,
    rule: RateRule,
    store: Arc<dyn PostStore>,
    identity: Arc<dyn IdentityResolver>,
    producer: EmbeddingProducer,
}

impl IndexingPipeline {
    pub fn new(
        client: Arc<dyn InferenceClient>,
        store: Arc<dyn PostStore>,
        identity: Arc<dyn IdentityResolver>,
        governor: Arc<RateGovernor>,
        rule: RateRule,
    ) -> Self {
        Self {
            governor,
            rule,
            store,
            identity,
            producer: EmbeddingProducer::new(client),
        }
    }

    pub fn admit(&self, client_ip: &str) -> Result<RateDecision, ApiError> {
        self.governor
            .admit(&rate_key(INDEX_CAPABILITY, client_ip), self.rule)
    }

    /// Resolves a bearer token to the caller's user id.
    pub async fn authenticate(&self, token: Option<&str>) -> Result<String, ApiError> {
        let token = token
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| ApiError::Unauthorized("Missing auth token".to_string()))?;

        self.identity
            .resolve_user(token)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("Invalid auth token".to_string()))
    }

    /// Embeds and persists `post_id` on behalf of `caller`.
    ///
    /// Only the owner may index a post. Posts that are not "found" are
    /// skipped without touching the model or the store.
    pub async fn index_post(&self, post_id: &str, caller: &str) -> Result<IndexOutcome, ApiError> {
        let job = self
            .store
            .get_post(post_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Post".to_string()))?;

        if job.owner_user_id != caller {
            tracing::warn!(post_id, "Index request from non-owner rejected");
            return Err(ApiError::Forbidden);
        }

        if !job.is_found() {
            tracing::debug!(post_id, status = ?job.status, "Skipping index for non-found post");
            return Ok(IndexOutcome::skipped());
        }

        let document = assemble_document(&job);
        let embedding = self.producer.produce(&document).await?;
        self.store
            .update_embedding(&job.post_id, &embedding)
            .await
            .map_err(|err| match err {
                ApiError::Persistence(_) => err,
                other => ApiError::Persistence(other.to_string()),
            })?;

        tracing::info!(
            post_id,
            dimension = embedding.dimension(),
            "Post embedding stored"
        );
        Ok(IndexOutcome::indexed())
    }
}
