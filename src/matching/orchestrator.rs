use std::fmt;
use std::sync::Arc;

use tracing::Instrument;
use uuid::Uuid;

use super::embedding::EmbeddingProducer;
use super::normalizer::IntentNormalizer;
use super::retriever::CandidateRetriever;
use super::synthesizer::ReplySynthesizer;
use super::types::{Admitted, AskResult, SearchQuery};
use crate::core::config::RateRule;
use crate::core::errors::ApiError;
use crate::llm::InferenceClient;
use crate::ratelimit::{rate_key, RateGovernor, ASK_CAPABILITY};
use crate::store::PostStore;

/// Steps of one ask, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AskStage {
    Received,
    RateChecked,
    Normalized,
    Embedded,
    Retrieved,
    Synthesized,
    Completed,
}

impl fmt::Display for AskStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AskStage::Received => "received",
            AskStage::RateChecked => "rate_checked",
            AskStage::Normalized => "normalized",
            AskStage::Embedded => "embedded",
            AskStage::Retrieved => "retrieved",
            AskStage::Synthesized => "synthesized",
            AskStage::Completed => "completed",
        };
        f.write_str(name)
    }
}

/// Entry point for "I lost X" queries.
///
/// Runs normalize, embed, retrieve and synthesize strictly in sequence
/// behind the rate governor. Normalization and synthesis degrade to
/// fallbacks; any other failure ends the request. Nothing is retried.
#[derive(Clone)]
pub struct MatchingOrchestrator {
    governor: Arc<RateGovernor>,
    rule: RateRule,
    normalizer: IntentNormalizer,
    producer: EmbeddingProducer,
    retriever: CandidateRetriever,
    synthesizer: ReplySynthesizer,
}

impl MatchingOrchestrator {
    pub fn new(
        client: Arc<dyn InferenceClient>,
        store: Arc<dyn PostStore>,
        governor: Arc<RateGovernor>,
        rule: RateRule,
    ) -> Self {
        Self {
            governor,
            rule,
            normalizer: IntentNormalizer::new(client.clone()),
            producer: EmbeddingProducer::new(client.clone()),
            retriever: CandidateRetriever::new(store),
            synthesizer: ReplySynthesizer::new(client),
        }
    }

    /// Validates and admits the request, then runs the pipeline.
    ///
    /// The outer error covers rejection before any quota is spent or the
    /// quota itself; the inner outcome covers everything after admission.
    pub async fn ask(
        &self,
        raw_query: &str,
        top_k: Option<i64>,
        client_ip: &str,
    ) -> Result<Admitted<AskResult>, ApiError> {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!("ask", %request_id);

        async move {
            let query = SearchQuery::new(raw_query, top_k)
                .ok_or_else(|| ApiError::Validation("Missing query".to_string()))?;
            tracing::debug!(stage = %AskStage::Received, top_k = query.top_k());

            let rate = self
                .governor
                .admit(&rate_key(ASK_CAPABILITY, client_ip), self.rule)?;
            tracing::debug!(stage = %AskStage::RateChecked, remaining = rate.remaining);

            let outcome = self.run(&query).await;
            if let Err(err) = &outcome {
                tracing::warn!("Ask aborted: {}", err);
            }
            Ok::<_, ApiError>(Admitted { rate, outcome })
        }
        .instrument(span)
        .await
    }

    async fn run(&self, query: &SearchQuery) -> Result<AskResult, ApiError> {
        let normalized_query = self.normalizer.normalize(query.raw_text()).await;
        tracing::debug!(stage = %AskStage::Normalized, normalized = %normalized_query);

        let embedding = self.producer.produce(&normalized_query).await?;
        tracing::debug!(stage = %AskStage::Embedded, dimension = embedding.dimension());

        let matches = self.retriever.retrieve(&embedding, query.top_k()).await?;
        tracing::debug!(stage = %AskStage::Retrieved, count = matches.len());

        let reply = self
            .synthesizer
            .synthesize(query.raw_text(), &matches)
            .await;
        tracing::debug!(stage = %AskStage::Synthesized);

        tracing::info!(
            stage = %AskStage::Completed,
            matches = matches.len(),
            "Ask completed"
        );
        Ok(AskResult {
            normalized_query,
            reply,
            matches,
        })
    }
}
