use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::core::config::AppConfig;
use crate::core::errors::ApiError;
use crate::llm::{InferenceClient, InferenceGateway, ProviderProfile};
use crate::matching::{IndexingPipeline, MatchingOrchestrator};
use crate::ratelimit::RateGovernor;
use crate::store::{IdentityResolver, PostStore, SupabaseStore};

pub struct AppState {
    pub config: Arc<AppConfig>,
    pub provider: ProviderProfile,
    pub credential_configured: bool,
    pub governor: Arc<RateGovernor>,
    pub orchestrator: MatchingOrchestrator,
    pub indexer: IndexingPipeline,
    pub started_at: DateTime<Utc>,
}

/// External collaborators the pipelines run against.
pub struct Collaborators {
    pub inference: Arc<dyn InferenceClient>,
    pub store: Arc<dyn PostStore>,
    pub identity: Arc<dyn IdentityResolver>,
}

impl AppState {
    /// Wires the HTTP gateway and the Supabase store from config.
    pub fn initialize(config: AppConfig) -> Result<Arc<Self>, ApiError> {
        let gateway = InferenceGateway::from_config(&config.ai)?;
        if !gateway.has_credential() {
            tracing::warn!("AI_API_KEY is not set; every AI request will fail until it is");
        }
        let provider = gateway.profile().clone();
        let credential_configured = gateway.has_credential();

        let store = Arc::new(SupabaseStore::from_config(&config.store)?);
        let collaborators = Collaborators {
            inference: Arc::new(gateway),
            store: store.clone(),
            identity: store,
        };

        Ok(Self::with_collaborators(
            config,
            provider,
            credential_configured,
            collaborators,
            Arc::new(RateGovernor::new()),
        ))
    }

    pub fn with_collaborators(
        config: AppConfig,
        provider: ProviderProfile,
        credential_configured: bool,
        collaborators: Collaborators,
        governor: Arc<RateGovernor>,
    ) -> Arc<Self> {
        let orchestrator = MatchingOrchestrator::new(
            collaborators.inference.clone(),
            collaborators.store.clone(),
            governor.clone(),
            config.rate_limit.ask,
        );
        let indexer = IndexingPipeline::new(
            collaborators.inference,
            collaborators.store,
            collaborators.identity,
            governor.clone(),
            config.rate_limit.index,
        );

        Arc::new(AppState {
            config: Arc::new(config),
            provider,
            credential_configured,
            governor,
            orchestrator,
            indexer,
            started_at: Utc::now(),
        })
    }
}
