use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::profile::ProviderProfile;
use super::provider::InferenceClient;
use super::types::{
    ChatMessage, ChatRequest, ChatResponse, EmbeddingRequest, EmbeddingResponse, EmbeddingVector,
};
use crate::core::config::AiConfig;
use crate::core::errors::ApiError;

/// HTTP client for OpenAI-compatible chat and embedding endpoints.
#[derive(Clone)]
pub struct InferenceGateway {
    profile: ProviderProfile,
    api_key: Option<String>,
    client: Client,
}

impl InferenceGateway {
    pub fn from_config(config: &AiConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(ApiError::internal)?;
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_string);

        Ok(Self::new(ProviderProfile::resolve(config), api_key, client))
    }

    pub fn new(profile: ProviderProfile, api_key: Option<String>, client: Client) -> Self {
        Self {
            profile,
            api_key,
            client,
        }
    }

    pub fn profile(&self) -> &ProviderProfile {
        &self.profile
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    async fn post_json<B, T>(&self, url: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ApiError::Configuration("Missing AI_API_KEY".to_string()))?;

        let res = self
            .client
            .post(url)
            .bearer_auth(api_key)
            .json(body)
            .send()
            .await
            .map_err(ApiError::transport)?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Upstream {
                status: status.as_u16(),
                body: text,
            });
        }

        res.json::<T>().await.map_err(ApiError::transport)
    }
}

#[async_trait]
impl InferenceClient for InferenceGateway {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        temperature: f32,
    ) -> Result<String, ApiError> {
        let request = ChatRequest {
            model: self.profile.chat_model.clone(),
            messages: vec![
                ChatMessage::system(system_prompt),
                ChatMessage::user(user_prompt),
            ],
            temperature,
            stream: false,
        };

        tracing::debug!(
            provider = %self.profile.kind,
            model = %request.model,
            "chat completion"
        );
        let response: ChatResponse = self.post_json(&self.profile.chat_url(), &request).await?;
        Ok(response.into_content())
    }

    async fn embed(&self, text: &str) -> Result<EmbeddingVector, ApiError> {
        let request = EmbeddingRequest {
            model: self.profile.embedding_model.clone(),
            input: text.to_string(),
        };

        tracing::debug!(
            provider = %self.profile.kind,
            model = %request.model,
            chars = text.chars().count(),
            "embedding"
        );
        let response: EmbeddingResponse = self
            .post_json(&self.profile.embeddings_url(), &request)
            .await?;

        response
            .data
            .into_iter()
            .next()
            .and_then(|datum| EmbeddingVector::new(datum.embedding))
            .ok_or_else(|| ApiError::EmptyResult("Embedding response is empty".to_string()))
    }
}
