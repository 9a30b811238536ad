//! PostgREST / GoTrue client for a Supabase project.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::json;

use super::{IdentityResolver, PostStore};
use crate::core::config::StoreConfig;
use crate::core::errors::ApiError;
use crate::llm::EmbeddingVector;
use crate::matching::types::{IndexJob, MatchCandidate, PostStatus};

const MATCH_RPC: &str = "match_found_posts";
const POST_COLUMNS: &str = "id,user_id,title,description,location,status";

#[derive(Clone)]
pub struct SupabaseStore {
    base_url: String,
    service_key: String,
    client: Client,
}

impl fmt::Debug for SupabaseStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SupabaseStore")
            .field("base_url", &self.base_url)
            .field("service_key", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct MatchRow {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    image_urls: Option<Vec<String>>,
    score: f64,
}

impl From<MatchRow> for MatchCandidate {
    fn from(row: MatchRow) -> Self {
        MatchCandidate {
            id: row.id,
            title: row.title,
            description: row.description,
            location: row.location,
            image_urls: row.image_urls,
            score: row.score,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PostRow {
    id: String,
    user_id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    status: String,
}

impl From<PostRow> for IndexJob {
    fn from(row: PostRow) -> Self {
        IndexJob {
            post_id: row.id,
            owner_user_id: row.user_id,
            title: row.title,
            description: row.description,
            location: row.location,
            status: PostStatus::parse(&row.status),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: String,
}

impl SupabaseStore {
    pub fn from_config(config: &StoreConfig) -> Result<Self, ApiError> {
        let base_url = config
            .url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| ApiError::Configuration("Missing SUPABASE_URL".to_string()))?;
        let service_key = config
            .service_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                ApiError::Configuration("Missing SUPABASE_SERVICE_ROLE_KEY".to_string())
            })?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(ApiError::internal)?;

        Ok(Self::new(base_url, service_key, client))
    }

    pub fn new(base_url: &str, service_key: &str, client: Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key: service_key.to_string(),
            client,
        }
    }

    fn rest(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    fn post_filter_url(&self, post_id: &str) -> String {
        format!(
            "{}/rest/v1/posts?id=eq.{}",
            self.base_url,
            urlencoding::encode(post_id)
        )
    }
}

#[async_trait]
impl PostStore for SupabaseStore {
    async fn match_found_posts(
        &self,
        embedding: &EmbeddingVector,
        match_count: usize,
    ) -> Result<Vec<MatchCandidate>, ApiError> {
        let url = format!("{}/rest/v1/rpc/{}", self.base_url, MATCH_RPC);
        let body = json!({
            "query_embedding": embedding,
            "match_count": match_count,
        });

        let res = self
            .rest(self.client.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(|err| ApiError::Retrieval(err.to_string()))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Retrieval(format!("{} {}", status.as_u16(), text)));
        }

        let rows: Option<Vec<MatchRow>> = res
            .json()
            .await
            .map_err(|err| ApiError::Retrieval(err.to_string()))?;
        Ok(rows
            .unwrap_or_default()
            .into_iter()
            .map(MatchCandidate::from)
            .collect())
    }

    async fn get_post(&self, post_id: &str) -> Result<Option<IndexJob>, ApiError> {
        let url = format!("{}&select={}", self.post_filter_url(post_id), POST_COLUMNS);

        let res = self
            .rest(self.client.get(&url))
            .send()
            .await
            .map_err(ApiError::internal)?;

        // PostgREST rejects malformed ids (e.g. non-uuid, 22P02) with a 4xx;
        // such a post cannot exist.
        if res.status().is_client_error() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            tracing::debug!(post_id, "Post lookup rejected: {} {}", status.as_u16(), text);
            return Ok(None);
        }

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Internal(format!(
                "Post lookup failed: {} {}",
                status.as_u16(),
                text
            )));
        }

        let rows: Vec<PostRow> = res.json().await.map_err(ApiError::internal)?;
        Ok(rows.into_iter().next().map(IndexJob::from))
    }

    async fn update_embedding(
        &self,
        post_id: &str,
        embedding: &EmbeddingVector,
    ) -> Result<(), ApiError> {
        let url = self.post_filter_url(post_id);

        let res = self
            .rest(self.client.patch(&url))
            .header("Prefer", "return=minimal")
            .json(&json!({ "description_embedding": embedding }))
            .send()
            .await
            .map_err(|err| ApiError::Persistence(err.to_string()))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Persistence(format!(
                "{} {}",
                status.as_u16(),
                text
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl IdentityResolver for SupabaseStore {
    async fn resolve_user(&self, token: &str) -> Result<Option<String>, ApiError> {
        let url = format!("{}/auth/v1/user", self.base_url);

        let res = self
            .client
            .get(&url)
            .header("apikey", &self.service_key)
            .bearer_auth(token)
            .send()
            .await
            .map_err(ApiError::internal)?;

        let status = res.status();
        if status.is_client_error() {
            return Ok(None);
        }
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Internal(format!(
                "Auth lookup failed: {} {}",
                status.as_u16(),
                text
            )));
        }

        let user: AuthUser = res.json().await.map_err(ApiError::internal)?;
        Ok(Some(user.id))
    }
}
