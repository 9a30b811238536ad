use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{ConnectInfo, State};
use axum::http::HeaderMap;
use axum::response::Response;
use serde::Deserialize;

use super::utils::{admitted_response, bearer_token, parse_json_body};
use crate::core::errors::ApiError;
use crate::matching::{Admitted, IndexOutcome};
use crate::ratelimit::client_ip;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexBody {
    #[serde(default)]
    pub post_id: Option<String>,
}

pub async fn index_post(
    State(state): State<Arc<AppState>>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let client = client_ip(&headers, peer.map(|ConnectInfo(addr)| addr));
    let rate = state.indexer.admit(&client)?;

    let outcome = run_index(&state, &headers, &body).await;
    Ok(admitted_response(Admitted { rate, outcome }))
}

async fn run_index(
    state: &AppState,
    headers: &HeaderMap,
    body: &Bytes,
) -> Result<IndexOutcome, ApiError> {
    let caller = state.indexer.authenticate(bearer_token(headers)).await?;

    let payload: IndexBody = parse_json_body(body)?;
    let post_id = payload
        .post_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::Validation("Missing postId".to_string()))?;

    state.indexer.index_post(post_id, &caller).await
}
