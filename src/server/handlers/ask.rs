use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{ConnectInfo, State};
use axum::http::HeaderMap;
use axum::response::Response;
use serde::Deserialize;

use super::utils::{admitted_response, parse_json_body};
use crate::core::errors::ApiError;
use crate::ratelimit::client_ip;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AskBody {
    #[serde(default)]
    pub query: Option<String>,
    /// Accepts any JSON number; fractional values are truncated.
    #[serde(default)]
    pub top_k: Option<f64>,
}

pub async fn ask(
    State(state): State<Arc<AppState>>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let payload: AskBody = parse_json_body(&body)?;
    let client = client_ip(&headers, peer.map(|ConnectInfo(addr)| addr));
    // `as` saturates, so huge or negative values still clamp sensibly.
    let top_k = payload.top_k.map(|value| value.trunc() as i64);

    let admitted = state
        .orchestrator
        .ask(payload.query.as_deref().unwrap_or_default(), top_k, &client)
        .await?;
    Ok(admitted_response(admitted))
}
