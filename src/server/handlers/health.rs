use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "provider": state.provider.kind.name(),
        "chatModel": state.provider.chat_model,
        "embeddingModel": state.provider.embedding_model,
        "credentialConfigured": state.credential_configured,
        "trackedRateKeys": state.governor.tracked_keys(),
        "startedAt": state.started_at.to_rfc3339(),
    }))
}
