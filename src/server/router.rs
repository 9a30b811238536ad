use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::core::errors::{RATE_LIMIT_REMAINING_HEADER, RATE_LIMIT_RESET_HEADER};
use crate::server::handlers::{ask, health, index};
use crate::state::AppState;

pub const ASK_PATH: &str = "/api/ai/assistant";
pub const INDEX_PATH: &str = "/api/ai/index-post";

/// Creates the application router.
///
/// - `POST /api/ai/assistant`: semantic search over found posts
/// - `POST /api/ai/index-post`: embed a freshly published post
/// - `GET /health`
pub fn router(state: Arc<AppState>) -> Router {
    let cors_layer = build_cors_layer(&state.config.server.cors_allowed_origins);
    Router::new()
        .route("/health", get(health::health))
        .route(ASK_PATH, post(ask::ask))
        .route(INDEX_PATH, post(index::index_post))
        .with_state(state)
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
}

/// An empty origin list allows any origin.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allowed_origins = origins
        .iter()
        .map(|origin| origin.trim())
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect::<Vec<_>>();

    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::ACCEPT, header::AUTHORIZATION, header::CONTENT_TYPE])
        .expose_headers([
            header::HeaderName::from_static(RATE_LIMIT_REMAINING_HEADER),
            header::HeaderName::from_static(RATE_LIMIT_RESET_HEADER),
        ]);

    if allowed_origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(allowed_origins))
    }
}
