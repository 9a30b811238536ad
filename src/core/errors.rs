use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::{response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

pub const RATE_LIMIT_REMAINING_HEADER: &str = "x-ratelimit-remaining";
pub const RATE_LIMIT_RESET_HEADER: &str = "x-ratelimit-reset";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("Too many requests. Please retry later.")]
    RateLimited { remaining: u32, reset_at: i64 },
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("forbidden")]
    Forbidden,
    #[error("not found: {0}")]
    NotFound(String),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("AI request failed: {status} {body}")]
    Upstream { status: u16, body: String },
    #[error("AI request failed: {0}")]
    Transport(String),
    #[error("{0}")]
    EmptyResult(String),
    #[error("retrieval failed: {0}")]
    Retrieval(String),
    #[error("persistence failed: {0}")]
    Persistence(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        ApiError::Internal(err.to_string())
    }

    pub fn transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Transport(format!("request timed out: {}", err))
        } else {
            ApiError::Transport(err.to_string())
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Configuration(_)
            | ApiError::Upstream { .. }
            | ApiError::Transport(_)
            | ApiError::EmptyResult(_)
            | ApiError::Retrieval(_)
            | ApiError::Persistence(_)
            | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Writes the governor's verdict onto a response header map.
pub fn insert_rate_limit_headers(headers: &mut HeaderMap, remaining: u32, reset_at: i64) {
    headers.insert(
        RATE_LIMIT_REMAINING_HEADER,
        HeaderValue::from(remaining),
    );
    headers.insert(RATE_LIMIT_RESET_HEADER, HeaderValue::from(reset_at));
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        match &self {
            ApiError::Validation(_)
            | ApiError::RateLimited { .. }
            | ApiError::Unauthorized(_)
            | ApiError::Forbidden
            | ApiError::NotFound(_) => tracing::warn!("Request rejected ({}): {}", status, self),
            _ => tracing::error!("Request failed ({}): {}", status, self),
        }

        let message = match &self {
            ApiError::Unauthorized(_) => "Unauthorized".to_string(),
            ApiError::Forbidden => "Forbidden".to_string(),
            ApiError::NotFound(what) => format!("{} not found", what),
            other => other.to_string(),
        };

        let mut response = (status, Json(json!({ "error": message }))).into_response();
        if let ApiError::RateLimited {
            remaining,
            reset_at,
        } = self
        {
            insert_rate_limit_headers(response.headers_mut(), remaining, reset_at);
        }
        response
    }
}
