use axum::body::Bytes;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::core::errors::{insert_rate_limit_headers, ApiError};
use crate::matching::Admitted;

/// Parses a JSON request body; an empty body reads as `{}`.
pub fn parse_json_body<T>(body: &Bytes) -> Result<T, ApiError>
where
    T: DeserializeOwned + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body)
        .map_err(|err| ApiError::Validation(format!("Invalid JSON body: {}", err)))
}

/// Token from `Authorization: Bearer <token>`.
///
/// The scheme is matched case-insensitively and may carry an empty token,
/// which callers reject as missing. A bare value without a scheme is taken
/// as the token; any other scheme yields `None`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?.trim_start();
    match value.split_once(char::is_whitespace) {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") => Some(token.trim()),
        Some(_) => None,
        None if value.trim_end().eq_ignore_ascii_case("bearer") => Some(""),
        None => Some(value.trim_end()),
    }
}

/// Renders an admitted request's outcome, success or failure, with the
/// caller's rate-limit headers attached.
pub fn admitted_response<T: Serialize>(admitted: Admitted<T>) -> Response {
    let mut response = match admitted.outcome {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(err) => err.into_response(),
    };
    insert_rate_limit_headers(
        response.headers_mut(),
        admitted.rate.remaining,
        admitted.rate.reset_at,
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize)]
    struct Body {
        query: Option<String>,
    }

    #[test]
    fn empty_body_reads_as_default() {
        let parsed: Body = parse_json_body(&Bytes::from_static(b"  ")).unwrap();
        assert!(parsed.query.is_none());
    }

    #[test]
    fn malformed_body_is_validation_error() {
        let err = parse_json_body::<Body>(&Bytes::from_static(b"{not json")).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn bearer_token_strips_scheme() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers), Some("abc.def"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("bearer  abc.def "));
        assert_eq!(bearer_token(&headers), Some("abc.def"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("raw-token"));
        assert_eq!(bearer_token(&headers), Some("raw-token"));
    }

    #[test]
    fn bearer_scheme_without_token_is_empty_not_the_scheme_word() {
        let mut headers = HeaderMap::new();
        for raw in ["Bearer ", "Bearer", "BEARER   "] {
            headers.insert(header::AUTHORIZATION, HeaderValue::from_static(raw));
            assert_eq!(bearer_token(&headers), Some(""), "header {raw:?}");
        }

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwdw=="));
        assert_eq!(bearer_token(&headers), None);
    }
}
