use serde::{Deserialize, Serialize};

use crate::core::errors::ApiError;
use crate::ratelimit::RateDecision;

pub const DEFAULT_TOP_K: i64 = 5;
pub const MIN_TOP_K: usize = 1;
pub const MAX_TOP_K: usize = 10;

/// Clamps a caller-supplied result count into `[1, 10]`; absent means 5.
pub fn clamp_top_k(requested: Option<i64>) -> usize {
    let requested = requested.unwrap_or(DEFAULT_TOP_K);
    requested.clamp(MIN_TOP_K as i64, MAX_TOP_K as i64) as usize
}

/// One validated ask request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    raw_text: String,
    top_k: usize,
}

impl SearchQuery {
    /// Trims the text; `None` if nothing is left.
    pub fn new(raw_text: &str, top_k: Option<i64>) -> Option<Self> {
        let trimmed = raw_text.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self {
            raw_text: trimmed.to_string(),
            top_k: clamp_top_k(top_k),
        })
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }
}

/// A "found" post returned by nearest-neighbour search.
///
/// `score` comes from the store and is never recomputed here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchCandidate {
    pub id: String,
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_urls: Option<Vec<String>>,
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Lost,
    Found,
}

impl PostStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "lost" => Some(PostStatus::Lost),
            "found" => Some(PostStatus::Found),
            _ => None,
        }
    }
}

/// The fields of a post the indexing pipeline needs.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexJob {
    pub post_id: String,
    pub owner_user_id: String,
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    /// `None` when the stored status is not one this service knows.
    pub status: Option<PostStatus>,
}

impl IndexJob {
    pub fn is_found(&self) -> bool {
        self.status == Some(PostStatus::Found)
    }
}

/// Response body of a completed ask.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AskResult {
    pub normalized_query: String,
    pub reply: String,
    pub matches: Vec<MatchCandidate>,
}

/// Result of a request that got past the rate governor.
///
/// The decision is kept even when the work fails so responses can still
/// report the caller's remaining quota.
#[derive(Debug)]
pub struct Admitted<T> {
    pub rate: RateDecision,
    pub outcome: Result<T, ApiError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexOutcome {
    pub ok: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub skipped: bool,
}

impl IndexOutcome {
    pub fn indexed() -> Self {
        Self {
            ok: true,
            skipped: false,
        }
    }

    pub fn skipped() -> Self {
        Self {
            ok: true,
            skipped: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_k_is_clamped() {
        assert_eq!(clamp_top_k(None), 5);
        assert_eq!(clamp_top_k(Some(0)), 1);
        assert_eq!(clamp_top_k(Some(-3)), 1);
        assert_eq!(clamp_top_k(Some(7)), 7);
        assert_eq!(clamp_top_k(Some(999)), 10);
        assert_eq!(clamp_top_k(Some(i64::MIN)), 1);
    }

    #[test]
    fn search_query_rejects_blank_text() {
        assert!(SearchQuery::new("", None).is_none());
        assert!(SearchQuery::new(" \t\n", Some(3)).is_none());

        let query = SearchQuery::new("  黑色保温杯 图书馆 ", Some(50)).unwrap();
        assert_eq!(query.raw_text(), "黑色保温杯 图书馆");
        assert_eq!(query.top_k(), 10);
    }

    #[test]
    fn index_outcome_omits_skipped_when_false() {
        assert_eq!(
            serde_json::to_value(IndexOutcome::indexed()).unwrap(),
            serde_json::json!({"ok": true})
        );
        assert_eq!(
            serde_json::to_value(IndexOutcome::skipped()).unwrap(),
            serde_json::json!({"ok": true, "skipped": true})
        );
    }

    #[test]
    fn post_status_parses_known_values_only() {
        assert_eq!(PostStatus::parse("found"), Some(PostStatus::Found));
        assert_eq!(PostStatus::parse("lost"), Some(PostStatus::Lost));
        assert_eq!(PostStatus::parse("claimed"), None);
    }

    #[test]
    fn ask_result_uses_camel_case() {
        let result = AskResult {
            normalized_query: "q".into(),
            reply: "r".into(),
            matches: vec![MatchCandidate {
                id: "1".into(),
                title: "t".into(),
                description: "d".into(),
                location: None,
                image_urls: Some(vec!["https://img/1.jpg".into()]),
                score: 0.5,
            }],
        };
        let value = serde_json::to_value(result).unwrap();
        assert_eq!(value["normalizedQuery"], "q");
        assert_eq!(value["matches"][0]["imageUrls"][0], "https://img/1.jpg");
    }
}
