use std::sync::Arc;

use crate::llm::InferenceClient;

pub const NORMALIZE_SYSTEM_PROMPT: &str = "你是失物招领信息提取助手。请把用户输入改写成适合向量检索的中文短语，保留核心物品、颜色、时间、地点。只输出一行文本，不要解释。";
const NORMALIZE_TEMPERATURE: f32 = 0.1;

/// Rewrites a free-text lost-item query into one retrieval-friendly phrase.
#[derive(Clone)]
pub struct IntentNormalizer {
    client: Arc<dyn InferenceClient>,
}

impl IntentNormalizer {
    pub fn new(client: Arc<dyn InferenceClient>) -> Self {
        Self { client }
    }

    /// Never fails: an error or a blank completion yields `raw_query` as is.
    pub async fn normalize(&self, raw_query: &str) -> String {
        match self
            .client
            .complete(NORMALIZE_SYSTEM_PROMPT, raw_query, NORMALIZE_TEMPERATURE)
            .await
        {
            Ok(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    tracing::warn!("Normalizer returned empty text; using raw query");
                    raw_query.to_string()
                } else {
                    trimmed.to_string()
                }
            }
            Err(err) => {
                tracing::warn!("Normalizer unavailable, using raw query: {}", err);
                raw_query.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::ApiError;
    use crate::matching::testing::ScriptedClient;

    #[tokio::test]
    async fn returns_trimmed_completion() {
        let client = Arc::new(ScriptedClient::new().with_completion(Ok("  黑色保温杯 图书馆丢失\n")));
        let normalizer = IntentNormalizer::new(client.clone());

        assert_eq!(normalizer.normalize("黑色保温杯 图书馆").await, "黑色保温杯 图书馆丢失");

        let calls = client.completions();
        assert_eq!(calls[0].system, NORMALIZE_SYSTEM_PROMPT);
        assert_eq!(calls[0].user, "黑色保温杯 图书馆");
        assert!((calls[0].temperature - 0.1).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn blank_completion_falls_back_to_raw_query() {
        let client = Arc::new(ScriptedClient::new().with_completion(Ok(" \n\t ")));
        let normalizer = IntentNormalizer::new(client);

        assert_eq!(normalizer.normalize("蓝色雨伞").await, "蓝色雨伞");
    }

    #[tokio::test]
    async fn upstream_failure_falls_back_to_raw_query() {
        let client = Arc::new(ScriptedClient::new().with_completion(Err(ApiError::Upstream {
            status: 503,
            body: "overloaded".into(),
        })));
        let normalizer = IntentNormalizer::new(client);

        assert_eq!(normalizer.normalize("student card").await, "student card");
    }
}
