use std::fmt;

use crate::core::config::AiConfig;

/// Supported OpenAI-compatible inference backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    DeepSeek,
    Zhipu,
}

impl ProviderKind {
    /// Case-insensitive; anything other than `zhipu` selects DeepSeek.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|value| value.trim().to_lowercase()) {
            Some(value) if value == "zhipu" => ProviderKind::Zhipu,
            _ => ProviderKind::DeepSeek,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ProviderKind::DeepSeek => "deepseek",
            ProviderKind::Zhipu => "zhipu",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderKind::DeepSeek => "https://api.deepseek.com/v1",
            ProviderKind::Zhipu => "https://open.bigmodel.cn/api/paas/v4",
        }
    }

    pub fn default_chat_model(&self) -> &'static str {
        match self {
            ProviderKind::DeepSeek => "deepseek-chat",
            ProviderKind::Zhipu => "glm-4-flash",
        }
    }

    pub fn default_embedding_model(&self) -> &'static str {
        match self {
            ProviderKind::DeepSeek => "deepseek-embedding",
            ProviderKind::Zhipu => "embedding-3",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Provider selection with every override applied, resolved once per gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderProfile {
    pub kind: ProviderKind,
    pub base_url: String,
    pub chat_model: String,
    pub embedding_model: String,
}

impl ProviderProfile {
    pub fn resolve(config: &AiConfig) -> Self {
        let kind = ProviderKind::parse(config.provider.as_deref());
        let base_url = non_blank(config.base_url.as_deref())
            .unwrap_or(kind.default_base_url())
            .trim_end_matches('/')
            .to_string();
        let chat_model = non_blank(config.chat_model.as_deref())
            .unwrap_or(kind.default_chat_model())
            .to_string();
        let embedding_model = non_blank(config.embedding_model.as_deref())
            .unwrap_or(kind.default_embedding_model())
            .to_string();

        Self {
            kind,
            base_url,
            chat_model,
            embedding_model,
        }
    }

    pub fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    pub fn embeddings_url(&self) -> String {
        format!("{}/embeddings", self.base_url)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_provider_falls_back_to_deepseek() {
        assert_eq!(ProviderKind::parse(None), ProviderKind::DeepSeek);
        assert_eq!(ProviderKind::parse(Some("openai")), ProviderKind::DeepSeek);
        assert_eq!(ProviderKind::parse(Some(" ZhiPu ")), ProviderKind::Zhipu);
    }

    #[test]
    fn defaults_follow_provider() {
        let profile = ProviderProfile::resolve(&AiConfig {
            provider: Some("zhipu".into()),
            ..AiConfig::default()
        });
        assert_eq!(profile.base_url, "https://open.bigmodel.cn/api/paas/v4");
        assert_eq!(profile.chat_model, "glm-4-flash");
        assert_eq!(profile.embedding_model, "embedding-3");
        assert_eq!(
            profile.embeddings_url(),
            "https://open.bigmodel.cn/api/paas/v4/embeddings"
        );
    }

    #[test]
    fn overrides_replace_defaults() {
        let profile = ProviderProfile::resolve(&AiConfig {
            base_url: Some("http://localhost:8000/v1/".into()),
            chat_model: Some("my-chat".into()),
            embedding_model: Some("  ".into()),
            ..AiConfig::default()
        });
        assert_eq!(profile.kind, ProviderKind::DeepSeek);
        assert_eq!(profile.chat_url(), "http://localhost:8000/v1/chat/completions");
        assert_eq!(profile.chat_model, "my-chat");
        assert_eq!(profile.embedding_model, "deepseek-embedding");
    }
}
