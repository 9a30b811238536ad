use serde::{Deserialize, Serialize};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
/// Upper bound for a single inference call, connect included.
const DEFAULT_AI_TIMEOUT_SECS: u64 = 30;
const DEFAULT_STORE_TIMEOUT_SECS: u64 = 10;
const DEFAULT_ASK_LIMIT: u32 = 20;
const DEFAULT_INDEX_LIMIT: u32 = 30;
const DEFAULT_WINDOW_MS: u64 = 60_000;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

/// Fully resolved service configuration.
///
/// Built by [`super::ConfigService::load_app_config`] from the merged YAML
/// files plus environment overrides. Every field has a default so the
/// service boots with only `AI_API_KEY` and the store credentials supplied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub ai: AiConfig,
    pub store: StoreConfig,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            cors_allowed_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// `deepseek` or `zhipu`; anything else resolves to `deepseek`.
    pub provider: Option<String>,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub chat_model: Option<String>,
    pub embedding_model: Option<String>,
    pub timeout_secs: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: None,
            base_url: None,
            api_key: None,
            chat_model: None,
            embedding_model: None,
            timeout_secs: DEFAULT_AI_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub url: Option<String>,
    pub service_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: None,
            service_key: None,
            timeout_secs: DEFAULT_STORE_TIMEOUT_SECS,
        }
    }
}

/// One fixed-window quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateRule {
    pub limit: u32,
    pub window_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub ask: RateRule,
    pub index: RateRule,
    /// Seconds between expired-bucket sweeps; 0 disables the sweep task.
    pub sweep_interval_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            ask: RateRule {
                limit: DEFAULT_ASK_LIMIT,
                window_ms: DEFAULT_WINDOW_MS,
            },
            index: RateRule {
                limit: DEFAULT_INDEX_LIMIT,
                window_ms: DEFAULT_WINDOW_MS,
            },
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
