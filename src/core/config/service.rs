use std::env;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde_json::{Map, Value};

use super::paths::AppPaths;
use super::settings::AppConfig;
use super::validation::validate_config;
use crate::core::errors::ApiError;

const REDACT_PLACEHOLDER: &str = "****";

const SENSITIVE_PATTERNS: [&str; 10] = [
    "api_key",
    "service_key",
    "secret",
    "password",
    "_token",
    "token_",
    "credential",
    "private_key",
    "access_key",
    "bearer",
];

const SENSITIVE_WHITELIST: [&str; 2] = ["max_tokens", "tokens"];

/// Environment variables and the config path each one overrides.
const ENV_OVERRIDES: [(&str, &[&str], EnvKind); 10] = [
    ("AI_PROVIDER", &["ai", "provider"], EnvKind::Text),
    ("AI_BASE_URL", &["ai", "base_url"], EnvKind::Text),
    ("AI_API_KEY", &["ai", "api_key"], EnvKind::Text),
    ("AI_CHAT_MODEL", &["ai", "chat_model"], EnvKind::Text),
    ("AI_EMBEDDING_MODEL", &["ai", "embedding_model"], EnvKind::Text),
    ("AI_TIMEOUT_SECS", &["ai", "timeout_secs"], EnvKind::Integer),
    ("SUPABASE_URL", &["store", "url"], EnvKind::Text),
    ("SUPABASE_SERVICE_ROLE_KEY", &["store", "service_key"], EnvKind::Text),
    ("HOST", &["server", "host"], EnvKind::Text),
    ("PORT", &["server", "port"], EnvKind::Integer),
];

#[derive(Clone, Copy)]
enum EnvKind {
    Text,
    Integer,
}

#[derive(Clone)]
pub struct ConfigService {
    paths: Arc<AppPaths>,
}

impl ConfigService {
    pub fn new(paths: Arc<AppPaths>) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &AppPaths {
        &self.paths
    }

    /// Public config file deep-merged with the secrets file.
    pub fn load_config(&self) -> Value {
        let public_config = load_yaml_file(&self.paths.config_path);
        let secrets_config = load_yaml_file(&self.paths.secrets_path);
        deep_merge(&public_config, &secrets_config)
    }

    pub fn load_app_config(&self) -> Result<AppConfig, ApiError> {
        let mut merged = self.load_config();
        apply_env_overrides(&mut merged, |name| env::var(name).ok());
        resolve_app_config(merged)
    }

    pub fn redact_sensitive_values(&self, value: &Value) -> Value {
        redact_sensitive_values(value)
    }
}

/// Validates a merged config document and converts it into [`AppConfig`].
pub fn resolve_app_config(merged: Value) -> Result<AppConfig, ApiError> {
    validate_config(&merged)?;
    serde_json::from_value(merged)
        .map_err(|err| ApiError::Configuration(format!("Invalid config: {}", err)))
}

pub fn apply_env_overrides<F>(config: &mut Value, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    for (name, path, kind) in ENV_OVERRIDES {
        let Some(raw) = lookup(name) else {
            continue;
        };
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }
        let value = match kind {
            EnvKind::Text => Value::String(raw.to_string()),
            // Unparseable numbers stay strings so validation reports the path.
            EnvKind::Integer => raw
                .parse::<u64>()
                .map(Value::from)
                .unwrap_or_else(|_| Value::String(raw.to_string())),
        };
        ensure_object_path(config, path, value);
    }
}

fn ensure_object_path(config: &mut Value, path: &[&str], value: Value) {
    if path.is_empty() {
        return;
    }
    if !config.is_object() {
        *config = Value::Object(Map::new());
    }

    let mut current = config;
    for (index, key) in path.iter().enumerate() {
        if index == path.len() - 1 {
            if let Some(map) = current.as_object_mut() {
                map.insert(key.to_string(), value);
            }
            return;
        }

        if !current.get(*key).map(|v| v.is_object()).unwrap_or(false) {
            let Some(map) = current.as_object_mut() else {
                return;
            };
            map.insert((*key).to_string(), Value::Object(Map::new()));
        }

        let Some(next) = current.get_mut(*key) else {
            return;
        };
        current = next;
    }
}

fn load_yaml_file(path: &Path) -> Value {
    if !path.exists() {
        return Value::Object(Map::new());
    }

    match fs::read_to_string(path) {
        Ok(contents) => match serde_yaml::from_str::<Value>(&contents) {
            Ok(value @ Value::Object(_)) => value,
            Ok(_) => Value::Object(Map::new()),
            Err(err) => {
                tracing::warn!("Ignoring unparseable config {}: {}", path.display(), err);
                Value::Object(Map::new())
            }
        },
        Err(err) => {
            tracing::warn!("Failed to read config {}: {}", path.display(), err);
            Value::Object(Map::new())
        }
    }
}

fn deep_merge(base: &Value, override_value: &Value) -> Value {
    match (base, override_value) {
        (Value::Object(base_map), Value::Object(override_map)) => {
            let mut merged: Map<String, Value> = base_map.clone();
            for (key, value) in override_map {
                let merged_value = match merged.get(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value.clone(),
                };
                merged.insert(key.clone(), merged_value);
            }
            Value::Object(merged)
        }
        _ => override_value.clone(),
    }
}

fn redact_sensitive_values(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut redacted = Map::new();
            for (key, val) in map {
                if is_sensitive_key(key) && !val.is_null() {
                    redacted.insert(key.clone(), Value::String(REDACT_PLACEHOLDER.to_string()));
                } else {
                    redacted.insert(key.clone(), redact_sensitive_values(val));
                }
            }
            Value::Object(redacted)
        }
        Value::Array(items) => Value::Array(items.iter().map(redact_sensitive_values).collect()),
        _ => value.clone(),
    }
}

fn is_sensitive_key(key: &str) -> bool {
    let key_lower = key.to_lowercase();
    if SENSITIVE_WHITELIST
        .iter()
        .any(|allowed| *allowed == key_lower)
    {
        return false;
    }
    SENSITIVE_PATTERNS
        .iter()
        .any(|pattern| key_lower.contains(pattern))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn deep_merge_merges_objects_and_overrides_scalars() {
        let base = json!({
            "ai": { "provider": "deepseek", "timeout_secs": 30 },
            "server": { "port": 3000 }
        });
        let secrets = json!({
            "ai": { "api_key": "sk-test" }
        });

        let merged = deep_merge(&base, &secrets);

        assert_eq!(
            merged,
            json!({
                "ai": { "provider": "deepseek", "timeout_secs": 30, "api_key": "sk-test" },
                "server": { "port": 3000 }
            })
        );
    }

    #[test]
    fn env_overrides_win_over_files_and_skip_blank_values() {
        let mut config = json!({
            "ai": { "provider": "zhipu", "chat_model": "glm-4-air" }
        });
        let lookup = lookup_from(&[
            ("AI_PROVIDER", "deepseek"),
            ("AI_CHAT_MODEL", "   "),
            ("PORT", "8081"),
            ("SUPABASE_URL", "https://db.example.com"),
        ]);

        apply_env_overrides(&mut config, lookup);

        assert_eq!(config["ai"]["provider"], "deepseek");
        assert_eq!(config["ai"]["chat_model"], "glm-4-air");
        assert_eq!(config["server"]["port"], 8081);
        assert_eq!(config["store"]["url"], "https://db.example.com");
    }

    #[test]
    fn resolve_app_config_fills_defaults() {
        let config = resolve_app_config(json!({ "ai": { "api_key": "sk" } })).unwrap();

        assert_eq!(config.ai.api_key.as_deref(), Some("sk"));
        assert_eq!(config.ai.timeout_secs, 30);
        assert_eq!(config.rate_limit.ask.limit, 20);
        assert_eq!(config.rate_limit.ask.window_ms, 60_000);
        assert_eq!(config.rate_limit.index.limit, 30);
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn non_numeric_port_is_rejected_with_path() {
        let mut config = json!({});
        apply_env_overrides(&mut config, lookup_from(&[("PORT", "eighty")]));

        let err = resolve_app_config(config).unwrap_err();
        assert!(err.to_string().contains("server.port"), "{}", err);
    }

    #[test]
    fn redact_sensitive_values_replaces_secrets_only() {
        let input = json!({
            "ai": { "api_key": "secret", "chat_model": "deepseek-chat" },
            "store": { "service_key": "srv", "url": "https://db" },
            "limits": { "max_tokens": 42 }
        });

        let redacted = redact_sensitive_values(&input);

        assert_eq!(
            redacted,
            json!({
                "ai": { "api_key": "****", "chat_model": "deepseek-chat" },
                "store": { "service_key": "****", "url": "https://db" },
                "limits": { "max_tokens": 42 }
            })
        );
    }

    #[test]
    fn load_config_merges_yaml_and_secrets() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.yml");
        let secrets_path = dir.path().join("secrets.yaml");
        fs::write(&config_path, "ai:\n  provider: zhipu\nserver:\n  port: 9000\n").unwrap();
        fs::write(&secrets_path, "ai:\n  api_key: sk-yaml\n").unwrap();

        let paths = AppPaths {
            user_data_dir: dir.path().to_path_buf(),
            log_dir: dir.path().join("logs"),
            config_path,
            secrets_path,
        };
        let service = ConfigService::new(Arc::new(paths));

        let merged = service.load_config();
        assert_eq!(merged["ai"]["provider"], "zhipu");
        assert_eq!(merged["ai"]["api_key"], "sk-yaml");
        assert_eq!(merged["server"]["port"], 9000);
    }
}
