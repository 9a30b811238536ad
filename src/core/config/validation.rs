use serde_json::{Map, Value};
use crate::core::errors::ApiError;

pub fn validate_config(config: &Value) -> Result<(), ApiError> {
    let root = config
        .as_object()
        .ok_or_else(|| config_type_error("root", "object"))?;

    if let Some(server) = expect_optional_object(root, "server")? {
        validate_optional_string_field(server, "server.host", "host")?;
        validate_u64_field(server, "server.port", "port", 0, 65_535)?;
        validate_string_array_field(
            server,
            "server.cors_allowed_origins",
            "cors_allowed_origins",
        )?;
    }

    if let Some(ai) = expect_optional_object(root, "ai")? {
        for key in ["provider", "base_url", "api_key", "chat_model", "embedding_model"] {
            validate_optional_string_field(ai, &format!("ai.{}", key), key)?;
        }
        validate_u64_field(ai, "ai.timeout_secs", "timeout_secs", 1, 600)?;
    }

    if let Some(store) = expect_optional_object(root, "store")? {
        validate_optional_string_field(store, "store.url", "url")?;
        validate_optional_string_field(store, "store.service_key", "service_key")?;
        validate_u64_field(store, "store.timeout_secs", "timeout_secs", 1, 600)?;
    }

    if let Some(rate_limit) = expect_optional_object(root, "rate_limit")? {
        for rule in ["ask", "index"] {
            let path_prefix = format!("rate_limit.{}", rule);
            let Some(value) = rate_limit.get(rule) else {
                continue;
            };
            let entry = value
                .as_object()
                .ok_or_else(|| config_type_error(&path_prefix, "object"))?;
            validate_required_u64_field(
                entry,
                &format!("{}.limit", path_prefix),
                "limit",
                1,
                100_000,
            )?;
            validate_required_u64_field(
                entry,
                &format!("{}.window_ms", path_prefix),
                "window_ms",
                1,
                86_400_000,
            )?;
        }
        validate_u64_field(
            rate_limit,
            "rate_limit.sweep_interval_secs",
            "sweep_interval_secs",
            0,
            86_400,
        )?;
    }

    Ok(())
}

fn expect_optional_object<'a>(
    root: &'a Map<String, Value>,
    key: &str,
) -> Result<Option<&'a Map<String, Value>>, ApiError> {
    match root.get(key) {
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(config_type_error(key, "object")),
        None => Ok(None),
    }
}

fn validate_u64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: u64,
    max: u64,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(number) = value.as_u64() else {
        return Err(config_type_error(path, "integer"));
    };
    if number < min || number > max {
        return Err(ApiError::Configuration(format!(
            "Invalid config at '{}': must be between {} and {}",
            path, min, max
        )));
    }
    Ok(())
}

fn validate_required_u64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: u64,
    max: u64,
) -> Result<(), ApiError> {
    if !section.contains_key(key) {
        return Err(ApiError::Configuration(format!(
            "Invalid config at '{}': value is required",
            path
        )));
    }
    validate_u64_field(section, path, key, min, max)
}

fn validate_optional_string_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    if value.is_null() || value.as_str().is_some() {
        return Ok(());
    }
    Err(config_type_error(path, "string"))
}

fn validate_string_array_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(items) = value.as_array() else {
        return Err(config_type_error(path, "array of strings"));
    };
    for (index, item) in items.iter().enumerate() {
        let Some(text) = item.as_str() else {
            return Err(config_type_error(&format!("{}[{}]", path, index), "string"));
        };
        if text.trim().is_empty() {
            return Err(ApiError::Configuration(format!(
                "Invalid config at '{}[{}]': value cannot be empty",
                path, index
            )));
        }
    }
    Ok(())
}

fn config_type_error(path: &str, expected: &str) -> ApiError {
    ApiError::Configuration(format!(
        "Invalid config at '{}': expected {}",
        path, expected
    ))
}
