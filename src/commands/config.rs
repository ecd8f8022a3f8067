//! Configuration commands.
//!
//! - `config show`: Display current configuration
//! - `config get`: Print one value
//! - `config set`: Set a configuration value
//! - `config path`: Print the config file location

use std::env;
use std::str::FromStr;

use owo_colors::OwoColorize;
use serde_json::json;

use super::CommandOutput;
use crate::cli::OutputOptions;
use crate::config::{API_TOKEN_ENV, API_URL_ENV, Config};
use crate::error::{ConsoleError, Result};

/// Every key accepted by `config get` and `config set`.
pub const CONFIG_KEYS: &[&str] = &[
    "api.base_url",
    "api.service",
    "api.timeout_secs",
    "auth.token",
    "lists.page_size",
    "lists.debounce_ms",
    "lists.min_search_chars",
    "retry.max_attempts",
    "retry.delay_ms",
    "cache.stale_secs",
];

/// Check `key` against the known keys, suggesting the full dotted form for a
/// bare field name such as `page_size`.
fn validate_config_key(key: &str) -> Result<&str> {
    if CONFIG_KEYS.contains(&key) {
        return Ok(key);
    }

    if !key.contains('.')
        && let Some(full) = CONFIG_KEYS
            .iter()
            .find(|k| k.rsplit_once('.').is_some_and(|(_, field)| field == key))
    {
        return Err(ConsoleError::Config(format!(
            "invalid config key '{key}'. Use dot notation: '{full}'"
        )));
    }

    Err(ConsoleError::Config(format!(
        "unknown config key '{key}'. Valid keys: {}",
        CONFIG_KEYS.join(", ")
    )))
}

/// Mask a sensitive value by showing only the first 2 and last 2 characters
fn mask_sensitive_value(value: &str) -> String {
    let char_count = value.chars().count();
    if char_count > 4 {
        let first: String = value.chars().take(2).collect();
        let last: String = value.chars().skip(char_count - 2).collect();
        format!("{first}...{last}")
    } else {
        "****".to_string()
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse::<T>().map_err(|_| {
        ConsoleError::Config(format!(
            "invalid value '{value}' for {key}. Expected a non-negative whole number"
        ))
    })
}

/// Current value of `key` as shown to the user. The token is masked.
fn display_value(config: &Config, key: &str) -> Option<String> {
    match key {
        "api.base_url" => config.api.base_url.clone(),
        "api.service" => Some(config.api.service.clone()),
        "api.timeout_secs" => Some(config.api.timeout_secs.to_string()),
        "auth.token" => config.auth.token.as_deref().map(mask_sensitive_value),
        "lists.page_size" => Some(config.lists.page_size.to_string()),
        "lists.debounce_ms" => Some(config.lists.debounce_ms.to_string()),
        "lists.min_search_chars" => Some(config.lists.min_search_chars.to_string()),
        "retry.max_attempts" => Some(config.retry.max_attempts.to_string()),
        "retry.delay_ms" => Some(config.retry.delay_ms.to_string()),
        "cache.stale_secs" => Some(config.cache.stale_secs.to_string()),
        _ => None,
    }
}

/// Assign `value` to `key`. Returns the JSON form of the stored value.
fn apply_value(config: &mut Config, key: &str, value: &str) -> Result<serde_json::Value> {
    let stored = match key {
        "api.base_url" => {
            let url = value.trim().to_string();
            url::Url::parse(&url).map_err(|e| {
                ConsoleError::Config(format!("invalid value '{value}' for api.base_url: {e}"))
            })?;
            config.api.base_url = Some(url.clone());
            json!(url)
        }
        "api.service" => {
            let service = value.trim();
            if service.is_empty() {
                return Err(ConsoleError::Config("api.service cannot be empty".to_string()));
            }
            config.api.service = service.to_string();
            json!(service)
        }
        "api.timeout_secs" => {
            config.api.timeout_secs = parse_number(key, value)?;
            json!(config.api.timeout_secs)
        }
        "auth.token" => {
            config.set_api_token(value.trim().to_string());
            json!(mask_sensitive_value(value.trim()))
        }
        "lists.page_size" => {
            config.lists.page_size = parse_number(key, value)?;
            json!(config.lists.page_size)
        }
        "lists.debounce_ms" => {
            config.lists.debounce_ms = parse_number(key, value)?;
            json!(config.lists.debounce_ms)
        }
        "lists.min_search_chars" => {
            config.lists.min_search_chars = parse_number(key, value)?;
            json!(config.lists.min_search_chars)
        }
        "retry.max_attempts" => {
            config.retry.max_attempts = parse_number(key, value)?;
            json!(config.retry.max_attempts)
        }
        "retry.delay_ms" => {
            config.retry.delay_ms = parse_number(key, value)?;
            json!(config.retry.delay_ms)
        }
        "cache.stale_secs" => {
            config.cache.stale_secs = parse_number(key, value)?;
            json!(config.cache.stale_secs)
        }
        _ => {
            return Err(ConsoleError::Config(format!("unknown config key '{key}'")));
        }
    };
    config.validate()?;
    Ok(stored)
}

fn env_override(name: &str) -> bool {
    env::var(name).is_ok_and(|v| !v.is_empty())
}

/// Show current configuration
pub fn cmd_config_show(output: OutputOptions) -> Result<()> {
    let config = Config::load()?;

    let values: serde_json::Map<String, serde_json::Value> = CONFIG_KEYS
        .iter()
        .map(|key| (key.to_string(), json!(display_value(&config, key))))
        .collect();

    let json_output = json!({
        "values": values,
        "overrides": {
            "api.base_url": env_override(API_URL_ENV),
            "auth.token": env_override(API_TOKEN_ENV),
        },
        "config_file": Config::config_path().to_string_lossy(),
    });

    let mut text_output = String::new();
    text_output.push_str(&format!("{}\n", "Configuration:".cyan().bold()));

    let mut section = "";
    for key in CONFIG_KEYS {
        let (prefix, field) = key.split_once('.').unwrap_or(("", key));
        if prefix != section {
            text_output.push_str(&format!("\n{}:\n", prefix.cyan()));
            section = prefix;
        }
        let value = match display_value(&config, key) {
            Some(value) => value,
            None => "not configured".dimmed().to_string(),
        };
        text_output.push_str(&format!("  {field}: {value}\n"));
    }

    for (key, var) in [("api.base_url", API_URL_ENV), ("auth.token", API_TOKEN_ENV)] {
        if env_override(var) {
            text_output.push_str(&format!(
                "\n{}",
                format!("{key} is overridden by ${var}").yellow()
            ));
        }
    }

    text_output.push('\n');
    text_output.push_str(&format!(
        "{}",
        format!("Config file: {}", Config::config_path().display()).dimmed()
    ));

    CommandOutput::new(json_output)
        .with_text(text_output)
        .print(output)
}

/// Print a single configuration value
pub fn cmd_config_get(key: &str, output: OutputOptions) -> Result<()> {
    validate_config_key(key)?;
    let config = Config::load()?;
    let value = display_value(&config, key);

    let text = value
        .clone()
        .unwrap_or_else(|| "not configured".dimmed().to_string());
    CommandOutput::new(json!({ "key": key, "value": value }))
        .with_text(text)
        .print(output)
}

/// Set a configuration value
pub fn cmd_config_set(key: &str, value: &str, output: OutputOptions) -> Result<()> {
    validate_config_key(key)?;

    let mut config = Config::load()?;
    let stored = apply_value(&mut config, key, value)?;
    config.save()?;

    let shown = match &stored {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    let json_output = json!({
        "action": "config_set",
        "key": key,
        "value": stored,
        "success": true,
    });
    let text_output = format!("Set {} to {}", key.cyan(), shown);

    CommandOutput::new(json_output)
        .with_text(text_output)
        .print(output)
}

/// Print the config file location
pub fn cmd_config_path(output: OutputOptions) -> Result<()> {
    let path = Config::config_path();
    CommandOutput::new(json!({ "path": path.to_string_lossy() }))
        .with_text(path.display().to_string())
        .print(output)
}
