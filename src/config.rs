//! Top-level application configuration.
//!
//! Configuration is stored in `.audience/config.yaml` (or under
//! `$AUDIENCE_ROOT`) and includes:
//! - API base URL, service header and request timeout
//! - Authentication token
//! - List paging and debounce settings
//! - Retry policy and page cache window

use std::env;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConsoleError, Result};
use crate::paths;

/// Environment variable overriding `api.base_url`.
pub const API_URL_ENV: &str = "AUDIENCE_API_URL";

/// Environment variable overriding `auth.token`.
pub const API_TOKEN_ENV: &str = "AUDIENCE_API_TOKEN";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub lists: ListsConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub cache: CacheConfig,
}

/// REST endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the audience service, e.g. `https://console.example.com/api/v1`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Value of the `service` header sent with every request (default: audience)
    #[serde(default = "default_service")]
    pub service: String,

    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_service() -> String {
    "audience".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            service: default_service(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Authentication configuration
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Paginated list behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListsConfig {
    /// Records requested per page (default: 20)
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Quiescence interval before a filter edit triggers a refetch (default: 300)
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Shortest non-empty search text that is sent to the server (default: 0)
    #[serde(default)]
    pub min_search_chars: usize,
}

fn default_page_size() -> u32 {
    20
}

fn default_debounce_ms() -> u64 {
    300
}

impl Default for ListsConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            debounce_ms: default_debounce_ms(),
            min_search_chars: 0,
        }
    }
}

/// Retry policy for transient request failures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per request, including the first (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay between attempts in milliseconds (default: 1000)
    #[serde(default = "default_retry_delay_ms")]
    pub delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay_ms: default_retry_delay_ms(),
        }
    }
}

/// Page cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// How long a fetched page is served from memory (default: 300, 0 disables)
    #[serde(default = "default_stale_secs")]
    pub stale_secs: u64,
}

fn default_stale_secs() -> u64 {
    300
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            stale_secs: default_stale_secs(),
        }
    }
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> PathBuf {
        paths::config_file()
    }

    /// Load configuration from file, or return default if not found
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&path).map_err(|e| {
            ConsoleError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read config at {}: {}", path.display(), e),
            ))
        })?;
        let config: Config = serde_yaml_ng::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ConsoleError::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create directory for config at {}: {}",
                        parent.display(),
                        e
                    ),
                ))
            })?;
        }

        let content = serde_yaml_ng::to_string(self)?;
        fs::write(&path, content).map_err(|e| {
            ConsoleError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to write config at {}: {}", path.display(), e),
            ))
        })?;

        // The file may hold an API token: owner read/write only
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = fs::Permissions::from_mode(0o600);
            fs::set_permissions(&path, permissions)?;
        }

        Ok(())
    }

    /// Reject values no request could be built from.
    pub fn validate(&self) -> Result<()> {
        if self.lists.page_size == 0 {
            return Err(ConsoleError::Config(
                "lists.page_size must be at least 1".to_string(),
            ));
        }
        if self.api.timeout_secs == 0 {
            return Err(ConsoleError::Config(
                "api.timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConsoleError::Config(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if let Some(url) = &self.api.base_url {
            url::Url::parse(url).map_err(|e| {
                ConsoleError::Config(format!("api.base_url '{url}' is not a valid URL: {e}"))
            })?;
        }
        Ok(())
    }

    /// Get the API base URL from environment variable or config file
    pub fn base_url(&self) -> Option<String> {
        if let Ok(url) = env::var(API_URL_ENV)
            && !url.is_empty()
        {
            return Some(url);
        }

        self.api.base_url.clone()
    }

    /// Get the API token from environment variable or config file
    pub fn api_token(&self) -> Option<String> {
        if let Ok(token) = env::var(API_TOKEN_ENV)
            && !token.is_empty()
        {
            return Some(token);
        }

        self.auth.token.clone()
    }

    /// Set the API token
    pub fn set_api_token(&mut self, token: String) {
        self.auth.token = Some(token);
    }

    /// Get the request timeout duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    /// Get the filter debounce interval
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.lists.debounce_ms)
    }

    /// Get the page cache window, `None` when caching is disabled
    pub fn stale_window(&self) -> Option<Duration> {
        (self.cache.stale_secs > 0).then(|| Duration::from_secs(self.cache.stale_secs))
    }
}
