//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use crate::client::{ClientConfig, RetryPolicy, DEFAULT_TOKEN_TTL_SECS, MAX_TOKEN_TTL_SECS};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub client: ClientSection,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Connection settings for the Cube.js API
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSection {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_base_path")]
    pub base_path: String,

    /// Token signing secret; leave unset to send requests unauthenticated
    pub secret: Option<String>,

    #[serde(default = "default_load_timeout")]
    pub load_timeout_secs: f64,

    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: i64,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_base_delay")]
    pub base_delay_ms: u64,
}

fn default_host() -> String {
    "http://localhost:4000".to_string()
}

fn default_base_path() -> String {
    "/cubejs-api".to_string()
}

fn default_load_timeout() -> f64 {
    30.0
}

fn default_token_ttl() -> i64 {
    DEFAULT_TOKEN_TTL_SECS
}

fn default_max_attempts() -> u32 {
    8
}

fn default_base_delay() -> u64 {
    1000
}

impl Default for ClientSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            base_path: default_base_path(),
            secret: None,
            load_timeout_secs: default_load_timeout(),
            token_ttl_secs: default_token_ttl(),
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay(),
        }
    }
}

impl From<&ClientSection> for ClientConfig {
    fn from(section: &ClientSection) -> Self {
        let load_timeout = Duration::try_from_secs_f64(section.load_timeout_secs)
            .unwrap_or_else(|_| Duration::from_secs_f64(default_load_timeout()));

        let token_ttl = match section.token_ttl_secs {
            secs @ 1..=MAX_TOKEN_TTL_SECS => chrono::Duration::try_seconds(secs),
            _ => None,
        }
        .unwrap_or_else(|| {
            tracing::warn!(
                token_ttl_secs = section.token_ttl_secs,
                "Token TTL out of range, using default"
            );
            chrono::Duration::seconds(DEFAULT_TOKEN_TTL_SECS)
        });

        Self {
            host: section.host.clone(),
            base_path: section.base_path.clone(),
            secret: section.secret.clone(),
            load_timeout,
            token_ttl,
            retry: RetryPolicy::new(
                section.max_attempts,
                Duration::from_millis(section.base_delay_ms),
            ),
            ..ClientConfig::default()
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("cubejs").join("config.toml")),
            Some(PathBuf::from("./cubejs.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                match Self::load_with_env(path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Client settings ready to hand to [`crate::client::CubeClient`]
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::from(&self.client)
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(host) = var("CUBEJS_API_HOST") {
            self.client.host = host;
        }
        if let Some(base_path) = var("CUBEJS_BASE_PATH") {
            self.client.base_path = base_path;
        }
        if let Some(secret) = var("CUBEJS_API_SECRET") {
            self.client.secret = Some(secret);
        }
        if let Some(timeout) = var("CUBEJS_LOAD_TIMEOUT").and_then(|v| v.parse().ok()) {
            self.client.load_timeout_secs = timeout;
        }
        if let Some(ttl) = var("CUBEJS_TOKEN_TTL").and_then(|v| v.parse().ok()) {
            self.client.token_ttl_secs = ttl;
        }

        if let Some(level) = var("CUBEJS_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("CUBEJS_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# cubejs-client configuration
#
# Environment variables override these settings:
# - CUBEJS_API_HOST
# - CUBEJS_BASE_PATH
# - CUBEJS_API_SECRET
# - CUBEJS_LOAD_TIMEOUT
# - CUBEJS_TOKEN_TTL
# - CUBEJS_LOG_LEVEL
# - CUBEJS_LOG_FORMAT

[client]
# Cube.js API host
host = "http://localhost:4000"

# Cube.js API base path
base_path = "/cubejs-api"

# Secret for signing tokens. Leave unset to skip authentication.
# secret = ""

# Timeout in seconds for each load attempt
load_timeout_secs = 30.0

# Token lifetime in seconds
token_ttl_secs = 3600

# Attempts per request, including the first one
max_attempts = 8

# Delay before the first retry (ms); doubles on each retry
base_delay_ms = 1000

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
