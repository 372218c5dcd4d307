//! Application configuration.
//!
//! Values come from the process environment (a `.env` file is loaded first
//! when present) and optionally from a TOML file. Environment variables take
//! precedence over the file. Missing Reddit credentials are a fatal
//! [`ConfigError`].

use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::ConfigError;

pub const ENV_CLIENT_ID: &str = "REDDIT_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "REDDIT_CLIENT_SECRET";
pub const ENV_USER_AGENT: &str = "REDDIT_USER_AGENT";
pub const ENV_TIMEOUT_SECS: &str = "REDSCRAPE_TIMEOUT_SECS";
pub const ENV_CACHE_TTL_SECS: &str = "REDSCRAPE_CACHE_TTL_SECS";

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CACHE_TTL_SECS: u64 = 3600;

/// Shape of the optional TOML configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub reddit_client_id: Option<String>,
    pub reddit_client_secret: Option<String>,
    pub reddit_user_agent: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub cache_ttl_secs: Option<u64>,
}

impl FileConfig {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub reddit_client_id: String,
    pub reddit_client_secret: String,
    pub reddit_user_agent: String,
    pub request_timeout: Duration,
    pub cache_ttl: Duration,
}

impl AppConfig {
    /// Loads `.env`, the optional config file and the process environment.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!("Loaded environment from {}", path.display());
        }

        let file = match config_path {
            Some(path) => FileConfig::from_path(path)?,
            None => FileConfig::default(),
        };

        Self::from_sources(file, |key| std::env::var(key).ok())
    }

    /// Merges a file config with an environment lookup. Kept separate from
    /// [`AppConfig::load`] so tests never touch the real environment.
    pub fn from_sources<F>(file: FileConfig, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str, fallback: Option<String>| {
            env(key)
                .filter(|value| !value.trim().is_empty())
                .or(fallback)
        };

        let reddit_client_id = lookup(ENV_CLIENT_ID, file.reddit_client_id).ok_or_else(|| {
            ConfigError::MissingEnvironmentVariable {
                var_name: ENV_CLIENT_ID.to_string(),
            }
        })?;
        let reddit_client_secret = lookup(ENV_CLIENT_SECRET, file.reddit_client_secret)
            .ok_or_else(|| ConfigError::MissingEnvironmentVariable {
                var_name: ENV_CLIENT_SECRET.to_string(),
            })?;
        let reddit_user_agent = lookup(ENV_USER_AGENT, file.reddit_user_agent).ok_or_else(|| {
            ConfigError::MissingEnvironmentVariable {
                var_name: ENV_USER_AGENT.to_string(),
            }
        })?;

        let request_timeout_secs = parse_secs(
            ENV_TIMEOUT_SECS,
            env(ENV_TIMEOUT_SECS),
            file.request_timeout_secs,
            DEFAULT_TIMEOUT_SECS,
        )?;
        if request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: ENV_TIMEOUT_SECS.to_string(),
                value: "0".to_string(),
            });
        }
        let cache_ttl_secs = parse_secs(
            ENV_CACHE_TTL_SECS,
            env(ENV_CACHE_TTL_SECS),
            file.cache_ttl_secs,
            DEFAULT_CACHE_TTL_SECS,
        )?;

        Ok(Self {
            reddit_client_id,
            reddit_client_secret,
            reddit_user_agent,
            request_timeout: Duration::from_secs(request_timeout_secs),
            cache_ttl: Duration::from_secs(cache_ttl_secs),
        })
    }
}

fn parse_secs(
    field: &str,
    env_value: Option<String>,
    file_value: Option<u64>,
    default: u64,
) -> Result<u64, ConfigError> {
    match env_value {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
            field: field.to_string(),
            value: raw,
        }),
        None => Ok(file_value.unwrap_or(default)),
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("reddit_client_id", &self.reddit_client_id)
            .field("reddit_client_secret", &"<redacted>")
            .field("reddit_user_agent", &self.reddit_user_agent)
            .field("request_timeout", &self.request_timeout)
            .field("cache_ttl", &self.cache_ttl)
            .finish()
    }
}
