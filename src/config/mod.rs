//! Explicit configuration objects.
//!
//! [`Config::default`] carries the process-wide defaults. [`Config::from_env`]
//! is an opt-in overlay of `EMBEDCACHE_*` variables (plus `OPENAI_API_KEY`);
//! library code never reads the environment on its own.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{
    DEFAULT_API_BASE, DEFAULT_BACKEND, DEFAULT_DATA_DIR, DEFAULT_MODEL,
    DEFAULT_REQUEST_TIMEOUT_SECS,
};
use crate::retry::RetryConfig;

/// Where and how cache entries are stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Directory holding `<key>.<extension>` files. Default: `data`.
    pub data_dir: PathBuf,

    /// Format tag of the serialization backend. Default: `json`.
    pub backend: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            backend: DEFAULT_BACKEND.to_string(),
        }
    }
}

impl CacheConfig {
    /// Returns a copy using `data_dir`.
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    /// Returns a copy using the backend tagged `backend`.
    pub fn with_backend(mut self, backend: impl Into<String>) -> Self {
        self.backend = backend.into();
        self
    }
}

/// Connection settings for the remote provider.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Bearer token. `None` leaves providers unconfigured.
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible API.
    pub api_base: String,

    /// Embedding model name.
    pub model: String,

    /// Connect + read timeout for one remote call. Independent of retries.
    pub request_timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// Full configuration: cache layout, provider connection and retry policy.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub cache: CacheConfig,
    pub provider: ProviderConfig,
    pub retry: RetryConfig,
}

impl Config {
    const ENV_DATA_DIR: &'static str = "EMBEDCACHE_DATA_DIR";
    const ENV_BACKEND: &'static str = "EMBEDCACHE_BACKEND";
    const ENV_MODEL: &'static str = "EMBEDCACHE_MODEL";
    const ENV_API_BASE: &'static str = "EMBEDCACHE_API_BASE";
    const ENV_TIMEOUT_SECS: &'static str = "EMBEDCACHE_TIMEOUT_SECS";
    const ENV_MAX_RETRIES: &'static str = "EMBEDCACHE_MAX_RETRIES";
    const ENV_BASE_DELAY_MS: &'static str = "EMBEDCACHE_BASE_DELAY_MS";
    const ENV_API_KEY: &'static str = "OPENAI_API_KEY";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let cache = CacheConfig {
            data_dir: Self::parse_path_from_env(Self::ENV_DATA_DIR, defaults.cache.data_dir),
            backend: Self::parse_string_from_env(Self::ENV_BACKEND, defaults.cache.backend),
        };

        let provider = ProviderConfig {
            api_key: Self::parse_optional_string_from_env(Self::ENV_API_KEY),
            api_base: Self::parse_string_from_env(Self::ENV_API_BASE, defaults.provider.api_base),
            model: Self::parse_string_from_env(Self::ENV_MODEL, defaults.provider.model),
            request_timeout: Self::parse_u64_from_env(Self::ENV_TIMEOUT_SECS)?
                .map(Duration::from_secs)
                .unwrap_or(defaults.provider.request_timeout),
        };

        let mut retry = defaults.retry;
        if let Some(max_retries) = Self::parse_max_retries_from_env()? {
            retry.max_retries = max_retries;
        }
        if let Some(ms) = Self::parse_u64_from_env(Self::ENV_BASE_DELAY_MS)? {
            retry.base_delay = Duration::from_millis(ms);
        }

        Ok(Self {
            cache,
            provider,
            retry,
        })
    }

    /// Validates paths and basic invariants (does not create directories).
    pub fn validate(&self) -> Result<(), ConfigError> {
        let data_dir = &self.cache.data_dir;
        if data_dir.exists() && !data_dir.is_dir() {
            return Err(ConfigError::NotADirectory {
                path: data_dir.clone(),
            });
        }

        if self.cache.backend.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                name: Self::ENV_BACKEND,
                reason: "backend tag must not be empty".to_string(),
            });
        }

        if self.provider.request_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: Self::ENV_TIMEOUT_SECS,
                reason: "request timeout must be greater than zero".to_string(),
            });
        }

        self.retry.validate()
    }

    fn parse_path_from_env(var_name: &str, default: PathBuf) -> PathBuf {
        env::var(var_name)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(default)
    }

    fn parse_string_from_env(var_name: &str, default: String) -> String {
        Self::parse_optional_string_from_env(var_name).unwrap_or(default)
    }

    fn parse_optional_string_from_env(var_name: &str) -> Option<String> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse_u64_from_env(var_name: &'static str) -> Result<Option<u64>, ConfigError> {
        match Self::parse_optional_string_from_env(var_name) {
            Some(value) => value
                .parse()
                .map(Some)
                .map_err(|e| ConfigError::ParseInt {
                    name: var_name,
                    value,
                    source: e,
                }),
            None => Ok(None),
        }
    }

    /// `unbounded` (or `none`) disables the retry cap; a number sets it.
    fn parse_max_retries_from_env() -> Result<Option<Option<u32>>, ConfigError> {
        match Self::parse_optional_string_from_env(Self::ENV_MAX_RETRIES) {
            Some(value) if matches!(value.to_lowercase().as_str(), "unbounded" | "none") => {
                Ok(Some(None))
            }
            Some(value) => value
                .parse()
                .map(|n| Some(Some(n)))
                .map_err(|e| ConfigError::ParseInt {
                    name: Self::ENV_MAX_RETRIES,
                    value,
                    source: e,
                }),
            None => Ok(None),
        }
    }
}
