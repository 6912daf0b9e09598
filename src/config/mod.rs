//! Environment-backed configuration.
//!
//! Every setting has a default. Override with `CHATSIFT_*` environment variables;
//! command-line flags override both.

pub mod error;


pub use error::ConfigError;

use std::env;

use crate::constants::{
    DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_TOKENS, DEFAULT_MIN_CHUNK_MESSAGES, DEFAULT_MODEL,
    DEFAULT_WINDOW_OVERLAP, DEFAULT_WINDOW_SIZE, DEFAULT_WORKERS,
};
use crate::dispatch::DispatcherConfig;
use crate::retry::RetryPolicy;
use crate::transcript::WindowConfig;

/// Run configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `CHATSIFT_*` overrides on top of defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Model id passed to the provider. Default: `claude-3-haiku-20240307`.
    pub model: String,

    /// Concurrent scoring units. Default: `5`.
    pub workers: usize,

    /// Attempts per unit, including the first. Default: `3`.
    pub max_retries: u32,

    /// Whether identical requests are served from the in-memory cache. Default: `true`.
    pub cache_enabled: bool,

    /// Messages per window. Default: `100`.
    pub window_size: usize,

    /// Messages shared by consecutive windows. Default: `50`.
    pub window_overlap: usize,

    /// Windows shorter than this are dropped. Default: `10`.
    pub min_chunk_messages: usize,

    /// Completion token budget per call. Default: `150`.
    pub max_tokens: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            workers: DEFAULT_WORKERS,
            max_retries: DEFAULT_MAX_ATTEMPTS,
            cache_enabled: true,
            window_size: DEFAULT_WINDOW_SIZE,
            window_overlap: DEFAULT_WINDOW_OVERLAP,
            min_chunk_messages: DEFAULT_MIN_CHUNK_MESSAGES,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

impl Config {
    const ENV_MODEL: &'static str = "CHATSIFT_MODEL";
    const ENV_WORKERS: &'static str = "CHATSIFT_WORKERS";
    const ENV_MAX_RETRIES: &'static str = "CHATSIFT_MAX_RETRIES";
    const ENV_CACHE_ENABLED: &'static str = "CHATSIFT_CACHE_ENABLED";
    const ENV_WINDOW_SIZE: &'static str = "CHATSIFT_WINDOW_SIZE";
    const ENV_WINDOW_OVERLAP: &'static str = "CHATSIFT_WINDOW_OVERLAP";
    const ENV_MIN_CHUNK_MESSAGES: &'static str = "CHATSIFT_MIN_CHUNK_MESSAGES";
    const ENV_MAX_TOKENS: &'static str = "CHATSIFT_MAX_TOKENS";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            model: Self::parse_string_from_env(Self::ENV_MODEL, defaults.model),
            workers: Self::parse_number_from_env(Self::ENV_WORKERS, defaults.workers)?,
            max_retries: Self::parse_number_from_env(Self::ENV_MAX_RETRIES, defaults.max_retries)?,
            cache_enabled: Self::parse_bool_from_env(
                Self::ENV_CACHE_ENABLED,
                defaults.cache_enabled,
            )?,
            window_size: Self::parse_number_from_env(Self::ENV_WINDOW_SIZE, defaults.window_size)?,
            window_overlap: Self::parse_number_from_env(
                Self::ENV_WINDOW_OVERLAP,
                defaults.window_overlap,
            )?,
            min_chunk_messages: Self::parse_number_from_env(
                Self::ENV_MIN_CHUNK_MESSAGES,
                defaults.min_chunk_messages,
            )?,
            max_tokens: Self::parse_number_from_env(Self::ENV_MAX_TOKENS, defaults.max_tokens)?,
        })
    }

    /// Checks counts and window geometry.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::EmptyModel);
        }
        if self.workers == 0 {
            return Err(ConfigError::Zero {
                name: Self::ENV_WORKERS,
            });
        }
        if self.max_retries == 0 {
            return Err(ConfigError::Zero {
                name: Self::ENV_MAX_RETRIES,
            });
        }
        if self.max_tokens == 0 {
            return Err(ConfigError::Zero {
                name: Self::ENV_MAX_TOKENS,
            });
        }
        self.window_config().validate()?;
        Ok(())
    }

    pub fn window_config(&self) -> WindowConfig {
        WindowConfig::new(self.window_size, self.window_overlap)
            .min_messages(self.min_chunk_messages)
    }

    /// Dispatcher settings with the default backoff curve.
    pub fn dispatcher_config(&self) -> DispatcherConfig {
        DispatcherConfig::default()
            .with_workers(self.workers)
            .with_cache(self.cache_enabled)
            .with_model(self.model.clone())
            .with_max_tokens(self.max_tokens)
            .with_policy(RetryPolicy::new(self.max_retries))
    }

    fn parse_string_from_env(var_name: &str, default: String) -> String {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(default)
    }

    fn parse_number_from_env<T>(var_name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: std::str::FromStr<Err = std::num::ParseIntError>,
    {
        match env::var(var_name) {
            Ok(value) => value
                .trim()
                .parse()
                .map_err(|source| ConfigError::InvalidNumber {
                    name: var_name,
                    value,
                    source,
                }),
            Err(_) => Ok(default),
        }
    }

    fn parse_bool_from_env(var_name: &'static str, default: bool) -> Result<bool, ConfigError> {
        let Ok(value) = env::var(var_name) else {
            return Ok(default);
        };
        match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidBool {
                name: var_name,
                value,
            }),
        }
    }
}
