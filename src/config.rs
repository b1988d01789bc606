//! Runtime configuration
//!
//! Resolved from the process environment (optionally populated from a
//! `.env` file by the binary). Nothing here touches storage; a bad value
//! fails before any connection is attempted.

use thiserror::Error;

pub const URL_VAR: &str = "MONGODB_URL";
pub const DATABASE_VAR: &str = "MONGODB_DB";
pub const MAX_POOL_VAR: &str = "MONGODB_MAX_POOL_SIZE";
pub const MIN_POOL_VAR: &str = "MONGODB_MIN_POOL_SIZE";

pub const DEFAULT_MAX_POOL_SIZE: u32 = 10;
pub const DEFAULT_MIN_POOL_SIZE: u32 = 0;

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} must be a non-negative integer, got '{value}'")]
    Invalid { name: &'static str, value: String },

    #[error("MONGODB_MIN_POOL_SIZE ({min}) exceeds MONGODB_MAX_POOL_SIZE ({max})")]
    PoolBounds { min: u32, max: u32 },
}

/// Connection settings for the document store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Connection string
    pub url: String,
    /// Target database name
    pub database: String,
    pub max_pool_size: u32,
    pub min_pool_size: u32,
}

impl Config {
    /// Reads configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads configuration through `lookup`, which maps a variable name to
    /// its value
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing(name))
        };
        let pool_size = |name: &'static str, default: u32| match lookup(name) {
            Some(raw) if !raw.trim().is_empty() => {
                raw.trim().parse::<u32>().map_err(|_| ConfigError::Invalid {
                    name,
                    value: raw.clone(),
                })
            }
            _ => Ok(default),
        };

        let config = Config {
            url: required(URL_VAR)?,
            database: required(DATABASE_VAR)?,
            max_pool_size: pool_size(MAX_POOL_VAR, DEFAULT_MAX_POOL_SIZE)?,
            min_pool_size: pool_size(MIN_POOL_VAR, DEFAULT_MIN_POOL_SIZE)?,
        };

        if config.min_pool_size > config.max_pool_size {
            return Err(ConfigError::PoolBounds {
                min: config.min_pool_size,
                max: config.max_pool_size,
            });
        }
        Ok(config)
    }

    /// Connection string with any credentials masked, for logging
    pub fn redacted_url(&self) -> String {
        let Some((scheme, rest)) = self.url.split_once("://") else {
            return self.url.clone();
        };
        match rest.rsplit_once('@') {
            Some((_, host)) => format!("{}://***@{}", scheme, host),
            None => self.url.clone(),
        }
    }
}
