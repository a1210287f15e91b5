//! # Configuration
//!
//! Server settings resolved in layers, each overriding the one before:
//!
//! 1. Built-in defaults
//! 2. TOML file (`--config lantern.toml`)
//! 3. Environment (`LANTERN_*`)
//! 4. Command-line flags
//!
//! ```toml
//! host = "0.0.0.0"
//! port = 6380
//! default_ttl_seconds = 60
//! sweep_interval_seconds = 60
//! rate_limit = 100
//! ```

use lantern_core::CacheError;
use lantern_core::primitives::{DEFAULT_SWEEP_INTERVAL, DEFAULT_TTL};
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Default listening port.
pub const DEFAULT_PORT: u16 = 6380;

/// Default rate limit in requests per second.
pub const DEFAULT_RATE_LIMIT: u32 = 100;

// =============================================================================
// RESOLVED CONFIG
// =============================================================================

/// Fully resolved server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// TTL applied to writes that carry no expiration.
    pub default_ttl: Duration,
    pub sweep_interval: Duration,
    /// Bearer key required on every endpoint except `/health`.
    pub api_key: Option<String>,
    /// Requests per second; 0 disables rate limiting.
    pub rate_limit: u32,
    /// Comma-separated allowed origins, or `*`.
    pub cors_origins: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            default_ttl: DEFAULT_TTL,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            api_key: None,
            rate_limit: DEFAULT_RATE_LIMIT,
            cors_origins: None,
        }
    }
}

impl Config {
    /// Resolve defaults → `file` → process environment → `flags`.
    pub fn load(file: Option<&Path>, flags: ConfigLayer) -> Result<Self, CacheError> {
        let file_layer = match file {
            Some(path) => ConfigLayer::from_file(path)?,
            None => ConfigLayer::default(),
        };
        let env_layer = ConfigLayer::from_lookup(|name| std::env::var(name).ok())?;

        let config = Self::default()
            .merge(file_layer)
            .merge(env_layer)
            .merge(flags);
        config.validate()?;
        Ok(config)
    }

    /// Apply every field `layer` sets.
    #[must_use]
    pub fn merge(mut self, layer: ConfigLayer) -> Self {
        if let Some(host) = layer.host {
            self.host = host;
        }
        if let Some(port) = layer.port {
            self.port = port;
        }
        if let Some(seconds) = layer.default_ttl_seconds {
            self.default_ttl = Duration::from_secs(seconds);
        }
        if let Some(seconds) = layer.sweep_interval_seconds {
            self.sweep_interval = Duration::from_secs(seconds);
        }
        if let Some(key) = layer.api_key {
            self.api_key = Some(key).filter(|k| !k.is_empty());
        }
        if let Some(rate) = layer.rate_limit {
            self.rate_limit = rate;
        }
        if let Some(origins) = layer.cors_origins {
            self.cors_origins = Some(origins).filter(|o| !o.trim().is_empty());
        }
        self
    }

    pub fn validate(&self) -> Result<(), CacheError> {
        if self.default_ttl.is_zero() {
            return Err(CacheError::ConfigError(
                "default TTL must be at least one second".to_string(),
            ));
        }
        if self.sweep_interval.is_zero() {
            return Err(CacheError::ConfigError(
                "sweep interval must be at least one second".to_string(),
            ));
        }
        if self.host.trim().is_empty() {
            return Err(CacheError::ConfigError("host must not be empty".to_string()));
        }
        Ok(())
    }

    /// `host:port` for binding.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// =============================================================================
// LAYERS
// =============================================================================

/// One partial configuration source. Unset fields leave lower layers alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigLayer {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub default_ttl_seconds: Option<u64>,
    pub sweep_interval_seconds: Option<u64>,
    pub api_key: Option<String>,
    pub rate_limit: Option<u32>,
    pub cors_origins: Option<String>,
}

impl ConfigLayer {
    /// Parse a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, CacheError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            CacheError::ConfigError(format!("Cannot read '{}': {}", path.display(), e))
        })?;
        Self::from_toml(&text)
            .map_err(|e| CacheError::ConfigError(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml(text: &str) -> Result<Self, CacheError> {
        toml::from_str(text).map_err(|e| CacheError::ConfigError(e.to_string()))
    }

    /// Read the `LANTERN_*` variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CacheError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            host: lookup("LANTERN_HOST"),
            port: parse_var(&lookup, "LANTERN_PORT")?,
            default_ttl_seconds: parse_var(&lookup, "LANTERN_DEFAULT_TTL_SECONDS")?,
            sweep_interval_seconds: parse_var(&lookup, "LANTERN_SWEEP_INTERVAL_SECONDS")?,
            api_key: lookup("LANTERN_API_KEY"),
            rate_limit: parse_var(&lookup, "LANTERN_RATE_LIMIT")?,
            cors_origins: lookup("LANTERN_CORS_ORIGINS"),
        })
    }
}

fn parse_var<F, T>(lookup: &F, name: &str) -> Result<Option<T>, CacheError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(name)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| CacheError::ConfigError(format!("{}='{}': {}", name, raw, e)))
        })
        .transpose()
}

// =============================================================================
// TESTS
// =============================================================================
