//! Configuration loading and validation.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{ConfigError, Result, ValidationError};

/// Main configuration for the dnsrelay server.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Address the UDP listener binds to.
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,

    /// Upstream DNS resolver address (e.g., "8.8.8.8:53").
    /// When unset, queries are answered without any records.
    #[serde(default)]
    pub upstream_resolver: Option<SocketAddr>,

    /// How long to wait for an upstream reply, in milliseconds.
    #[serde(default = "default_upstream_timeout_ms")]
    pub upstream_timeout_ms: u64,

    /// Maximum number of cached names.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: u64,

    /// Maximum number of queries handled concurrently.
    #[serde(default = "default_max_inflight")]
    pub max_inflight: usize,

    /// Size of the receive buffer pool.
    #[serde(default = "default_buffer_pool_size")]
    pub buffer_pool_size: usize,

    /// Prometheus metrics exporter.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Prometheus exporter settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Address of the `/metrics` HTTP listener.
    #[serde(default = "default_metrics_listen")]
    pub listen: SocketAddr,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen: default_metrics_listen(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            upstream_resolver: None,
            upstream_timeout_ms: default_upstream_timeout_ms(),
            cache_capacity: default_cache_capacity(),
            max_inflight: default_max_inflight(),
            buffer_pool_size: default_buffer_pool_size(),
            metrics: MetricsConfig::default(),
        }
    }
}

fn default_listen() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, 2053))
}

fn default_metrics_listen() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::LOCALHOST, 9090))
}

const fn default_upstream_timeout_ms() -> u64 {
    2000
}

const fn default_cache_capacity() -> u64 {
    crate::cache::DEFAULT_CACHE_CAPACITY
}

const fn default_max_inflight() -> usize {
    256
}

const fn default_buffer_pool_size() -> usize {
    64
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.upstream_timeout_ms == 0 {
            return Err(ValidationError::ZeroUpstreamTimeout.into());
        }

        if self.cache_capacity == 0 {
            return Err(ValidationError::ZeroCacheCapacity.into());
        }

        if self.max_inflight == 0 {
            return Err(ValidationError::ZeroMaxInflight.into());
        }

        if self.buffer_pool_size == 0 {
            return Err(ValidationError::ZeroBufferPoolSize.into());
        }

        Ok(())
    }

    pub const fn upstream_timeout(&self) -> Duration {
        Duration::from_millis(self.upstream_timeout_ms)
    }
}
