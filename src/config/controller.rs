//! # Controller Configuration
//!
//! Controller-level settings loaded from environment variables.

use anyhow::{bail, Result};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Which kind of secondary resource contributes addresses to Gateways.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddressSourceKind {
    /// Nodes labelled with the composite back-reference key
    #[default]
    Node,
    /// Pods labelled with the owning namespace/name pair
    Pod,
}

impl AddressSourceKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            AddressSourceKind::Node => "node",
            AddressSourceKind::Pod => "pod",
        }
    }
}

impl fmt::Display for AddressSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AddressSourceKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "node" | "nodes" => Ok(AddressSourceKind::Node),
            "pod" | "pods" => Ok(AddressSourceKind::Pod),
            other => bail!("unknown address source '{other}', expected 'node' or 'pod'"),
        }
    }
}

/// Log output layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    fn parse_lenient(s: &str) -> Self {
        if s.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

/// Controller-level configuration
///
/// All settings have defaults and can be overridden via environment variables.
/// Environment variables are usually populated from a ConfigMap using `envFrom`.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Secondary resource kind watched for addresses (`ADDRESS_SOURCE`)
    pub address_source: AddressSourceKind,
    /// Port for `/metrics`, `/healthz` and `/readyz`
    pub metrics_port: u16,
    /// How long to wait for the HTTP server to bind at startup
    pub server_startup_timeout_secs: u64,
    /// Poll interval while waiting for the HTTP server
    pub server_poll_interval_ms: u64,
    /// Deadline for a single Kubernetes API call
    pub api_timeout_secs: u64,
    /// First retry delay after a failed reconciliation
    pub backoff_min_secs: u64,
    /// Upper bound on the retry delay
    pub backoff_max_secs: u64,
    /// Periodic resync of every Gateway; zero waits for changes only
    pub resync_interval_secs: u64,
    /// Maximum reconciliations in flight across distinct Gateways
    pub max_concurrent_reconciliations: u16,
    /// Server-side timeout of watch requests
    pub watch_timeout_secs: u32,
    /// Global log level (ERROR, WARN, INFO, DEBUG, TRACE)
    pub log_level: String,
    /// Log format (json, text)
    pub log_format: LogFormat,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        use crate::constants::*;
        Self {
            address_source: AddressSourceKind::default(),
            metrics_port: DEFAULT_METRICS_PORT,
            server_startup_timeout_secs: DEFAULT_SERVER_STARTUP_TIMEOUT_SECS,
            server_poll_interval_ms: DEFAULT_SERVER_POLL_INTERVAL_MS,
            api_timeout_secs: DEFAULT_API_TIMEOUT_SECS,
            backoff_min_secs: DEFAULT_BACKOFF_MIN_SECS,
            backoff_max_secs: DEFAULT_BACKOFF_MAX_SECS,
            resync_interval_secs: DEFAULT_RESYNC_INTERVAL_SECS,
            max_concurrent_reconciliations: DEFAULT_MAX_CONCURRENT_RECONCILIATIONS,
            watch_timeout_secs: DEFAULT_WATCH_TIMEOUT_SECS,
            log_level: "INFO".to_string(),
            log_format: LogFormat::Text,
        }
    }
}

impl ControllerConfig {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// Numeric values that fail to parse fall back to their defaults; an
    /// unknown `ADDRESS_SOURCE` is rejected since it selects what the
    /// controller manages.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let address_source = match lookup("ADDRESS_SOURCE") {
            Some(v) if !v.trim().is_empty() => v.parse()?,
            _ => defaults.address_source,
        };

        let config = Self {
            address_source,
            metrics_port: parsed_or(&lookup, "METRICS_PORT", defaults.metrics_port),
            server_startup_timeout_secs: parsed_or(
                &lookup,
                "SERVER_STARTUP_TIMEOUT_SECS",
                defaults.server_startup_timeout_secs,
            ),
            server_poll_interval_ms: parsed_or(
                &lookup,
                "SERVER_POLL_INTERVAL_MS",
                defaults.server_poll_interval_ms,
            ),
            api_timeout_secs: parsed_or(&lookup, "API_TIMEOUT_SECS", defaults.api_timeout_secs),
            backoff_min_secs: parsed_or(&lookup, "BACKOFF_MIN_SECS", defaults.backoff_min_secs),
            backoff_max_secs: parsed_or(&lookup, "BACKOFF_MAX_SECS", defaults.backoff_max_secs),
            resync_interval_secs: parsed_or(
                &lookup,
                "RESYNC_INTERVAL_SECS",
                defaults.resync_interval_secs,
            ),
            max_concurrent_reconciliations: parsed_or(
                &lookup,
                "MAX_CONCURRENT_RECONCILIATIONS",
                defaults.max_concurrent_reconciliations,
            ),
            watch_timeout_secs: parsed_or(
                &lookup,
                "WATCH_TIMEOUT_SECS",
                defaults.watch_timeout_secs,
            ),
            log_level: lookup("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_format: lookup("LOG_FORMAT")
                .map_or(defaults.log_format, |v| LogFormat::parse_lenient(&v)),
        };

        if config.backoff_min_secs == 0 || config.backoff_min_secs > config.backoff_max_secs {
            bail!(
                "invalid backoff bounds: BACKOFF_MIN_SECS={} BACKOFF_MAX_SECS={}",
                config.backoff_min_secs,
                config.backoff_max_secs
            );
        }

        // A zero deadline would fail every API call before it is sent.
        if config.api_timeout_secs == 0 {
            bail!("invalid API_TIMEOUT_SECS=0: must be at least 1");
        }

        Ok(config)
    }

    /// Get API call deadline
    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_secs)
    }

    /// Get resync interval, `None` when periodic resync is disabled
    pub fn resync_interval(&self) -> Option<Duration> {
        (self.resync_interval_secs > 0).then(|| Duration::from_secs(self.resync_interval_secs))
    }
}

fn parsed_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
