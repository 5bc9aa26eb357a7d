//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Counter synchronisation configuration.
    #[serde(default)]
    pub counters: CounterConfig,
    /// Periodic reconciliation configuration.
    #[serde(default)]
    pub reconcile: ReconcileConfig,
    /// Feed pagination configuration.
    #[serde(default)]
    pub feed: FeedConfig,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Counter adjustment configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CounterConfig {
    /// Delay before the single retry of a failed counter adjustment.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

/// Reconciliation pass configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ReconcileConfig {
    /// Whether the periodic reconciler runs at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Seconds between two full sweeps.
    #[serde(default = "default_reconcile_interval")]
    pub interval_secs: u64,
    /// Number of targets loaded per batch during a sweep.
    #[serde(default = "default_batch_size")]
    pub batch_size: u64,
}

/// Feed pagination configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// Page size used when the caller does not ask for one.
    #[serde(default = "default_feed_limit")]
    pub default_limit: u64,
    /// Upper bound on any requested page size.
    #[serde(default = "default_feed_max_limit")]
    pub max_limit: u64,
}

const fn default_max_connections() -> u32 {
    100
}

const fn default_min_connections() -> u32 {
    5
}

const fn default_retry_delay_ms() -> u64 {
    50
}

const fn default_true() -> bool {
    true
}

const fn default_reconcile_interval() -> u64 {
    3600
}

const fn default_batch_size() -> u64 {
    500
}

const fn default_feed_limit() -> u64 {
    20
}

const fn default_feed_max_limit() -> u64 {
    100
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: default_reconcile_interval(),
            batch_size: default_batch_size(),
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            default_limit: default_feed_limit(),
            max_limit: default_feed_max_limit(),
        }
    }
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `VIDEOTUBE_ENV`)
    /// 3. Environment variables with `VIDEOTUBE__` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("VIDEOTUBE_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("VIDEOTUBE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("VIDEOTUBE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
