use config::{Config, ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub queue: QueueConfig,
    pub cache: CacheConfig,
    pub router: RouterConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address for the HTTP/WebSocket API
    #[serde(default = "default_host")]
    pub host: String,
    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,
    /// Maximum connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueueConfig {
    /// Maximum concurrently executing jobs
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Attempts per job before it is abandoned
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Base delay for exponential retry backoff
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    /// How long shutdown waits for in-flight jobs to drain
    #[serde(default = "default_drain_timeout_secs")]
    pub drain_timeout_secs: u64,
}

fn default_concurrency() -> usize {
    10
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_base_ms() -> u64 {
    1000
}

fn default_drain_timeout_secs() -> u64 {
    30
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
            drain_timeout_secs: default_drain_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Snapshot time-to-live, refreshed on every write
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
    /// Maximum cached snapshots before stale entries are evicted
    #[serde(default = "default_cache_max_entries")]
    pub max_entries: usize,
}

fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_cache_max_entries() -> usize {
    10_000
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_cache_ttl_secs(),
            max_entries: default_cache_max_entries(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RouterConfig {
    /// Reference price the mock venues quote around
    #[serde(default = "default_base_price")]
    pub base_price: Decimal,
    /// Simulated quote latency per venue
    #[serde(default = "default_quote_latency_ms")]
    pub quote_latency_ms: u64,
    /// Simulated execution latency range
    #[serde(default = "default_execute_latency_min_ms")]
    pub execute_latency_min_ms: u64,
    #[serde(default = "default_execute_latency_max_ms")]
    pub execute_latency_max_ms: u64,
    /// Fixed settlement delay before an order is confirmed
    #[serde(default = "default_confirm_delay_ms")]
    pub confirm_delay_ms: u64,
}

fn default_base_price() -> Decimal {
    Decimal::from(10)
}

fn default_quote_latency_ms() -> u64 {
    200
}

fn default_execute_latency_min_ms() -> u64 {
    2000
}

fn default_execute_latency_max_ms() -> u64 {
    3000
}

fn default_confirm_delay_ms() -> u64 {
    500
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            base_price: default_base_price(),
            quote_latency_ms: default_quote_latency_ms(),
            execute_latency_min_ms: default_execute_latency_min_ms(),
            execute_latency_max_ms: default_execute_latency_max_ms(),
            confirm_delay_ms: default_confirm_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            // Start with default values
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("database.max_connections", 5)?
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("SWAPFLOW_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (SWAPFLOW_DATABASE__URL, etc.)
            .add_source(
                Environment::with_prefix("SWAPFLOW")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.queue.concurrency == 0 {
            errors.push("queue.concurrency must be at least 1".to_string());
        }

        if self.queue.max_attempts == 0 {
            errors.push("queue.max_attempts must be at least 1".to_string());
        }

        if self.cache.ttl_secs == 0 {
            errors.push("cache.ttl_secs must be positive".to_string());
        }

        if self.router.base_price <= Decimal::ZERO {
            errors.push("router.base_price must be positive".to_string());
        }

        if self.router.execute_latency_max_ms < self.router.execute_latency_min_ms {
            errors.push(
                "router.execute_latency_max_ms must not be below execute_latency_min_ms"
                    .to_string(),
            );
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_defaults() -> AppConfig {
        AppConfig {
            server: ServerConfig::default(),
            database: DatabaseConfig {
                url: "postgres://localhost/swapflow".to_string(),
                max_connections: 5,
            },
            queue: QueueConfig::default(),
            cache: CacheConfig::default(),
            router: RouterConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    #[test]
    fn default_config_is_valid() {
        assert!(config_with_defaults().validate().is_ok());
    }

    #[test]
    fn queue_defaults_match_retry_policy() {
        let queue = QueueConfig::default();
        assert_eq!(queue.concurrency, 10);
        assert_eq!(queue.max_attempts, 3);
        assert_eq!(queue.backoff_base_ms, 1000);
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let mut config = config_with_defaults();
        config.queue.concurrency = 0;
        let errors = config.validate().unwrap_err();
        assert!(errors.iter().any(|e| e.contains("concurrency")));
    }

    #[test]
    fn inverted_execute_latency_range_is_rejected() {
        let mut config = config_with_defaults();
        config.router.execute_latency_min_ms = 500;
        config.router.execute_latency_max_ms = 100;
        assert!(config.validate().is_err());
    }
}
