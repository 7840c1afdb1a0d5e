//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Document store configuration.
    pub store: StoreConfig,
    /// Analytics engine configuration.
    #[serde(default)]
    pub analytics: AnalyticsConfig,
}

/// Document store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Customer workspace all collections are scoped under.
    pub customer_id: String,
}

/// Analytics engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyticsConfig {
    /// Debounce window for coalescing filter changes, in milliseconds.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Time-to-live for cached snapshots, in seconds.
    #[serde(default = "default_snapshot_ttl_secs")]
    pub snapshot_ttl_secs: u64,
    /// Maximum number of snapshots kept in the cache.
    #[serde(default = "default_snapshot_capacity")]
    pub snapshot_capacity: u64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            snapshot_ttl_secs: default_snapshot_ttl_secs(),
            snapshot_capacity: default_snapshot_capacity(),
        }
    }
}

fn default_debounce_ms() -> u64 {
    300
}

fn default_snapshot_ttl_secs() -> u64 {
    300 // 5 minutes
}

fn default_snapshot_capacity() -> u64 {
    64
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        // Best effort; absence of a .env file is not an error.
        dotenvy::dotenv().ok();

        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("BUILDTRACK").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
