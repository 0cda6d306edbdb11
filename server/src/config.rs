//! Server Configuration
//!
//! Loads configuration from environment variables.

use anyhow::{ensure, Result};
use std::env;

use crate::trending::TrendingSettings;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (e.g., "0.0.0.0:8080")
    pub bind_address: String,

    /// Trending lookback window in days (default: 10)
    pub trending_window_days: i64,

    /// Trending snapshot TTL in seconds (default: 82800 = 23 hours)
    pub trending_ttl_secs: i64,

    /// Maximum posts in the trending list (default: 20)
    pub trending_limit: usize,

    /// Allow any CORS origin (default: true)
    pub cors_allow_any: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let config = Self {
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".into()),
            trending_window_days: env::var("TRENDING_WINDOW_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            trending_ttl_secs: env::var("TRENDING_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(82_800),
            trending_limit: env::var("TRENDING_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(20),
            cors_allow_any: env::var("CORS_ALLOW_ANY")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(true),
        };

        ensure!(
            config.trending_window_days > 0,
            "TRENDING_WINDOW_DAYS must be positive"
        );
        ensure!(config.trending_ttl_secs > 0, "TRENDING_TTL_SECS must be positive");
        ensure!(config.trending_limit > 0, "TRENDING_LIMIT must be positive");

        Ok(config)
    }

    /// Trending cache knobs derived from this configuration.
    #[must_use]
    pub fn trending_settings(&self) -> TrendingSettings {
        TrendingSettings {
            window: chrono::Duration::days(self.trending_window_days),
            ttl: chrono::Duration::seconds(self.trending_ttl_secs),
            limit: self.trending_limit,
        }
    }

    /// Create a default configuration for testing.
    #[must_use]
    pub fn default_for_test() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".into(),
            trending_window_days: 10,
            trending_ttl_secs: 82_800,
            trending_limit: 20,
            cors_allow_any: true,
        }
    }
}
