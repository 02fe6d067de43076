//! Dashboard client configuration
//!
//! Loaded the same way as the server's: defaults in code, then an optional
//! `config/client` file, then `WMS_CLIENT__*` environment variables.

use std::time::Duration;

use config::{ConfigError, Environment, File};
use serde::Deserialize;

use crate::poller::Screen;

#[derive(Debug, Deserialize, Clone)]
pub struct ClientConfig {
    /// Base URL of the REST API, including the version prefix
    pub base_url: String,

    /// Bearer token; requests go out anonymously when unset
    pub token: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    pub polling: PollingConfig,
}

/// Poll interval per screen, in seconds
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct PollingConfig {
    pub overview_secs: u64,
    pub outbound_secs: u64,
    pub quality_secs: u64,
    pub inbound_secs: u64,
    pub inventory_secs: u64,
    pub analytics_secs: u64,
}

impl PollingConfig {
    pub fn interval(&self, screen: Screen) -> Duration {
        let secs = match screen {
            Screen::Overview => self.overview_secs,
            Screen::Outbound => self.outbound_secs,
            Screen::Quality => self.quality_secs,
            Screen::Inbound => self.inbound_secs,
            Screen::Inventory => self.inventory_secs,
            Screen::Analytics => self.analytics_secs,
        };
        // A zero interval would make tokio panic
        Duration::from_secs(secs.max(1))
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            overview_secs: 10,
            outbound_secs: 10,
            quality_secs: 10,
            inbound_secs: 15,
            inventory_secs: 20,
            analytics_secs: 30,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/api/v1".to_string(),
            token: None,
            timeout_secs: 10,
            polling: PollingConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let defaults = PollingConfig::default();

        let config = config::Config::builder()
            .set_default("base_url", "http://localhost:3000/api/v1")?
            .set_default("timeout_secs", 10)?
            .set_default("polling.overview_secs", defaults.overview_secs)?
            .set_default("polling.outbound_secs", defaults.outbound_secs)?
            .set_default("polling.quality_secs", defaults.quality_secs)?
            .set_default("polling.inbound_secs", defaults.inbound_secs)?
            .set_default("polling.inventory_secs", defaults.inventory_secs)?
            .set_default("polling.analytics_secs", defaults.analytics_secs)?
            .add_source(File::with_name("config/client").required(false))
            .add_source(
                Environment::with_prefix("WMS_CLIENT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_intervals_per_screen() {
        let polling = PollingConfig::default();
        assert_eq!(polling.interval(Screen::Overview), Duration::from_secs(10));
        assert_eq!(polling.interval(Screen::Outbound), Duration::from_secs(10));
        assert_eq!(polling.interval(Screen::Quality), Duration::from_secs(10));
        assert_eq!(polling.interval(Screen::Inbound), Duration::from_secs(15));
        assert_eq!(polling.interval(Screen::Inventory), Duration::from_secs(20));
        assert_eq!(polling.interval(Screen::Analytics), Duration::from_secs(30));
    }

    #[test]
    fn test_zero_interval_is_clamped() {
        let polling = PollingConfig {
            inbound_secs: 0,
            ..PollingConfig::default()
        };
        assert_eq!(polling.interval(Screen::Inbound), Duration::from_secs(1));
    }
}
