//! Configuration management for the Warehouse Operations Platform
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with WMS__ prefix

use config::{ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::{AlertPolicy, CycleCountPolicy, TemperatureBands};

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    pub server: ServerConfig,

    pub database: DatabaseConfig,

    /// JWT verification for incoming bearer tokens
    pub jwt: JwtConfig,

    pub auth: AuthConfig,

    pub logging: LoggingConfig,

    /// Ledger policies
    pub inventory: InventoryConfig,

    /// Storage-condition banding
    pub quality: QualityConfig,

    /// External route optimizer
    pub route_optimizer: RouteOptimizerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    /// Secret key used to verify HS256 tokens
    pub secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// Serve requests that carry no bearer token
    pub allow_anonymous: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Emit JSON lines instead of human-readable output
    pub json: bool,

    /// Filter used when RUST_LOG is not set
    pub filter: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InventoryConfig {
    /// Items expiring within this many days raise an alert
    pub expiring_within_days: i64,

    /// Allow closing a cycle count before every item is counted
    pub allow_partial_cycle_counts: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct QualityConfig {
    pub temperature_normal_min: Decimal,
    pub temperature_normal_max: Decimal,
    pub temperature_warning_margin: Decimal,
    pub humidity_normal_max: Decimal,
    pub humidity_warning_max: Decimal,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RouteOptimizerConfig {
    /// Base URL of the optimizer; routes keep their metrics when unset
    pub endpoint: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("WMS_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.url", "postgres://localhost/warehouse_ops")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("jwt.secret", "development-secret-key")?
            .set_default("auth.allow_anonymous", true)?
            .set_default("logging.json", false)?
            .set_default("logging.filter", "wms_server=debug,warehouse_ops_backend=debug,tower_http=debug,sqlx=warn")?
            .set_default("inventory.expiring_within_days", 30)?
            .set_default("inventory.allow_partial_cycle_counts", false)?
            .set_default("quality.temperature_normal_min", 15)?
            .set_default("quality.temperature_normal_max", 25)?
            .set_default("quality.temperature_warning_margin", 5)?
            .set_default("quality.humidity_normal_max", 60)?
            .set_default("quality.humidity_warning_max", 70)?
            .set_default("route_optimizer.timeout_secs", 5)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (WMS__ prefix)
            .add_source(
                Environment::with_prefix("WMS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = config.try_deserialize()?;
        config
            .quality
            .bands()
            .validate()
            .map_err(|e| ConfigError::Message(e.to_string()))?;
        Ok(config)
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl InventoryConfig {
    pub fn alert_policy(&self) -> AlertPolicy {
        AlertPolicy {
            expiring_within_days: self.expiring_within_days,
        }
    }

    pub fn cycle_count_policy(&self) -> CycleCountPolicy {
        CycleCountPolicy {
            allow_partial_completion: self.allow_partial_cycle_counts,
        }
    }
}

impl QualityConfig {
    pub fn bands(&self) -> TemperatureBands {
        TemperatureBands {
            normal_min: self.temperature_normal_min,
            normal_max: self.temperature_normal_max,
            warning_margin: self.temperature_warning_margin,
            humidity_normal_max: self.humidity_normal_max,
            humidity_warning_max: self.humidity_warning_max,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            server: ServerConfig::default(),
            database: DatabaseConfig {
                url: "postgres://localhost/warehouse_ops".to_string(),
                max_connections: 10,
                min_connections: 2,
            },
            jwt: JwtConfig {
                secret: "development-secret-key".to_string(),
            },
            auth: AuthConfig {
                allow_anonymous: true,
            },
            logging: LoggingConfig {
                json: false,
                filter: "wms_server=debug,warehouse_ops_backend=debug,tower_http=debug,sqlx=warn"
                    .to_string(),
            },
            inventory: InventoryConfig {
                expiring_within_days: AlertPolicy::default().expiring_within_days,
                allow_partial_cycle_counts: false,
            },
            quality: QualityConfig::default(),
            route_optimizer: RouteOptimizerConfig {
                endpoint: None,
                timeout_secs: 5,
            },
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
        }
    }
}

impl Default for QualityConfig {
    fn default() -> Self {
        let bands = TemperatureBands::default();
        Self {
            temperature_normal_min: bands.normal_min,
            temperature_normal_max: bands.normal_max,
            temperature_warning_margin: bands.warning_margin,
            humidity_normal_max: bands.humidity_normal_max,
            humidity_warning_max: bands.humidity_warning_max,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policies() {
        let config = Config::default();
        assert_eq!(config.inventory.alert_policy().expiring_within_days, 30);
        assert!(!config.inventory.cycle_count_policy().allow_partial_completion);
        assert_eq!(config.quality.bands(), TemperatureBands::default());
        assert!(config.auth.allow_anonymous);
        assert!(config.route_optimizer.endpoint.is_none());
    }
}
