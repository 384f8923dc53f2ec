//! Application configuration management.

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::AppResult;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Distribution engine tolerances.
    #[serde(default)]
    pub distribution: DistributionConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Tolerances used when checking distributions.
///
/// Generated (equal/weighted) distributions are always held to exact
/// equality; these values only apply to manual input and rollup checks.
#[derive(Debug, Clone, Deserialize)]
pub struct DistributionConfig {
    /// Maximum absolute difference between a manual or stored total and the
    /// source budget.
    #[serde(default = "default_rollup_tolerance")]
    pub rollup_tolerance: Decimal,
    /// Maximum absolute deviation of a weight sum from 1.
    #[serde(default = "default_weight_sum_epsilon")]
    pub weight_sum_epsilon: Decimal,
}

fn default_rollup_tolerance() -> Decimal {
    Decimal::new(1, 2) // 0.01
}

fn default_weight_sum_epsilon() -> Decimal {
    Decimal::new(1, 4) // 0.0001
}

impl Default for DistributionConfig {
    fn default() -> Self {
        Self {
            rollup_tolerance: default_rollup_tolerance(),
            weight_sum_epsilon: default_weight_sum_epsilon(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from `.env`, config files, and the environment.
    ///
    /// This is the entry point for applications embedding the engine. The
    /// migrator binary does not use it; the migration CLI reads
    /// `DATABASE_URL` on its own.
    ///
    /// Sources, lowest precedence first: `config/default`, `config/{RUN_MODE}`,
    /// then `ALLOTMENT__SECTION__KEY` environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Configuration` if configuration cannot be loaded.
    pub fn load() -> AppResult<Self> {
        dotenvy::dotenv().ok();

        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("ALLOTMENT").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
