use config::{Config, ConfigError, Environment, File};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError, ValidationErrors};

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8050;
const CONFIG_DIR: &str = "config";
const DEFAULT_SNAPSHOT_PATH: &str = "data/sales_snapshot.json";
const DEFAULT_TRAILING_WINDOW_DAYS: i64 = 30;
const DEFAULT_REORDER_LEAD_TIME_DAYS: i64 = 14;

/// RFM scoring thresholds.
///
/// Each cutoff list carries exactly four entries and is evaluated top-down
/// against scores 5,4,3,2; anything past the last cutoff scores 1.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields, default)]
pub struct RfmConfig {
    /// Recency bands in days, ascending: <=30 scores 5, <=60 scores 4, ...
    #[validate(custom = "validate_ascending_i64")]
    pub recency_cutoffs: Vec<i64>,
    /// Frequency bands in transaction counts, descending: >=20 scores 5, ...
    #[validate(custom = "validate_descending_i64")]
    pub frequency_cutoffs: Vec<i64>,
    /// Monetary bands in currency units, descending: >=5000 scores 5, ...
    #[validate(custom = "validate_descending_decimal")]
    pub monetary_cutoffs: Vec<Decimal>,
}

impl Default for RfmConfig {
    fn default() -> Self {
        Self {
            recency_cutoffs: vec![30, 60, 90, 180],
            frequency_cutoffs: vec![20, 15, 10, 5],
            monetary_cutoffs: vec![dec!(5000), dec!(2000), dec!(1000), dec!(500)],
        }
    }
}

/// Stock level bands, evaluated against `stock_quantity` alone.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields, default)]
pub struct StockConfig {
    /// stock <= this is Critical
    pub critical_max: i64,
    /// stock <= this is Low
    pub low_max: i64,
    /// stock <= this is Medium; above is High
    pub medium_max: i64,
}

impl Default for StockConfig {
    fn default() -> Self {
        Self {
            critical_max: 10,
            low_max: 50,
            medium_max: 100,
        }
    }
}

impl StockConfig {
    fn bands_ascending(&self) -> bool {
        self.critical_max < self.low_max && self.low_max < self.medium_max
    }
}

/// Data-quality thresholds applied to the loaded snapshot.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields, default)]
pub struct QualityConfig {
    /// Minimum transaction count expected on the as-of day
    pub min_daily_transactions: i64,
    /// Single-transaction amount above which an anomaly is flagged
    pub max_transaction_amount: Decimal,
    /// Snapshot staleness threshold in hours
    pub data_freshness_hours: i64,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            min_daily_transactions: 100,
            max_transaction_amount: dec!(10000),
            data_freshness_hours: 24,
        }
    }
}

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields, default)]
pub struct AnalyticsConfig {
    /// Server host address
    pub host: String,

    /// Server port
    pub port: u16,

    /// Application environment
    pub environment: String,

    /// Logging level
    pub log_level: String,

    /// Log in JSON format (structured logging)
    pub log_json: bool,

    /// Path to the JSON snapshot produced by the ETL collaborator
    pub snapshot_path: String,

    /// Abort on the first bad record instead of collecting skipped rows
    pub fail_fast: bool,

    /// Trailing window length in days for velocity/KPI metrics
    #[validate(range(min = 1, max = 365))]
    pub trailing_window_days: i64,

    /// Days-of-inventory cutoff below which restocking is flagged
    #[validate(range(min = 1, max = 365))]
    pub reorder_lead_time_days: i64,

    #[validate]
    pub rfm: RfmConfig,

    #[validate]
    pub stock: StockConfig,

    #[validate]
    pub quality: QualityConfig,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            environment: DEFAULT_ENV.to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_json: false,
            snapshot_path: DEFAULT_SNAPSHOT_PATH.to_string(),
            fail_fast: false,
            trailing_window_days: DEFAULT_TRAILING_WINDOW_DAYS,
            reorder_lead_time_days: DEFAULT_REORDER_LEAD_TIME_DAYS,
            rfm: RfmConfig::default(),
            stock: StockConfig::default(),
            quality: QualityConfig::default(),
        }
    }
}

impl AnalyticsConfig {
    /// Checks that span multiple fields, beyond what derive rules express.
    pub fn validate_additional_constraints(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if !self.stock.bands_ascending() {
            errors.add(
                "stock",
                ValidationError::new("stock bands must satisfy critical_max < low_max < medium_max"),
            );
        }
        if self.rfm.recency_cutoffs.len() != 4
            || self.rfm.frequency_cutoffs.len() != 4
            || self.rfm.monetary_cutoffs.len() != 4
        {
            errors.add(
                "rfm",
                ValidationError::new("each RFM cutoff list must carry exactly four entries"),
            );
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn validate_ascending_i64(values: &[i64]) -> Result<(), ValidationError> {
    if values.windows(2).any(|w| w[0] >= w[1]) {
        return Err(ValidationError::new("cutoffs_not_ascending"));
    }
    Ok(())
}

fn validate_descending_i64(values: &[i64]) -> Result<(), ValidationError> {
    if values.windows(2).any(|w| w[0] <= w[1]) {
        return Err(ValidationError::new("cutoffs_not_descending"));
    }
    Ok(())
}

fn validate_descending_decimal(values: &[Decimal]) -> Result<(), ValidationError> {
    if values.windows(2).any(|w| w[0] <= w[1]) {
        return Err(ValidationError::new("cutoffs_not_descending"));
    }
    Ok(())
}

#[derive(Debug, Error)]
pub enum AnalyticsConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ConfigError),
    #[error("configuration validation failed: {0}")]
    Validation(#[from] ValidationErrors),
}

/// Layers configuration sources in this order:
/// 1. Built-in defaults
/// 2. Default config (config/default.toml)
/// 3. Environment-specific config (config/{env}.toml)
/// 4. Environment variables (ANALYTICS__*)
pub fn load_config() -> Result<AnalyticsConfig, AnalyticsConfigError> {
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("ANALYTICS_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            CONFIG_DIR
        );
    }

    let config = Config::builder()
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
        .add_source(Environment::with_prefix("ANALYTICS").separator("__"))
        .build()?;

    let app_config: AnalyticsConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AnalyticsConfigError::Validation(e)
    })?;

    app_config.validate_additional_constraints().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AnalyticsConfigError::Validation(e)
    })?;

    Ok(app_config)
}

/// Install the global tracing subscriber.
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let default_directive = format!("sales_analytics={},tower_http=info", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    if json {
        tracing_subscriber::registry()
            .with(EnvFilter::new(filter_directive))
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(EnvFilter::new(filter_directive))
            .with(fmt::layer())
            .init();
    }
}
