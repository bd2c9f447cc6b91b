//! Application configuration.

use crate::error::{AppError, AppResult};
use pmq_engine::StrategyConfig;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub strategy: StrategyConfig,
    #[serde(default)]
    pub replay: ReplayConfig,
    #[serde(default)]
    pub persistence: PersistenceConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Book replay and paper venue settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayConfig {
    /// JSON Lines file of book snapshots.
    #[serde(default = "default_book_file")]
    pub book_file: String,
    /// Spacing applied to snapshots that carry no timestamp (ms). Default: 1000.
    #[serde(default = "default_step_ms")]
    pub step_ms: u64,
    /// Wall-clock delay between replayed snapshots (ms). 0 replays as fast as possible.
    #[serde(default)]
    pub pace_ms: u64,
    /// Paper account starting cash. Default: 100.
    #[serde(default = "default_starting_balance")]
    pub starting_balance: Decimal,
    /// Commission as a fraction of fill notional. Default: 0.
    #[serde(default)]
    pub fee_rate: Decimal,
    /// Cancel the resting order on the same side when a new quote arrives.
    /// Default: true.
    #[serde(default = "default_replace_resting")]
    pub replace_resting: bool,
}

fn default_book_file() -> String {
    "data/sample_book.jsonl".to_string()
}

fn default_step_ms() -> u64 {
    1_000
}

fn default_starting_balance() -> Decimal {
    Decimal::ONE_HUNDRED
}

fn default_replace_resting() -> bool {
    true
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            book_file: default_book_file(),
            step_ms: default_step_ms(),
            pace_ms: 0,
            starting_balance: default_starting_balance(),
            fee_rate: Decimal::ZERO,
            replace_resting: default_replace_resting(),
        }
    }
}

/// Event recorder configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Write quote/fill/inventory/reject events. Default: true.
    #[serde(default = "default_persistence_enabled")]
    pub enabled: bool,
    /// Base directory for JSON Lines files.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// Buffer size before flush.
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
}

fn default_persistence_enabled() -> bool {
    true
}

fn default_data_dir() -> String {
    "./data/events".to_string()
}

fn default_buffer_size() -> usize {
    100
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            enabled: default_persistence_enabled(),
            data_dir: default_data_dir(),
            buffer_size: default_buffer_size(),
        }
    }
}

/// Telemetry configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Write the Prometheus text exposition here on shutdown.
    #[serde(default)]
    pub metrics_file: Option<String>,
}

impl AppConfig {
    /// Load from `PMQ_CONFIG`, falling back to `config/default.toml`, then
    /// to built-in defaults.
    pub fn load() -> AppResult<Self> {
        let config_path =
            std::env::var("PMQ_CONFIG").unwrap_or_else(|_| "config/default.toml".to_string());

        if Path::new(&config_path).exists() {
            Self::from_file(&config_path)
        } else {
            tracing::warn!(path = %config_path, "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load from a specific file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;

        toml::from_str(&content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }

    /// Validate every section that can be checked before startup.
    pub fn validate(&self) -> AppResult<()> {
        self.strategy.validate()?;
        if self.replay.starting_balance.is_sign_negative() {
            return Err(AppError::Config(
                "replay.starting_balance must not be negative".to_string(),
            ));
        }
        if self.replay.fee_rate.is_sign_negative() || self.replay.fee_rate >= Decimal::ONE {
            return Err(AppError::Config(format!(
                "replay.fee_rate {} outside [0, 1)",
                self.replay.fee_rate
            )));
        }
        Ok(())
    }
}
