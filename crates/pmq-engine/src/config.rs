//! Strategy configuration.

use pmq_mm::QuotingConfig;
use pmq_risk::RiskLimits;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Everything one strategy instance needs, fixed at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Venue identifier of the outcome token being quoted.
    #[serde(default = "default_instrument_id")]
    pub instrument_id: String,

    /// Minimum time between quoting cycles.
    #[serde(default = "default_update_interval_ms")]
    pub update_interval_ms: u64,

    /// Period of the forced re-evaluation timer.
    #[serde(default = "default_pulse_interval_ms")]
    pub pulse_interval_ms: u64,

    /// Market expiry (Unix ms), when known. Otherwise expiry is estimated
    /// from the first observation plus the nominal duration.
    #[serde(default)]
    pub market_end_ms: Option<u64>,

    #[serde(default)]
    pub quoting: QuotingConfig,

    #[serde(default)]
    pub risk: RiskLimits,
}

fn default_instrument_id() -> String {
    "UNSET".to_string()
}
fn default_update_interval_ms() -> u64 {
    1000
}
fn default_pulse_interval_ms() -> u64 {
    1000
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            instrument_id: default_instrument_id(),
            update_interval_ms: default_update_interval_ms(),
            pulse_interval_ms: default_pulse_interval_ms(),
            market_end_ms: None,
            quoting: QuotingConfig::default(),
            risk: RiskLimits::default(),
        }
    }
}

impl StrategyConfig {
    /// Reject configurations that would break pricing invariants.
    pub fn validate(&self) -> EngineResult<()> {
        self.risk.validate()?;

        let q = &self.quoting;
        if self.instrument_id.trim().is_empty() {
            return Err(EngineError::Config("instrument_id is empty".to_string()));
        }
        if q.min_spread > q.max_spread {
            return Err(EngineError::Config(format!(
                "min_spread {} exceeds max_spread {}",
                q.min_spread, q.max_spread
            )));
        }
        if q.min_order_size == 0 || q.min_order_size > q.max_order_size {
            return Err(EngineError::Config(format!(
                "order size bounds [{}, {}] are invalid",
                q.min_order_size, q.max_order_size
            )));
        }
        if q.max_skew.is_sign_negative() {
            return Err(EngineError::Config("max_skew must not be negative".to_string()));
        }
        if self.pulse_interval_ms == 0 {
            return Err(EngineError::Config("pulse_interval_ms must be positive".to_string()));
        }
        Ok(())
    }
}
