//! Risk error types.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::gates::GateKind;

#[derive(Debug, Error)]
pub enum RiskError {
    #[error("Risk gate blocked: {gate} - {reason} (measured {measured}, limit {limit})")]
    GateBlocked {
        gate: GateKind,
        measured: Decimal,
        limit: Decimal,
        reason: String,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type RiskResult<T> = Result<T, RiskError>;
