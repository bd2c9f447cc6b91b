//! Engine error types.

use pmq_risk::RiskError;
use thiserror::Error;

/// Failure reported by an order sink.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SinkError {
    #[error("Order rejected: {0}")]
    Rejected(String),

    #[error("Order sink unavailable: {0}")]
    Unavailable(String),
}

/// Failure arming a one-shot timer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClockError {
    #[error("Cannot set time alert '{name}': {reason}")]
    AlertRejected { name: String, reason: String },
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Risk error: {0}")]
    Risk(#[from] RiskError),

    #[error("Order sink error: {0}")]
    Sink(#[from] SinkError),
}

pub type EngineResult<T> = Result<T, EngineError>;
