//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Replay error: {0}")]
    Replay(String),

    #[error("Engine error: {0}")]
    Engine(#[from] pmq_engine::EngineError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] pmq_telemetry::TelemetryError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] pmq_persistence::PersistenceError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
