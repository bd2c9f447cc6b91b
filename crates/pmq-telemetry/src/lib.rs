//! Prometheus metrics and structured logging for the quoting engine.
//!
//! - Prometheus metrics for quote cycles, vetoes, risk gates, fills, hedges
//! - Structured logging with tracing (JSON in production)

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use metrics::Metrics;
