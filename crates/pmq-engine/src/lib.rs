//! Quote decision engine for short-lived binary prediction markets.
//!
//! `QuotingStrategy` is a standalone decision object: the host feeds it
//! book updates, timer callbacks, and execution events, and it acts only
//! through the collaborator traits in [`ports`].

pub mod config;
pub mod error;
pub mod ports;
pub mod rejection;
pub mod strategy;

pub use config::StrategyConfig;
pub use error::{ClockError, EngineError, EngineResult, SinkError};
pub use ports::{AccountSource, Clock, MarketDataSource, OrderSink};
pub use rejection::RejectCategory;
pub use strategy::{Collaborators, CycleOutcome, QuotingStrategy, VetoReason, PULSE_TIMER};
