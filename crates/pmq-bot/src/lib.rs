//! Replay host for the binary-market quoting engine.
//!
//! Runs one quoting strategy against a JSON Lines file of recorded order
//! books, with a paper venue standing in for the exchange:
//! - Simulated clock with one-shot alerts
//! - Paper order matching, position ledger and account balances
//! - Event recording and metrics dump on shutdown

pub mod app;
pub mod config;
pub mod error;
pub mod paper;
pub mod replay;

pub use app::{Application, ReplaySummary};
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use paper::{PaperVenue, VenueEvent};
pub use replay::{load_books, ReplayClock, ReplayFeed};
