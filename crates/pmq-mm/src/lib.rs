//! Pricing models for short-lived binary prediction markets.
//!
//! Pure, synchronous building blocks; no I/O and no clocks of their own.
//!
//! # Architecture
//!
//! ```text
//! BookSnapshot + time remaining
//!   → MarketLifecycleGuard: state + resolved mid (or veto)
//!   → PriceHistory ← mid
//!   → VolatilityEstimator → SpreadModel (cold-start override)
//!   → InventorySkewModel ← position
//!   → QuoteGenerator: quantized bid/ask + size
//!
//! FillEvent → HedgingController → optional market order
//! ```

pub mod clock;
pub mod config;
pub mod hedging;
pub mod inventory;
pub mod lifecycle;
pub mod price_history;
pub mod quote_engine;
pub mod spread;
pub mod volatility;

pub use clock::MarketClock;
pub use config::QuotingConfig;
pub use hedging::{HedgeDecision, HedgingController};
pub use inventory::InventorySkewModel;
pub use lifecycle::{LifecycleDecision, LifecycleState, MarketLifecycleGuard};
pub use price_history::PriceHistory;
pub use quote_engine::{compute_quotes, QuoteGenerator, QuotePair, QuoteParameters};
pub use spread::SpreadModel;
pub use volatility::VolatilityEstimator;
