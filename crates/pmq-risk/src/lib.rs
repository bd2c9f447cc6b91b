//! Pre-quote risk gates.
//!
//! Every check must pass before a quote pair is sent:
//! - PriceRange: mid inside `[min_price, max_price]`
//! - Volatility: estimate at or below `max_volatility`
//! - Inventory: |position| below `max_inventory`
//! - PositionValue: |position| × price within `free_balance × max_position_ratio`
//! - DailyLoss: realized + unrealized PnL at or above `max_daily_loss`
//!
//! All checks run every cycle so each failing constraint is reported on
//! its own, with the measured value and the limit.

pub mod error;
pub mod gates;

pub use error::{RiskError, RiskResult};
pub use gates::{GateKind, GateReport, GateResult, RiskGate, RiskInputs, RiskLimits};
