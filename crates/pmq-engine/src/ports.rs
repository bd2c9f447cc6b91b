//! Collaborator contracts.
//!
//! The strategy reaches the outside world only through these traits. Hosts
//! implement them over a live venue, a replay file, or test fakes.

use pmq_core::{
    AccountSnapshot, BookSnapshot, LimitOrder, MarketOrder, PositionSnapshot, VenueOrderId,
};

use crate::error::{ClockError, SinkError};

/// Current order book for the quoted instrument.
pub trait MarketDataSource: Send + Sync {
    /// Latest snapshot, or `None` if nothing has been received yet.
    fn book(&self) -> Option<BookSnapshot>;
}

/// Time source with one-shot alerts.
pub trait Clock: Send + Sync {
    /// Returns current time in milliseconds since Unix epoch.
    fn now_ms(&self) -> u64;

    /// Schedule a single callback named `name` at `alert_at_ms`.
    ///
    /// The host delivers it through `QuotingStrategy::on_timer`.
    fn set_time_alert(&self, name: &str, alert_at_ms: u64) -> Result<(), ClockError>;
}

/// Position and balance state, read fresh every cycle.
pub trait AccountSource: Send + Sync {
    fn position(&self, instrument: &str) -> Option<PositionSnapshot>;

    fn account(&self) -> Option<AccountSnapshot>;
}

/// Order execution. Fills, rejects, and cancels come back asynchronously
/// through the strategy's event handlers.
pub trait OrderSink: Send + Sync {
    fn submit_limit(&self, order: &LimitOrder) -> Result<VenueOrderId, SinkError>;

    fn submit_market(&self, order: &MarketOrder) -> Result<VenueOrderId, SinkError>;

    /// Cancel every resting order for `instrument`; returns how many.
    fn cancel_all(&self, instrument: &str) -> Result<usize, SinkError>;
}
