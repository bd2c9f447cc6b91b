//! Execution events delivered back from the order sink.

use crate::{ClientOrderId, OrderSide, Price, Size, VenueOrderId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A (possibly partial) fill of one of our orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillEvent {
    pub cloid: ClientOrderId,
    pub venue_order_id: Option<VenueOrderId>,
    pub side: OrderSide,
    pub price: Price,
    pub quantity: Size,
    #[serde(default)]
    pub commission: Decimal,
    pub ts_ms: u64,
}

impl FillEvent {
    /// Cash value of the fill, excluding commission.
    pub fn notional(&self) -> Decimal {
        self.quantity.notional(self.price)
    }
}

/// The venue refused an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectEvent {
    pub cloid: ClientOrderId,
    pub reason: String,
}

/// A resting order was canceled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelEvent {
    pub cloid: ClientOrderId,
    pub venue_order_id: Option<VenueOrderId>,
}
