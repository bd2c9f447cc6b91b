//! Order-related types and identifiers.
//!
//! Provides order side, time-in-force, client and venue order IDs,
//! and the two order shapes the engine hands to the execution sink.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::{Price, Size};

/// Order side: buy or sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Returns the opposite side.
    pub fn opposite(&self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Time-in-force for resting orders. Hedges go out as [`MarketOrder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TimeInForce {
    /// Good-til-cancelled. Quotes rest until filled or canceled.
    #[default]
    #[serde(rename = "Gtc")]
    GoodTilCancelled,
}

impl fmt::Display for TimeInForce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GoodTilCancelled => write!(f, "Gtc"),
        }
    }
}

/// Client order ID for idempotency.
///
/// Every order carries a unique cloid so that retries never double-submit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientOrderId(String);

impl ClientOrderId {
    /// Create a new unique client order ID.
    ///
    /// Format: `pmq_{timestamp_ms}_{uuid_short}`
    pub fn new() -> Self {
        let ts = chrono::Utc::now().timestamp_millis();
        let uuid_short = &Uuid::new_v4().to_string()[..8];
        Self(format!("pmq_{ts}_{uuid_short}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ClientOrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClientOrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ClientOrderId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Identifier the venue returns for an accepted order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VenueOrderId(pub String);

impl fmt::Display for VenueOrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Limit order submitted as one leg of a quote pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitOrder {
    pub cloid: ClientOrderId,
    pub instrument: String,
    pub side: OrderSide,
    /// Already quantized to the venue's price precision.
    pub price: Price,
    pub quantity: Size,
    pub tif: TimeInForce,
}

impl LimitOrder {
    /// Create a GTC limit order with a fresh cloid.
    #[must_use]
    pub fn gtc(instrument: &str, side: OrderSide, price: Price, quantity: Size) -> Self {
        Self {
            cloid: ClientOrderId::new(),
            instrument: instrument.to_string(),
            side,
            price,
            quantity,
            tif: TimeInForce::GoodTilCancelled,
        }
    }
}

/// Market order used for inventory-reducing hedges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketOrder {
    pub cloid: ClientOrderId,
    pub instrument: String,
    pub side: OrderSide,
    pub quantity: Size,
}

impl MarketOrder {
    #[must_use]
    pub fn new(instrument: &str, side: OrderSide, quantity: Size) -> Self {
        Self {
            cloid: ClientOrderId::new(),
            instrument: instrument.to_string(),
            side,
            quantity,
        }
    }
}
