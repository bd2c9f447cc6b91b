//! Order-book snapshot types.
//!
//! A snapshot is what the market-data source hands the engine each cycle:
//! depth levels on each side (best first) and an optional venue midpoint.
//! Either side may be empty; binary markets regularly show one-sided books
//! right after listing and just before the outcome is decided.

use crate::{Price, Size};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Which sides of the book are populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookShape {
    /// Both bid and ask present.
    TwoSided,
    /// Bids only, no ask.
    BidOnly,
    /// Asks only, no bid.
    AskOnly,
    /// Neither side.
    Empty,
}

impl BookShape {
    pub fn is_two_sided(&self) -> bool {
        matches!(self, Self::TwoSided)
    }
}

impl std::fmt::Display for BookShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TwoSided => write!(f, "TWO_SIDED"),
            Self::BidOnly => write!(f, "BID_ONLY"),
            Self::AskOnly => write!(f, "ASK_ONLY"),
            Self::Empty => write!(f, "EMPTY"),
        }
    }
}

/// One price level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookLevel {
    pub price: Price,
    pub size: Size,
}

impl BookLevel {
    pub fn new(price: Price, size: Size) -> Self {
        Self { price, size }
    }

    fn is_live(&self) -> bool {
        self.price.is_positive() && self.size.is_positive()
    }
}

/// Order-book snapshot for one instrument.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookSnapshot {
    /// Bid levels, best (highest) first.
    #[serde(default)]
    pub bids: Vec<BookLevel>,
    /// Ask levels, best (lowest) first.
    #[serde(default)]
    pub asks: Vec<BookLevel>,
    /// Venue-reported midpoint, when the feed carries one.
    #[serde(default)]
    pub midpoint: Option<Price>,
    /// Snapshot time (Unix milliseconds).
    #[serde(default)]
    pub ts_ms: u64,
}

impl BookSnapshot {
    /// Snapshot with only top-of-book levels.
    pub fn top(best_bid: Option<BookLevel>, best_ask: Option<BookLevel>, ts_ms: u64) -> Self {
        Self {
            bids: best_bid.into_iter().collect(),
            asks: best_ask.into_iter().collect(),
            midpoint: None,
            ts_ms,
        }
    }

    /// Parse one JSON Lines record.
    pub fn from_json_line(line: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(line)?)
    }

    /// First live bid level; removed (zero-size) levels are skipped.
    pub fn best_bid(&self) -> Option<Price> {
        self.bids.iter().find(|l| l.is_live()).map(|l| l.price)
    }

    /// First live ask level; removed (zero-size) levels are skipped.
    pub fn best_ask(&self) -> Option<Price> {
        self.asks.iter().find(|l| l.is_live()).map(|l| l.price)
    }

    pub fn shape(&self) -> BookShape {
        match (self.best_bid().is_some(), self.best_ask().is_some()) {
            (true, true) => BookShape::TwoSided,
            (true, false) => BookShape::BidOnly,
            (false, true) => BookShape::AskOnly,
            (false, false) => BookShape::Empty,
        }
    }

    /// Mid price for a two-sided book.
    ///
    /// Prefers the venue midpoint; falls back to `(bid + ask) / 2`.
    /// Returns None unless both sides are present.
    pub fn mid_price(&self) -> Option<Price> {
        let (bid, ask) = (self.best_bid()?, self.best_ask()?);
        Some(
            self.midpoint
                .unwrap_or_else(|| Price::new((bid.inner() + ask.inner()) / Decimal::TWO)),
        )
    }

    /// Summed size over the top `levels` live levels of each side: `(bid_depth, ask_depth)`.
    pub fn depth(&self, levels: usize) -> (Decimal, Decimal) {
        let sum = |side: &[BookLevel]| -> Decimal {
            side.iter()
                .filter(|l| l.is_live())
                .take(levels)
                .map(|l| l.size.inner())
                .sum()
        };
        (sum(&self.bids), sum(&self.asks))
    }
}
