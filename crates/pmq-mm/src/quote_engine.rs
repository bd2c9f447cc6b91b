//! Quote price calculation engine.
//!
//! Prices a bid/ask pair around the resolved mid:
//! - bid = mid × (1 − spread/2 − skew)
//! - ask = mid × (1 + spread/2 + skew)
//!
//! Both legs are rounded to the venue increment and clamped into the
//! tradable band. A pair whose bid does not sit strictly below its ask after
//! rounding is dropped.

use pmq_core::{BookSnapshot, Price, Size};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use crate::config::QuotingConfig;

/// Quantized bid/ask pair ready for order construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuotePair {
    pub bid: Price,
    pub ask: Price,
}

/// Everything that went into one quote cycle.
///
/// Ephemeral: recomputed each cycle, logged and recorded, never read back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuoteParameters {
    pub mid_price: Price,
    pub volatility: Decimal,
    pub spread: Decimal,
    pub skew: Decimal,
    pub bid_price: Price,
    pub ask_price: Price,
    pub size: Size,
    pub time_remaining_secs: u64,
    pub cold_start: bool,
}

/// Price a quote pair.
///
/// Returns `None` when the rounded, clamped bid is not strictly below the ask.
pub fn compute_quotes(
    mid: Price,
    spread: Decimal,
    skew: Decimal,
    precision: u32,
    min_price: Price,
    max_price: Price,
) -> Option<QuotePair> {
    let half_spread = spread / dec!(2);

    let bid = (mid * (Decimal::ONE - half_spread - skew))
        .quantize(precision)
        .clamp(min_price, max_price);
    let ask = (mid * (Decimal::ONE + half_spread + skew))
        .quantize(precision)
        .clamp(min_price, max_price);

    (bid < ask).then_some(QuotePair { bid, ask })
}

/// Turns pricing inputs into a concrete quote with a size.
#[derive(Debug, Clone)]
pub struct QuoteGenerator {
    precision: u32,
    min_price: Price,
    max_price: Price,
    order_size: u64,
    min_order_size: u64,
    max_order_size: u64,
    use_depth_sizing: bool,
    depth_levels: usize,
    thin_depth: Decimal,
    deep_depth: Decimal,
}

impl QuoteGenerator {
    /// `min_price`/`max_price` are the tradable band from the risk limits.
    pub fn new(config: &QuotingConfig, min_price: Price, max_price: Price) -> Self {
        Self {
            precision: config.price_precision,
            min_price,
            max_price,
            order_size: config.order_size,
            min_order_size: config.min_order_size,
            max_order_size: config.max_order_size.max(config.min_order_size),
            use_depth_sizing: config.use_depth_sizing,
            depth_levels: config.depth_levels,
            thin_depth: config.thin_depth,
            deep_depth: config.deep_depth,
        }
    }

    pub fn quote(&self, mid: Price, spread: Decimal, skew: Decimal) -> Option<QuotePair> {
        compute_quotes(
            mid,
            spread,
            skew,
            self.precision,
            self.min_price,
            self.max_price,
        )
    }

    /// Contracts per leg, always within `[min_order_size, max_order_size]`.
    pub fn order_size(&self, book: &BookSnapshot) -> Size {
        let units = if self.use_depth_sizing {
            self.depth_sized(book)
        } else {
            self.order_size
        };
        Size::from_units(units.clamp(self.min_order_size, self.max_order_size))
    }

    fn depth_sized(&self, book: &BookSnapshot) -> u64 {
        let (bid_depth, ask_depth) = book.depth(self.depth_levels);
        let avg_depth = (bid_depth + ask_depth) / dec!(2);

        if avg_depth < self.thin_depth {
            self.order_size.min(self.min_order_size * 2)
        } else if avg_depth < self.deep_depth {
            self.order_size
        } else {
            self.order_size.min(self.max_order_size)
        }
    }
}
