//! Rolling buffer of observed mid prices.

use std::collections::VecDeque;

use pmq_core::Price;
use rust_decimal::Decimal;

/// Bounded, insertion-ordered mid-price history.
///
/// Holds at most `2 × window` entries; the oldest is dropped on overflow.
#[derive(Debug, Clone)]
pub struct PriceHistory {
    prices: VecDeque<Decimal>,
    capacity: usize,
}

impl PriceHistory {
    pub fn new(window: usize) -> Self {
        let capacity = window.max(1) * 2;
        Self {
            prices: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, mid: Price) {
        if self.prices.len() == self.capacity {
            self.prices.pop_front();
        }
        self.prices.push_back(mid.inner());
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Most recent price.
    pub fn latest(&self) -> Option<Price> {
        self.prices.back().copied().map(Price::new)
    }

    /// The newest `n` prices, oldest first.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &Decimal> {
        self.prices.iter().skip(self.prices.len().saturating_sub(n))
    }
}
