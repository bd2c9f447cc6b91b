//! Market lifecycle classification.
//!
//! Every cycle re-derives the state from the current book and clock; there
//! is no memory of past states. Order of checks:
//!
//! 1. `Expiring` when inside the end-of-market buffer, regardless of the book.
//! 2. Book shape: two-sided is `Normal`; empty, one-sided, or extreme
//!    one-sided books are `ColdStart` or `Zombie`.
//! 3. `OutOfRange` when the resolved mid sits in either tail.

use pmq_core::{BookShape, BookSnapshot, Price};
use rust_decimal::Decimal;
use std::fmt;

use crate::config::QuotingConfig;

/// Lifecycle classification for one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    /// Two-sided book, time left, mid in range.
    Normal,
    /// Book missing one or both sides; mid synthesized.
    ColdStart,
    /// Lone quote at an extreme; outcome effectively decided.
    Zombie,
    /// Inside the end-of-market buffer.
    Expiring,
    /// Resolved mid too close to 0 or 1.
    OutOfRange,
}

impl LifecycleState {
    /// Whether quoting may proceed in this state.
    pub fn allows_quoting(&self) -> bool {
        matches!(self, Self::Normal | Self::ColdStart)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::ColdStart => "cold_start",
            Self::Zombie => "zombie",
            Self::Expiring => "expiring",
            Self::OutOfRange => "out_of_range",
        }
    }

    /// Numeric code for the lifecycle gauge.
    pub fn code(&self) -> i64 {
        match self {
            Self::Normal => 0,
            Self::ColdStart => 1,
            Self::Zombie => 2,
            Self::Expiring => 3,
            Self::OutOfRange => 4,
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of classifying one book snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleDecision {
    pub state: LifecycleState,
    pub shape: BookShape,
    /// Resolved mid price, when one could be derived.
    pub mid_price: Option<Price>,
    pub time_remaining_secs: u64,
}

impl LifecycleDecision {
    pub fn allows_quoting(&self) -> bool {
        self.state.allows_quoting()
    }

    /// The book lacked a two-sided quote this cycle.
    pub fn is_cold_start(&self) -> bool {
        self.state == LifecycleState::ColdStart
    }
}

#[derive(Debug, Clone)]
pub struct MarketLifecycleGuard {
    end_buffer_secs: u64,
    base_spread: Decimal,
    zombie_ask_threshold: Decimal,
    zombie_bid_threshold: Decimal,
    out_of_range_low: Decimal,
    out_of_range_high: Decimal,
    cold_start_prior: Decimal,
}

impl MarketLifecycleGuard {
    pub fn new(config: &QuotingConfig) -> Self {
        Self {
            end_buffer_secs: config.end_buffer_secs(),
            base_spread: config.base_spread,
            zombie_ask_threshold: config.zombie_ask_threshold,
            zombie_bid_threshold: config.zombie_bid_threshold,
            out_of_range_low: config.out_of_range_low,
            out_of_range_high: config.out_of_range_high,
            cold_start_prior: config.cold_start_prior,
        }
    }

    pub fn classify(&self, book: &BookSnapshot, time_remaining_secs: u64) -> LifecycleDecision {
        let shape = book.shape();
        let decision = |state, mid_price| LifecycleDecision {
            state,
            shape,
            mid_price,
            time_remaining_secs,
        };

        if time_remaining_secs <= self.end_buffer_secs {
            return decision(LifecycleState::Expiring, None);
        }

        let (state, mid) = match shape {
            BookShape::TwoSided => (LifecycleState::Normal, book.mid_price()),
            BookShape::Empty => (
                LifecycleState::ColdStart,
                Some(Price::new(self.cold_start_prior)),
            ),
            BookShape::AskOnly => {
                let Some(ask) = book.best_ask() else {
                    return decision(LifecycleState::ColdStart, None);
                };
                if ask.inner() <= self.zombie_ask_threshold {
                    return decision(LifecycleState::Zombie, None);
                }
                (
                    LifecycleState::ColdStart,
                    Some(ask * (Decimal::ONE - self.base_spread)),
                )
            }
            BookShape::BidOnly => {
                let Some(bid) = book.best_bid() else {
                    return decision(LifecycleState::ColdStart, None);
                };
                if bid.inner() >= self.zombie_bid_threshold {
                    return decision(LifecycleState::Zombie, None);
                }
                (
                    LifecycleState::ColdStart,
                    Some(bid * (Decimal::ONE + self.base_spread)),
                )
            }
        };

        match mid {
            Some(m) if m.inner() <= self.out_of_range_low || m.inner() >= self.out_of_range_high => {
                decision(LifecycleState::OutOfRange, mid)
            }
            _ => decision(state, mid),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pmq_core::{BookLevel, Size};
    use rust_decimal_macros::dec;

    fn level(px: Decimal) -> Option<BookLevel> {
        Some(BookLevel::new(Price::new(px), Size::from_units(10)))
    }

    fn guard() -> MarketLifecycleGuard {
        MarketLifecycleGuard::new(&QuotingConfig::default())
    }

    #[test]
    fn test_normal_two_sided() {
        let book = BookSnapshot::top(level(dec!(0.48)), level(dec!(0.52)), 0);
        let d = guard().classify(&book, 600);
        assert_eq!(d.state, LifecycleState::Normal);
        assert_eq!(d.mid_price, Some(Price::new(dec!(0.50))));
        assert!(d.allows_quoting());
    }

    #[test]
    fn test_removed_top_level_does_not_hide_side() {
        let book = BookSnapshot {
            bids: vec![
                BookLevel::new(Price::new(dec!(0.50)), Size::ZERO),
                BookLevel::new(Price::new(dec!(0.49)), Size::from_units(30)),
            ],
            asks: vec![BookLevel::new(Price::new(dec!(0.52)), Size::from_units(10))],
            midpoint: None,
            ts_ms: 0,
        };
        let d = guard().classify(&book, 600);
        assert_eq!(d.state, LifecycleState::Normal);
        assert_eq!(d.mid_price, Some(Price::new(dec!(0.505))));
        assert!(!d.is_cold_start());
    }

    #[test]
    fn test_empty_book_uses_prior() {
        let d = guard().classify(&BookSnapshot::default(), 600);
        assert_eq!(d.state, LifecycleState::ColdStart);
        assert_eq!(d.mid_price, Some(Price::new(dec!(0.5))));
    }

    #[test]
    fn test_zombie_low_ask() {
        let book = BookSnapshot::top(None, level(dec!(0.01)), 0);
        let d = guard().classify(&book, 600);
        assert_eq!(d.state, LifecycleState::Zombie);
        assert!(!d.allows_quoting());
    }

    #[test]
    fn test_zombie_high_bid() {
        let book = BookSnapshot::top(level(dec!(0.98)), None, 0);
        assert_eq!(guard().classify(&book, 600).state, LifecycleState::Zombie);
    }

    #[test]
    fn test_ask_only_synthesizes_mid() {
        let book = BookSnapshot::top(None, level(dec!(0.40)), 0);
        let d = guard().classify(&book, 600);
        assert_eq!(d.state, LifecycleState::ColdStart);
        assert_eq!(d.mid_price.unwrap().inner(), dec!(0.392));
    }

    #[test]
    fn test_bid_only_synthesizes_mid() {
        let book = BookSnapshot::top(level(dec!(0.50)), None, 0);
        let d = guard().classify(&book, 600);
        assert_eq!(d.state, LifecycleState::ColdStart);
        assert_eq!(d.mid_price.unwrap().inner(), dec!(0.51));
    }

    #[test]
    fn test_expiring_overrides_everything() {
        let books = [
            BookSnapshot::top(level(dec!(0.48)), level(dec!(0.52)), 0),
            BookSnapshot::default(),
            BookSnapshot::top(None, level(dec!(0.01)), 0),
        ];
        for book in &books {
            for tr in [0, 1, 299, 300] {
                let d = guard().classify(book, tr);
                assert_eq!(d.state, LifecycleState::Expiring);
                assert!(!d.allows_quoting());
            }
        }
        assert_ne!(guard().classify(&books[0], 301).state, LifecycleState::Expiring);
    }

    #[test]
    fn test_out_of_range_tails() {
        let high = BookSnapshot::top(level(dec!(0.94)), level(dec!(0.96)), 0);
        assert_eq!(guard().classify(&high, 600).state, LifecycleState::OutOfRange);

        let low = BookSnapshot::top(level(dec!(0.04)), level(dec!(0.06)), 0);
        assert_eq!(guard().classify(&low, 600).state, LifecycleState::OutOfRange);

        // Synthesized mid lands in the tail: 0.05 × 0.98 = 0.049.
        let synth = BookSnapshot::top(None, level(dec!(0.05)), 0);
        assert_eq!(guard().classify(&synth, 600).state, LifecycleState::OutOfRange);
    }
}
