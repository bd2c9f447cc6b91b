//! Reactive inventory hedge.
//!
//! Evaluated once per fill. When |inventory| reaches the threshold, one
//! market order reduces it by `min(|inventory| / 2, hedge_size)`. There is no
//! follow-up loop: the next fill decides again.

use pmq_core::{OrderSide, Size};

use crate::config::QuotingConfig;

/// Hedge order to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HedgeDecision {
    pub side: OrderSide,
    pub quantity: Size,
}

#[derive(Debug, Clone)]
pub struct HedgingController {
    threshold: u64,
    max_hedge_size: u64,
}

impl HedgingController {
    pub fn new(config: &QuotingConfig) -> Self {
        Self {
            threshold: config.hedge_threshold,
            max_hedge_size: config.hedge_size,
        }
    }

    pub fn needs_hedge(&self, inventory: i64) -> bool {
        inventory != 0 && inventory.unsigned_abs() >= self.threshold
    }

    /// Hedge for the current signed inventory, if one is due.
    pub fn evaluate(&self, inventory: i64) -> Option<HedgeDecision> {
        if !self.needs_hedge(inventory) {
            return None;
        }

        let qty = (inventory.unsigned_abs() / 2).min(self.max_hedge_size);
        if qty == 0 {
            return None;
        }

        let side = if inventory > 0 {
            OrderSide::Sell
        } else {
            OrderSide::Buy
        };

        Some(HedgeDecision {
            side,
            quantity: Size::from_units(qty),
        })
    }
}
