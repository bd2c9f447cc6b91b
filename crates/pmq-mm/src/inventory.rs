//! Non-linear inventory skew.
//!
//! Skew grows with the square of the deviation from target inventory, so a
//! few contracts barely move the quote while a large one-sided position
//! pushes it hard.

use rust_decimal::Decimal;

use crate::config::QuotingConfig;

#[derive(Debug, Clone)]
pub struct InventorySkewModel {
    target_inventory: i64,
    skew_factor: Decimal,
    max_skew: Decimal,
    enabled: bool,
}

impl InventorySkewModel {
    pub fn new(config: &QuotingConfig) -> Self {
        Self {
            target_inventory: config.target_inventory,
            skew_factor: config.skew_factor,
            max_skew: config.max_skew.abs(),
            enabled: config.use_inventory_skew,
        }
    }

    /// Signed skew for the given inventory, within `[-max_skew, max_skew]`.
    ///
    /// Positive when long of target, negative when short.
    pub fn skew(&self, inventory: i64) -> Decimal {
        if !self.enabled {
            return Decimal::ZERO;
        }

        let delta = Decimal::from(inventory) - Decimal::from(self.target_inventory);
        let magnitude = delta * delta * self.skew_factor;
        let signed = if delta.is_sign_negative() {
            -magnitude
        } else {
            magnitude
        };

        signed.max(-self.max_skew).min(self.max_skew)
    }
}
