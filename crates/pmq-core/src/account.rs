//! Account and position snapshots.
//!
//! Read from the account source once per decision cycle and never cached
//! past it. All money values are in the market's settlement currency.

use crate::Price;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Net position in the quoted outcome token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionSnapshot {
    /// Signed contract count: positive long, negative short.
    pub quantity: i64,
    pub avg_entry_price: Option<Price>,
    /// Last mark price, if the venue reports one.
    pub current_price: Option<Price>,
    pub realized_pnl: Decimal,
    pub unrealized_pnl: Decimal,
}

impl PositionSnapshot {
    pub fn flat() -> Self {
        Self::default()
    }

    pub fn is_flat(&self) -> bool {
        self.quantity == 0
    }

    pub fn abs_quantity(&self) -> u64 {
        self.quantity.unsigned_abs()
    }
}

/// Balance and PnL summary for the trading account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub total_balance: Decimal,
    pub free_balance: Decimal,
    pub locked_balance: Decimal,
    pub realized_pnl: Decimal,
    pub unrealized_pnl: Decimal,
}

impl AccountSnapshot {
    /// Realized plus unrealized PnL.
    pub fn total_pnl(&self) -> Decimal {
        self.realized_pnl + self.unrealized_pnl
    }
}
