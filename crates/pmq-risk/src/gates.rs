//! Risk gate implementation.
//!
//! Checks are independent and evaluated against one snapshot of position
//! and account state taken by the caller for the cycle.

use std::fmt;

use pmq_core::{AccountSnapshot, PositionSnapshot, Price};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::error::{RiskError, RiskResult};

/// Risk limits, fixed for the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskLimits {
    /// Lowest mid price at which quoting is allowed.
    #[serde(default = "default_min_price")]
    pub min_price: Decimal,
    /// Highest mid price at which quoting is allowed.
    #[serde(default = "default_max_price")]
    pub max_price: Decimal,
    /// Volatility ceiling. Readings above it veto the cycle.
    #[serde(default = "default_max_volatility")]
    pub max_volatility: Decimal,
    /// Quoting stops once |inventory| reaches this.
    #[serde(default = "default_max_inventory")]
    pub max_inventory: u64,
    /// Position value allowed as a fraction of free balance.
    #[serde(default = "default_max_position_ratio")]
    pub max_position_ratio: Decimal,
    /// PnL floor for the session (negative).
    #[serde(default = "default_max_daily_loss")]
    pub max_daily_loss: Decimal,
}

fn default_min_price() -> Decimal {
    Decimal::new(5, 2) // 0.05
}
fn default_max_price() -> Decimal {
    Decimal::new(95, 2) // 0.95
}
fn default_max_volatility() -> Decimal {
    Decimal::new(15, 2) // 15%
}
fn default_max_inventory() -> u64 {
    10
}
fn default_max_position_ratio() -> Decimal {
    Decimal::new(4, 1) // 40% of free balance
}
fn default_max_daily_loss() -> Decimal {
    Decimal::new(-3, 0)
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self {
            min_price: default_min_price(),
            max_price: default_max_price(),
            max_volatility: default_max_volatility(),
            max_inventory: default_max_inventory(),
            max_position_ratio: default_max_position_ratio(),
            max_daily_loss: default_max_daily_loss(),
        }
    }
}

impl RiskLimits {
    pub fn validate(&self) -> RiskResult<()> {
        if self.min_price >= self.max_price {
            return Err(RiskError::ConfigError(format!(
                "min_price {} must be below max_price {}",
                self.min_price, self.max_price
            )));
        }
        if self.max_position_ratio.is_sign_negative() {
            return Err(RiskError::ConfigError(
                "max_position_ratio must not be negative".to_string(),
            ));
        }
        Ok(())
    }

    pub fn min_price(&self) -> Price {
        Price::new(self.min_price)
    }

    pub fn max_price(&self) -> Price {
        Price::new(self.max_price)
    }
}

/// Which check fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GateKind {
    PriceRange,
    Volatility,
    Inventory,
    PositionValue,
    DailyLoss,
}

impl GateKind {
    pub const ALL: [GateKind; 5] = [
        Self::PriceRange,
        Self::Volatility,
        Self::Inventory,
        Self::PositionValue,
        Self::DailyLoss,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PriceRange => "price_range",
            Self::Volatility => "volatility",
            Self::Inventory => "inventory",
            Self::PositionValue => "position_value",
            Self::DailyLoss => "daily_loss",
        }
    }
}

impl fmt::Display for GateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a gate check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateResult {
    /// Gate passed.
    Pass,
    /// Gate blocked; carries the measured value and the limit it broke.
    Block {
        measured: Decimal,
        limit: Decimal,
        reason: String,
    },
}

impl GateResult {
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }

    pub fn is_block(&self) -> bool {
        matches!(self, Self::Block { .. })
    }

    fn block(measured: Decimal, limit: Decimal, reason: impl Into<String>) -> Self {
        Self::Block {
            measured,
            limit,
            reason: reason.into(),
        }
    }
}

/// One consistent view of everything the gates look at.
#[derive(Debug, Clone, Copy)]
pub struct RiskInputs<'a> {
    pub mid_price: Price,
    pub volatility: Decimal,
    pub position: Option<&'a PositionSnapshot>,
    pub account: Option<&'a AccountSnapshot>,
}

/// Outcome of every gate for one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateReport {
    results: Vec<(GateKind, GateResult)>,
}

impl GateReport {
    pub fn is_pass(&self) -> bool {
        self.results.iter().all(|(_, r)| r.is_pass())
    }

    pub fn results(&self) -> &[(GateKind, GateResult)] {
        &self.results
    }

    pub fn result(&self, kind: GateKind) -> Option<&GateResult> {
        self.results.iter().find(|(k, _)| *k == kind).map(|(_, r)| r)
    }

    /// Gates that blocked, in evaluation order.
    pub fn blocked(&self) -> impl Iterator<Item = GateKind> + '_ {
        self.results
            .iter()
            .filter(|(_, r)| r.is_block())
            .map(|(k, _)| *k)
    }

    /// `Ok` when every gate passed, otherwise the first block as an error.
    pub fn into_result(self) -> RiskResult<GateReport> {
        let first = self.results.iter().find_map(|(kind, r)| match r {
            GateResult::Block {
                measured,
                limit,
                reason,
            } => Some(RiskError::GateBlocked {
                gate: *kind,
                measured: *measured,
                limit: *limit,
                reason: reason.clone(),
            }),
            GateResult::Pass => None,
        });
        match first {
            Some(err) => Err(err),
            None => Ok(self),
        }
    }
}

/// Conjunction of the pre-quote checks.
#[derive(Debug, Clone)]
pub struct RiskGate {
    limits: RiskLimits,
}

impl RiskGate {
    pub fn new(limits: RiskLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &RiskLimits {
        &self.limits
    }

    /// Run every gate and log each block with its measured value and limit.
    pub fn evaluate(&self, inputs: &RiskInputs<'_>) -> GateReport {
        let results: Vec<(GateKind, GateResult)> = GateKind::ALL
            .iter()
            .map(|kind| {
                let result = match kind {
                    GateKind::PriceRange => self.check_price_range(inputs.mid_price),
                    GateKind::Volatility => self.check_volatility(inputs.volatility),
                    GateKind::Inventory => self.check_inventory(inputs.position),
                    GateKind::PositionValue => self.check_position_value(
                        inputs.position,
                        inputs.account,
                        inputs.mid_price,
                    ),
                    GateKind::DailyLoss => self.check_daily_loss(inputs.account),
                };
                (*kind, result)
            })
            .collect();

        for (kind, result) in &results {
            match result {
                GateResult::Block {
                    measured,
                    limit,
                    reason,
                } => warn!(
                    gate = %kind,
                    measured = %measured,
                    limit = %limit,
                    reason = %reason,
                    "risk gate blocked"
                ),
                GateResult::Pass => trace!(gate = %kind, "risk gate passed"),
            }
        }

        GateReport { results }
    }

    /// Run every gate; the first block becomes `RiskError::GateBlocked`.
    pub fn check_all(&self, inputs: &RiskInputs<'_>) -> RiskResult<GateReport> {
        self.evaluate(inputs).into_result()
    }

    /// Mid price inside `[min_price, max_price]`.
    pub fn check_price_range(&self, mid: Price) -> GateResult {
        let mid = mid.inner();
        if mid < self.limits.min_price {
            return GateResult::block(
                mid,
                self.limits.min_price,
                format!("mid {} below min price {}", mid, self.limits.min_price),
            );
        }
        if mid > self.limits.max_price {
            return GateResult::block(
                mid,
                self.limits.max_price,
                format!("mid {} above max price {}", mid, self.limits.max_price),
            );
        }
        GateResult::Pass
    }

    pub fn check_volatility(&self, volatility: Decimal) -> GateResult {
        if volatility > self.limits.max_volatility {
            return GateResult::block(
                volatility,
                self.limits.max_volatility,
                format!(
                    "volatility {} above max {}",
                    volatility, self.limits.max_volatility
                ),
            );
        }
        GateResult::Pass
    }

    /// No position reads as flat.
    pub fn check_inventory(&self, position: Option<&PositionSnapshot>) -> GateResult {
        let Some(position) = position else {
            return GateResult::Pass;
        };
        let inventory = position.abs_quantity();
        if inventory >= self.limits.max_inventory {
            return GateResult::block(
                Decimal::from(inventory),
                Decimal::from(self.limits.max_inventory),
                format!(
                    "inventory {} at or above max {}",
                    inventory, self.limits.max_inventory
                ),
            );
        }
        GateResult::Pass
    }

    /// Blocks when the account is unknown. Without a venue mark price the
    /// position is valued at the cycle's mid.
    pub fn check_position_value(
        &self,
        position: Option<&PositionSnapshot>,
        account: Option<&AccountSnapshot>,
        mid: Price,
    ) -> GateResult {
        let Some(account) = account else {
            return GateResult::block(
                Decimal::ZERO,
                Decimal::ZERO,
                "account snapshot unavailable",
            );
        };
        let Some(position) = position else {
            return GateResult::Pass;
        };

        let price = position.current_price.unwrap_or(mid).inner();
        let value = Decimal::from(position.abs_quantity()) * price;
        let limit = account.free_balance * self.limits.max_position_ratio;

        if value > limit {
            return GateResult::block(
                value,
                limit,
                format!("position value {} above {}", value, limit),
            );
        }
        GateResult::Pass
    }

    /// No account reads as no loss.
    pub fn check_daily_loss(&self, account: Option<&AccountSnapshot>) -> GateResult {
        let Some(account) = account else {
            return GateResult::Pass;
        };
        let pnl = account.total_pnl();
        if pnl < self.limits.max_daily_loss {
            return GateResult::block(
                pnl,
                self.limits.max_daily_loss,
                format!("pnl {} below floor {}", pnl, self.limits.max_daily_loss),
            );
        }
        GateResult::Pass
    }
}
