//! Quoting configuration.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Pricing and sizing parameters for one quoted market.
///
/// Supplied once at strategy construction; every field resolves its default
/// at load time so a partial TOML table is always complete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotingConfig {
    /// Risk aversion γ in the time-decay spread term.
    #[serde(default = "default_risk_aversion")]
    pub risk_aversion: Decimal,

    /// Multiplier k applied to normalized time remaining.
    #[serde(default = "default_time_decay_factor")]
    pub time_decay_factor: Decimal,

    /// Spread floor added to the theoretical term (fraction of mid).
    #[serde(default = "default_base_spread")]
    pub base_spread: Decimal,

    #[serde(default = "default_min_spread")]
    pub min_spread: Decimal,

    #[serde(default = "default_max_spread")]
    pub max_spread: Decimal,

    /// Contracts per quote leg.
    #[serde(default = "default_order_size")]
    pub order_size: u64,

    #[serde(default = "default_min_order_size")]
    pub min_order_size: u64,

    #[serde(default = "default_max_order_size")]
    pub max_order_size: u64,

    /// Inventory the skew model steers toward.
    #[serde(default)]
    pub target_inventory: i64,

    /// Skew per squared contract of inventory deviation.
    #[serde(default = "default_skew_factor")]
    pub skew_factor: Decimal,

    #[serde(default = "default_max_skew")]
    pub max_skew: Decimal,

    /// |inventory| at which a fill triggers a hedge.
    #[serde(default = "default_hedge_threshold")]
    pub hedge_threshold: u64,

    /// Upper bound on a single hedge order.
    #[serde(default = "default_hedge_size")]
    pub hedge_size: u64,

    /// Prices used for the volatility estimate.
    #[serde(default = "default_volatility_window")]
    pub volatility_window: usize,

    /// Below this many samples the default volatility is used.
    #[serde(default = "default_min_volatility_samples")]
    pub min_volatility_samples: usize,

    #[serde(default = "default_default_volatility")]
    pub default_volatility: Decimal,

    /// Volatility floor; keeps flat markets from collapsing the spread.
    #[serde(default = "default_min_volatility")]
    pub min_volatility: Decimal,

    /// Stop quoting this many minutes before expiry.
    #[serde(default = "default_end_buffer_minutes")]
    pub end_buffer_minutes: u64,

    /// Nominal market lifetime in seconds.
    #[serde(default = "default_market_duration_secs")]
    pub market_duration_secs: u64,

    /// Decimal places of the venue's price increment.
    #[serde(default = "default_price_precision")]
    pub price_precision: u32,

    /// Lone ask at or below this means the market has settled at NO.
    #[serde(default = "default_zombie_ask_threshold")]
    pub zombie_ask_threshold: Decimal,

    /// Lone bid at or above this means the market has settled at YES.
    #[serde(default = "default_zombie_bid_threshold")]
    pub zombie_bid_threshold: Decimal,

    #[serde(default = "default_out_of_range_low")]
    pub out_of_range_low: Decimal,

    #[serde(default = "default_out_of_range_high")]
    pub out_of_range_high: Decimal,

    /// Mid assumed when the book is empty.
    #[serde(default = "default_cold_start_prior")]
    pub cold_start_prior: Decimal,

    #[serde(default = "default_cold_start_spread_divisor")]
    pub cold_start_spread_divisor: Decimal,

    /// Book levels per side summed for depth sizing.
    #[serde(default = "default_depth_levels")]
    pub depth_levels: usize,

    /// Average depth below which the book counts as thin.
    #[serde(default = "default_thin_depth")]
    pub thin_depth: Decimal,

    /// Average depth at or above which the book counts as deep.
    #[serde(default = "default_deep_depth")]
    pub deep_depth: Decimal,

    #[serde(default = "default_true")]
    pub use_dynamic_spread: bool,

    #[serde(default = "default_true")]
    pub use_inventory_skew: bool,

    #[serde(default)]
    pub use_depth_sizing: bool,
}

impl QuotingConfig {
    pub fn end_buffer_secs(&self) -> u64 {
        self.end_buffer_minutes * 60
    }
}

impl Default for QuotingConfig {
    fn default() -> Self {
        Self {
            risk_aversion: default_risk_aversion(),
            time_decay_factor: default_time_decay_factor(),
            base_spread: default_base_spread(),
            min_spread: default_min_spread(),
            max_spread: default_max_spread(),
            order_size: default_order_size(),
            min_order_size: default_min_order_size(),
            max_order_size: default_max_order_size(),
            target_inventory: 0,
            skew_factor: default_skew_factor(),
            max_skew: default_max_skew(),
            hedge_threshold: default_hedge_threshold(),
            hedge_size: default_hedge_size(),
            volatility_window: default_volatility_window(),
            min_volatility_samples: default_min_volatility_samples(),
            default_volatility: default_default_volatility(),
            min_volatility: default_min_volatility(),
            end_buffer_minutes: default_end_buffer_minutes(),
            market_duration_secs: default_market_duration_secs(),
            price_precision: default_price_precision(),
            zombie_ask_threshold: default_zombie_ask_threshold(),
            zombie_bid_threshold: default_zombie_bid_threshold(),
            out_of_range_low: default_out_of_range_low(),
            out_of_range_high: default_out_of_range_high(),
            cold_start_prior: default_cold_start_prior(),
            cold_start_spread_divisor: default_cold_start_spread_divisor(),
            depth_levels: default_depth_levels(),
            thin_depth: default_thin_depth(),
            deep_depth: default_deep_depth(),
            use_dynamic_spread: true,
            use_inventory_skew: true,
            use_depth_sizing: false,
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_risk_aversion() -> Decimal {
    Decimal::new(5, 1) // 0.5
}
fn default_time_decay_factor() -> Decimal {
    Decimal::TWO
}
fn default_base_spread() -> Decimal {
    Decimal::new(2, 2) // 2%
}
fn default_min_spread() -> Decimal {
    Decimal::new(1, 2) // 1%
}
fn default_max_spread() -> Decimal {
    Decimal::new(15, 2) // 15%
}
fn default_order_size() -> u64 {
    2
}
fn default_min_order_size() -> u64 {
    1
}
fn default_max_order_size() -> u64 {
    5
}
fn default_skew_factor() -> Decimal {
    Decimal::new(1, 3) // 0.001
}
fn default_max_skew() -> Decimal {
    Decimal::new(5, 2) // 5%
}
fn default_hedge_threshold() -> u64 {
    4
}
fn default_hedge_size() -> u64 {
    3
}
fn default_volatility_window() -> usize {
    30
}
fn default_min_volatility_samples() -> usize {
    10
}
fn default_default_volatility() -> Decimal {
    Decimal::new(5, 2) // 5%
}
fn default_min_volatility() -> Decimal {
    Decimal::new(5, 3) // 0.5%
}
fn default_end_buffer_minutes() -> u64 {
    5
}
fn default_market_duration_secs() -> u64 {
    900 // 15 minutes
}
fn default_price_precision() -> u32 {
    3
}
fn default_zombie_ask_threshold() -> Decimal {
    Decimal::new(2, 2) // 0.02
}
fn default_zombie_bid_threshold() -> Decimal {
    Decimal::new(98, 2) // 0.98
}
fn default_out_of_range_low() -> Decimal {
    Decimal::new(6, 2) // 0.06
}
fn default_out_of_range_high() -> Decimal {
    Decimal::new(94, 2) // 0.94
}
fn default_cold_start_prior() -> Decimal {
    Decimal::new(5, 1) // 0.5
}
fn default_cold_start_spread_divisor() -> Decimal {
    Decimal::new(3, 0)
}
fn default_depth_levels() -> usize {
    5
}
fn default_thin_depth() -> Decimal {
    Decimal::new(50, 0)
}
fn default_deep_depth() -> Decimal {
    Decimal::new(200, 0)
}
