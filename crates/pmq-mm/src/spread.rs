//! Time-decaying spread model.
//!
//! `spread = base_spread + γ · σ² · (time_remaining / duration) · k`,
//! clamped to `[min_spread, max_spread]`. The spread narrows as expiry
//! approaches since a binary price converges toward 0 or 1.

use rust_decimal::Decimal;

use crate::config::QuotingConfig;

#[derive(Debug, Clone)]
pub struct SpreadModel {
    risk_aversion: Decimal,
    time_decay_factor: Decimal,
    base_spread: Decimal,
    min_spread: Decimal,
    max_spread: Decimal,
    duration_secs: u64,
    cold_start_divisor: Decimal,
    dynamic: bool,
}

impl SpreadModel {
    pub fn new(config: &QuotingConfig) -> Self {
        Self {
            risk_aversion: config.risk_aversion,
            time_decay_factor: config.time_decay_factor,
            base_spread: config.base_spread,
            min_spread: config.min_spread,
            max_spread: config.max_spread,
            duration_secs: config.market_duration_secs.max(1),
            cold_start_divisor: config.cold_start_spread_divisor,
            dynamic: config.use_dynamic_spread,
        }
    }

    /// Full spread as a fraction of mid.
    pub fn spread(&self, volatility: Decimal, time_remaining_secs: u64) -> Decimal {
        if !self.dynamic {
            return self.clamp(self.base_spread);
        }

        let t = Decimal::from(time_remaining_secs) / Decimal::from(self.duration_secs)
            * self.time_decay_factor;
        let theoretical = self.risk_aversion * volatility * volatility * t;

        self.clamp(self.base_spread + theoretical)
    }

    /// Tighter spread used to seed the first trade on a one-sided or empty book.
    pub fn cold_start(&self, spread: Decimal) -> Decimal {
        if self.cold_start_divisor <= Decimal::ONE {
            return self.clamp(spread);
        }
        self.clamp(spread / self.cold_start_divisor)
    }

    fn clamp(&self, spread: Decimal) -> Decimal {
        spread.max(self.min_spread).min(self.max_spread)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_spread_formula() {
        let model = SpreadModel::new(&QuotingConfig::default());
        // 0.02 + 0.5 * 0.1² * (900/900 * 2) = 0.02 + 0.01 = 0.03
        assert_eq!(model.spread(dec!(0.1), 900), dec!(0.03));
        // Half the time left halves the theoretical term.
        assert_eq!(model.spread(dec!(0.1), 450), dec!(0.025));
    }

    #[test]
    fn test_spread_shrinks_toward_expiry() {
        let model = SpreadModel::new(&QuotingConfig::default());
        let early = model.spread(dec!(0.3), 800);
        let late = model.spread(dec!(0.3), 320);
        assert!(late < early);
    }

    #[test]
    fn test_spread_clamped() {
        let model = SpreadModel::new(&QuotingConfig::default());
        assert_eq!(model.spread(dec!(5), 900), dec!(0.15));

        let config = QuotingConfig {
            base_spread: dec!(0.001),
            ..Default::default()
        };
        let model = SpreadModel::new(&config);
        assert_eq!(model.spread(dec!(0.005), 0), dec!(0.01));
    }

    #[test]
    fn test_cold_start_divides_and_floors() {
        let model = SpreadModel::new(&QuotingConfig::default());
        assert_eq!(model.cold_start(dec!(0.09)), dec!(0.03));
        assert_eq!(model.cold_start(dec!(0.021)), dec!(0.01));
    }

    #[test]
    fn test_static_spread_when_dynamic_disabled() {
        let config = QuotingConfig {
            use_dynamic_spread: false,
            ..Default::default()
        };
        let model = SpreadModel::new(&config);
        assert_eq!(model.spread(dec!(0.5), 900), dec!(0.02));
    }

    #[test]
    fn test_spread_always_within_bounds() {
        let model = SpreadModel::new(&QuotingConfig::default());
        for vol in [dec!(0.005), dec!(0.05), dec!(0.15), dec!(1)] {
            for tr in [0u64, 301, 600, 900, 1800] {
                let s = model.spread(vol, tr);
                assert!(s >= dec!(0.01) && s <= dec!(0.15));
                let c = model.cold_start(s);
                assert!(c >= dec!(0.01) && c <= dec!(0.15));
            }
        }
    }
}
