//! Coefficient-of-variation volatility over the recent mid-price window.

use rust_decimal::{Decimal, MathematicalOps};

use crate::config::QuotingConfig;
use crate::price_history::PriceHistory;

/// Volatility as `stddev / mean` of the newest `window` mid prices.
///
/// Standard deviation is the population form (divides by n). The result is
/// never below `min_volatility`. An upper bound is not applied here: an
/// excessive reading is a risk-gate veto, not something to clamp away.
#[derive(Debug, Clone)]
pub struct VolatilityEstimator {
    window: usize,
    min_samples: usize,
    default_volatility: Decimal,
    min_volatility: Decimal,
}

impl VolatilityEstimator {
    pub fn new(config: &QuotingConfig) -> Self {
        Self {
            window: config.volatility_window.max(1),
            min_samples: config.min_volatility_samples,
            default_volatility: config.default_volatility,
            min_volatility: config.min_volatility,
        }
    }

    pub fn estimate(&self, history: &PriceHistory) -> Decimal {
        if history.len() < self.min_samples {
            return self.default_volatility.max(self.min_volatility);
        }

        let window: Vec<Decimal> = history.recent(self.window).copied().collect();
        if window.is_empty() {
            return self.default_volatility.max(self.min_volatility);
        }
        let n = Decimal::from(window.len());
        let mean = window.iter().sum::<Decimal>() / n;
        if mean <= Decimal::ZERO {
            return self.min_volatility;
        }

        let variance = window
            .iter()
            .map(|p| (*p - mean) * (*p - mean))
            .sum::<Decimal>()
            / n;
        let std_dev = variance.sqrt().unwrap_or(Decimal::ZERO);

        (std_dev / mean).max(self.min_volatility)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pmq_core::Price;
    use rust_decimal_macros::dec;

    fn history_of(prices: &[Decimal]) -> PriceHistory {
        let mut history = PriceHistory::new(30);
        for p in prices {
            history.push(Price::new(*p));
        }
        history
    }

    #[test]
    fn test_default_below_min_samples() {
        let estimator = VolatilityEstimator::new(&QuotingConfig::default());
        for n in 0..10 {
            let history = history_of(&vec![dec!(0.5); n]);
            let vol = estimator.estimate(&history);
            assert_eq!(vol, dec!(0.05));
            assert!(vol >= dec!(0.005));
        }
    }

    #[test]
    fn test_flat_prices_hit_floor() {
        let estimator = VolatilityEstimator::new(&QuotingConfig::default());
        let history = history_of(&[dec!(0.5); 12]);
        assert_eq!(estimator.estimate(&history), dec!(0.005));
    }

    #[test]
    fn test_coefficient_of_variation() {
        let estimator = VolatilityEstimator::new(&QuotingConfig::default());
        // Mean 0.5, every sample 0.1 away: stddev 0.1, cv 0.2.
        let prices: Vec<Decimal> = (0..10)
            .map(|i| if i % 2 == 0 { dec!(0.4) } else { dec!(0.6) })
            .collect();
        let vol = estimator.estimate(&history_of(&prices));
        assert!((vol - dec!(0.2)).abs() < dec!(0.0000001));
    }

    #[test]
    fn test_uses_only_recent_window() {
        let config = QuotingConfig {
            volatility_window: 10,
            ..Default::default()
        };
        let estimator = VolatilityEstimator::new(&config);
        let mut prices = vec![dec!(0.1), dec!(0.9), dec!(0.1), dec!(0.9)];
        prices.extend(std::iter::repeat(dec!(0.5)).take(10));
        let mut history = PriceHistory::new(10);
        for p in prices {
            history.push(Price::new(p));
        }
        assert_eq!(estimator.estimate(&history), dec!(0.005));
    }
}
