//! Market clock: time remaining until expiry.

/// Derives `time_remaining` for the current market.
///
/// When the host knows the market end time it is used directly. Otherwise
/// the clock assumes the market opened when the strategy first observed it
/// and runs for the nominal duration.
#[derive(Debug, Clone)]
pub struct MarketClock {
    duration_ms: u64,
    started_at_ms: Option<u64>,
    ends_at_ms: Option<u64>,
}

impl MarketClock {
    pub fn new(duration_secs: u64) -> Self {
        Self {
            duration_ms: duration_secs.saturating_mul(1000),
            started_at_ms: None,
            ends_at_ms: None,
        }
    }

    /// Clock anchored to a known expiry.
    pub fn with_end(duration_secs: u64, ends_at_ms: u64) -> Self {
        Self {
            ends_at_ms: Some(ends_at_ms),
            ..Self::new(duration_secs)
        }
    }

    /// Set the start time if not already set.
    pub fn start(&mut self, now_ms: u64) {
        if self.started_at_ms.is_none() {
            self.started_at_ms = Some(now_ms);
        }
    }

    pub fn started_at_ms(&self) -> Option<u64> {
        self.started_at_ms
    }

    /// Whole seconds left, never negative.
    ///
    /// Starts the clock lazily on first use.
    pub fn time_remaining_secs(&mut self, now_ms: u64) -> u64 {
        if let Some(end) = self.ends_at_ms {
            return end.saturating_sub(now_ms) / 1000;
        }
        self.start(now_ms);
        let elapsed = now_ms.saturating_sub(self.started_at_ms.unwrap_or(now_ms));
        self.duration_ms.saturating_sub(elapsed) / 1000
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lazy_start_full_duration() {
        let mut clock = MarketClock::new(900);
        assert_eq!(clock.time_remaining_secs(1_000_000), 900);
        assert_eq!(clock.started_at_ms(), Some(1_000_000));
    }

    #[test]
    fn test_partial_seconds_truncate() {
        let mut clock = MarketClock::new(900);
        clock.start(0);
        assert_eq!(clock.time_remaining_secs(400), 899);
        assert_eq!(clock.time_remaining_secs(600_000), 300);
    }

    #[test]
    fn test_never_negative() {
        let mut clock = MarketClock::new(900);
        clock.start(0);
        assert_eq!(clock.time_remaining_secs(2_000_000), 0);
    }

    #[test]
    fn test_start_is_idempotent() {
        let mut clock = MarketClock::new(900);
        clock.start(10_000);
        clock.start(50_000);
        assert_eq!(clock.started_at_ms(), Some(10_000));
    }

    #[test]
    fn test_explicit_end_wins() {
        let mut clock = MarketClock::with_end(900, 1_000_000);
        clock.start(0);
        assert_eq!(clock.time_remaining_secs(940_000), 60);
        assert_eq!(clock.time_remaining_secs(1_200_000), 0);
    }
}
