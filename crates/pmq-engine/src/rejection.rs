//! Order rejection classification.
//!
//! Maps a venue's free-text reject reason to a category for logs and
//! metrics. No corrective action is taken here; the next cycle's checks
//! decide what happens next.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectCategory {
    InsufficientBalance,
    InvalidPrice,
    InvalidQuantity,
    RateLimited,
    Other,
}

impl RejectCategory {
    /// Case-insensitive substring match, first hit wins.
    pub fn classify(reason: &str) -> Self {
        let reason = reason.to_ascii_lowercase();
        if reason.contains("insufficient") {
            Self::InsufficientBalance
        } else if reason.contains("price") {
            Self::InvalidPrice
        } else if reason.contains("quantity") {
            Self::InvalidQuantity
        } else if reason.contains("throttle") || reason.contains("rate limit") {
            Self::RateLimited
        } else {
            Self::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InsufficientBalance => "insufficient_balance",
            Self::InvalidPrice => "invalid_price",
            Self::InvalidQuantity => "invalid_quantity",
            Self::RateLimited => "rate_limited",
            Self::Other => "other",
        }
    }

    /// Human-readable description for operator logs.
    pub fn description(&self) -> &'static str {
        match self {
            Self::InsufficientBalance => "insufficient balance for order",
            Self::InvalidPrice => "price outside venue limits or increment",
            Self::InvalidQuantity => "quantity below minimum or wrong increment",
            Self::RateLimited => "venue rate limit hit",
            Self::Other => "unclassified rejection",
        }
    }
}

impl fmt::Display for RejectCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
