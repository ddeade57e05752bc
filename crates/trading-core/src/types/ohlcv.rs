//! Price bar and quote types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A closed price bar.
/// Uses f64 for fast moving-average calculations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    /// Bar open time (UTC)
    pub timestamp: DateTime<Utc>,
    /// Closing price
    pub close: f64,
}

impl PriceBar {
    /// Create a new bar.
    pub fn new(timestamp: DateTime<Utc>, close: f64) -> Self {
        Self { timestamp, close }
    }

    /// Create a bar from a Unix timestamp in seconds.
    ///
    /// Returns `None` when the timestamp is out of range.
    pub fn from_unix_secs(secs: i64, close: f64) -> Option<Self> {
        DateTime::from_timestamp(secs, 0).map(|timestamp| Self { timestamp, close })
    }
}

/// Latest top-of-book quote for a symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Symbol
    pub symbol: String,
    /// Best bid price
    pub bid: Decimal,
    /// Best ask price
    pub ask: Decimal,
    /// Quote time
    pub timestamp: DateTime<Utc>,
}

impl Quote {
    /// Bid price if it is usable for a sell.
    pub fn usable_bid(&self) -> Option<Decimal> {
        (self.bid > Decimal::ZERO).then_some(self.bid)
    }

    /// Ask price if it is usable for a buy.
    pub fn usable_ask(&self) -> Option<Decimal> {
        (self.ask > Decimal::ZERO).then_some(self.ask)
    }
}

/// Closes of a bar slice, oldest first.
pub fn closes(bars: &[PriceBar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}
