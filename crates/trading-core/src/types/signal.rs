//! Trading signals.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Side;

/// Discrete directional state derived from a moving-average comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    /// Fast average above slow average
    Long,
    /// Fast average below slow average
    Short,
    /// Averages equal or undefined
    #[default]
    Flat,
}

impl Signal {
    /// Numeric code used in the trade log (1, -1, 0).
    pub fn code(&self) -> i8 {
        match self {
            Signal::Long => 1,
            Signal::Short => -1,
            Signal::Flat => 0,
        }
    }

    /// Parse a numeric code.
    pub fn from_code(code: i8) -> Option<Self> {
        match code {
            1 => Some(Signal::Long),
            -1 => Some(Signal::Short),
            0 => Some(Signal::Flat),
            _ => None,
        }
    }

    /// Order side needed to follow this signal.
    pub fn side(&self) -> Option<Side> {
        match self {
            Signal::Long => Some(Side::Buy),
            Signal::Short => Some(Side::Sell),
            Signal::Flat => None,
        }
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Signal::Long => write!(f, "Long"),
            Signal::Short => write!(f, "Short"),
            Signal::Flat => write!(f, "Flat"),
        }
    }
}

/// Signal change between two consecutive evaluation points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalTransition {
    /// Signal at the earlier point
    pub previous: Signal,
    /// Signal at the latest point
    pub current: Signal,
    /// Timestamp of the latest point
    pub timestamp: DateTime<Utc>,
}

impl SignalTransition {
    /// Whether the signal changed.
    pub fn is_change(&self) -> bool {
        self.previous != self.current
    }
}
