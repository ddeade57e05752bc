//! Moving Average Crossover signal calculation.
//!
//! Every bar gets a signal: `Long` while the fast SMA is above the slow SMA,
//! `Short` while it is below, `Flat` when they are equal or the slow window
//! is not yet full. Orders are driven by changes between the two latest
//! fully-defined points.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use trading_core::error::SignalError;
use trading_core::traits::Indicator;
use trading_core::types::{closes, PriceBar, Signal, SignalTransition};
use trading_indicators::Sma;

/// Relative tolerance under which two averages count as equal.
///
/// The sliding-window sum accumulates rounding error of a few ulps; without
/// a tolerance a flat market would flicker between Long and Short.
const EQUALITY_TOLERANCE: f64 = 1e-12;

/// Window configuration for the crossover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MACrossoverConfig {
    /// Fast moving average window
    pub fast_window: usize,
    /// Slow moving average window
    pub slow_window: usize,
}

impl Default for MACrossoverConfig {
    fn default() -> Self {
        Self {
            fast_window: 5,
            slow_window: 10,
        }
    }
}

impl MACrossoverConfig {
    /// Validate the windows.
    pub fn validate(&self) -> Result<(), SignalError> {
        if self.fast_window == 0 || self.fast_window >= self.slow_window {
            return Err(SignalError::InvalidWindows {
                fast: self.fast_window,
                slow: self.slow_window,
            });
        }
        Ok(())
    }

    /// Compute the signal series for `bars`.
    pub fn compute(&self, bars: &[PriceBar]) -> Result<SignalSeries, SignalError> {
        compute_signals(bars, self.fast_window, self.slow_window)
    }
}

/// One entry of the signal series, aligned with a bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalPoint {
    pub timestamp: DateTime<Utc>,
    pub fast: Option<f64>,
    pub slow: Option<f64>,
    pub signal: Signal,
}

impl SignalPoint {
    /// Both averages are available.
    pub fn is_defined(&self) -> bool {
        self.fast.is_some() && self.slow.is_some()
    }
}

/// Signal series aligned 1:1 with the input bars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalSeries {
    points: Vec<SignalPoint>,
}

impl SignalSeries {
    /// All points, oldest first.
    pub fn points(&self) -> &[SignalPoint] {
        &self.points
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the series is empty.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Transition between the two most recent fully-defined points.
    pub fn transition(&self) -> Option<SignalTransition> {
        let mut defined = self.points.iter().rev().filter(|p| p.is_defined());
        let current = defined.next()?;
        let previous = defined.next()?;
        Some(SignalTransition {
            previous: previous.signal,
            current: current.signal,
            timestamp: current.timestamp,
        })
    }

    /// Every change of signal across the whole series.
    ///
    /// Undefined points count as `Flat`, so the first defined non-flat point
    /// is itself a transition.
    pub fn transitions(&self) -> Vec<SignalTransition> {
        self.points
            .windows(2)
            .filter(|w| w[0].signal != w[1].signal)
            .map(|w| SignalTransition {
                previous: w[0].signal,
                current: w[1].signal,
                timestamp: w[1].timestamp,
            })
            .collect()
    }
}

/// Classify one pair of averages.
pub fn classify(fast: Option<f64>, slow: Option<f64>) -> Signal {
    match (fast, slow) {
        (Some(f), Some(s)) => {
            let scale = f.abs().max(s.abs()).max(f64::MIN_POSITIVE);
            if (f - s).abs() <= EQUALITY_TOLERANCE * scale {
                Signal::Flat
            } else if f > s {
                Signal::Long
            } else {
                Signal::Short
            }
        }
        _ => Signal::Flat,
    }
}

/// Compute fast/slow SMAs and the per-bar signal.
///
/// Needs at least `slow_window + 1` bars so that two fully-defined points
/// exist. Bars must have strictly increasing timestamps.
pub fn compute_signals(
    bars: &[PriceBar],
    fast_window: usize,
    slow_window: usize,
) -> Result<SignalSeries, SignalError> {
    MACrossoverConfig {
        fast_window,
        slow_window,
    }
    .validate()?;

    let required = slow_window + 1;
    if bars.len() < required {
        return Err(SignalError::InsufficientData {
            required,
            available: bars.len(),
        });
    }

    if let Some(index) = bars
        .windows(2)
        .position(|w| w[1].timestamp <= w[0].timestamp)
    {
        return Err(SignalError::UnorderedBars { index: index + 1 });
    }

    let closes = closes(bars);
    let fast = Sma::new(fast_window).calculate_aligned(&closes);
    let slow = Sma::new(slow_window).calculate_aligned(&closes);

    let points = bars
        .iter()
        .zip(fast.into_iter().zip(slow))
        .map(|(bar, (fast, slow))| {
            let slow_defined = slow.is_some();
            let fast = fast.filter(|_| slow_defined);
            SignalPoint {
                timestamp: bar.timestamp,
                fast,
                slow,
                signal: classify(fast, slow),
            }
        })
        .collect();

    Ok(SignalSeries { points })
}
