//! Trading signal calculation.
//!
//! Currently one rule: the simple moving average crossover.

mod ma_crossover;

pub use ma_crossover::{classify, compute_signals, MACrossoverConfig, SignalPoint, SignalSeries};
