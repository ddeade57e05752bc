//! Technical indicators.
//!
//! Provides the simple moving average used by the crossover signal. Values
//! can be produced either compactly (one per full window) or aligned 1:1
//! with the input series.

pub mod moving_average;

pub use moving_average::Sma;
