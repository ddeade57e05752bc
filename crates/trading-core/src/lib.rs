//! Core types and traits for the trading bot.
//!
//! This crate provides the foundational building blocks including:
//! - Market data types (PriceBar, Quote, Timeframe)
//! - Signals, order requests/results and trade records
//! - Seams for brokerage sessions, the trade ledger, notifications and credentials

pub mod error;
pub mod traits;
pub mod types;

pub use traits::*;
pub use types::*;
