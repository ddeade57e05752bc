//! Core data types for the trading bot.

mod ohlcv;
mod order;
mod signal;
mod timeframe;
mod trade;

pub use ohlcv::{closes, PriceBar, Quote};
pub use order::{OrderMetadata, OrderRequest, OrderResult, Side};
pub use signal::{Signal, SignalTransition};
pub use timeframe::Timeframe;
pub use trade::TradeRecord;
