//! Error types for the trading system.

use thiserror::Error;

/// Signal calculation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignalError {
    #[error("Insufficient data: need {required} bars, have {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("Invalid windows: fast ({fast}) must be > 0 and < slow ({slow})")]
    InvalidWindows { fast: usize, slow: usize },

    #[error("Bars are not strictly increasing at index {index}")]
    UnorderedBars { index: usize },
}

/// Order policy errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("No {side} quote available for {symbol}")]
    QuoteUnavailable { symbol: String, side: &'static str },

    #[error("Offset must be non-negative: {name} = {value}")]
    NegativeOffset {
        name: &'static str,
        value: rust_decimal::Decimal,
    },
}

/// Broker-specific errors.
#[derive(Error, Debug)]
pub enum BrokerError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Session initialization failed: {0}")]
    SessionInit(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("API error: {0}")]
    ApiError(String),
}

/// Data source errors.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    #[error("No data available for the requested range")]
    NoDataAvailable,

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Trade ledger errors.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Ledger IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Ledger encoding error: {0}")]
    Csv(String),

    #[error("Malformed ledger row {row}: {reason}")]
    Malformed { row: usize, reason: String },

    #[error("Ledger write task failed: {0}")]
    Task(String),
}

/// Notification delivery errors.
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Notifier not configured: {0}")]
    NotConfigured(String),

    #[error("Delivery failed: {0}")]
    Delivery(String),
}

/// Indicator calculation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndicatorError {
    #[error("Insufficient data: need {required} points, have {available}")]
    InsufficientData { required: usize, available: usize },
}
