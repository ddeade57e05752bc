//! Trade ledger trait.

use crate::error::LedgerError;
use crate::types::TradeRecord;

/// Durable, append-only store of executed trades.
pub trait TradeLedger: Send + Sync {
    /// Append one record as a single atomic write.
    fn append(&self, record: &TradeRecord) -> Result<(), LedgerError>;
}
