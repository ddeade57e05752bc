//! Executed trade records.

use chrono::{DateTime, SubsecRound, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{OrderRequest, OrderResult, Side, Signal};

/// Immutable record of an executed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub signal: Signal,
    pub executed_price: Decimal,
    pub take_profit: Decimal,
    pub stop_loss: Decimal,
    pub side: Side,
}

impl TradeRecord {
    /// Build a record for an accepted order.
    ///
    /// Returns `None` for results that were not accepted. The execution price
    /// falls back to the order's reference price when the brokerage omits it.
    /// The timestamp is truncated to microseconds, the trade log's resolution.
    pub fn from_execution(
        order: &OrderRequest,
        result: &OrderResult,
        signal: Signal,
        timestamp: DateTime<Utc>,
    ) -> Option<Self> {
        if !result.accepted {
            return None;
        }
        Some(Self {
            symbol: order.symbol.clone(),
            timestamp: timestamp.trunc_subsecs(6),
            signal,
            executed_price: result.executed_price.unwrap_or(order.reference_price),
            take_profit: order.take_profit,
            stop_loss: order.stop_loss,
            side: order.side,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OrderMetadata;
    use rust_decimal_macros::dec;

    fn order() -> OrderRequest {
        OrderRequest {
            symbol: "EURUSDm".to_string(),
            side: Side::Buy,
            volume: dec!(0.01),
            reference_price: dec!(1.1000),
            stop_loss: dec!(1.0990),
            take_profit: dec!(1.1020),
            metadata: OrderMetadata {
                deviation: 20,
                magic: 123456,
                comment: "sma-bot-trade".to_string(),
            },
        }
    }

    #[test]
    fn test_record_only_for_accepted() {
        let rejected = OrderResult::rejected(10006, "rejected");
        assert!(TradeRecord::from_execution(&order(), &rejected, Signal::Long, Utc::now()).is_none());
    }

    #[test]
    fn test_record_price_fallback() {
        let mut result = OrderResult::accepted(10009, dec!(1.1001));
        let record =
            TradeRecord::from_execution(&order(), &result, Signal::Long, Utc::now()).unwrap();
        assert_eq!(record.executed_price, dec!(1.1001));
        assert_eq!(record.take_profit, dec!(1.1020));

        result.executed_price = None;
        let record =
            TradeRecord::from_execution(&order(), &result, Signal::Long, Utc::now()).unwrap();
        assert_eq!(record.executed_price, dec!(1.1000));
    }

    #[test]
    fn test_record_time_truncated_to_micros() {
        use chrono::{TimeZone, Timelike};

        let at = Utc.timestamp_opt(1_709_649_000, 495_811_073).unwrap();
        let result = OrderResult::accepted(10009, dec!(1.1001));
        let record = TradeRecord::from_execution(&order(), &result, Signal::Long, at).unwrap();

        assert_eq!(record.timestamp.nanosecond(), 495_811_000);
        assert_eq!(record.timestamp.timestamp(), 1_709_649_000);
    }
}
