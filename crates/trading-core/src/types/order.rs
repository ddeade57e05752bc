//! Order types and structures.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Order side (buy or sell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Get the sign for price offsets (+1 for buy, -1 for sell).
    pub fn sign(&self) -> Decimal {
        match self {
            Side::Buy => Decimal::ONE,
            Side::Sell => -Decimal::ONE,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

impl std::str::FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "BUY" => Ok(Side::Buy),
            "SELL" => Ok(Side::Sell),
            _ => Err(format!("Invalid side: {}", s)),
        }
    }
}

/// Fixed execution metadata attached to every order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderMetadata {
    /// Maximum tolerated price deviation, in points
    pub deviation: u32,
    /// Identifying tag ("magic number") for orders placed by this bot
    pub magic: u64,
    /// Free-text order comment
    pub comment: String,
}

/// Market order request with protective levels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    /// Symbol to trade
    pub symbol: String,
    /// Buy or sell
    pub side: Side,
    /// Lots to trade
    pub volume: Decimal,
    /// Quote the order was priced from (ask for buys, bid for sells)
    pub reference_price: Decimal,
    /// Stop-loss level
    pub stop_loss: Decimal,
    /// Take-profit level
    pub take_profit: Decimal,
    /// Execution metadata
    pub metadata: OrderMetadata,
}

/// Outcome of an order submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderResult {
    /// Whether the brokerage executed the order
    pub accepted: bool,
    /// Brokerage return code, `None` when no reply was received
    pub broker_code: Option<i32>,
    /// Execution price reported by the brokerage
    pub executed_price: Option<Decimal>,
    /// Brokerage or transport comment
    pub comment: String,
}

impl OrderResult {
    /// An executed order.
    pub fn accepted(code: i32, executed_price: Decimal) -> Self {
        Self {
            accepted: true,
            broker_code: Some(code),
            executed_price: Some(executed_price),
            comment: String::new(),
        }
    }

    /// An order the brokerage answered but did not execute.
    pub fn rejected(code: i32, comment: impl Into<String>) -> Self {
        Self {
            accepted: false,
            broker_code: Some(code),
            executed_price: None,
            comment: comment.into(),
        }
    }

    /// A submission that never got a brokerage reply.
    pub fn failed(comment: impl Into<String>) -> Self {
        Self {
            accepted: false,
            broker_code: None,
            executed_price: None,
            comment: comment.into(),
        }
    }

    /// Human-readable return code.
    pub fn code_label(&self) -> String {
        match self.broker_code {
            Some(code) => code.to_string(),
            None => "n/a".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_side_display_and_parse() {
        assert_eq!(Side::Buy.to_string(), "BUY");
        assert_eq!(Side::Sell.to_string(), "SELL");
        assert_eq!("sell".parse::<Side>().unwrap(), Side::Sell);
        assert!("hold".parse::<Side>().is_err());
    }

    #[test]
    fn test_side_sign() {
        assert_eq!(Side::Buy.sign(), dec!(1));
        assert_eq!(Side::Sell.sign(), dec!(-1));
    }

    #[test]
    fn test_order_result_constructors() {
        let ok = OrderResult::accepted(10009, dec!(1.0872));
        assert!(ok.accepted);
        assert_eq!(ok.executed_price, Some(dec!(1.0872)));

        let rejected = OrderResult::rejected(10006, "Request rejected");
        assert!(!rejected.accepted);
        assert_eq!(rejected.code_label(), "10006");

        let failed = OrderResult::failed("timed out");
        assert_eq!(failed.code_label(), "n/a");
    }
}
