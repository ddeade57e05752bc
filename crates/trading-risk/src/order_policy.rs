//! Order construction on signal transitions.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use trading_core::error::PolicyError;
use trading_core::types::{OrderMetadata, OrderRequest, Quote, Side, Signal};

/// Fixed order parameters.
///
/// None of these depend on market state, so the same transition and quote
/// always produce the same order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderPolicyConfig {
    /// Lots per order
    pub volume: Decimal,
    /// Maximum price deviation, in points
    pub deviation: u32,
    /// Identifying tag for this bot's orders
    pub magic: u64,
    /// Order comment
    pub comment: String,
}

impl Default for OrderPolicyConfig {
    fn default() -> Self {
        Self {
            volume: dec!(0.01),
            deviation: 20,
            magic: 123456,
            comment: "sma-bot-trade".to_string(),
        }
    }
}

/// Protective price distances from the reference price.
///
/// Always non-negative: [`Offsets::new`] is the only constructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Offsets {
    take_profit: Decimal,
    stop_loss: Decimal,
}

impl Offsets {
    /// Create offsets, rejecting negative values.
    pub fn new(take_profit: Decimal, stop_loss: Decimal) -> Result<Self, PolicyError> {
        if take_profit < Decimal::ZERO {
            return Err(PolicyError::NegativeOffset {
                name: "take_profit",
                value: take_profit,
            });
        }
        if stop_loss < Decimal::ZERO {
            return Err(PolicyError::NegativeOffset {
                name: "stop_loss",
                value: stop_loss,
            });
        }
        Ok(Self {
            take_profit,
            stop_loss,
        })
    }

    pub fn take_profit(&self) -> Decimal {
        self.take_profit
    }

    pub fn stop_loss(&self) -> Decimal {
        self.stop_loss
    }
}

/// Decides whether a transition needs an order and prices it.
#[derive(Debug, Clone, Default)]
pub struct OrderPolicy {
    config: OrderPolicyConfig,
}

impl OrderPolicy {
    /// Create a new policy.
    pub fn new(config: OrderPolicyConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &OrderPolicyConfig {
        &self.config
    }

    /// Decide on an order for the transition `previous -> current`.
    ///
    /// Returns `Ok(None)` when the signal did not change or went flat. The
    /// quote is only consulted when an order is required; a missing quote
    /// or an unusable price on the needed side is `QuoteUnavailable`, the
    /// only error `decide` returns.
    pub fn decide(
        &self,
        symbol: &str,
        previous: Signal,
        current: Signal,
        offsets: Offsets,
        quote: Option<&Quote>,
    ) -> Result<Option<OrderRequest>, PolicyError> {
        if previous == current {
            return Ok(None);
        }
        let Some(side) = current.side() else {
            return Ok(None);
        };

        let reference_price = quote
            .and_then(|q| match side {
                Side::Buy => q.usable_ask(),
                Side::Sell => q.usable_bid(),
            })
            .ok_or_else(|| PolicyError::QuoteUnavailable {
                symbol: symbol.to_string(),
                side: match side {
                    Side::Buy => "ask",
                    Side::Sell => "bid",
                },
            })?;

        let (stop_loss, take_profit) = protective_levels(reference_price, side, offsets);

        Ok(Some(OrderRequest {
            symbol: symbol.to_string(),
            side,
            volume: self.config.volume,
            reference_price,
            stop_loss,
            take_profit,
            metadata: OrderMetadata {
                deviation: self.config.deviation,
                magic: self.config.magic,
                comment: self.config.comment.clone(),
            },
        }))
    }
}

/// Stop-loss and take-profit levels around `price`.
///
/// Long: stop below, target above. Short: stop above, target below.
pub fn protective_levels(price: Decimal, side: Side, offsets: Offsets) -> (Decimal, Decimal) {
    let sign = side.sign();
    let stop_loss = price - sign * offsets.stop_loss;
    let take_profit = price + sign * offsets.take_profit;
    (stop_loss, take_profit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn quote() -> Quote {
        Quote {
            symbol: "EURUSDm".to_string(),
            bid: dec!(1.08500),
            ask: dec!(1.08520),
            timestamp: Utc::now(),
        }
    }

    fn offsets() -> Offsets {
        Offsets::new(dec!(0.002), dec!(0.001)).unwrap()
    }

    #[test]
    fn test_no_order_without_change() {
        let policy = OrderPolicy::default();
        for signal in [Signal::Long, Signal::Short, Signal::Flat] {
            let decision = policy
                .decide("EURUSDm", signal, signal, offsets(), Some(&quote()))
                .unwrap();
            assert!(decision.is_none());
        }
    }

    #[test]
    fn test_no_order_when_going_flat() {
        let policy = OrderPolicy::default();
        let decision = policy
            .decide("EURUSDm", Signal::Long, Signal::Flat, offsets(), None)
            .unwrap();
        assert!(decision.is_none());
    }

    #[test]
    fn test_long_transition_buys_at_ask() {
        let policy = OrderPolicy::default();
        let order = policy
            .decide("EURUSDm", Signal::Short, Signal::Long, offsets(), Some(&quote()))
            .unwrap()
            .unwrap();

        assert_eq!(order.side, Side::Buy);
        assert_eq!(order.reference_price, dec!(1.08520));
        assert_eq!(order.stop_loss, dec!(1.08420));
        assert_eq!(order.take_profit, dec!(1.08720));
        assert_eq!(order.volume, dec!(0.01));
        assert_eq!(order.metadata.magic, 123456);
        assert_eq!(order.metadata.deviation, 20);
    }

    #[test]
    fn test_short_transition_sells_at_bid() {
        let policy = OrderPolicy::default();
        let order = policy
            .decide("EURUSDm", Signal::Flat, Signal::Short, offsets(), Some(&quote()))
            .unwrap()
            .unwrap();

        assert_eq!(order.side, Side::Sell);
        assert_eq!(order.reference_price, dec!(1.08500));
        assert_eq!(order.stop_loss, dec!(1.08600));
        assert_eq!(order.take_profit, dec!(1.08300));
    }

    #[test]
    fn test_missing_quote() {
        let policy = OrderPolicy::default();
        let err = policy
            .decide("EURUSDm", Signal::Flat, Signal::Long, offsets(), None)
            .unwrap_err();
        assert_eq!(
            err,
            PolicyError::QuoteUnavailable {
                symbol: "EURUSDm".to_string(),
                side: "ask"
            }
        );
    }

    #[test]
    fn test_unusable_side_of_quote() {
        let policy = OrderPolicy::default();
        let q = Quote {
            bid: Decimal::ZERO,
            ..quote()
        };
        // Ask is fine for a buy...
        assert!(policy
            .decide("EURUSDm", Signal::Flat, Signal::Long, offsets(), Some(&q))
            .is_ok());
        // ...but a sell needs the bid.
        assert!(matches!(
            policy.decide("EURUSDm", Signal::Long, Signal::Short, offsets(), Some(&q)),
            Err(PolicyError::QuoteUnavailable { side: "bid", .. })
        ));
    }

    #[test]
    fn test_decide_is_deterministic() {
        let policy = OrderPolicy::default();
        let q = quote();
        let a = policy.decide("EURUSDm", Signal::Short, Signal::Long, offsets(), Some(&q));
        let b = policy.decide("EURUSDm", Signal::Short, Signal::Long, offsets(), Some(&q));
        assert_eq!(a, b);
    }

    #[test]
    fn test_negative_offsets_rejected() {
        assert_eq!(
            Offsets::new(dec!(-0.1), dec!(0.1)),
            Err(PolicyError::NegativeOffset {
                name: "take_profit",
                value: dec!(-0.1)
            })
        );
        assert!(matches!(
            Offsets::new(dec!(0.1), dec!(-0.1)),
            Err(PolicyError::NegativeOffset { name: "stop_loss", .. })
        ));

        let zero = Offsets::new(Decimal::ZERO, Decimal::ZERO).unwrap();
        assert_eq!(zero.take_profit(), Decimal::ZERO);
        assert_eq!(zero.stop_loss(), Decimal::ZERO);
    }

    #[test]
    fn test_zero_offsets_put_levels_at_price() {
        let zero = Offsets::new(Decimal::ZERO, Decimal::ZERO).unwrap();
        assert_eq!(
            protective_levels(dec!(1.1), Side::Sell, zero),
            (dec!(1.1), dec!(1.1))
        );
    }
}
