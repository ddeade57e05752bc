//! Paper brokerage for dry runs and tests.

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use tracing::{debug, info};
use trading_core::error::{BrokerError, DataError};
use trading_core::traits::{BrokerSession, Brokerage, ExecutionGateway, MarketDataSource};
use trading_core::types::{OrderRequest, OrderResult, PriceBar, Quote, Timeframe};

use crate::retcode;

/// Session and order counters shared by every session of a paper brokerage.
#[derive(Debug, Default)]
pub struct PaperStats {
    sessions_opened: AtomicUsize,
    sessions_closed: AtomicUsize,
    orders_submitted: AtomicUsize,
    orders_filled: AtomicUsize,
}

impl PaperStats {
    /// Sessions opened so far.
    pub fn sessions_opened(&self) -> usize {
        self.sessions_opened.load(Ordering::SeqCst)
    }

    /// Sessions shut down so far.
    pub fn sessions_closed(&self) -> usize {
        self.sessions_closed.load(Ordering::SeqCst)
    }

    /// Orders received, accepted or not.
    pub fn orders_submitted(&self) -> usize {
        self.orders_submitted.load(Ordering::SeqCst)
    }

    /// Orders accepted.
    pub fn orders_filled(&self) -> usize {
        self.orders_filled.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct PaperBehavior {
    refuse_sessions: bool,
    withhold_quotes: bool,
    reject_code: Option<i32>,
}

/// Simulated brokerage over a fixed bar set.
///
/// Quotes the last close as bid and `bid + spread` as ask; fills every
/// order at its reference price unless configured to reject.
#[derive(Debug, Clone)]
pub struct PaperBrokerage {
    bars: Arc<RwLock<Vec<PriceBar>>>,
    spread: Decimal,
    behavior: PaperBehavior,
    stats: Arc<PaperStats>,
}

impl PaperBrokerage {
    /// Create a paper brokerage serving `bars` (oldest first).
    pub fn new(bars: Vec<PriceBar>) -> Self {
        Self {
            bars: Arc::new(RwLock::new(bars)),
            spread: dec!(0.0002),
            behavior: PaperBehavior::default(),
            stats: Arc::new(PaperStats::default()),
        }
    }

    /// Set the quoted spread.
    pub fn with_spread(mut self, spread: Decimal) -> Self {
        self.spread = spread;
        self
    }

    /// Reject every order with the given return code.
    pub fn rejecting_orders(mut self, code: i32) -> Self {
        self.behavior.reject_code = Some(code);
        self
    }

    /// Answer every quote request with "no tick".
    pub fn without_quotes(mut self) -> Self {
        self.behavior.withhold_quotes = true;
        self
    }

    /// Fail every session request.
    pub fn refusing_sessions(mut self) -> Self {
        self.behavior.refuse_sessions = true;
        self
    }

    /// Replace the served bars.
    pub fn set_bars(&self, bars: Vec<PriceBar>) {
        if let Ok(mut guard) = self.bars.write() {
            *guard = bars;
        }
    }

    /// Shared counters.
    pub fn stats(&self) -> Arc<PaperStats> {
        Arc::clone(&self.stats)
    }
}

#[async_trait]
impl Brokerage for PaperBrokerage {
    async fn open_session(&self) -> Result<Box<dyn BrokerSession>, BrokerError> {
        if self.behavior.refuse_sessions {
            return Err(BrokerError::SessionInit(
                "paper brokerage configured to refuse sessions".into(),
            ));
        }
        self.stats.sessions_opened.fetch_add(1, Ordering::SeqCst);
        debug!("Paper session opened");
        Ok(Box::new(PaperSession {
            brokerage: self.clone(),
            closed: AtomicBool::new(false),
        }))
    }

    fn name(&self) -> &str {
        "Paper Brokerage"
    }
}

struct PaperSession {
    brokerage: PaperBrokerage,
    closed: AtomicBool,
}

#[async_trait]
impl MarketDataSource for PaperSession {
    async fn fetch_bars(
        &self,
        _symbol: &str,
        _timeframe: Timeframe,
        count: usize,
    ) -> Result<Vec<PriceBar>, DataError> {
        let bars = self
            .brokerage
            .bars
            .read()
            .map_err(|_| DataError::ConnectionError("paper feed lock poisoned".into()))?;
        let start = bars.len().saturating_sub(count);
        Ok(bars[start..].to_vec())
    }

    async fn latest_quote(&self, symbol: &str) -> Result<Option<Quote>, DataError> {
        if self.brokerage.behavior.withhold_quotes {
            return Ok(None);
        }
        let bars = self
            .brokerage
            .bars
            .read()
            .map_err(|_| DataError::ConnectionError("paper feed lock poisoned".into()))?;
        let Some(last) = bars.last() else {
            return Ok(None);
        };
        let bid = Decimal::try_from(last.close)
            .map_err(|e| DataError::ParseError(format!("close {}: {}", last.close, e)))?;
        Ok(Some(Quote {
            symbol: symbol.to_string(),
            bid,
            ask: bid + self.brokerage.spread,
            timestamp: last.timestamp,
        }))
    }
}

#[async_trait]
impl ExecutionGateway for PaperSession {
    async fn submit(&self, order: &OrderRequest) -> OrderResult {
        let stats = &self.brokerage.stats;
        stats.orders_submitted.fetch_add(1, Ordering::SeqCst);

        if let Some(code) = self.brokerage.behavior.reject_code {
            info!("Paper order rejected: {} {} (code {})", order.side, order.symbol, code);
            return OrderResult::rejected(code, "Request rejected");
        }

        stats.orders_filled.fetch_add(1, Ordering::SeqCst);
        info!(
            "Paper order filled: {} {} {} @ {}",
            order.side, order.volume, order.symbol, order.reference_price
        );
        OrderResult::accepted(retcode::DONE, order.reference_price)
    }

    async fn shutdown(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.brokerage
                .stats
                .sessions_closed
                .fetch_add(1, Ordering::SeqCst);
            debug!("Paper session closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trading_core::types::{OrderMetadata, Side};

    fn bars(closes: &[f64]) -> Vec<PriceBar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| PriceBar::from_unix_secs(1_700_000_000 + i as i64 * 60, c).unwrap())
            .collect()
    }

    fn order(price: Decimal) -> OrderRequest {
        OrderRequest {
            symbol: "EURUSDm".to_string(),
            side: Side::Buy,
            volume: dec!(0.01),
            reference_price: price,
            stop_loss: price - dec!(0.001),
            take_profit: price + dec!(0.002),
            metadata: OrderMetadata {
                deviation: 20,
                magic: 123456,
                comment: "sma-bot-trade".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn test_fetch_latest_bars() {
        let broker = PaperBrokerage::new(bars(&[1.0, 2.0, 3.0, 4.0]));
        let session = broker.open_session().await.unwrap();

        let fetched = session.fetch_bars("EURUSDm", Timeframe::Minute1, 2).await.unwrap();
        assert_eq!(fetched.iter().map(|b| b.close).collect::<Vec<_>>(), vec![3.0, 4.0]);

        let all = session.fetch_bars("EURUSDm", Timeframe::Minute1, 100).await.unwrap();
        assert_eq!(all.len(), 4);
    }

    #[tokio::test]
    async fn test_quote_from_last_close() {
        let broker = PaperBrokerage::new(bars(&[1.085, 1.0852])).with_spread(dec!(0.0003));
        let session = broker.open_session().await.unwrap();

        let quote = session.latest_quote("EURUSDm").await.unwrap().unwrap();
        assert_eq!(quote.bid, dec!(1.0852));
        assert_eq!(quote.ask, dec!(1.0855));
    }

    #[tokio::test]
    async fn test_fill_and_reject() {
        let broker = PaperBrokerage::new(bars(&[1.0]));
        let session = broker.open_session().await.unwrap();
        let result = session.submit(&order(dec!(1.1))).await;
        assert!(result.accepted);
        assert_eq!(result.broker_code, Some(retcode::DONE));
        assert_eq!(result.executed_price, Some(dec!(1.1)));

        let rejecting = PaperBrokerage::new(bars(&[1.0])).rejecting_orders(retcode::REJECT);
        let session = rejecting.open_session().await.unwrap();
        let result = session.submit(&order(dec!(1.1))).await;
        assert!(!result.accepted);
        assert_eq!(rejecting.stats().orders_submitted(), 1);
        assert_eq!(rejecting.stats().orders_filled(), 0);
    }

    #[tokio::test]
    async fn test_shutdown_counted_once() {
        let broker = PaperBrokerage::new(vec![]);
        let session = broker.open_session().await.unwrap();
        session.shutdown().await;
        session.shutdown().await;

        let stats = broker.stats();
        assert_eq!(stats.sessions_opened(), 1);
        assert_eq!(stats.sessions_closed(), 1);
    }

    #[tokio::test]
    async fn test_refused_session_and_missing_quote() {
        let refusing = PaperBrokerage::new(vec![]).refusing_sessions();
        assert!(matches!(
            refusing.open_session().await,
            Err(BrokerError::SessionInit(_))
        ));

        let quiet = PaperBrokerage::new(bars(&[1.0])).without_quotes();
        let session = quiet.open_session().await.unwrap();
        assert!(session.latest_quote("EURUSDm").await.unwrap().is_none());
    }
}
