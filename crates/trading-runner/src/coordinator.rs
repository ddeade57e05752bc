//! One evaluation cycle: fetch, compute, decide, execute, record, notify.

use chrono::{DateTime, Utc};
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, error, info, info_span, warn, Instrument};
use trading_core::error::{BrokerError, LedgerError, SignalError};
use trading_core::traits::{BrokerSession, Brokerage, Notifier, TradeLedger};
use trading_core::types::{
    OrderResult, PriceBar, Quote, Signal, SignalTransition, Timeframe, TradeRecord,
};
use trading_risk::{Offsets, OrderPolicy};
use trading_strategies::MACrossoverConfig;
use uuid::Uuid;

/// Fatal cycle errors. Everything else is resolved inside the cycle.
#[derive(Error, Debug)]
pub enum CycleError {
    #[error("Session initialization failed: {0}")]
    SessionInit(#[from] BrokerError),
}

/// Per-symbol coordinator settings.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    pub symbol: String,
    pub crossover: MACrossoverConfig,
    pub timeframe: Timeframe,
    /// Bars requested per cycle
    pub bar_count: usize,
    pub offsets: Offsets,
    /// Bound on every brokerage and notifier call
    pub request_timeout: Duration,
}

impl CoordinatorConfig {
    /// Settings for `symbol` with the default windows, timeframe and timeout.
    pub fn new(symbol: impl Into<String>, offsets: Offsets) -> Self {
        Self {
            symbol: symbol.into(),
            crossover: MACrossoverConfig::default(),
            timeframe: Timeframe::Minute1,
            bar_count: 100,
            offsets,
            request_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_windows(mut self, fast_window: usize, slow_window: usize) -> Self {
        self.crossover = MACrossoverConfig {
            fast_window,
            slow_window,
        };
        self
    }

    pub fn with_bar_count(mut self, bar_count: usize) -> Self {
        self.bar_count = bar_count;
        self
    }

    pub fn with_timeframe(mut self, timeframe: Timeframe) -> Self {
        self.timeframe = timeframe;
        self
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }
}

/// States a cycle passes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Idle,
    SessionOpen,
    DataFetched,
    SignalEvaluated,
    NoAction,
    OrderAttempted,
    SessionClosed,
}

/// How a cycle ended.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// Signal unchanged, or changed to flat
    NoAction,
    /// Transition already handled by an earlier cycle
    AlreadyActed,
    /// Fetch failed, timed out, or returned nothing
    DataUnavailable { reason: String },
    InsufficientData { required: usize, available: usize },
    /// Bars out of order or otherwise unusable
    InvalidData { reason: String },
    QuoteUnavailable,
    Rejected { code: Option<i32>, comment: String },
    /// Order accepted; `logged` is false when the ledger write failed
    Executed { record: TradeRecord, logged: bool },
}

impl CycleOutcome {
    /// Whether an order was accepted this cycle.
    pub fn is_executed(&self) -> bool {
        matches!(self, CycleOutcome::Executed { .. })
    }
}

impl fmt::Display for CycleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleOutcome::NoAction => write!(f, "no action"),
            CycleOutcome::AlreadyActed => write!(f, "transition already acted on"),
            CycleOutcome::DataUnavailable { reason } => write!(f, "no data ({})", reason),
            CycleOutcome::InsufficientData {
                required,
                available,
            } => write!(f, "insufficient data ({}/{} bars)", available, required),
            CycleOutcome::InvalidData { reason } => write!(f, "invalid data ({})", reason),
            CycleOutcome::QuoteUnavailable => write!(f, "no quote"),
            CycleOutcome::Rejected { code, comment } => {
                let code = code.map_or_else(|| "n/a".to_string(), |c| c.to_string());
                write!(f, "order rejected (code {}: {})", code, comment)
            }
            CycleOutcome::Executed { record, logged } => {
                write!(f, "{} executed @ {}", record.side, record.executed_price)?;
                if !logged {
                    write!(f, " (NOT recorded)")?;
                }
                Ok(())
            }
        }
    }
}

/// Result of one cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub cycle_id: Uuid,
    pub symbol: String,
    /// Timestamp of the latest evaluated bar
    pub bar_time: Option<DateTime<Utc>>,
    pub transition: Option<SignalTransition>,
    pub outcome: CycleOutcome,
    /// States visited, in order
    pub states: Vec<CycleState>,
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol)?;
        match self.bar_time {
            Some(t) => write!(f, " [{}]", t.format("%Y-%m-%d %H:%M:%S"))?,
            None => write!(f, " [-]")?,
        }
        if let Some(t) = &self.transition {
            write!(f, " {} -> {}", t.previous, t.current)?;
        }
        write!(f, ": {}", self.outcome)
    }
}

struct Evaluation {
    bar_time: Option<DateTime<Utc>>,
    transition: Option<SignalTransition>,
    outcome: CycleOutcome,
}

impl Evaluation {
    fn aborted(outcome: CycleOutcome) -> Self {
        Self {
            bar_time: None,
            transition: None,
            outcome,
        }
    }
}

/// Runs evaluation cycles for one symbol.
///
/// Each cycle owns a fresh brokerage session and releases it on every
/// path. The coordinator remembers the bar of the last transition it
/// handled (an order submitted, or a change to flat notified) and never
/// handles the same bar twice.
pub struct RunCoordinator {
    config: CoordinatorConfig,
    policy: OrderPolicy,
    brokerage: Arc<dyn Brokerage>,
    ledger: Arc<dyn TradeLedger>,
    notifier: Arc<dyn Notifier>,
    last_acted: Mutex<Option<DateTime<Utc>>>,
}

impl RunCoordinator {
    /// Create a coordinator. Fails when the windows are invalid.
    pub fn new(
        config: CoordinatorConfig,
        policy: OrderPolicy,
        brokerage: Arc<dyn Brokerage>,
        ledger: Arc<dyn TradeLedger>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, SignalError> {
        config.crossover.validate()?;
        Ok(Self {
            config,
            policy,
            brokerage,
            ledger,
            notifier,
            last_acted: Mutex::new(None),
        })
    }

    /// Symbol this coordinator trades.
    pub fn symbol(&self) -> &str {
        &self.config.symbol
    }

    /// Bar timestamp of the last transition handled.
    pub fn last_acted(&self) -> Option<DateTime<Utc>> {
        self.last_acted.lock().ok().and_then(|g| *g)
    }

    /// Run one cycle.
    ///
    /// Only a failure to open the brokerage session is an error; every
    /// other problem is notified and reported in the `CycleReport`.
    pub async fn run_cycle(&self) -> Result<CycleReport, CycleError> {
        let cycle_id = Uuid::new_v4();
        let span = info_span!(
            "cycle",
            symbol = %self.config.symbol,
            cycle_id = %cycle_id
        );
        self.run_cycle_inner(cycle_id).instrument(span).await
    }

    async fn run_cycle_inner(&self, cycle_id: Uuid) -> Result<CycleReport, CycleError> {
        let mut states = vec![CycleState::Idle];

        let session = match self.bounded(self.brokerage.open_session()).await {
            Some(Ok(session)) => session,
            Some(Err(e)) => {
                error!("Failed to open {} session: {}", self.brokerage.name(), e);
                self.notify(&format!("❌ Failed to initialize session: {}", e))
                    .await;
                return Err(CycleError::SessionInit(e));
            }
            None => {
                let e = BrokerError::Timeout(self.config.request_timeout);
                error!("Failed to open {} session: {}", self.brokerage.name(), e);
                self.notify(&format!("❌ Failed to initialize session: {}", e))
                    .await;
                return Err(CycleError::SessionInit(e));
            }
        };
        states.push(CycleState::SessionOpen);
        debug!("Session open on {}", self.brokerage.name());

        let evaluation = self.evaluate(session.as_ref(), &mut states).await;

        if self.bounded(session.shutdown()).await.is_none() {
            warn!("Session shutdown timed out");
        }
        states.push(CycleState::SessionClosed);

        let report = CycleReport {
            cycle_id,
            symbol: self.config.symbol.clone(),
            bar_time: evaluation.bar_time,
            transition: evaluation.transition,
            outcome: evaluation.outcome,
            states,
        };
        info!("Cycle complete: {}", report);
        Ok(report)
    }

    async fn evaluate(
        &self,
        session: &dyn BrokerSession,
        states: &mut Vec<CycleState>,
    ) -> Evaluation {
        let symbol = self.config.symbol.as_str();

        let bars = match self.fetch_bars(session).await {
            Ok(bars) => bars,
            Err(reason) => {
                warn!("No data for {}: {}", symbol, reason);
                self.notify(&format!("❌ No data for {}", symbol)).await;
                return Evaluation::aborted(CycleOutcome::DataUnavailable { reason });
            }
        };
        states.push(CycleState::DataFetched);
        debug!("Fetched {} bars", bars.len());

        let series = match self.config.crossover.compute(&bars) {
            Ok(series) => series,
            Err(SignalError::InsufficientData {
                required,
                available,
            }) => {
                warn!(
                    "Not enough data for {}: need {} bars, have {}",
                    symbol, required, available
                );
                self.notify(&format!(
                    "❌ Not enough data for {}: need {} bars, have {}",
                    symbol, required, available
                ))
                .await;
                return Evaluation::aborted(CycleOutcome::InsufficientData {
                    required,
                    available,
                });
            }
            Err(e) => {
                warn!("Invalid data for {}: {}", symbol, e);
                self.notify(&format!("❌ Invalid data for {}: {}", symbol, e))
                    .await;
                return Evaluation::aborted(CycleOutcome::InvalidData {
                    reason: e.to_string(),
                });
            }
        };
        states.push(CycleState::SignalEvaluated);

        let Some(transition) = series.transition() else {
            states.push(CycleState::NoAction);
            return Evaluation::aborted(CycleOutcome::NoAction);
        };

        let mut evaluation = Evaluation {
            bar_time: Some(transition.timestamp),
            transition: Some(transition),
            outcome: CycleOutcome::NoAction,
        };

        if !transition.is_change() {
            info!("No action for {}: {} unchanged", symbol, transition.current);
            states.push(CycleState::NoAction);
            return evaluation;
        }

        if self.last_acted() == Some(transition.timestamp) {
            debug!("Transition at {} already acted on", transition.timestamp);
            states.push(CycleState::NoAction);
            evaluation.outcome = CycleOutcome::AlreadyActed;
            return evaluation;
        }

        info!(
            "Signal change on {}: {} -> {}",
            symbol, transition.previous, transition.current
        );
        self.notify(&format!(
            "📊 {} signal on {}",
            signal_word(transition.current),
            symbol
        ))
        .await;

        evaluation.outcome = self.execute(session, transition, states).await;
        evaluation
    }

    async fn execute(
        &self,
        session: &dyn BrokerSession,
        transition: SignalTransition,
        states: &mut Vec<CycleState>,
    ) -> CycleOutcome {
        let symbol = self.config.symbol.as_str();

        let quote = if transition.current.side().is_some() {
            self.fetch_quote(session).await
        } else {
            None
        };

        let order = match self.policy.decide(
            symbol,
            transition.previous,
            transition.current,
            self.config.offsets,
            quote.as_ref(),
        ) {
            Ok(Some(order)) => order,
            Ok(None) => {
                info!("No order for {}: signal went flat", symbol);
                self.mark_acted(transition.timestamp);
                states.push(CycleState::NoAction);
                return CycleOutcome::NoAction;
            }
            Err(e) => {
                warn!("{}", e);
                self.notify(&format!("❌ Failed to get tick data for {}", symbol))
                    .await;
                states.push(CycleState::NoAction);
                return CycleOutcome::QuoteUnavailable;
            }
        };

        states.push(CycleState::OrderAttempted);
        debug!("Submitting {:?}", order);
        let result = self
            .bounded(session.submit(&order))
            .await
            .unwrap_or_else(|| {
                OrderResult::failed(format!(
                    "no response within {:?}",
                    self.config.request_timeout
                ))
            });
        self.mark_acted(transition.timestamp);

        let Some(record) =
            TradeRecord::from_execution(&order, &result, transition.current, Utc::now())
        else {
            warn!(
                "{} order for {} rejected: code {} {}",
                order.side,
                symbol,
                result.code_label(),
                result.comment
            );
            self.notify(&format!(
                "❌ {} trade failed for {}: Code {}",
                order.side,
                symbol,
                result.code_label()
            ))
            .await;
            return CycleOutcome::Rejected {
                code: result.broker_code,
                comment: result.comment,
            };
        };

        let logged = match self.record_trade(&record).await {
            Ok(()) => true,
            Err(e) => {
                error!(
                    "{} order for {} filled at {} but not recorded: {}",
                    record.side, symbol, record.executed_price, e
                );
                self.notify(&format!(
                    "⚠️ {} order for {} filled at {} but not recorded: {}",
                    record.side, symbol, record.executed_price, e
                ))
                .await;
                false
            }
        };

        info!(
            "{} order placed for {} at {}",
            record.side, symbol, record.executed_price
        );
        self.notify(&format!(
            "✅ {} order placed for {} at {}",
            record.side, symbol, record.executed_price
        ))
        .await;

        CycleOutcome::Executed { record, logged }
    }

    async fn fetch_quote(&self, session: &dyn BrokerSession) -> Option<Quote> {
        let symbol = self.config.symbol.as_str();
        match self.bounded(session.latest_quote(symbol)).await {
            Some(Ok(quote)) => quote,
            Some(Err(e)) => {
                warn!("Quote request failed for {}: {}", symbol, e);
                None
            }
            None => {
                warn!("Quote request timed out for {}", symbol);
                None
            }
        }
    }

    /// Append to the ledger on the blocking pool; the write syncs to disk.
    async fn record_trade(&self, record: &TradeRecord) -> Result<(), LedgerError> {
        let ledger = Arc::clone(&self.ledger);
        let record = record.clone();
        tokio::task::spawn_blocking(move || ledger.append(&record))
            .await
            .map_err(|e| LedgerError::Task(e.to_string()))?
    }

    async fn fetch_bars(&self, session: &dyn BrokerSession) -> Result<Vec<PriceBar>, String> {
        let request = session.fetch_bars(
            &self.config.symbol,
            self.config.timeframe,
            self.config.bar_count,
        );
        match self.bounded(request).await {
            Some(Ok(bars)) if bars.is_empty() => Err("empty response".to_string()),
            Some(Ok(bars)) => Ok(bars),
            Some(Err(e)) => Err(e.to_string()),
            None => Err(format!("timed out after {:?}", self.config.request_timeout)),
        }
    }

    fn mark_acted(&self, timestamp: DateTime<Utc>) {
        if let Ok(mut guard) = self.last_acted.lock() {
            *guard = Some(timestamp);
        }
    }

    /// Best-effort notification; failures are logged and dropped.
    async fn notify(&self, message: &str) {
        match self.bounded(self.notifier.notify(message)).await {
            Some(Ok(())) => {}
            Some(Err(e)) => warn!("Notification dropped: {}", e),
            None => warn!("Notification timed out"),
        }
    }

    /// Run `fut` under the request timeout; `None` on timeout.
    async fn bounded<F: Future>(&self, fut: F) -> Option<F::Output> {
        timeout(self.config.request_timeout, fut).await.ok()
    }
}

fn signal_word(signal: Signal) -> &'static str {
    match signal {
        Signal::Long => "Buy",
        Signal::Short => "Sell",
        Signal::Flat => "Flat",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use trading_core::types::Side;

    fn record() -> TradeRecord {
        TradeRecord {
            symbol: "EURUSDm".to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 0).unwrap(),
            signal: Signal::Long,
            executed_price: dec!(1.0852),
            take_profit: dec!(1.0872),
            stop_loss: dec!(1.0842),
            side: Side::Buy,
        }
    }

    #[test]
    fn test_report_display() {
        let report = CycleReport {
            cycle_id: Uuid::nil(),
            symbol: "EURUSDm".to_string(),
            bar_time: Some(Utc.with_ymd_and_hms(2024, 3, 5, 14, 29, 0).unwrap()),
            transition: Some(SignalTransition {
                previous: Signal::Flat,
                current: Signal::Long,
                timestamp: Utc.with_ymd_and_hms(2024, 3, 5, 14, 29, 0).unwrap(),
            }),
            outcome: CycleOutcome::Executed {
                record: record(),
                logged: true,
            },
            states: vec![],
        };

        assert_eq!(
            report.to_string(),
            "EURUSDm [2024-03-05 14:29:00] Flat -> Long: BUY executed @ 1.0852"
        );
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(
            CycleOutcome::Rejected {
                code: None,
                comment: "timeout".to_string()
            }
            .to_string(),
            "order rejected (code n/a: timeout)"
        );
        assert_eq!(
            CycleOutcome::InsufficientData {
                required: 11,
                available: 4
            }
            .to_string(),
            "insufficient data (4/11 bars)"
        );
        assert!(CycleOutcome::Executed {
            record: record(),
            logged: false
        }
        .to_string()
        .ends_with("(NOT recorded)"));
    }

    #[test]
    fn test_config_builder() {
        let offsets = Offsets::new(dec!(0.002), dec!(0.001)).unwrap();
        let config = CoordinatorConfig::new("EURUSDm", offsets)
            .with_windows(2, 4)
            .with_bar_count(20)
            .with_timeframe(Timeframe::Minute5);

        assert_eq!(config.crossover.fast_window, 2);
        assert_eq!(config.crossover.slow_window, 4);
        assert_eq!(config.bar_count, 20);
        assert_eq!(config.timeframe, Timeframe::Minute5);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
    }
}
