//! Polling loop over one coordinator per symbol.

use futures::future::join_all;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{watch, Mutex as AsyncMutex, OwnedMutexGuard};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

use crate::coordinator::{CycleError, CycleReport, RunCoordinator};

/// Callback invoked with every completed cycle report.
pub type ReportSink = Arc<dyn Fn(&CycleReport) + Send + Sync>;

/// Scheduler setup errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("{0} is already scheduled")]
    DuplicateSymbol(String),
}

/// One async mutex per symbol.
///
/// Cycles for the same symbol hold its lock for their whole duration;
/// distinct symbols never contend.
#[derive(Debug, Clone, Default)]
pub(crate) struct SymbolLocks {
    locks: Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>,
}

impl SymbolLocks {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `symbol`.
    pub(crate) async fn acquire(&self, symbol: &str) -> OwnedMutexGuard<()> {
        self.lock_for(symbol).lock_owned().await
    }

    fn lock_for(&self, symbol: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(locks.entry(symbol.to_string()).or_default())
    }
}

/// Cycle counts for one symbol after the scheduler stops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolRun {
    pub symbol: String,
    pub cycles: usize,
    pub orders: usize,
}

/// Runs every coordinator on a fixed interval until shutdown.
pub struct Scheduler {
    coordinators: Vec<Arc<RunCoordinator>>,
    interval: Duration,
    locks: SymbolLocks,
    on_report: Option<ReportSink>,
}

impl Scheduler {
    /// Create a scheduler ticking every `interval`.
    pub fn new(interval: Duration) -> Self {
        Self {
            coordinators: Vec::new(),
            interval,
            locks: SymbolLocks::new(),
            on_report: None,
        }
    }

    /// Hand every cycle report to `sink`.
    pub fn with_report_sink(mut self, sink: ReportSink) -> Self {
        self.on_report = Some(sink);
        self
    }

    /// Add a coordinator.
    ///
    /// Each symbol is scheduled at most once, ignoring ASCII case; the
    /// last-acted guard lives in the coordinator.
    pub fn add(&mut self, coordinator: Arc<RunCoordinator>) -> Result<(), ScheduleError> {
        let symbol = coordinator.symbol();
        if self
            .coordinators
            .iter()
            .any(|c| c.symbol().eq_ignore_ascii_case(symbol))
        {
            return Err(ScheduleError::DuplicateSymbol(symbol.to_string()));
        }
        self.coordinators.push(coordinator);
        Ok(())
    }

    /// Run until `shutdown` is set to `true`.
    ///
    /// The first cycle of every symbol starts immediately. Shutdown is only
    /// observed between cycles. A fatal cycle error sets `shutdown` so the
    /// other symbols stop after their current cycle, and is returned.
    pub async fn run(
        &self,
        shutdown: Arc<watch::Sender<bool>>,
    ) -> Result<Vec<SymbolRun>, CycleError> {
        info!(
            "Scheduler starting: {} symbol(s) every {:?}",
            self.coordinators.len(),
            self.interval
        );

        let loops = self
            .coordinators
            .iter()
            .map(|c| self.run_symbol(Arc::clone(c), Arc::clone(&shutdown)));
        let results = join_all(loops).await;

        let mut runs = Vec::with_capacity(results.len());
        let mut fatal = None;
        for result in results {
            match result {
                Ok(run) => runs.push(run),
                Err(e) => {
                    fatal.get_or_insert(e);
                }
            }
        }

        match fatal {
            Some(e) => Err(e),
            None => {
                info!("Scheduler stopped");
                Ok(runs)
            }
        }
    }

    async fn run_symbol(
        &self,
        coordinator: Arc<RunCoordinator>,
        shutdown: Arc<watch::Sender<bool>>,
    ) -> Result<SymbolRun, CycleError> {
        let mut stop = shutdown.subscribe();
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut run = SymbolRun {
            symbol: coordinator.symbol().to_string(),
            cycles: 0,
            orders: 0,
        };

        loop {
            if *stop.borrow() {
                break;
            }
            tokio::select! {
                _ = ticker.tick() => {}
                changed = stop.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
            }

            let _guard = self.locks.acquire(&run.symbol).await;
            match coordinator.run_cycle().await {
                Ok(report) => {
                    if let Some(sink) = &self.on_report {
                        sink(&report);
                    }
                    run.cycles += 1;
                    if report.outcome.is_executed() {
                        run.orders += 1;
                    }
                }
                Err(e) => {
                    error!("Stopping {}: {}", run.symbol, e);
                    shutdown.send_replace(true);
                    return Err(e);
                }
            }
        }

        info!(
            "{} stopped after {} cycle(s), {} order(s)",
            run.symbol, run.cycles, run.orders
        );
        Ok(run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_same_symbol_is_serialized() {
        let locks = SymbolLocks::new();
        let active = Arc::new(AtomicUsize::new(0));
        let max_active = Arc::new(AtomicUsize::new(0));

        let tasks = (0..4).map(|_| {
            let locks = locks.clone();
            let active = Arc::clone(&active);
            let max_active = Arc::clone(&max_active);
            async move {
                let _guard = locks.acquire("EURUSDm").await;
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                max_active.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                active.fetch_sub(1, Ordering::SeqCst);
            }
        });
        join_all(tasks).await;

        assert_eq!(max_active.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_distinct_symbols_do_not_contend() {
        let locks = SymbolLocks::new();
        let _eur = locks.acquire("EURUSDm").await;
        let gbp = tokio::time::timeout(Duration::from_millis(50), locks.acquire("GBPUSDm")).await;
        assert!(gbp.is_ok());
    }
}
