//! CLI command implementations.

pub mod run;
pub mod validate;
pub mod watch;

use anyhow::{bail, Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use trading_broker::{BridgeBrokerage, BridgeConfig, PaperBrokerage};
use trading_config::{AppConfig, BrokerKind, EnvCredentials};
use trading_core::traits::{Brokerage, Notifier, TradeLedger};
use trading_data::{load_csv, CsvTradeLedger};
use trading_monitor::{LogNotifier, TelegramNotifier};
use trading_risk::{Offsets, OrderPolicy};
use trading_runner::{CoordinatorConfig, RunCoordinator};

use crate::cli::TradeArgs;

/// Shared collaborators for every coordinator of one process.
pub struct Services {
    pub brokerage: Arc<dyn Brokerage>,
    pub ledger: Arc<dyn TradeLedger>,
    pub notifier: Arc<dyn Notifier>,
    pub offsets: Offsets,
}

impl Services {
    pub fn build(config: &AppConfig, args: &TradeArgs) -> Result<Self> {
        let offsets = Offsets::new(
            args.tp.unwrap_or(config.order.take_profit),
            args.sl.unwrap_or(config.order.stop_loss),
        )?;

        Ok(Self {
            brokerage: brokerage(config, args.paper_data.as_deref())?,
            ledger: Arc::new(CsvTradeLedger::new(&config.ledger.path)),
            notifier: notifier(config),
            offsets,
        })
    }

    pub fn coordinator(&self, config: &AppConfig, symbol: &str) -> Result<RunCoordinator> {
        let coordinator_config = CoordinatorConfig::new(symbol, self.offsets)
            .with_windows(config.strategy.fast_window, config.strategy.slow_window)
            .with_timeframe(config.strategy.timeframe)
            .with_bar_count(config.strategy.bar_count)
            .with_request_timeout(config.broker.request_timeout());

        let coordinator = RunCoordinator::new(
            coordinator_config,
            OrderPolicy::new(config.order.policy()),
            Arc::clone(&self.brokerage),
            Arc::clone(&self.ledger),
            Arc::clone(&self.notifier),
        )?;
        Ok(coordinator)
    }
}

fn brokerage(config: &AppConfig, paper_data: Option<&Path>) -> Result<Arc<dyn Brokerage>> {
    let paper_data = paper_data.or(config.broker.paper_data.as_deref());

    if paper_data.is_none() && config.broker.kind == BrokerKind::Bridge {
        let bridge = BridgeBrokerage::new(
            BridgeConfig {
                base_url: config.broker.base_url.clone(),
                login_key: config.broker.login_env.clone(),
                password_key: config.broker.password_env.clone(),
                server_key: config.broker.server_env.clone(),
                request_timeout: config.broker.request_timeout(),
            },
            Arc::new(EnvCredentials),
        )?;
        info!("Using terminal bridge at {}", config.broker.base_url);
        return Ok(Arc::new(bridge));
    }

    let Some(path) = paper_data else {
        bail!("paper brokerage needs broker.paper_data or --paper-data");
    };
    let bars = load_csv(path).with_context(|| format!("loading bars from {}", path.display()))?;
    info!("Using paper brokerage with {} bars from {}", bars.len(), path.display());
    Ok(Arc::new(
        PaperBrokerage::new(bars).with_spread(config.broker.paper_spread),
    ))
}

fn notifier(config: &AppConfig) -> Arc<dyn Notifier> {
    if !config.notifier.enabled {
        return Arc::new(LogNotifier);
    }

    match TelegramNotifier::from_credentials(
        &EnvCredentials,
        &config.notifier.token_env,
        &config.notifier.chat_id_env,
        config.notifier.timeout(),
    ) {
        Ok(telegram) => Arc::new(telegram),
        Err(e) => {
            warn!("Telegram notifications disabled: {}", e);
            Arc::new(LogNotifier)
        }
    }
}
