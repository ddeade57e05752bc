//! Polling loop command.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};
use trading_config::AppConfig;
use trading_runner::{CycleReport, Scheduler};

use super::Services;
use crate::cli::WatchArgs;

pub async fn run(args: WatchArgs, config: &AppConfig) -> Result<()> {
    config.validate()?;

    let symbols = if args.symbols.is_empty() {
        vec![config.order.default_symbol.clone()]
    } else {
        unique_symbols(args.symbols)
    };
    let interval = args
        .interval_secs
        .map(Duration::from_secs)
        .unwrap_or_else(|| config.scheduler.interval());
    anyhow::ensure!(!interval.is_zero(), "--interval-secs must be positive");

    let services = Services::build(config, &args.trade)?;
    let mut scheduler = Scheduler::new(interval)
        .with_report_sink(Arc::new(|report: &CycleReport| println!("{}", report)));
    for symbol in &symbols {
        scheduler.add(Arc::new(services.coordinator(config, symbol)?))?;
    }

    let (tx, _rx) = watch::channel(false);
    let shutdown = Arc::new(tx);
    {
        let shutdown = Arc::clone(&shutdown);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Shutdown requested, stopping after current cycles");
                shutdown.send_replace(true);
            }
        });
    }

    info!("Watching {} every {:?}", symbols.join(", "), interval);
    let runs = scheduler.run(shutdown).await?;

    for run in runs {
        println!(
            "{}: {} cycle(s), {} order(s)",
            run.symbol, run.cycles, run.orders
        );
    }
    Ok(())
}

/// Drop repeated symbols, ignoring ASCII case; the first spelling wins.
fn unique_symbols(symbols: Vec<String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(symbols.len());
    for symbol in symbols {
        if unique.iter().any(|s| s.eq_ignore_ascii_case(&symbol)) {
            warn!("Ignoring repeated symbol {}", symbol);
        } else {
            unique.push(symbol);
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_symbols() {
        let symbols = ["EURUSDm", "GBPUSDm", "eurusdm", "EURUSDm"]
            .map(String::from)
            .to_vec();
        assert_eq!(unique_symbols(symbols), vec!["EURUSDm", "GBPUSDm"]);
    }
}
