//! Single cycle command.

use anyhow::Result;
use tracing::info;
use trading_config::AppConfig;

use super::Services;
use crate::cli::RunArgs;

pub async fn run(args: RunArgs, config: &AppConfig) -> Result<()> {
    config.validate()?;

    let symbol = args
        .symbol
        .unwrap_or_else(|| config.order.default_symbol.clone());
    let services = Services::build(config, &args.trade)?;
    let coordinator = services.coordinator(config, &symbol)?;

    info!(
        "Running one cycle for {} (tp {}, sl {})",
        symbol,
        services.offsets.take_profit(),
        services.offsets.stop_loss()
    );
    let report = coordinator.run_cycle().await?;
    println!("{}", report);

    Ok(())
}
