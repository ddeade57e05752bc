//! CLI definitions.

pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use std::path::PathBuf;

/// Configuration file used when `--config` is not given.
pub const DEFAULT_CONFIG: &str = "config/default.toml";

#[derive(Parser)]
#[command(name = "sma-trader")]
#[command(author, version, about = "Moving-average crossover trading bot")]
pub struct Cli {
    /// Configuration file path [default: config/default.toml]
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log level (overrides logging.level)
    #[arg(short, long)]
    pub log_level: Option<LogLevel>,

    /// Enable JSON log format
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one evaluation cycle
    Run(RunArgs),
    /// Poll one or more symbols until interrupted
    Watch(WatchArgs),
    /// Validate configuration
    ValidateConfig,
}

/// Options shared by `run` and `watch`.
#[derive(clap::Args)]
pub struct TradeArgs {
    /// Take-profit distance from the entry price [default: order.take_profit]
    #[arg(long)]
    pub tp: Option<Decimal>,

    /// Stop-loss distance from the entry price [default: order.stop_loss]
    #[arg(long)]
    pub sl: Option<Decimal>,

    /// Trade against the paper brokerage using bars from this CSV
    #[arg(long)]
    pub paper_data: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct RunArgs {
    /// Symbol to trade [default: order.default_symbol]
    #[arg(short, long)]
    pub symbol: Option<String>,

    #[command(flatten)]
    pub trade: TradeArgs,
}

#[derive(clap::Args)]
pub struct WatchArgs {
    /// Symbols to trade (comma-separated) [default: order.default_symbol]
    #[arg(short = 'S', long, value_delimiter = ',')]
    pub symbols: Vec<String>,

    /// Seconds between cycles [default: scheduler.interval_secs]
    #[arg(long)]
    pub interval_secs: Option<u64>,

    #[command(flatten)]
    pub trade: TradeArgs,
}
