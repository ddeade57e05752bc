//! Configuration structures.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use trading_core::error::PolicyError;
use trading_core::types::Timeframe;
use trading_risk::{Offsets, OrderPolicyConfig};

/// Invalid configuration values.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("strategy windows invalid: fast ({fast}) must be > 0 and < slow ({slow})")]
    Windows { fast: usize, slow: usize },

    #[error("strategy.bar_count ({bar_count}) must be at least slow + 1 ({required})")]
    BarCount { bar_count: usize, required: usize },

    #[error("{0}")]
    Offsets(#[from] PolicyError),

    #[error("order.volume must be positive, got {0}")]
    Volume(Decimal),

    #[error("{0} must be positive")]
    NonPositive(&'static str),
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub broker: BrokerSettings,
    #[serde(default)]
    pub strategy: StrategySettings,
    #[serde(default)]
    pub order: OrderSettings,
    #[serde(default)]
    pub ledger: LedgerSettings,
    #[serde(default)]
    pub notifier: NotifierSettings,
    #[serde(default)]
    pub scheduler: SchedulerSettings,
}

impl AppConfig {
    /// Check cross-field constraints the types cannot express.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let s = &self.strategy;
        if s.fast_window == 0 || s.fast_window >= s.slow_window {
            return Err(ValidationError::Windows {
                fast: s.fast_window,
                slow: s.slow_window,
            });
        }
        if s.bar_count < s.slow_window + 1 {
            return Err(ValidationError::BarCount {
                bar_count: s.bar_count,
                required: s.slow_window + 1,
            });
        }

        self.order.offsets()?;
        if self.order.volume <= Decimal::ZERO {
            return Err(ValidationError::Volume(self.order.volume));
        }

        if self.broker.request_timeout_secs == 0 {
            return Err(ValidationError::NonPositive("broker.request_timeout_secs"));
        }
        if self.notifier.timeout_secs == 0 {
            return Err(ValidationError::NonPositive("notifier.timeout_secs"));
        }
        if self.scheduler.interval_secs == 0 {
            return Err(ValidationError::NonPositive("scheduler.interval_secs"));
        }
        Ok(())
    }
}

/// General app settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub name: String,
    pub environment: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "sma-trader".to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    /// Directory for daily-rotated log files
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file: None,
        }
    }
}

/// Which brokerage to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BrokerKind {
    /// Terminal HTTP bridge
    #[default]
    Bridge,
    /// In-process simulation over recorded bars
    Paper,
}

/// Brokerage connection settings.
///
/// Credential fields hold environment variable names, never the secrets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerSettings {
    pub kind: BrokerKind,
    pub base_url: String,
    pub login_env: String,
    pub password_env: String,
    pub server_env: String,
    pub request_timeout_secs: u64,
    /// Bar CSV served by the paper brokerage
    pub paper_data: Option<PathBuf>,
    pub paper_spread: Decimal,
}

impl BrokerSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self {
            kind: BrokerKind::Bridge,
            base_url: "http://127.0.0.1:8228".to_string(),
            login_env: "BROKER_LOGIN".to_string(),
            password_env: "BROKER_PASSWORD".to_string(),
            server_env: "BROKER_SERVER".to_string(),
            request_timeout_secs: 10,
            paper_data: None,
            paper_spread: dec!(0.0002),
        }
    }
}

/// Crossover strategy settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategySettings {
    pub fast_window: usize,
    pub slow_window: usize,
    pub timeframe: Timeframe,
    /// Bars requested per cycle
    pub bar_count: usize,
}

impl Default for StrategySettings {
    fn default() -> Self {
        Self {
            fast_window: 5,
            slow_window: 10,
            timeframe: Timeframe::Minute1,
            bar_count: 100,
        }
    }
}

/// Order parameters and protective offsets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderSettings {
    pub default_symbol: String,
    pub volume: Decimal,
    pub deviation: u32,
    pub magic: u64,
    pub comment: String,
    pub take_profit: Decimal,
    pub stop_loss: Decimal,
}

impl OrderSettings {
    /// Fixed order parameters for the policy.
    pub fn policy(&self) -> OrderPolicyConfig {
        OrderPolicyConfig {
            volume: self.volume,
            deviation: self.deviation,
            magic: self.magic,
            comment: self.comment.clone(),
        }
    }

    /// Configured protective offsets.
    pub fn offsets(&self) -> Result<Offsets, PolicyError> {
        Offsets::new(self.take_profit, self.stop_loss)
    }
}

impl Default for OrderSettings {
    fn default() -> Self {
        let policy = OrderPolicyConfig::default();
        Self {
            default_symbol: "EURUSDm".to_string(),
            volume: policy.volume,
            deviation: policy.deviation,
            magic: policy.magic,
            comment: policy.comment,
            take_profit: dec!(0.002),
            stop_loss: dec!(0.001),
        }
    }
}

/// Trade log location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerSettings {
    pub path: PathBuf,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("trade_log.csv"),
        }
    }
}

/// Telegram channel settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifierSettings {
    pub enabled: bool,
    pub token_env: String,
    pub chat_id_env: String,
    pub timeout_secs: u64,
}

impl NotifierSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for NotifierSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            token_env: "TELEGRAM_BOT_TOKEN".to_string(),
            chat_id_env: "TELEGRAM_CHAT_ID".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Polling loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerSettings {
    pub interval_secs: u64,
}

impl SchedulerSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self { interval_secs: 60 }
    }
}
