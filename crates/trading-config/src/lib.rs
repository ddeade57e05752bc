//! Configuration management.

mod credentials;
mod settings;

pub use credentials::EnvCredentials;
pub use settings::{
    AppConfig, AppSettings, BrokerKind, BrokerSettings, LedgerSettings, LoggingConfig,
    NotifierSettings, OrderSettings, SchedulerSettings, StrategySettings, ValidationError,
};

use config::{Config, ConfigError, Environment, File};
use std::path::Path;

/// Load configuration from file and environment.
///
/// Environment variables use the `TRADING` prefix and `__` as the section
/// separator, e.g. `TRADING__SCHEDULER__INTERVAL_SECS=30`. A missing file is
/// only an error when `required` is set.
pub fn load_config(path: &Path, required: bool) -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::from(path).required(required))
        .add_source(
            Environment::with_prefix("TRADING")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    config.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[order]\ndefault_symbol = \"GBPUSDm\"\n\n[ledger]\npath = \"logs/trades.csv\"").unwrap();
        file.flush().unwrap();

        let config = load_config(file.path(), true).unwrap();
        assert_eq!(config.order.default_symbol, "GBPUSDm");
        assert_eq!(config.ledger.path, Path::new("logs/trades.csv"));
        assert_eq!(config.strategy.bar_count, 100);
    }

    #[test]
    fn test_missing_file() {
        let path = Path::new("/definitely/not/here.toml");
        assert!(load_config(path, true).is_err());
        assert!(load_config(path, false).unwrap().validate().is_ok());
    }
}
