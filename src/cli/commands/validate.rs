//! Validate configuration command.

use anyhow::Result;
use std::path::Path;
use trading_config::AppConfig;

pub async fn run(config_path: &Path, config: &AppConfig) -> Result<()> {
    println!("Validating configuration: {:?}", config_path);

    match config.validate() {
        Ok(()) => {
            println!("Configuration is valid!");
            println!();
            println!("{}", toml::to_string_pretty(config)?);
        }
        Err(e) => {
            println!("Configuration error: {}", e);
            return Err(e.into());
        }
    }

    Ok(())
}
