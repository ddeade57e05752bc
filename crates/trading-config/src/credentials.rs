//! Environment-backed credentials.

use trading_core::traits::CredentialProvider;

/// Reads secrets from process environment variables.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCredentials;

impl CredentialProvider for EnvCredentials {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_environment() {
        std::env::set_var("SMA_TRADER_TEST_SECRET", "s3cret");
        assert_eq!(
            EnvCredentials.get("SMA_TRADER_TEST_SECRET").as_deref(),
            Some("s3cret")
        );
        assert!(EnvCredentials.require("SMA_TRADER_TEST_UNSET").is_err());
    }
}
