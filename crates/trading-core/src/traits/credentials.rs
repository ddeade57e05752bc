//! Credential provider trait.

use std::collections::HashMap;

/// Supplies secrets by name.
pub trait CredentialProvider: Send + Sync {
    /// Look up a secret, `None` when it is not set.
    fn get(&self, name: &str) -> Option<String>;

    /// Look up a secret that must be present and non-empty.
    fn require(&self, name: &str) -> Result<String, String> {
        match self.get(name) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(format!("{} not set", name)),
        }
    }
}

/// Fixed in-memory credentials.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    values: HashMap<String, String>,
}

impl StaticCredentials {
    /// Create an empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a secret.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }
}

impl CredentialProvider for StaticCredentials {
    fn get(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }
}
