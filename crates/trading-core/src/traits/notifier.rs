//! Notification channel trait.

use crate::error::NotifyError;
use async_trait::async_trait;

/// Human-readable alert channel.
///
/// Delivery is best-effort: callers log and drop errors.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send a UTF-8 text message.
    async fn notify(&self, message: &str) -> Result<(), NotifyError>;
}
