//! Brokerage session and execution traits.

use crate::error::BrokerError;
use crate::traits::MarketDataSource;
use crate::types::{OrderRequest, OrderResult};
use async_trait::async_trait;

/// Order submission against an open brokerage session.
#[async_trait]
pub trait ExecutionGateway: Send + Sync {
    /// Submit an order.
    ///
    /// Never fails: transport errors and brokerage refusals both come back as
    /// an `OrderResult` with `accepted == false`.
    async fn submit(&self, order: &OrderRequest) -> OrderResult;

    /// Release the session.
    ///
    /// Must be safe to call once on every exit path; errors are logged by
    /// the implementation, not returned.
    async fn shutdown(&self);
}

/// An open brokerage session: market data plus order execution.
pub trait BrokerSession: MarketDataSource + ExecutionGateway {}

impl<T: MarketDataSource + ExecutionGateway> BrokerSession for T {}

/// Factory for brokerage sessions.
///
/// Each call yields a session exclusively owned by the caller.
#[async_trait]
pub trait Brokerage: Send + Sync {
    /// Establish a new session.
    async fn open_session(&self) -> Result<Box<dyn BrokerSession>, BrokerError>;

    /// Get the brokerage name.
    fn name(&self) -> &str;
}
