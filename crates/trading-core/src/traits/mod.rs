//! Core traits for the trading bot.

mod broker;
mod credentials;
mod data_source;
mod indicator;
mod ledger;
mod notifier;

pub use broker::{BrokerSession, Brokerage, ExecutionGateway};
pub use credentials::{CredentialProvider, StaticCredentials};
pub use data_source::MarketDataSource;
pub use indicator::Indicator;
pub use ledger::TradeLedger;
pub use notifier::Notifier;
