//! Market data source trait.

use crate::error::DataError;
use crate::types::{PriceBar, Quote, Timeframe};
use async_trait::async_trait;

/// Source of recent bars and live quotes.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Fetch the most recent closed bars.
    ///
    /// # Arguments
    /// * `symbol` - The symbol to fetch
    /// * `timeframe` - The bar timeframe
    /// * `count` - Number of bars, counted back from the latest
    ///
    /// # Returns
    /// Bars ordered from oldest to newest. An empty vector means the source
    /// had nothing for the symbol.
    async fn fetch_bars(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        count: usize,
    ) -> Result<Vec<PriceBar>, DataError>;

    /// Get the latest quote, or `None` when the venue has no tick.
    async fn latest_quote(&self, symbol: &str) -> Result<Option<Quote>, DataError>;
}
