//! HTTP bridge to a trading terminal.
//!
//! The bridge exposes a small JSON API in front of the terminal:
//!
//! | Method   | Path           | Purpose                         |
//! |----------|----------------|---------------------------------|
//! | `POST`   | `/api/session` | log in, returns a session id    |
//! | `DELETE` | `/api/session` | log out                         |
//! | `GET`    | `/api/bars`    | latest closed bars for a symbol |
//! | `GET`    | `/api/tick`    | latest bid/ask, 404 when none   |
//! | `POST`   | `/api/orders`  | market deal, returns a retcode  |
//!
//! Every call after login carries the session id in `X-Session-Id`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use trading_core::error::{BrokerError, DataError};
use trading_core::traits::{
    BrokerSession, Brokerage, CredentialProvider, ExecutionGateway, MarketDataSource,
};
use trading_core::types::{OrderRequest, OrderResult, PriceBar, Quote, Side, Timeframe};

use crate::retcode;

const SESSION_HEADER: &str = "X-Session-Id";

/// Bridge connection settings.
///
/// The `*_key` fields name credentials looked up through the
/// [`CredentialProvider`]; they are not the secrets themselves.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub base_url: String,
    pub login_key: String,
    pub password_key: String,
    pub server_key: String,
    pub request_timeout: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8228".to_string(),
            login_key: "BROKER_LOGIN".to_string(),
            password_key: "BROKER_PASSWORD".to_string(),
            server_key: "BROKER_SERVER".to_string(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    login: &'a str,
    password: &'a str,
    server: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    session_id: String,
}

#[derive(Debug, Deserialize)]
struct BridgeBar {
    /// Bar open time, unix seconds
    time: i64,
    close: f64,
}

#[derive(Debug, Deserialize)]
struct BridgeTick {
    bid: Decimal,
    ask: Decimal,
    /// Unix seconds
    time: i64,
}

#[derive(Debug, Serialize)]
struct DealRequest<'a> {
    action: &'static str,
    symbol: &'a str,
    volume: Decimal,
    #[serde(rename = "type")]
    order_type: &'static str,
    price: Decimal,
    sl: Decimal,
    tp: Decimal,
    deviation: u32,
    magic: u64,
    comment: &'a str,
    type_time: &'static str,
    type_filling: &'static str,
}

impl<'a> From<&'a OrderRequest> for DealRequest<'a> {
    fn from(order: &'a OrderRequest) -> Self {
        Self {
            action: "deal",
            symbol: &order.symbol,
            volume: order.volume,
            order_type: match order.side {
                Side::Buy => "buy",
                Side::Sell => "sell",
            },
            price: order.reference_price,
            sl: order.stop_loss,
            tp: order.take_profit,
            deviation: order.metadata.deviation,
            magic: order.metadata.magic,
            comment: &order.metadata.comment,
            type_time: "gtc",
            type_filling: "ioc",
        }
    }
}

#[derive(Debug, Deserialize)]
struct DealResponse {
    retcode: i32,
    #[serde(default)]
    price: Option<Decimal>,
    #[serde(default)]
    comment: String,
}

impl DealResponse {
    fn into_result(self, reference_price: Decimal) -> OrderResult {
        if self.retcode == retcode::DONE {
            let price = self
                .price
                .filter(|p| *p > Decimal::ZERO)
                .unwrap_or(reference_price);
            OrderResult::accepted(self.retcode, price)
        } else {
            OrderResult::rejected(self.retcode, self.comment)
        }
    }
}

/// Brokerage reached through the HTTP bridge.
pub struct BridgeBrokerage {
    config: BridgeConfig,
    client: Client,
    credentials: Arc<dyn CredentialProvider>,
}

impl BridgeBrokerage {
    /// Create a bridge client. Credentials are read on each session open.
    pub fn new(
        config: BridgeConfig,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self, BrokerError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| BrokerError::Configuration(e.to_string()))?;

        Ok(Self {
            config,
            client,
            credentials,
        })
    }

    fn url(&self, path: &str) -> String {
        join_url(&self.config.base_url, path)
    }
}

#[async_trait]
impl Brokerage for BridgeBrokerage {
    async fn open_session(&self) -> Result<Box<dyn BrokerSession>, BrokerError> {
        let login = self
            .credentials
            .require(&self.config.login_key)
            .map_err(BrokerError::SessionInit)?;
        let password = self
            .credentials
            .require(&self.config.password_key)
            .map_err(BrokerError::SessionInit)?;
        let server = self
            .credentials
            .require(&self.config.server_key)
            .map_err(BrokerError::SessionInit)?;

        let resp = self
            .client
            .post(self.url("/api/session"))
            .json(&LoginRequest {
                login: &login,
                password: &password,
                server: &server,
            })
            .send()
            .await
            .map_err(|e| BrokerError::SessionInit(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(BrokerError::SessionInit(format!("{}: {}", status, text)));
        }

        let data: LoginResponse = resp
            .json()
            .await
            .map_err(|e| BrokerError::SessionInit(e.to_string()))?;

        info!("Bridge session opened on {}", server);
        Ok(Box::new(BridgeSession {
            client: self.client.clone(),
            base_url: self.config.base_url.clone(),
            session_id: data.session_id,
            closed: AtomicBool::new(false),
        }))
    }

    fn name(&self) -> &str {
        "Terminal Bridge"
    }
}

struct BridgeSession {
    client: Client,
    base_url: String,
    session_id: String,
    closed: AtomicBool,
}

impl BridgeSession {
    fn url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }
}

#[async_trait]
impl MarketDataSource for BridgeSession {
    async fn fetch_bars(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        count: usize,
    ) -> Result<Vec<PriceBar>, DataError> {
        let resp = self
            .client
            .get(self.url("/api/bars"))
            .header(SESSION_HEADER, &self.session_id)
            .query(&[
                ("symbol", symbol.to_string()),
                ("timeframe", timeframe.terminal_code().to_string()),
                ("count", count.to_string()),
            ])
            .send()
            .await
            .map_err(|e| DataError::ConnectionError(e.to_string()))?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Err(DataError::SymbolNotFound(symbol.to_string()));
        }
        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(DataError::ConnectionError(format!("{}: {}", status, text)));
        }

        let data: Vec<BridgeBar> = resp
            .json()
            .await
            .map_err(|e| DataError::ParseError(e.to_string()))?;

        let bars = data
            .into_iter()
            .map(|b| {
                PriceBar::from_unix_secs(b.time, b.close)
                    .ok_or_else(|| DataError::ParseError(format!("bar time {}", b.time)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!("Fetched {} bars for {}", bars.len(), symbol);
        Ok(bars)
    }

    async fn latest_quote(&self, symbol: &str) -> Result<Option<Quote>, DataError> {
        let resp = self
            .client
            .get(self.url("/api/tick"))
            .header(SESSION_HEADER, &self.session_id)
            .query(&[("symbol", symbol)])
            .send()
            .await
            .map_err(|e| DataError::ConnectionError(e.to_string()))?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(DataError::ConnectionError(format!("{}: {}", status, text)));
        }

        let tick: BridgeTick = resp
            .json()
            .await
            .map_err(|e| DataError::ParseError(e.to_string()))?;

        Ok(Some(Quote {
            symbol: symbol.to_string(),
            bid: tick.bid,
            ask: tick.ask,
            timestamp: DateTime::from_timestamp(tick.time, 0).unwrap_or_else(Utc::now),
        }))
    }
}

#[async_trait]
impl ExecutionGateway for BridgeSession {
    async fn submit(&self, order: &OrderRequest) -> OrderResult {
        let resp = match self
            .client
            .post(self.url("/api/orders"))
            .header(SESSION_HEADER, &self.session_id)
            .json(&DealRequest::from(order))
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => return OrderResult::failed(format!("order send failed: {}", e)),
        };

        let status = resp.status();
        let text = match resp.text().await {
            Ok(text) => text,
            Err(e) => return OrderResult::failed(format!("order response unreadable: {}", e)),
        };

        // Terminal refusals come back with a retcode even on non-2xx.
        match serde_json::from_str::<DealResponse>(&text) {
            Ok(deal) => deal.into_result(order.reference_price),
            Err(_) if !status.is_success() => OrderResult::failed(format!("{}: {}", status, text)),
            Err(e) => OrderResult::failed(format!("order response malformed: {}", e)),
        }
    }

    async fn shutdown(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        let result = self
            .client
            .delete(self.url("/api/session"))
            .header(SESSION_HEADER, &self.session_id)
            .send()
            .await;

        match result {
            Ok(resp) if resp.status().is_success() => debug!("Bridge session closed"),
            Ok(resp) => warn!("Bridge logout returned {}", resp.status()),
            Err(e) => warn!("Bridge logout failed: {}", e),
        }
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}
