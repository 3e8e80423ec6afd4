//! Alpaca REST Client
//!
//! Thin wrappers over the trading and market data REST APIs. Every call
//! waits on the rate limiter, sends one request through the
//! [`HttpTransport`] port, decodes the raw wire entity and hands it to the
//! normalizer.
//!
//! # Endpoints
//!
//! | Method | Path | Returns |
//! |---|---|---|
//! | GET | `/v2/account` | [`Account`] |
//! | GET | `/v2/clock` | [`Clock`] |
//! | GET/POST/PATCH/DELETE | `/v2/orders[...]` | [`Order`] |
//! | GET/DELETE | `/v2/positions[...]` | [`Position`] / [`Order`] |
//! | GET | `/v2/account/activities` | [`Activity`] |
//! | GET | `/v2/stocks/{symbol}/{trades,quotes,bars}` | [`Page`](crate::domain::entities::Page) |
//! | GET | `/v2/stocks/{symbol}/trades/latest` | [`LatestTrade`] |
//! | GET | `/v2/stocks/{symbol}/snapshot`, `/v2/stocks/snapshots` | [`Snapshot`] |

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::application::ports::{
    HttpMethod, HttpRequest, HttpTransport, RateLimiter, TransportError,
};
use crate::domain::entities::{
    Account, Activity, Bar, Clock, DataSource, LatestTrade, Order, OrderCancelation, PageOfBars,
    PageOfQuotes, PageOfTrades, Position, Quote, RawAccount, RawActivity, RawClock,
    RawLatestTrade, RawOrder, RawOrderCancelation, RawPageOfBars, RawPageOfQuotes,
    RawPageOfTrades, RawPosition, RawSnapshot, Snapshot, Trade,
};
use crate::domain::normalize;
use crate::error::ClientError;
use crate::infrastructure::alpaca::auth::Credentials;
use crate::infrastructure::alpaca::params::{
    ClosePosition, GetAccountActivities, GetBars, GetOrders, GetQuotes, GetTrades, PlaceOrder,
    Query, ReplaceOrder,
};
use crate::infrastructure::config::{ClientConfig, Endpoints};
use crate::infrastructure::rate_limit::{Unlimited, WindowRateLimiter};

// =============================================================================
// Transport Adapter
// =============================================================================

/// [`HttpTransport`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<String, TransportError> {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, &request.url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(*name, value);
        }
        if let Some(body) = request.body {
            builder = builder
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        if status.is_success() {
            Ok(body)
        } else {
            Err(TransportError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }
}

// =============================================================================
// Client
// =============================================================================

/// Result of closing one position in `close_positions`.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionClosure {
    /// Symbol of the position.
    pub symbol: String,
    /// HTTP status of the individual close.
    pub status: u16,
    /// Liquidating order, when the close was accepted.
    pub order: Option<Order>,
}

#[derive(Deserialize)]
struct RawPositionClosure {
    symbol: String,
    status: u16,
    #[serde(default)]
    body: serde_json::Value,
}

/// Typed Alpaca REST client.
#[derive(Clone)]
pub struct AlpacaClient {
    transport: Arc<dyn HttpTransport>,
    limiter: Arc<dyn RateLimiter>,
    credentials: Credentials,
    endpoints: Endpoints,
    feed: DataSource,
}

impl std::fmt::Debug for AlpacaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlpacaClient")
            .field("credentials", &self.credentials)
            .field("endpoints", &self.endpoints)
            .field("feed", &self.feed)
            .finish_non_exhaustive()
    }
}

impl AlpacaClient {
    /// Production client: `reqwest` transport and the configured rate limit.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let transport = Arc::new(ReqwestTransport::new(config.http_timeout)?);
        let limiter: Arc<dyn RateLimiter> =
            match WindowRateLimiter::per_minute(config.rate_limit_per_minute) {
                Some(limiter) => Arc::new(limiter),
                None => Arc::new(Unlimited),
            };
        Ok(Self::with_transport(config, transport, limiter))
    }

    /// Client over arbitrary ports.
    #[must_use]
    pub fn with_transport(
        config: &ClientConfig,
        transport: Arc<dyn HttpTransport>,
        limiter: Arc<dyn RateLimiter>,
    ) -> Self {
        Self {
            transport,
            limiter,
            credentials: config.credentials.clone(),
            endpoints: config.endpoints.clone(),
            feed: config.feed,
        }
    }

    /// Endpoints in use.
    #[must_use]
    pub const fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    // -------------------------------------------------------------------------
    // Plumbing
    // -------------------------------------------------------------------------

    fn trading(&self, method: HttpMethod, path: &str) -> HttpRequest {
        HttpRequest::new(method, format!("{}{path}", self.endpoints.trading_rest))
    }

    fn data(&self, path: &str) -> HttpRequest {
        HttpRequest::new(HttpMethod::Get, format!("{}{path}", self.endpoints.data_rest))
    }

    async fn send(&self, request: HttpRequest) -> Result<String, ClientError> {
        self.limiter.acquire().await;

        let request = request.with_headers(self.credentials.headers());
        let method = request.method;
        let url = request.url.clone();
        tracing::debug!(method = %method, url = %url, "Sending request");

        match self.transport.send(request).await {
            Ok(body) => Ok(body),
            Err(e) => {
                tracing::warn!(method = %method, url = %url, error = %e, "Request failed");
                Err(e.into())
            }
        }
    }

    async fn fetch<R: DeserializeOwned>(&self, request: HttpRequest) -> Result<R, ClientError> {
        let body = self.send(request).await?;
        Ok(serde_json::from_str(&body)?)
    }

    fn feed_query(&self, feed: Option<DataSource>) -> Query {
        vec![("feed".to_string(), feed.unwrap_or(self.feed).as_str().to_string())]
    }

    // -------------------------------------------------------------------------
    // Account
    // -------------------------------------------------------------------------

    /// `GET /v2/account`
    pub async fn get_account(&self) -> Result<Account, ClientError> {
        let raw: RawAccount = self.fetch(self.trading(HttpMethod::Get, "/account")).await?;
        Ok(normalize::account(raw)?)
    }

    /// `GET /v2/clock`
    pub async fn get_clock(&self) -> Result<Clock, ClientError> {
        let raw: RawClock = self.fetch(self.trading(HttpMethod::Get, "/clock")).await?;
        Ok(normalize::clock(raw)?)
    }

    /// `GET /v2/account/activities`
    pub async fn get_account_activities(
        &self,
        params: &GetAccountActivities,
    ) -> Result<Vec<Activity>, ClientError> {
        let request = self
            .trading(HttpMethod::Get, "/account/activities")
            .with_query(params.to_query());
        let raw: Vec<RawActivity> = self.fetch(request).await?;
        Ok(normalize::activities(raw)?)
    }

    // -------------------------------------------------------------------------
    // Orders
    // -------------------------------------------------------------------------

    /// `GET /v2/orders/{id}`
    pub async fn get_order(&self, order_id: &str, nested: bool) -> Result<Order, ClientError> {
        let request = self
            .trading(HttpMethod::Get, &format!("/orders/{order_id}"))
            .with_query(vec![("nested".to_string(), nested.to_string())]);
        let raw: RawOrder = self.fetch(request).await?;
        Ok(normalize::order(raw)?)
    }

    /// `GET /v2/orders:by_client_order_id`
    pub async fn get_order_by_client_id(&self, client_order_id: &str) -> Result<Order, ClientError> {
        let request = self
            .trading(HttpMethod::Get, "/orders:by_client_order_id")
            .with_query(vec![(
                "client_order_id".to_string(),
                client_order_id.to_string(),
            )]);
        let raw: RawOrder = self.fetch(request).await?;
        Ok(normalize::order(raw)?)
    }

    /// `GET /v2/orders`
    pub async fn get_orders(&self, params: &GetOrders) -> Result<Vec<Order>, ClientError> {
        let request = self
            .trading(HttpMethod::Get, "/orders")
            .with_query(params.to_query());
        let raw: Vec<RawOrder> = self.fetch(request).await?;
        Ok(normalize::orders(raw)?)
    }

    /// `POST /v2/orders`
    pub async fn place_order(&self, params: &PlaceOrder) -> Result<Order, ClientError> {
        params.validate()?;
        let request = self
            .trading(HttpMethod::Post, "/orders")
            .with_body(serde_json::to_string(params)?);
        let raw: RawOrder = self.fetch(request).await?;

        tracing::info!(
            order_id = %raw.id,
            symbol = %raw.symbol,
            status = %raw.status,
            "Order placed"
        );
        Ok(normalize::order(raw)?)
    }

    /// `PATCH /v2/orders/{id}`
    pub async fn replace_order(
        &self,
        order_id: &str,
        params: &ReplaceOrder,
    ) -> Result<Order, ClientError> {
        params.validate()?;
        let request = self
            .trading(HttpMethod::Patch, &format!("/orders/{order_id}"))
            .with_body(serde_json::to_string(params)?);
        let raw: RawOrder = self.fetch(request).await?;
        Ok(normalize::order(raw)?)
    }

    /// `DELETE /v2/orders/{id}`
    pub async fn cancel_order(&self, order_id: &str) -> Result<(), ClientError> {
        self.send(self.trading(HttpMethod::Delete, &format!("/orders/{order_id}")))
            .await?;
        tracing::info!(order_id = %order_id, "Order cancel requested");
        Ok(())
    }

    /// `DELETE /v2/orders`
    pub async fn cancel_orders(&self) -> Result<Vec<OrderCancelation>, ClientError> {
        let raw: Vec<RawOrderCancelation> =
            self.fetch(self.trading(HttpMethod::Delete, "/orders")).await?;
        Ok(normalize::order_cancelations(raw)?)
    }

    // -------------------------------------------------------------------------
    // Positions
    // -------------------------------------------------------------------------

    /// `GET /v2/positions/{symbol}`
    pub async fn get_position(&self, symbol: &str) -> Result<Position, ClientError> {
        let raw: RawPosition = self
            .fetch(self.trading(HttpMethod::Get, &format!("/positions/{symbol}")))
            .await?;
        Ok(normalize::position(raw)?)
    }

    /// `GET /v2/positions`
    pub async fn get_positions(&self) -> Result<Vec<Position>, ClientError> {
        let raw: Vec<RawPosition> = self.fetch(self.trading(HttpMethod::Get, "/positions")).await?;
        Ok(normalize::positions(raw)?)
    }

    /// `DELETE /v2/positions/{symbol}`
    pub async fn close_position(
        &self,
        symbol: &str,
        params: &ClosePosition,
    ) -> Result<Order, ClientError> {
        let request = self
            .trading(HttpMethod::Delete, &format!("/positions/{symbol}"))
            .with_query(params.to_query()?);
        let raw: RawOrder = self.fetch(request).await?;
        Ok(normalize::order(raw)?)
    }

    /// `DELETE /v2/positions`
    pub async fn close_positions(
        &self,
        cancel_orders: bool,
    ) -> Result<Vec<PositionClosure>, ClientError> {
        let request = self
            .trading(HttpMethod::Delete, "/positions")
            .with_query(vec![("cancel_orders".to_string(), cancel_orders.to_string())]);
        let raw: Vec<RawPositionClosure> = self.fetch(request).await?;

        raw.into_iter()
            .map(|closure| {
                let order = if (200..300).contains(&closure.status) {
                    let raw_order: RawOrder = serde_json::from_value(closure.body)?;
                    Some(normalize::order(raw_order)?)
                } else {
                    tracing::warn!(
                        symbol = %closure.symbol,
                        status = closure.status,
                        "Position close rejected"
                    );
                    None
                };
                Ok(PositionClosure {
                    symbol: closure.symbol,
                    status: closure.status,
                    order,
                })
            })
            .collect()
    }

    // -------------------------------------------------------------------------
    // Market Data
    // -------------------------------------------------------------------------

    /// `GET /v2/stocks/{symbol}/trades`, one page.
    pub async fn get_trades(&self, params: &GetTrades) -> Result<PageOfTrades, ClientError> {
        let mut query = params.to_query()?;
        if params.range.feed.is_none() {
            query.extend(self.feed_query(None));
        }
        let request = self
            .data(&format!("/stocks/{}/trades", params.symbol))
            .with_query(query);
        let raw: RawPageOfTrades = self.fetch(request).await?;
        Ok(normalize::page_of_trades(raw)?)
    }

    /// `GET /v2/stocks/{symbol}/quotes`, one page.
    pub async fn get_quotes(&self, params: &GetQuotes) -> Result<PageOfQuotes, ClientError> {
        let mut query = params.to_query()?;
        if params.range.feed.is_none() {
            query.extend(self.feed_query(None));
        }
        let request = self
            .data(&format!("/stocks/{}/quotes", params.symbol))
            .with_query(query);
        let raw: RawPageOfQuotes = self.fetch(request).await?;
        Ok(normalize::page_of_quotes(raw)?)
    }

    /// `GET /v2/stocks/{symbol}/bars`, one page.
    pub async fn get_bars(&self, params: &GetBars) -> Result<PageOfBars, ClientError> {
        let mut query = params.to_query()?;
        if params.range.feed.is_none() {
            query.extend(self.feed_query(None));
        }
        let request = self
            .data(&format!("/stocks/{}/bars", params.symbol))
            .with_query(query);
        let raw: RawPageOfBars = self.fetch(request).await?;
        Ok(normalize::page_of_bars(raw)?)
    }

    /// Every trade in range, following continuation tokens.
    pub async fn get_all_trades(&self, params: &GetTrades) -> Result<Vec<Trade>, ClientError> {
        let mut params = params.clone();
        let mut items = Vec::new();
        loop {
            let page = self.get_trades(&params).await?;
            items.extend(page.items);
            match page.next_page_token {
                Some(token) => params.range.page_token = Some(token),
                None => return Ok(items),
            }
        }
    }

    /// Every quote in range, following continuation tokens.
    pub async fn get_all_quotes(&self, params: &GetQuotes) -> Result<Vec<Quote>, ClientError> {
        let mut params = params.clone();
        let mut items = Vec::new();
        loop {
            let page = self.get_quotes(&params).await?;
            items.extend(page.items);
            match page.next_page_token {
                Some(token) => params.range.page_token = Some(token),
                None => return Ok(items),
            }
        }
    }

    /// Every bar in range, following continuation tokens.
    pub async fn get_all_bars(&self, params: &GetBars) -> Result<Vec<Bar>, ClientError> {
        let mut params = params.clone();
        let mut items = Vec::new();
        loop {
            let page = self.get_bars(&params).await?;
            items.extend(page.items);
            match page.next_page_token {
                Some(token) => params.range.page_token = Some(token),
                None => return Ok(items),
            }
        }
    }

    /// `GET /v2/stocks/{symbol}/trades/latest`
    pub async fn get_latest_trade(
        &self,
        symbol: &str,
        feed: Option<DataSource>,
    ) -> Result<LatestTrade, ClientError> {
        let request = self
            .data(&format!("/stocks/{symbol}/trades/latest"))
            .with_query(self.feed_query(feed));
        let raw: RawLatestTrade = self.fetch(request).await?;
        Ok(normalize::latest_trade(raw)?)
    }

    /// `GET /v2/stocks/{symbol}/snapshot`
    pub async fn get_snapshot(
        &self,
        symbol: &str,
        feed: Option<DataSource>,
    ) -> Result<Snapshot, ClientError> {
        let request = self
            .data(&format!("/stocks/{symbol}/snapshot"))
            .with_query(self.feed_query(feed));
        let mut raw: RawSnapshot = self.fetch(request).await?;
        if raw.symbol.is_none() {
            raw.symbol = Some(symbol.to_string());
        }
        Ok(normalize::snapshot(raw)?)
    }

    /// `GET /v2/stocks/snapshots`
    ///
    /// Snapshots come back in the order of `symbols`; symbols the server has
    /// no data for are left out.
    pub async fn get_snapshots(
        &self,
        symbols: &[&str],
        feed: Option<DataSource>,
    ) -> Result<Vec<Snapshot>, ClientError> {
        let mut query = vec![("symbols".to_string(), symbols.join(","))];
        query.extend(self.feed_query(feed));
        let request = self.data("/stocks/snapshots").with_query(query);
        let mut by_symbol: HashMap<String, Option<RawSnapshot>> = self.fetch(request).await?;

        let raw: Vec<RawSnapshot> = symbols
            .iter()
            .filter_map(|symbol| {
                let mut snapshot = by_symbol.remove(*symbol).flatten()?;
                snapshot.symbol = Some((*symbol).to_string());
                Some(snapshot)
            })
            .collect();
        Ok(normalize::snapshots(raw)?)
    }
}
