//! REST Request Parameters
//!
//! Typed parameters for the REST wrappers on
//! [`AlpacaClient`](super::rest::AlpacaClient). Query parameters render to
//! `(name, value)` pairs; order bodies serialize to Alpaca's JSON, with
//! decimals sent as strings so no precision is lost.
//!
//! # Wire Format (JSON)
//! ```json
//! {"symbol":"AAPL","qty":"10","side":"buy","type":"limit","time_in_force":"day",
//!  "limit_price":"187.25","order_class":"bracket",
//!  "take_profit":{"limit_price":"195"},"stop_loss":{"stop_price":"180"}}
//! ```

use std::fmt;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::entities::{
    ActivityType, DataSource, OrderClass, OrderSide, OrderType, TimeInForce,
};

/// Rendered query string pairs.
pub type Query = Vec<(String, String)>;

/// Parameter validation failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid request: {0}")]
pub struct InvalidRequest(pub String);

fn invalid(msg: impl Into<String>) -> InvalidRequest {
    InvalidRequest(msg.into())
}

fn wire<T: Serialize>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(s)) => s,
        Ok(other) => other.to_string(),
        Err(_) => String::new(),
    }
}

fn timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn push(query: &mut Query, name: &str, value: impl Into<String>) {
    query.push((name.to_string(), value.into()));
}

// =============================================================================
// Shared
// =============================================================================

/// Chronological sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Oldest first.
    Asc,
    /// Newest first.
    Desc,
}

// =============================================================================
// Orders
// =============================================================================

/// Which orders `get_orders` returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderQueryStatus {
    /// Orders that can still fill.
    Open,
    /// Filled, canceled, expired or rejected orders.
    Closed,
    /// Every order.
    All,
}

/// Query for `GET /v2/orders`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetOrders {
    /// Order status filter (server default: open).
    pub status: Option<OrderQueryStatus>,
    /// Maximum number of orders (server default 50, max 500).
    pub limit: Option<u32>,
    /// Only orders submitted after this time.
    pub after: Option<DateTime<Utc>>,
    /// Only orders submitted until this time.
    pub until: Option<DateTime<Utc>>,
    /// Sort direction by submission time.
    pub direction: Option<SortDirection>,
    /// Roll up legs under their parent order.
    pub nested: Option<bool>,
    /// Only orders for these symbols.
    pub symbols: Vec<String>,
}

impl GetOrders {
    /// Render as query parameters.
    #[must_use]
    pub fn to_query(&self) -> Query {
        let mut query = Query::new();
        if let Some(status) = &self.status {
            push(&mut query, "status", wire(status));
        }
        if let Some(limit) = self.limit {
            push(&mut query, "limit", limit.to_string());
        }
        if let Some(after) = &self.after {
            push(&mut query, "after", timestamp(after));
        }
        if let Some(until) = &self.until {
            push(&mut query, "until", timestamp(until));
        }
        if let Some(direction) = &self.direction {
            push(&mut query, "direction", wire(direction));
        }
        if let Some(nested) = self.nested {
            push(&mut query, "nested", nested.to_string());
        }
        if !self.symbols.is_empty() {
            push(&mut query, "symbols", self.symbols.join(","));
        }
        query
    }
}

/// Take-profit leg of a bracket or OCO order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TakeProfit {
    /// Limit price of the take-profit leg.
    #[serde(with = "rust_decimal::serde::str")]
    pub limit_price: Decimal,
}

/// Stop-loss leg of a bracket, OCO or OTO order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StopLoss {
    /// Stop price of the stop-loss leg.
    #[serde(with = "rust_decimal::serde::str")]
    pub stop_price: Decimal,
    /// Makes the stop-loss leg a stop-limit order.
    #[serde(
        with = "rust_decimal::serde::str_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub limit_price: Option<Decimal>,
}

/// Body of `POST /v2/orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaceOrder {
    /// Symbol or asset ID.
    pub symbol: String,
    /// Share quantity. Exclusive with `notional`.
    #[serde(
        with = "rust_decimal::serde::str_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub qty: Option<Decimal>,
    /// Dollar amount. Exclusive with `qty`.
    #[serde(
        with = "rust_decimal::serde::str_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub notional: Option<Decimal>,
    /// Buy or sell.
    pub side: OrderSide,
    /// Order type.
    #[serde(rename = "type")]
    pub order_type: OrderType,
    /// Time in force.
    pub time_in_force: TimeInForce,
    /// Required for limit and stop-limit orders.
    #[serde(
        with = "rust_decimal::serde::str_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub limit_price: Option<Decimal>,
    /// Required for stop and stop-limit orders.
    #[serde(
        with = "rust_decimal::serde::str_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub stop_price: Option<Decimal>,
    /// Trailing stop offset in dollars.
    #[serde(
        with = "rust_decimal::serde::str_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub trail_price: Option<Decimal>,
    /// Trailing stop offset in percent.
    #[serde(
        with = "rust_decimal::serde::str_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub trail_percent: Option<Decimal>,
    /// Allow execution in pre/post market (limit day orders only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extended_hours: Option<bool>,
    /// Caller-chosen unique ID (max 48 characters).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_order_id: Option<String>,
    /// Simple, bracket, OCO or OTO.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_class: Option<OrderClass>,
    /// Take-profit leg.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub take_profit: Option<TakeProfit>,
    /// Stop-loss leg.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_loss: Option<StopLoss>,
}

impl PlaceOrder {
    fn base(symbol: impl Into<String>, side: OrderSide, order_type: OrderType) -> Self {
        Self {
            symbol: symbol.into(),
            qty: None,
            notional: None,
            side,
            order_type,
            time_in_force: TimeInForce::Day,
            limit_price: None,
            stop_price: None,
            trail_price: None,
            trail_percent: None,
            extended_hours: None,
            client_order_id: None,
            order_class: None,
            take_profit: None,
            stop_loss: None,
        }
    }

    /// Market order for `qty` shares.
    #[must_use]
    pub fn market(symbol: impl Into<String>, side: OrderSide, qty: Decimal) -> Self {
        Self {
            qty: Some(qty),
            ..Self::base(symbol, side, OrderType::Market)
        }
    }

    /// Market order for a dollar amount.
    #[must_use]
    pub fn notional(symbol: impl Into<String>, side: OrderSide, notional: Decimal) -> Self {
        Self {
            notional: Some(notional),
            ..Self::base(symbol, side, OrderType::Market)
        }
    }

    /// Limit order.
    #[must_use]
    pub fn limit(
        symbol: impl Into<String>,
        side: OrderSide,
        qty: Decimal,
        limit_price: Decimal,
    ) -> Self {
        Self {
            qty: Some(qty),
            limit_price: Some(limit_price),
            ..Self::base(symbol, side, OrderType::Limit)
        }
    }

    /// Stop order.
    #[must_use]
    pub fn stop(
        symbol: impl Into<String>,
        side: OrderSide,
        qty: Decimal,
        stop_price: Decimal,
    ) -> Self {
        Self {
            qty: Some(qty),
            stop_price: Some(stop_price),
            ..Self::base(symbol, side, OrderType::Stop)
        }
    }

    /// Stop-limit order.
    #[must_use]
    pub fn stop_limit(
        symbol: impl Into<String>,
        side: OrderSide,
        qty: Decimal,
        stop_price: Decimal,
        limit_price: Decimal,
    ) -> Self {
        Self {
            qty: Some(qty),
            stop_price: Some(stop_price),
            limit_price: Some(limit_price),
            ..Self::base(symbol, side, OrderType::StopLimit)
        }
    }

    /// Trailing stop order with a dollar offset.
    #[must_use]
    pub fn trailing_stop_price(
        symbol: impl Into<String>,
        side: OrderSide,
        qty: Decimal,
        trail_price: Decimal,
    ) -> Self {
        Self {
            qty: Some(qty),
            trail_price: Some(trail_price),
            ..Self::base(symbol, side, OrderType::TrailingStop)
        }
    }

    /// Trailing stop order with a percent offset.
    #[must_use]
    pub fn trailing_stop_percent(
        symbol: impl Into<String>,
        side: OrderSide,
        qty: Decimal,
        trail_percent: Decimal,
    ) -> Self {
        Self {
            qty: Some(qty),
            trail_percent: Some(trail_percent),
            ..Self::base(symbol, side, OrderType::TrailingStop)
        }
    }

    /// Set the time in force.
    #[must_use]
    pub const fn time_in_force(mut self, time_in_force: TimeInForce) -> Self {
        self.time_in_force = time_in_force;
        self
    }

    /// Allow pre/post market execution.
    #[must_use]
    pub const fn extended_hours(mut self, extended_hours: bool) -> Self {
        self.extended_hours = Some(extended_hours);
        self
    }

    /// Set the client order ID.
    #[must_use]
    pub fn client_order_id(mut self, id: impl Into<String>) -> Self {
        self.client_order_id = Some(id.into());
        self
    }

    /// Set a random (UUID v4) client order ID.
    #[must_use]
    pub fn generated_client_order_id(self) -> Self {
        self.client_order_id(uuid::Uuid::new_v4().to_string())
    }

    /// Attach take-profit and stop-loss legs as a bracket order.
    #[must_use]
    pub fn bracket(mut self, take_profit: TakeProfit, stop_loss: StopLoss) -> Self {
        self.order_class = Some(OrderClass::Bracket);
        self.take_profit = Some(take_profit);
        self.stop_loss = Some(stop_loss);
        self
    }

    /// One-cancels-other exit for an existing position.
    #[must_use]
    pub fn oco(mut self, take_profit: TakeProfit, stop_loss: StopLoss) -> Self {
        self.order_class = Some(OrderClass::Oco);
        self.take_profit = Some(take_profit);
        self.stop_loss = Some(stop_loss);
        self
    }

    /// One-triggers-other with a single exit leg.
    #[must_use]
    pub fn oto(
        mut self,
        take_profit: Option<TakeProfit>,
        stop_loss: Option<StopLoss>,
    ) -> Self {
        self.order_class = Some(OrderClass::Oto);
        self.take_profit = take_profit;
        self.stop_loss = stop_loss;
        self
    }

    /// Check the combination of fields Alpaca requires.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidRequest`] naming the first violated rule.
    pub fn validate(&self) -> Result<(), InvalidRequest> {
        if self.symbol.trim().is_empty() {
            return Err(invalid("symbol is required"));
        }

        match (self.qty, self.notional) {
            (Some(_), Some(_)) => return Err(invalid("qty and notional are exclusive")),
            (None, None) => return Err(invalid("one of qty or notional is required")),
            (Some(qty), None) if qty <= Decimal::ZERO => {
                return Err(invalid("qty must be positive"));
            }
            (None, Some(notional)) if notional <= Decimal::ZERO => {
                return Err(invalid("notional must be positive"));
            }
            _ => {}
        }

        if self
            .client_order_id
            .as_ref()
            .is_some_and(|id| id.chars().count() > 48)
        {
            return Err(invalid("client_order_id is limited to 48 characters"));
        }

        if self.notional.is_some() && self.order_type != OrderType::Market {
            return Err(invalid("notional orders must be market orders"));
        }

        match self.order_type {
            OrderType::Market => {}
            OrderType::Limit if self.limit_price.is_none() => {
                return Err(invalid("limit orders require limit_price"));
            }
            OrderType::Stop if self.stop_price.is_none() => {
                return Err(invalid("stop orders require stop_price"));
            }
            OrderType::StopLimit if self.limit_price.is_none() || self.stop_price.is_none() => {
                return Err(invalid("stop_limit orders require stop_price and limit_price"));
            }
            OrderType::TrailingStop
                if self.trail_price.is_some() == self.trail_percent.is_some() =>
            {
                return Err(invalid(
                    "trailing_stop orders require exactly one of trail_price or trail_percent",
                ));
            }
            _ => {}
        }

        match self.order_class {
            Some(OrderClass::Bracket | OrderClass::Oco)
                if self.take_profit.is_none() || self.stop_loss.is_none() =>
            {
                Err(invalid("bracket and oco orders require take_profit and stop_loss"))
            }
            Some(OrderClass::Oto) if self.take_profit.is_some() == self.stop_loss.is_some() => {
                Err(invalid("oto orders require exactly one of take_profit or stop_loss"))
            }
            None | Some(OrderClass::Simple)
                if self.take_profit.is_some() || self.stop_loss.is_some() =>
            {
                Err(invalid("take_profit and stop_loss require a composite order_class"))
            }
            _ => Ok(()),
        }
    }
}

/// Body of `PATCH /v2/orders/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReplaceOrder {
    /// New quantity.
    #[serde(
        with = "rust_decimal::serde::str_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub qty: Option<Decimal>,
    /// New time in force.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_in_force: Option<TimeInForce>,
    /// New limit price.
    #[serde(
        with = "rust_decimal::serde::str_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub limit_price: Option<Decimal>,
    /// New stop price.
    #[serde(
        with = "rust_decimal::serde::str_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub stop_price: Option<Decimal>,
    /// New trailing offset (dollars or percent, matching the order).
    #[serde(
        with = "rust_decimal::serde::str_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub trail: Option<Decimal>,
    /// New client order ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_order_id: Option<String>,
}

impl ReplaceOrder {
    /// Reject a replacement that changes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidRequest`] if no field is set.
    pub fn validate(&self) -> Result<(), InvalidRequest> {
        if *self == Self::default() {
            return Err(invalid("replace_order needs at least one field"));
        }
        Ok(())
    }
}

/// Query for `DELETE /v2/positions/{symbol}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClosePosition {
    /// Shares to liquidate. Exclusive with `percentage`.
    pub qty: Option<Decimal>,
    /// Percent of the position to liquidate.
    pub percentage: Option<Decimal>,
}

impl ClosePosition {
    /// Render as query parameters.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidRequest`] if both `qty` and `percentage` are set.
    pub fn to_query(&self) -> Result<Query, InvalidRequest> {
        let mut query = Query::new();
        match (self.qty, self.percentage) {
            (Some(_), Some(_)) => return Err(invalid("qty and percentage are exclusive")),
            (Some(qty), None) => push(&mut query, "qty", qty.to_string()),
            (None, Some(percentage)) => push(&mut query, "percentage", percentage.to_string()),
            (None, None) => {}
        }
        Ok(query)
    }
}

// =============================================================================
// Account Activities
// =============================================================================

/// Query for `GET /v2/account/activities`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetAccountActivities {
    /// Only these activity types (all when empty).
    pub activity_types: Vec<ActivityType>,
    /// Only activities on this date.
    pub date: Option<NaiveDate>,
    /// Only activities up to this time.
    pub until: Option<DateTime<Utc>>,
    /// Only activities after this time.
    pub after: Option<DateTime<Utc>>,
    /// Sort direction (server default: desc).
    pub direction: Option<SortDirection>,
    /// Maximum activities per page (server default 100, max 100).
    pub page_size: Option<u32>,
    /// Continue after this activity ID.
    pub page_token: Option<String>,
}

impl GetAccountActivities {
    /// Render as query parameters.
    #[must_use]
    pub fn to_query(&self) -> Query {
        let mut query = Query::new();
        if !self.activity_types.is_empty() {
            let types: Vec<String> = self.activity_types.iter().map(wire).collect();
            push(&mut query, "activity_types", types.join(","));
        }
        if let Some(date) = &self.date {
            push(&mut query, "date", date.format("%Y-%m-%d").to_string());
        }
        if let Some(until) = &self.until {
            push(&mut query, "until", timestamp(until));
        }
        if let Some(after) = &self.after {
            push(&mut query, "after", timestamp(after));
        }
        if let Some(direction) = &self.direction {
            push(&mut query, "direction", wire(direction));
        }
        if let Some(page_size) = self.page_size {
            push(&mut query, "page_size", page_size.to_string());
        }
        if let Some(token) = self.page_token.as_deref().filter(|t| !t.is_empty()) {
            push(&mut query, "page_token", token);
        }
        query
    }
}

// =============================================================================
// Market Data
// =============================================================================

/// Bar aggregation unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeframeUnit {
    /// Minutes (1-59).
    Minute,
    /// Hours (1-23).
    Hour,
    /// Days (1).
    Day,
    /// Weeks (1).
    Week,
    /// Months (1, 2, 3, 4, 6 or 12).
    Month,
}

/// Bar aggregation period, rendered as Alpaca's `5Min` / `1Hour` / `1Day`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Timeframe {
    /// Number of units.
    pub amount: u32,
    /// Unit.
    pub unit: TimeframeUnit,
}

impl Timeframe {
    /// One minute.
    pub const MINUTE: Self = Self::new(1, TimeframeUnit::Minute);
    /// One hour.
    pub const HOUR: Self = Self::new(1, TimeframeUnit::Hour);
    /// One day.
    pub const DAY: Self = Self::new(1, TimeframeUnit::Day);

    /// `amount` units.
    #[must_use]
    pub const fn new(amount: u32, unit: TimeframeUnit) -> Self {
        Self { amount, unit }
    }

    /// Whether Alpaca accepts this combination.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        match self.unit {
            TimeframeUnit::Minute => self.amount >= 1 && self.amount <= 59,
            TimeframeUnit::Hour => self.amount >= 1 && self.amount <= 23,
            TimeframeUnit::Day | TimeframeUnit::Week => self.amount == 1,
            TimeframeUnit::Month => matches!(self.amount, 1 | 2 | 3 | 4 | 6 | 12),
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = match self.unit {
            TimeframeUnit::Minute => "Min",
            TimeframeUnit::Hour => "Hour",
            TimeframeUnit::Day => "Day",
            TimeframeUnit::Week => "Week",
            TimeframeUnit::Month => "Month",
        };
        write!(f, "{}{unit}", self.amount)
    }
}

/// Time range and paging shared by historical market data queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoricalRange {
    /// Inclusive start.
    pub start: DateTime<Utc>,
    /// Inclusive end (server default: now, or 15 minutes ago without SIP).
    pub end: Option<DateTime<Utc>>,
    /// Maximum items per page (1-10000).
    pub limit: Option<u32>,
    /// Continuation token from a previous page.
    pub page_token: Option<String>,
    /// Data source.
    pub feed: Option<DataSource>,
}

impl HistoricalRange {
    /// Range starting at `start`.
    #[must_use]
    pub const fn starting(start: DateTime<Utc>) -> Self {
        Self {
            start,
            end: None,
            limit: None,
            page_token: None,
            feed: None,
        }
    }

    fn push_into(&self, query: &mut Query) {
        push(query, "start", timestamp(&self.start));
        if let Some(end) = &self.end {
            push(query, "end", timestamp(end));
        }
        if let Some(limit) = self.limit {
            push(query, "limit", limit.to_string());
        }
        if let Some(token) = self.page_token.as_deref().filter(|t| !t.is_empty()) {
            push(query, "page_token", token);
        }
        if let Some(feed) = self.feed {
            push(query, "feed", feed.as_str());
        }
    }

    fn validate(&self) -> Result<(), InvalidRequest> {
        if let Some(end) = self.end
            && end < self.start
        {
            return Err(invalid("end must not precede start"));
        }
        if let Some(limit) = self.limit
            && !(1..=10_000).contains(&limit)
        {
            return Err(invalid("limit must be between 1 and 10000"));
        }
        Ok(())
    }
}

/// Query for `GET /v2/stocks/{symbol}/trades`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetTrades {
    /// Symbol.
    pub symbol: String,
    /// Range and paging.
    pub range: HistoricalRange,
}

/// Query for `GET /v2/stocks/{symbol}/quotes`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetQuotes {
    /// Symbol.
    pub symbol: String,
    /// Range and paging.
    pub range: HistoricalRange,
}

/// Query for `GET /v2/stocks/{symbol}/bars`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetBars {
    /// Symbol.
    pub symbol: String,
    /// Aggregation period.
    pub timeframe: Timeframe,
    /// Range and paging.
    pub range: HistoricalRange,
}

macro_rules! historical_query {
    ($name:ident) => {
        impl $name {
            /// Same query continuing at `page_token`.
            #[must_use]
            pub fn with_page_token(mut self, page_token: impl Into<String>) -> Self {
                self.range.page_token = Some(page_token.into());
                self
            }
        }
    };
}

historical_query!(GetTrades);
historical_query!(GetQuotes);
historical_query!(GetBars);

impl GetTrades {
    /// Trades for `symbol` from `start`.
    #[must_use]
    pub fn new(symbol: impl Into<String>, start: DateTime<Utc>) -> Self {
        Self {
            symbol: symbol.into(),
            range: HistoricalRange::starting(start),
        }
    }

    /// Render as query parameters.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidRequest`] for an inverted range or out-of-bounds limit.
    pub fn to_query(&self) -> Result<Query, InvalidRequest> {
        self.range.validate()?;
        let mut query = Query::new();
        self.range.push_into(&mut query);
        Ok(query)
    }
}

impl GetQuotes {
    /// Quotes for `symbol` from `start`.
    #[must_use]
    pub fn new(symbol: impl Into<String>, start: DateTime<Utc>) -> Self {
        Self {
            symbol: symbol.into(),
            range: HistoricalRange::starting(start),
        }
    }

    /// Render as query parameters.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidRequest`] for an inverted range or out-of-bounds limit.
    pub fn to_query(&self) -> Result<Query, InvalidRequest> {
        self.range.validate()?;
        let mut query = Query::new();
        self.range.push_into(&mut query);
        Ok(query)
    }
}

impl GetBars {
    /// Bars for `symbol` from `start`.
    #[must_use]
    pub fn new(symbol: impl Into<String>, timeframe: Timeframe, start: DateTime<Utc>) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe,
            range: HistoricalRange::starting(start),
        }
    }

    /// Render as query parameters.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidRequest`] for an unsupported timeframe, an inverted
    /// range or an out-of-bounds limit.
    pub fn to_query(&self) -> Result<Query, InvalidRequest> {
        if !self.timeframe.is_valid() {
            return Err(invalid(format!("unsupported timeframe {}", self.timeframe)));
        }
        self.range.validate()?;

        let mut query = Query::new();
        push(&mut query, "timeframe", self.timeframe.to_string());
        self.range.push_into(&mut query);
        Ok(query)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use chrono::TimeZone;

    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn pairs(query: &Query) -> Vec<(&str, &str)> {
        query.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect()
    }

    #[test]
    fn bracket_order_body() {
        let order = PlaceOrder::limit("AAPL", OrderSide::Buy, dec("10"), dec("187.25"))
            .time_in_force(TimeInForce::Gtc)
            .bracket(
                TakeProfit {
                    limit_price: dec("195"),
                },
                StopLoss {
                    stop_price: dec("180"),
                    limit_price: None,
                },
            );
        order.validate().unwrap();

        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "symbol": "AAPL",
                "qty": "10",
                "side": "buy",
                "type": "limit",
                "time_in_force": "gtc",
                "limit_price": "187.25",
                "order_class": "bracket",
                "take_profit": {"limit_price": "195"},
                "stop_loss": {"stop_price": "180"}
            })
        );
    }

    #[test]
    fn notional_market_order_body() {
        let order = PlaceOrder::notional("SPY", OrderSide::Sell, dec("250.50"));
        order.validate().unwrap();
        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["notional"], "250.50");
        assert!(json.get("qty").is_none());
        assert_eq!(json["type"], "market");
    }

    #[test]
    fn generated_client_order_id_is_uuid() {
        let order = PlaceOrder::market("AAPL", OrderSide::Buy, dec("1")).generated_client_order_id();
        let id = order.client_order_id.unwrap();
        assert!(uuid::Uuid::parse_str(&id).is_ok());
    }

    #[test]
    fn validation_rules() {
        let mut order = PlaceOrder::market("AAPL", OrderSide::Buy, dec("1"));
        order.notional = Some(dec("5"));
        assert!(order.validate().is_err());

        let mut order = PlaceOrder::limit("AAPL", OrderSide::Buy, dec("1"), dec("1"));
        order.limit_price = None;
        assert!(order.validate().is_err());

        let order = PlaceOrder::trailing_stop_percent("AAPL", OrderSide::Sell, dec("1"), dec("2"));
        assert!(order.validate().is_ok());

        let mut order = PlaceOrder::market("AAPL", OrderSide::Buy, dec("1"));
        order.order_class = Some(OrderClass::Bracket);
        assert!(order.validate().is_err());

        let order = PlaceOrder::market("AAPL", OrderSide::Buy, dec("1")).oto(
            Some(TakeProfit {
                limit_price: dec("2"),
            }),
            None,
        );
        assert!(order.validate().is_ok());

        let order = PlaceOrder::market("AAPL", OrderSide::Buy, dec("0"));
        assert!(order.validate().is_err());
    }

    #[test]
    fn replace_order_needs_a_field() {
        assert!(ReplaceOrder::default().validate().is_err());
        let replace = ReplaceOrder {
            limit_price: Some(dec("10.5")),
            ..ReplaceOrder::default()
        };
        replace.validate().unwrap();
        assert_eq!(
            serde_json::to_string(&replace).unwrap(),
            r#"{"limit_price":"10.5"}"#
        );
    }

    #[test]
    fn get_orders_query() {
        let query = GetOrders {
            status: Some(OrderQueryStatus::All),
            limit: Some(500),
            after: Some(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()),
            direction: Some(SortDirection::Asc),
            nested: Some(true),
            symbols: vec!["AAPL".into(), "MSFT".into()],
            ..GetOrders::default()
        }
        .to_query();

        assert_eq!(
            pairs(&query),
            vec![
                ("status", "all"),
                ("limit", "500"),
                ("after", "2024-01-02T03:04:05Z"),
                ("direction", "asc"),
                ("nested", "true"),
                ("symbols", "AAPL,MSFT"),
            ]
        );
    }

    #[test]
    fn activities_query() {
        let query = GetAccountActivities {
            activity_types: vec![ActivityType::Fill, ActivityType::Div],
            date: NaiveDate::from_ymd_opt(2024, 3, 1),
            page_size: Some(50),
            page_token: Some(String::new()),
            ..GetAccountActivities::default()
        }
        .to_query();

        assert_eq!(
            pairs(&query),
            vec![
                ("activity_types", "FILL,DIV"),
                ("date", "2024-03-01"),
                ("page_size", "50"),
            ]
        );
    }

    #[test]
    fn bars_query() {
        let start = Utc.with_ymd_and_hms(2024, 1, 2, 14, 30, 0).unwrap();
        let mut params = GetBars::new("SPY", Timeframe::new(5, TimeframeUnit::Minute), start)
            .with_page_token("abc");
        params.range.feed = Some(DataSource::Sip);
        params.range.limit = Some(1_000);

        assert_eq!(
            pairs(&params.to_query().unwrap()),
            vec![
                ("timeframe", "5Min"),
                ("start", "2024-01-02T14:30:00Z"),
                ("limit", "1000"),
                ("page_token", "abc"),
                ("feed", "sip"),
            ]
        );
    }

    #[test]
    fn invalid_market_data_queries() {
        let start = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        assert!(
            GetBars::new("SPY", Timeframe::new(2, TimeframeUnit::Day), start)
                .to_query()
                .is_err()
        );

        let mut trades = GetTrades::new("AAPL", start);
        trades.range.end = Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert!(trades.to_query().is_err());

        let mut quotes = GetQuotes::new("AAPL", start);
        quotes.range.limit = Some(0);
        assert!(quotes.to_query().is_err());
    }

    #[test]
    fn close_position_query() {
        assert!(ClosePosition::default().to_query().unwrap().is_empty());
        let query = ClosePosition {
            percentage: Some(dec("50")),
            ..ClosePosition::default()
        }
        .to_query()
        .unwrap();
        assert_eq!(pairs(&query), vec![("percentage", "50")]);
        assert!(
            ClosePosition {
                qty: Some(dec("1")),
                percentage: Some(dec("1")),
            }
            .to_query()
            .is_err()
        );
    }
}
