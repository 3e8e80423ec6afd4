//! Alpaca WebSocket Message Types
//!
//! Wire format types for the control frames exchanged on Alpaca's streams.
//! Data payloads (trades, quotes, bars, trade updates) decode straight into
//! the raw entities in [`crate::domain::entities`].
//!
//! # Message Types
//!
//! ## Market Data Streams (JSON arrays, `T` discriminator)
//! - `success`: connection / authentication success
//! - `error`: error response with code and message
//! - `subscription`: current subscriptions after a (un)subscribe
//! - `t` / `q` / `b`: trade, quote, minute bar
//!
//! ## Account Stream (JSON objects, `stream` discriminator)
//! - `authorization`: authentication result
//! - `listening`: streams currently listened to
//! - `trade_updates`: order lifecycle events
//!
//! # References
//!
//! - [Stock Streaming](https://docs.alpaca.markets/docs/real-time-stock-pricing-data)
//! - [Trade Updates](https://docs.alpaca.markets/docs/websocket-streaming)

use serde::{Deserialize, Serialize};

use crate::domain::entities::{RawBar, RawQuote, RawTrade, RawTradeUpdate};
use crate::domain::stream::{Channel, SubscriptionSet};

// =============================================================================
// Control Messages (Market Data)
// =============================================================================

/// Success message.
///
/// # Wire Format (JSON)
/// ```json
/// {"T": "success", "msg": "connected"}
/// {"T": "success", "msg": "authenticated"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessMessage {
    /// "connected" or "authenticated".
    pub msg: String,
}

impl SuccessMessage {
    /// Whether this acknowledges authentication.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.msg == "authenticated"
    }
}

/// Error message with code and description.
///
/// # Wire Format (JSON)
/// ```json
/// {"T": "error", "code": 402, "msg": "auth failed"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMessage {
    /// Error code.
    pub code: i32,
    /// Error message.
    pub msg: String,
}

/// Subscription confirmation.
///
/// # Wire Format (JSON)
/// ```json
/// {"T": "subscription", "trades": ["AAPL"], "quotes": ["AMD", "CLDR"], "bars": ["*"]}
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionMessage {
    /// Subscribed trade symbols.
    #[serde(default)]
    pub trades: Vec<String>,
    /// Subscribed quote symbols.
    #[serde(default)]
    pub quotes: Vec<String>,
    /// Subscribed bar symbols.
    #[serde(default)]
    pub bars: Vec<String>,
}

// =============================================================================
// Control Messages (Account Stream)
// =============================================================================

/// Authorization response data.
///
/// # Wire Format (JSON)
/// ```json
/// {"stream": "authorization", "data": {"status": "authorized", "action": "authenticate"}}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationData {
    /// "authorized" or "unauthorized".
    pub status: String,
    /// Always "authenticate".
    #[serde(default)]
    pub action: String,
}

impl AuthorizationData {
    /// Whether authorization succeeded.
    #[must_use]
    pub fn is_authorized(&self) -> bool {
        self.status == "authorized"
    }
}

/// Listening confirmation data.
///
/// # Wire Format (JSON)
/// ```json
/// {"stream": "listening", "data": {"streams": ["trade_updates"]}}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListeningData {
    /// Streams currently listened to.
    #[serde(default)]
    pub streams: Vec<String>,
}

// =============================================================================
// Decoded Inbound Message
// =============================================================================

/// One decoded inbound message from either stream kind.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// `{"T":"success"}`
    Success(SuccessMessage),
    /// `{"T":"error"}`
    Error(ErrorMessage),
    /// `{"T":"subscription"}`
    Subscription(SubscriptionMessage),
    /// `{"stream":"authorization"}`
    Authorization(AuthorizationData),
    /// `{"stream":"listening"}`
    Listening(ListeningData),
    /// `{"T":"t"}`
    Trade(RawTrade),
    /// `{"T":"q"}`
    Quote(RawQuote),
    /// `{"T":"b"}`
    Bar(RawBar),
    /// `{"stream":"trade_updates"}`
    TradeUpdate(Box<RawTradeUpdate>),
    /// Any other message type, ignored.
    Other(String),
}

// =============================================================================
// Outbound Messages (Client -> Server)
// =============================================================================

/// Authentication request for market data streams.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarketDataAuthRequest {
    /// Action: "auth"
    pub action: &'static str,
    /// API key ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// API secret key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    /// OAuth token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oauth_token: Option<String>,
}

impl MarketDataAuthRequest {
    /// Key pair authentication.
    #[must_use]
    pub const fn key_secret(key: String, secret: String) -> Self {
        Self {
            action: "auth",
            key: Some(key),
            secret: Some(secret),
            oauth_token: None,
        }
    }

    /// OAuth authentication.
    #[must_use]
    pub const fn oauth(token: String) -> Self {
        Self {
            action: "auth",
            key: None,
            secret: None,
            oauth_token: Some(token),
        }
    }
}

/// Authentication request for the account stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountAuthRequest {
    /// Action: "authenticate"
    pub action: &'static str,
    /// Authentication data.
    pub data: AccountAuthData,
}

/// Authentication data for the account stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountAuthData {
    /// API key ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_id: Option<String>,
    /// API secret key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,
    /// OAuth token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oauth_token: Option<String>,
}

impl AccountAuthRequest {
    /// Key pair authentication.
    #[must_use]
    pub const fn key_secret(key: String, secret: String) -> Self {
        Self {
            action: "authenticate",
            data: AccountAuthData {
                key_id: Some(key),
                secret_key: Some(secret),
                oauth_token: None,
            },
        }
    }

    /// OAuth authentication.
    #[must_use]
    pub const fn oauth(token: String) -> Self {
        Self {
            action: "authenticate",
            data: AccountAuthData {
                key_id: None,
                secret_key: None,
                oauth_token: Some(token),
            },
        }
    }
}

/// Subscription request for market data streams.
///
/// # Wire Format (JSON)
/// ```json
/// {"action": "subscribe", "trades": ["AAPL"], "quotes": ["MSFT"], "bars": []}
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SubscriptionRequest {
    /// Action: "subscribe" or "unsubscribe"
    pub action: String,
    /// Trade symbols.
    pub trades: Vec<String>,
    /// Quote symbols.
    pub quotes: Vec<String>,
    /// Bar symbols.
    pub bars: Vec<String>,
}

impl SubscriptionRequest {
    /// Create a subscribe request.
    #[must_use]
    pub fn subscribe() -> Self {
        Self {
            action: "subscribe".to_string(),
            ..Default::default()
        }
    }

    /// Create an unsubscribe request.
    #[must_use]
    pub fn unsubscribe() -> Self {
        Self {
            action: "unsubscribe".to_string(),
            ..Default::default()
        }
    }

    /// Set the symbols of one market data channel.
    #[must_use]
    pub fn with(mut self, channel: Channel, symbols: Vec<String>) -> Self {
        match channel {
            Channel::Trades => self.trades = symbols,
            Channel::Quotes => self.quotes = symbols,
            Channel::Bars => self.bars = symbols,
            Channel::TradeUpdates => {}
        }
        self
    }

    /// Subscribe request replaying every market data channel of `set`.
    #[must_use]
    pub fn replay(set: &SubscriptionSet) -> Self {
        Self::subscribe()
            .with(Channel::Trades, set.symbols(Channel::Trades).to_vec())
            .with(Channel::Quotes, set.symbols(Channel::Quotes).to_vec())
            .with(Channel::Bars, set.symbols(Channel::Bars).to_vec())
    }

    /// Whether the request names no symbol.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trades.is_empty() && self.quotes.is_empty() && self.bars.is_empty()
    }
}

/// Listen request for the account stream.
///
/// # Wire Format (JSON)
/// ```json
/// {"action": "listen", "data": {"streams": ["trade_updates"]}}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListenRequest {
    /// Action: "listen"
    pub action: &'static str,
    /// Listen data.
    pub data: ListenData,
}

/// Listen data for the account stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListenData {
    /// Streams to listen to.
    pub streams: Vec<String>,
}

impl ListenRequest {
    /// Listen to `trade_updates`.
    #[must_use]
    pub fn trade_updates() -> Self {
        Self::streams(vec![Channel::TradeUpdates.as_str().to_string()])
    }

    /// Stop listening to every stream.
    #[must_use]
    pub const fn none() -> Self {
        Self::streams(Vec::new())
    }

    const fn streams(streams: Vec<String>) -> Self {
        Self {
            action: "listen",
            data: ListenData { streams },
        }
    }
}
