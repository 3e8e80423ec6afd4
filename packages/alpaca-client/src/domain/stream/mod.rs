//! Streaming domain: channels, session states and the desired subscription set.
//!
//! Alpaca exposes two kinds of stream:
//!
//! - **market data** (`wss://stream.data.alpaca.markets/v2/{iex|sip}`) carrying
//!   the `trades`, `quotes` and `bars` channels;
//! - **account** (`wss://{paper-}api.alpaca.markets/stream`) carrying the
//!   `trade_updates` channel.

mod error;
mod state;
mod subscription;

pub use error::{AuthError, StreamError};
pub use state::{SessionEvent, StreamState};
pub use subscription::{SubscriptionSet, WILDCARD};

use serde::{Deserialize, Serialize};

use crate::domain::entities::DataSource;

/// A stream channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// Market data trades.
    Trades,
    /// Market data quotes.
    Quotes,
    /// Market data minute bars.
    Bars,
    /// Account order events.
    TradeUpdates,
}

impl Channel {
    /// All channels.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Trades, Self::Quotes, Self::Bars, Self::TradeUpdates]
    }

    /// Wire name of the channel.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trades => "trades",
            Self::Quotes => "quotes",
            Self::Bars => "bars",
            Self::TradeUpdates => "trade_updates",
        }
    }

    /// Whether the channel belongs to a market data stream.
    #[must_use]
    pub const fn is_market_data(self) -> bool {
        !matches!(self, Self::TradeUpdates)
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which stream a session is connected to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamSource {
    /// Market data for a feed.
    MarketData(DataSource),
    /// Account events (`trade_updates`).
    Account,
}

impl StreamSource {
    /// Whether `channel` is served by this stream.
    #[must_use]
    pub const fn supports(self, channel: Channel) -> bool {
        match self {
            Self::MarketData(_) => channel.is_market_data(),
            Self::Account => !channel.is_market_data(),
        }
    }
}

impl std::fmt::Display for StreamSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MarketData(source) => write!(f, "market_data/{source}"),
            Self::Account => f.write_str("account"),
        }
    }
}
