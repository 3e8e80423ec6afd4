//! Market data entities: trades, quotes, bars, snapshots and pages.
//!
//! Market data uses single-letter wire keys and JSON numbers for prices and
//! sizes. Timestamps are RFC-3339 strings with nanosecond precision.
//!
//! The symbol (`S`) is present on streamed messages but omitted on items of a
//! historical page and on the sub-objects of a snapshot or latest trade,
//! where the symbol lives on the enclosing object. Parsed entities always
//! carry the symbol, taken from the enclosing object when the item lacks it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Data Source
// =============================================================================

/// Market data feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    /// Investors Exchange feed (free tier).
    #[default]
    Iex,
    /// Consolidated feed of all US exchanges.
    Sip,
}

impl DataSource {
    /// Path segment and query value for this feed.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Iex => "iex",
            Self::Sip => "sip",
        }
    }
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DataSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "iex" => Ok(Self::Iex),
            "sip" => Ok(Self::Sip),
            other => Err(format!("unknown data source: {other}")),
        }
    }
}

// =============================================================================
// Trade
// =============================================================================

/// Trade as Alpaca sends it.
///
/// # Wire Format (JSON)
/// ```json
/// {"T":"t","S":"AAPL","t":"2021-02-22T15:51:44.208Z","x":"V","p":129.74,"s":100,"c":["@"],"i":52983525028175,"z":"C"}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTrade {
    /// Symbol.
    #[serde(rename = "S", default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    /// Timestamp.
    #[serde(rename = "t")]
    pub timestamp: String,
    /// Exchange code.
    #[serde(rename = "x")]
    pub exchange: String,
    /// Price.
    #[serde(rename = "p")]
    pub price: f64,
    /// Size.
    #[serde(rename = "s")]
    pub size: f64,
    /// Condition flags.
    #[serde(rename = "c", default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<String>>,
    /// Trade ID.
    #[serde(rename = "i")]
    pub id: u64,
    /// Tape.
    #[serde(rename = "z")]
    pub tape: String,
}

/// Trade with parsed timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    /// Symbol.
    pub symbol: String,
    /// Timestamp.
    pub timestamp: DateTime<Utc>,
    /// Exchange code.
    pub exchange: String,
    /// Price.
    pub price: f64,
    /// Size.
    pub size: f64,
    /// Condition flags.
    pub conditions: Vec<String>,
    /// Trade ID.
    pub id: u64,
    /// Tape.
    pub tape: String,
    pub(crate) raw: RawTrade,
}

impl Trade {
    /// The payload this trade was parsed from.
    #[must_use]
    pub const fn raw(&self) -> &RawTrade {
        &self.raw
    }
}

// =============================================================================
// Quote
// =============================================================================

/// Quote as Alpaca sends it.
///
/// # Wire Format (JSON)
/// ```json
/// {"T":"q","S":"AMD","bx":"U","bp":87.66,"bs":1,"ax":"Q","ap":87.68,"as":4,"t":"2021-02-22T15:51:45.335Z","c":["R"]}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawQuote {
    /// Symbol.
    #[serde(rename = "S", default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    /// Timestamp.
    #[serde(rename = "t")]
    pub timestamp: String,
    /// Ask exchange code.
    #[serde(rename = "ax")]
    pub ask_exchange: String,
    /// Ask price.
    #[serde(rename = "ap")]
    pub ask_price: f64,
    /// Ask size.
    #[serde(rename = "as")]
    pub ask_size: f64,
    /// Bid exchange code.
    #[serde(rename = "bx")]
    pub bid_exchange: String,
    /// Bid price.
    #[serde(rename = "bp")]
    pub bid_price: f64,
    /// Bid size.
    #[serde(rename = "bs")]
    pub bid_size: f64,
    /// Condition flags.
    #[serde(rename = "c", default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<String>>,
}

/// Quote with parsed timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    /// Symbol.
    pub symbol: String,
    /// Timestamp.
    pub timestamp: DateTime<Utc>,
    /// Ask exchange code.
    pub ask_exchange: String,
    /// Ask price.
    pub ask_price: f64,
    /// Ask size.
    pub ask_size: f64,
    /// Bid exchange code.
    pub bid_exchange: String,
    /// Bid price.
    pub bid_price: f64,
    /// Bid size.
    pub bid_size: f64,
    /// Condition flags.
    pub conditions: Vec<String>,
    pub(crate) raw: RawQuote,
}

impl Quote {
    /// The payload this quote was parsed from.
    #[must_use]
    pub const fn raw(&self) -> &RawQuote {
        &self.raw
    }

    /// Ask minus bid.
    #[must_use]
    pub fn spread(&self) -> f64 {
        self.ask_price - self.bid_price
    }
}

// =============================================================================
// Bar
// =============================================================================

/// OHLCV bar as Alpaca sends it.
///
/// # Wire Format (JSON)
/// ```json
/// {"T":"b","S":"SPY","o":388.985,"h":389.13,"l":388.975,"c":389.12,"v":49378,"n":461,"vw":389.06,"t":"2021-02-22T19:15:00Z"}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBar {
    /// Symbol.
    #[serde(rename = "S", default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    /// Bar start timestamp.
    #[serde(rename = "t")]
    pub timestamp: String,
    /// Open price.
    #[serde(rename = "o")]
    pub open: f64,
    /// High price.
    #[serde(rename = "h")]
    pub high: f64,
    /// Low price.
    #[serde(rename = "l")]
    pub low: f64,
    /// Close price.
    #[serde(rename = "c")]
    pub close: f64,
    /// Volume.
    #[serde(rename = "v")]
    pub volume: f64,
    /// Number of trades.
    #[serde(rename = "n", default, skip_serializing_if = "Option::is_none")]
    pub trade_count: Option<u64>,
    /// Volume-weighted average price.
    #[serde(rename = "vw", default, skip_serializing_if = "Option::is_none")]
    pub vwap: Option<f64>,
}

/// Bar with parsed timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    /// Symbol.
    pub symbol: String,
    /// Bar start timestamp.
    pub timestamp: DateTime<Utc>,
    /// Open price.
    pub open: f64,
    /// High price.
    pub high: f64,
    /// Low price.
    pub low: f64,
    /// Close price.
    pub close: f64,
    /// Volume.
    pub volume: f64,
    /// Number of trades.
    pub trade_count: Option<u64>,
    /// Volume-weighted average price.
    pub vwap: Option<f64>,
    pub(crate) raw: RawBar,
}

impl Bar {
    /// The payload this bar was parsed from.
    #[must_use]
    pub const fn raw(&self) -> &RawBar {
        &self.raw
    }
}

// =============================================================================
// Snapshot / Latest Trade
// =============================================================================

/// Snapshot as Alpaca sends it.
///
/// Each sub-object may be `null` (e.g. no trades yet today).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSnapshot {
    /// Symbol. Absent on entries of the multi-symbol endpoint, keyed by symbol instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    /// Most recent trade.
    #[serde(rename = "latestTrade", default)]
    pub latest_trade: Option<RawTrade>,
    /// Most recent quote.
    #[serde(rename = "latestQuote", default)]
    pub latest_quote: Option<RawQuote>,
    /// Current minute bar.
    #[serde(rename = "minuteBar", default)]
    pub minute_bar: Option<RawBar>,
    /// Current daily bar.
    #[serde(rename = "dailyBar", default)]
    pub daily_bar: Option<RawBar>,
    /// Previous daily bar.
    #[serde(rename = "prevDailyBar", default)]
    pub prev_daily_bar: Option<RawBar>,
}

/// Snapshot with each present sub-object normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Symbol.
    pub symbol: String,
    /// Most recent trade.
    pub latest_trade: Option<Trade>,
    /// Most recent quote.
    pub latest_quote: Option<Quote>,
    /// Current minute bar.
    pub minute_bar: Option<Bar>,
    /// Current daily bar.
    pub daily_bar: Option<Bar>,
    /// Previous daily bar.
    pub prev_daily_bar: Option<Bar>,
    pub(crate) raw: RawSnapshot,
}

impl Snapshot {
    /// The payload this snapshot was parsed from.
    #[must_use]
    pub const fn raw(&self) -> &RawSnapshot {
        &self.raw
    }
}

/// Latest trade as Alpaca sends it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawLatestTrade {
    /// Symbol.
    pub symbol: String,
    /// The trade.
    pub trade: RawTrade,
}

/// Latest trade for a symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct LatestTrade {
    /// Symbol.
    pub symbol: String,
    /// The trade.
    pub trade: Trade,
    pub(crate) raw: RawLatestTrade,
}

impl LatestTrade {
    /// The payload this latest trade was parsed from.
    #[must_use]
    pub const fn raw(&self) -> &RawLatestTrade {
        &self.raw
    }
}

// =============================================================================
// Pages
// =============================================================================

/// A page of trades as Alpaca sends it. `trades` is `null` on an empty page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPageOfTrades {
    /// Trades in query order.
    #[serde(default)]
    pub trades: Option<Vec<RawTrade>>,
    /// Queried symbol.
    pub symbol: String,
    /// Continuation token.
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// A page of quotes as Alpaca sends it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPageOfQuotes {
    /// Quotes in query order.
    #[serde(default)]
    pub quotes: Option<Vec<RawQuote>>,
    /// Queried symbol.
    pub symbol: String,
    /// Continuation token.
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// A page of bars as Alpaca sends it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPageOfBars {
    /// Bars in query order.
    #[serde(default)]
    pub bars: Option<Vec<RawBar>>,
    /// Queried symbol.
    pub symbol: String,
    /// Continuation token.
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// One page of a paginated collection.
///
/// `next_page_token` is `Some` only while more data exists upstream.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T, R> {
    /// Items in query order.
    pub items: Vec<T>,
    /// Queried symbol.
    pub symbol: String,
    /// Token for the next page; `None` once exhausted.
    pub next_page_token: Option<String>,
    pub(crate) raw: R,
}

impl<T, R> Page<T, R> {
    /// The payload this page was parsed from.
    #[must_use]
    pub const fn raw(&self) -> &R {
        &self.raw
    }

    /// Whether more pages exist.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.next_page_token.is_some()
    }
}

/// Page of trades.
pub type PageOfTrades = Page<Trade, RawPageOfTrades>;
/// Page of quotes.
pub type PageOfQuotes = Page<Quote, RawPageOfQuotes>;
/// Page of bars.
pub type PageOfBars = Page<Bar, RawPageOfBars>;
