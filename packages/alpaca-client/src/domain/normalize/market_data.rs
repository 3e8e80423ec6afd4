//! Normalization of market data entities.

use super::{NormalizeError, timestamp};
use crate::domain::entities::{
    Bar, LatestTrade, Page, PageOfBars, PageOfQuotes, PageOfTrades, Quote, RawBar, RawLatestTrade,
    RawPageOfBars, RawPageOfQuotes, RawPageOfTrades, RawQuote, RawSnapshot, RawTrade, Snapshot,
    Trade,
};

/// The item's own `S`, else the enclosing object's symbol.
fn resolve_symbol(own: Option<&str>, enclosing: Option<&str>) -> Result<String, NormalizeError> {
    own.or(enclosing)
        .map(str::to_owned)
        .ok_or(NormalizeError::MissingField("S"))
}

/// A continuation token is present only while more data exists.
fn page_token(token: Option<&String>) -> Option<String> {
    token.filter(|t| !t.is_empty()).cloned()
}

// =============================================================================
// Trades / Quotes / Bars
// =============================================================================

fn trade_in(raw: RawTrade, enclosing: Option<&str>) -> Result<Trade, NormalizeError> {
    Ok(Trade {
        symbol: resolve_symbol(raw.symbol.as_deref(), enclosing)?,
        timestamp: timestamp("t", &raw.timestamp)?,
        exchange: raw.exchange.clone(),
        price: raw.price,
        size: raw.size,
        conditions: raw.conditions.clone().unwrap_or_default(),
        id: raw.id,
        tape: raw.tape.clone(),
        raw,
    })
}

fn quote_in(raw: RawQuote, enclosing: Option<&str>) -> Result<Quote, NormalizeError> {
    Ok(Quote {
        symbol: resolve_symbol(raw.symbol.as_deref(), enclosing)?,
        timestamp: timestamp("t", &raw.timestamp)?,
        ask_exchange: raw.ask_exchange.clone(),
        ask_price: raw.ask_price,
        ask_size: raw.ask_size,
        bid_exchange: raw.bid_exchange.clone(),
        bid_price: raw.bid_price,
        bid_size: raw.bid_size,
        conditions: raw.conditions.clone().unwrap_or_default(),
        raw,
    })
}

fn bar_in(raw: RawBar, enclosing: Option<&str>) -> Result<Bar, NormalizeError> {
    Ok(Bar {
        symbol: resolve_symbol(raw.symbol.as_deref(), enclosing)?,
        timestamp: timestamp("t", &raw.timestamp)?,
        open: raw.open,
        high: raw.high,
        low: raw.low,
        close: raw.close,
        volume: raw.volume,
        trade_count: raw.trade_count,
        vwap: raw.vwap,
        raw,
    })
}

/// Normalize a trade. The trade must carry its symbol (`S`).
pub fn trade(raw: RawTrade) -> Result<Trade, NormalizeError> {
    trade_in(raw, None)
}

/// Normalize a list of trades, preserving order.
pub fn trades(raw: Vec<RawTrade>) -> Result<Vec<Trade>, NormalizeError> {
    raw.into_iter().map(trade).collect()
}

/// Normalize a quote. The quote must carry its symbol (`S`).
pub fn quote(raw: RawQuote) -> Result<Quote, NormalizeError> {
    quote_in(raw, None)
}

/// Normalize a list of quotes, preserving order.
pub fn quotes(raw: Vec<RawQuote>) -> Result<Vec<Quote>, NormalizeError> {
    raw.into_iter().map(quote).collect()
}

/// Normalize a bar. The bar must carry its symbol (`S`).
pub fn bar(raw: RawBar) -> Result<Bar, NormalizeError> {
    bar_in(raw, None)
}

/// Normalize a list of bars, preserving order.
pub fn bars(raw: Vec<RawBar>) -> Result<Vec<Bar>, NormalizeError> {
    raw.into_iter().map(bar).collect()
}

// =============================================================================
// Snapshots / Latest Trade
// =============================================================================

/// Normalize a snapshot. Each sub-object is normalized on its own; a `null`
/// sub-object stays `None`.
pub fn snapshot(raw: RawSnapshot) -> Result<Snapshot, NormalizeError> {
    let symbol = raw
        .symbol
        .clone()
        .ok_or(NormalizeError::MissingField("symbol"))?;
    let enclosing = Some(symbol.as_str());

    Ok(Snapshot {
        latest_trade: raw
            .latest_trade
            .clone()
            .map(|t| trade_in(t, enclosing))
            .transpose()?,
        latest_quote: raw
            .latest_quote
            .clone()
            .map(|q| quote_in(q, enclosing))
            .transpose()?,
        minute_bar: raw
            .minute_bar
            .clone()
            .map(|b| bar_in(b, enclosing))
            .transpose()?,
        daily_bar: raw
            .daily_bar
            .clone()
            .map(|b| bar_in(b, enclosing))
            .transpose()?,
        prev_daily_bar: raw
            .prev_daily_bar
            .clone()
            .map(|b| bar_in(b, enclosing))
            .transpose()?,
        symbol,
        raw,
    })
}

/// Normalize a list of snapshots, preserving order.
pub fn snapshots(raw: Vec<RawSnapshot>) -> Result<Vec<Snapshot>, NormalizeError> {
    raw.into_iter().map(snapshot).collect()
}

/// Normalize the latest trade of a symbol.
pub fn latest_trade(raw: RawLatestTrade) -> Result<LatestTrade, NormalizeError> {
    Ok(LatestTrade {
        symbol: raw.symbol.clone(),
        trade: trade_in(raw.trade.clone(), Some(&raw.symbol))?,
        raw,
    })
}

// =============================================================================
// Pages
// =============================================================================

/// Normalize a page of trades. Items without `S` take the page symbol.
pub fn page_of_trades(raw: RawPageOfTrades) -> Result<PageOfTrades, NormalizeError> {
    let items = raw
        .trades
        .iter()
        .flatten()
        .cloned()
        .map(|t| trade_in(t, Some(&raw.symbol)))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Page {
        items,
        symbol: raw.symbol.clone(),
        next_page_token: page_token(raw.next_page_token.as_ref()),
        raw,
    })
}

/// Normalize a page of quotes. Items without `S` take the page symbol.
pub fn page_of_quotes(raw: RawPageOfQuotes) -> Result<PageOfQuotes, NormalizeError> {
    let items = raw
        .quotes
        .iter()
        .flatten()
        .cloned()
        .map(|q| quote_in(q, Some(&raw.symbol)))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Page {
        items,
        symbol: raw.symbol.clone(),
        next_page_token: page_token(raw.next_page_token.as_ref()),
        raw,
    })
}

/// Normalize a page of bars. Items without `S` take the page symbol.
pub fn page_of_bars(raw: RawPageOfBars) -> Result<PageOfBars, NormalizeError> {
    let items = raw
        .bars
        .iter()
        .flatten()
        .cloned()
        .map(|b| bar_in(b, Some(&raw.symbol)))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Page {
        items,
        symbol: raw.symbol.clone(),
        next_page_token: page_token(raw.next_page_token.as_ref()),
        raw,
    })
}
