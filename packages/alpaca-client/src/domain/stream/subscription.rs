//! Desired subscription set.
//!
//! The set the caller asked for, per channel, independent of what the server
//! has acknowledged. It survives reconnects and is replayed in full after
//! every successful authentication.
//!
//! Symbols keep their insertion order so a replay sends exactly what was
//! asked for, in the order it was asked for.

use super::Channel;

/// Symbol matching every symbol on a channel.
pub const WILDCARD: &str = "*";

/// Symbols wanted on each channel.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SubscriptionSet {
    trades: Vec<String>,
    quotes: Vec<String>,
    bars: Vec<String>,
    trade_updates: Vec<String>,
}

impl SubscriptionSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    const fn symbols_mut(&mut self, channel: Channel) -> &mut Vec<String> {
        match channel {
            Channel::Trades => &mut self.trades,
            Channel::Quotes => &mut self.quotes,
            Channel::Bars => &mut self.bars,
            Channel::TradeUpdates => &mut self.trade_updates,
        }
    }

    /// Symbols wanted on `channel`, in insertion order.
    #[must_use]
    pub fn symbols(&self, channel: Channel) -> &[String] {
        match channel {
            Channel::Trades => &self.trades,
            Channel::Quotes => &self.quotes,
            Channel::Bars => &self.bars,
            Channel::TradeUpdates => &self.trade_updates,
        }
    }

    /// Add symbols to `channel`.
    ///
    /// Returns the symbols that were not already present.
    pub fn insert<I, S>(&mut self, channel: Channel, symbols: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let current = self.symbols_mut(channel);
        let mut added = Vec::new();

        for symbol in symbols {
            let symbol = symbol.into();
            if current.contains(&symbol) {
                continue;
            }
            current.push(symbol.clone());
            added.push(symbol);
        }

        added
    }

    /// Remove symbols from `channel`.
    ///
    /// Returns the symbols that were present.
    pub fn remove<S: AsRef<str>>(&mut self, channel: Channel, symbols: &[S]) -> Vec<String> {
        let current = self.symbols_mut(channel);
        let mut removed = Vec::new();

        current.retain(|existing| {
            let drop = symbols.iter().any(|s| s.as_ref() == existing);
            if drop {
                removed.push(existing.clone());
            }
            !drop
        });

        removed
    }

    /// Whether frames for `symbol` on `channel` are wanted.
    ///
    /// A [`WILDCARD`] entry matches every symbol.
    #[must_use]
    pub fn wants(&self, channel: Channel, symbol: &str) -> bool {
        self.symbols(channel)
            .iter()
            .any(|s| s == symbol || s == WILDCARD)
    }

    /// Whether no channel has any symbol.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        Channel::all().iter().all(|c| self.symbols(*c).is_empty())
    }

    /// Whether any market data channel has a symbol.
    #[must_use]
    pub fn has_market_data(&self) -> bool {
        !(self.trades.is_empty() && self.quotes.is_empty() && self.bars.is_empty())
    }

    /// Total number of (channel, symbol) entries.
    #[must_use]
    pub fn len(&self) -> usize {
        Channel::all().iter().map(|c| self.symbols(*c).len()).sum()
    }

    /// Drop every symbol.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
