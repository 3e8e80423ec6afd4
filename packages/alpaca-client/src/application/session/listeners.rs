//! Listener registry.
//!
//! Callbacks are keyed by symbol per channel; [`WILDCARD`] matches every
//! symbol. Dispatch snapshots the matching callbacks before invoking them,
//! so a listener may register or remove listeners without deadlocking.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::domain::entities::{Bar, Quote, Trade, TradeUpdate};
use crate::domain::stream::{StreamError, WILDCARD};

/// Callback invoked with each dispatched value.
pub type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Handle returned on registration, used to remove the listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Entry<T> {
    id: ListenerId,
    symbol: String,
    callback: Callback<T>,
}

pub(crate) struct Registry<T> {
    entries: RwLock<Vec<Entry<T>>>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }
}

impl<T> Registry<T> {
    fn add(&self, id: ListenerId, symbol: String, callback: Callback<T>) {
        self.entries.write().push(Entry {
            id,
            symbol,
            callback,
        });
    }

    fn remove(&self, id: ListenerId) -> bool {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        entries.len() != before
    }

    fn matching(&self, symbol: &str) -> Vec<Callback<T>> {
        self.entries
            .read()
            .iter()
            .filter(|entry| entry.symbol == symbol || entry.symbol == WILDCARD)
            .map(|entry| Arc::clone(&entry.callback))
            .collect()
    }

    /// Invoke every listener for `symbol`, in registration order.
    pub(crate) fn dispatch(&self, symbol: &str, value: &T) -> usize {
        let callbacks = self.matching(symbol);
        for callback in &callbacks {
            callback(value);
        }
        callbacks.len()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.read().len()
    }
}

/// Every listener of one session.
#[derive(Default)]
pub(crate) struct Listeners {
    next_id: AtomicU64,
    pub(crate) trades: Registry<Trade>,
    pub(crate) quotes: Registry<Quote>,
    pub(crate) bars: Registry<Bar>,
    pub(crate) trade_updates: Registry<TradeUpdate>,
    pub(crate) errors: Registry<StreamError>,
}

impl Listeners {
    fn next_id(&self) -> ListenerId {
        ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    pub(crate) fn on_trade(&self, symbol: String, callback: Callback<Trade>) -> ListenerId {
        let id = self.next_id();
        self.trades.add(id, symbol, callback);
        id
    }

    pub(crate) fn on_quote(&self, symbol: String, callback: Callback<Quote>) -> ListenerId {
        let id = self.next_id();
        self.quotes.add(id, symbol, callback);
        id
    }

    pub(crate) fn on_bar(&self, symbol: String, callback: Callback<Bar>) -> ListenerId {
        let id = self.next_id();
        self.bars.add(id, symbol, callback);
        id
    }

    pub(crate) fn on_trade_update(
        &self,
        symbol: String,
        callback: Callback<TradeUpdate>,
    ) -> ListenerId {
        let id = self.next_id();
        self.trade_updates.add(id, symbol, callback);
        id
    }

    pub(crate) fn on_error(&self, callback: Callback<StreamError>) -> ListenerId {
        let id = self.next_id();
        self.errors.add(id, WILDCARD.to_string(), callback);
        id
    }

    pub(crate) fn emit_error(&self, error: &StreamError) {
        if self.errors.dispatch(WILDCARD, error) == 0 {
            tracing::debug!(error = %error, "Stream error with no error listener");
        }
    }

    /// Remove a listener from whichever registry holds it.
    pub(crate) fn remove(&self, id: ListenerId) -> bool {
        self.trades.remove(id)
            || self.quotes.remove(id)
            || self.bars.remove(id)
            || self.trade_updates.remove(id)
            || self.errors.remove(id)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    fn counter() -> (Arc<AtomicUsize>, Callback<u32>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&hits);
        let callback: Callback<u32> = Arc::new(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        (hits, callback)
    }

    #[test]
    fn exact_and_wildcard_both_fire() {
        let registry = Registry::<u32>::default();
        let (exact, exact_cb) = counter();
        let (wild, wild_cb) = counter();
        let (other, other_cb) = counter();
        registry.add(ListenerId(0), "AAPL".into(), exact_cb);
        registry.add(ListenerId(1), WILDCARD.into(), wild_cb);
        registry.add(ListenerId(2), "MSFT".into(), other_cb);

        assert_eq!(registry.dispatch("AAPL", &1), 2);
        assert_eq!(exact.load(Ordering::SeqCst), 1);
        assert_eq!(wild.load(Ordering::SeqCst), 1);
        assert_eq!(other.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn removed_listener_stops_firing() {
        let listeners = Listeners::default();
        let hits = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&hits);
        let id = listeners.on_error(Arc::new(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        }));

        listeners.emit_error(&StreamError::SessionClosed);
        assert!(listeners.remove(id));
        assert!(!listeners.remove(id));
        listeners.emit_error(&StreamError::SessionClosed);

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(listeners.errors.len(), 0);
    }

    #[test]
    fn listener_may_register_during_dispatch() {
        let registry = Arc::new(Registry::<u32>::default());
        let inner = Arc::clone(&registry);
        registry.add(
            ListenerId(0),
            WILDCARD.into(),
            Arc::new(move |_| inner.add(ListenerId(9), "X".into(), Arc::new(|_| {}))),
        );

        registry.dispatch("X", &0);
        assert_eq!(registry.len(), 2);
    }
}
