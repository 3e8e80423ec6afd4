//! Stream Session
//!
//! One logical Alpaca stream (a market data feed or the account stream)
//! driven by a single background task. The handle only queues commands and
//! registers listeners; the task owns the connection, the state machine and
//! the desired subscription set, so frames are never dispatched against a
//! half-applied subscription change.
//!
//! # Lifecycle
//!
//! 1. [`StreamSession::spawn`] starts the task in `Disconnected`.
//! 2. [`StreamSession::connect`] opens the socket and sends the auth frame.
//! 3. After authentication the whole desired set is replayed in one request.
//! 4. A dropped transport reconnects with exponential backoff; a fatal
//!    server error leaves the session `Disconnected` until the next
//!    `connect`.
//! 5. [`StreamSession::close`] ends the task for good.

mod driver;
mod listeners;

pub use listeners::{Callback, ListenerId};

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use self::driver::{Command, Driver};
use self::listeners::Listeners;
use crate::application::ports::WebSocketConnector;
use crate::domain::entities::{Bar, DataSource, Quote, Trade, TradeUpdate};
use crate::domain::stream::{Channel, StreamError, StreamSource, StreamState, SubscriptionSet};
use crate::infrastructure::alpaca::auth::{AUTH_TIMEOUT, Credentials};
use crate::infrastructure::alpaca::reconnect::ReconnectConfig;
use crate::infrastructure::config::ClientConfig;

// =============================================================================
// Session Configuration
// =============================================================================

/// Settings of one stream session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Stream kind.
    pub source: StreamSource,
    /// WebSocket URL.
    pub url: String,
    /// Credentials sent in the auth frame.
    pub credentials: Credentials,
    /// Reconnection backoff.
    pub reconnect: ReconnectConfig,
    /// How long to wait for the server to accept the auth frame.
    pub auth_timeout: Duration,
}

impl SessionConfig {
    /// Session settings with default backoff and auth timeout.
    #[must_use]
    pub fn new(source: StreamSource, url: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            source,
            url: url.into(),
            credentials,
            reconnect: ReconnectConfig::default(),
            auth_timeout: AUTH_TIMEOUT,
        }
    }

    /// Market data session on the configured feed.
    #[must_use]
    pub fn market_data(config: &ClientConfig) -> Self {
        Self::market_data_feed(config, config.feed)
    }

    /// Market data session on `feed`.
    #[must_use]
    pub fn market_data_feed(config: &ClientConfig, feed: DataSource) -> Self {
        Self::new(
            StreamSource::MarketData(feed),
            config.endpoints.market_data_stream_url(feed),
            config.credentials.clone(),
        )
        .with_reconnect(config.reconnect.clone())
    }

    /// Account (`trade_updates`) session.
    #[must_use]
    pub fn account(config: &ClientConfig) -> Self {
        Self::new(
            StreamSource::Account,
            config.endpoints.account_stream.clone(),
            config.credentials.clone(),
        )
        .with_reconnect(config.reconnect.clone())
    }

    /// Override the reconnection backoff.
    #[must_use]
    pub fn with_reconnect(mut self, reconnect: ReconnectConfig) -> Self {
        self.reconnect = reconnect;
        self
    }

    /// Override the auth timeout.
    #[must_use]
    pub const fn with_auth_timeout(mut self, auth_timeout: Duration) -> Self {
        self.auth_timeout = auth_timeout;
        self
    }
}

// =============================================================================
// Session Handle
// =============================================================================

/// Handle to a running stream session.
///
/// Dropping the handle closes the session.
pub struct StreamSession {
    source: StreamSource,
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<StreamState>,
    subscriptions: watch::Receiver<SubscriptionSet>,
    listeners: Arc<Listeners>,
    cancel: CancellationToken,
}

impl std::fmt::Debug for StreamSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamSession")
            .field("source", &self.source)
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl StreamSession {
    /// Start the session task. Must be called inside a tokio runtime.
    #[must_use]
    pub fn spawn(config: SessionConfig, connector: Arc<dyn WebSocketConnector>) -> Self {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(StreamState::Disconnected);
        let (subscriptions_tx, subscriptions_rx) = watch::channel(SubscriptionSet::new());
        let listeners = Arc::new(Listeners::default());
        let cancel = CancellationToken::new();
        let source = config.source;

        let driver = Driver::new(
            config,
            connector,
            commands_rx,
            state_tx,
            subscriptions_tx,
            Arc::clone(&listeners),
            cancel.clone(),
        );
        tokio::spawn(driver.run());

        Self {
            source,
            commands: commands_tx,
            state: state_rx,
            subscriptions: subscriptions_rx,
            listeners,
            cancel,
        }
    }

    /// Stream this session talks to.
    #[must_use]
    pub const fn source(&self) -> StreamSource {
        self.source
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> StreamState {
        *self.state.borrow()
    }

    /// Receiver following every state change.
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<StreamState> {
        self.state.clone()
    }

    /// The desired subscription set as last applied by the session task.
    #[must_use]
    pub fn subscriptions(&self) -> SubscriptionSet {
        self.subscriptions.borrow().clone()
    }

    /// Open the connection. Ignored while already connected.
    pub fn connect(&self) -> Result<(), StreamError> {
        self.send(Command::Connect)
    }

    /// Add symbols to `channel`.
    ///
    /// Sent right away when authenticated, otherwise replayed after the next
    /// authentication.
    pub fn subscribe<I, S>(&self, channel: Channel, symbols: I) -> Result<(), StreamError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.check_channel(channel)?;
        self.send(Command::Subscribe {
            channel,
            symbols: symbols.into_iter().map(Into::into).collect(),
        })
    }

    /// Remove symbols from `channel`.
    pub fn unsubscribe<I, S>(&self, channel: Channel, symbols: I) -> Result<(), StreamError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.check_channel(channel)?;
        self.send(Command::Unsubscribe {
            channel,
            symbols: symbols.into_iter().map(Into::into).collect(),
        })
    }

    /// Replace the credentials used by the next authentication.
    pub fn set_credentials(&self, credentials: Credentials) -> Result<(), StreamError> {
        self.send(Command::SetCredentials(credentials))
    }

    /// Close the session and wait until the task has stopped.
    ///
    /// Cancels any pending reconnect; no connection is attempted afterwards.
    pub async fn close(&self) {
        self.cancel.cancel();
        let mut state = self.state.clone();
        // Err means the task is already gone.
        let _ = state.wait_for(|s| s.is_closed()).await;
    }

    // -------------------------------------------------------------------------
    // Listeners
    // -------------------------------------------------------------------------

    /// Listen to trades of `symbol` (or `"*"`).
    pub fn on_trade<F>(&self, symbol: impl Into<String>, f: F) -> Result<ListenerId, StreamError>
    where
        F: Fn(&Trade) + Send + Sync + 'static,
    {
        self.check_channel(Channel::Trades)?;
        Ok(self.listeners.on_trade(symbol.into(), Arc::new(f)))
    }

    /// Listen to quotes of `symbol` (or `"*"`).
    pub fn on_quote<F>(&self, symbol: impl Into<String>, f: F) -> Result<ListenerId, StreamError>
    where
        F: Fn(&Quote) + Send + Sync + 'static,
    {
        self.check_channel(Channel::Quotes)?;
        Ok(self.listeners.on_quote(symbol.into(), Arc::new(f)))
    }

    /// Listen to minute bars of `symbol` (or `"*"`).
    pub fn on_bar<F>(&self, symbol: impl Into<String>, f: F) -> Result<ListenerId, StreamError>
    where
        F: Fn(&Bar) + Send + Sync + 'static,
    {
        self.check_channel(Channel::Bars)?;
        Ok(self.listeners.on_bar(symbol.into(), Arc::new(f)))
    }

    /// Listen to order events for `symbol` (or `"*"`).
    pub fn on_trade_update<F>(
        &self,
        symbol: impl Into<String>,
        f: F,
    ) -> Result<ListenerId, StreamError>
    where
        F: Fn(&TradeUpdate) + Send + Sync + 'static,
    {
        self.check_channel(Channel::TradeUpdates)?;
        Ok(self.listeners.on_trade_update(symbol.into(), Arc::new(f)))
    }

    /// Listen to every error the session reports.
    pub fn on_error<F>(&self, f: F) -> ListenerId
    where
        F: Fn(&StreamError) + Send + Sync + 'static,
    {
        self.listeners.on_error(Arc::new(f))
    }

    /// Remove a listener. Returns whether it was registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    // -------------------------------------------------------------------------
    // Internal
    // -------------------------------------------------------------------------

    const fn check_channel(&self, channel: Channel) -> Result<(), StreamError> {
        if self.source.supports(channel) {
            Ok(())
        } else {
            Err(StreamError::ChannelNotSupported {
                channel,
                stream: self.source,
            })
        }
    }

    fn send(&self, command: Command) -> Result<(), StreamError> {
        self.commands
            .send(command)
            .map_err(|_| StreamError::SessionClosed)
    }
}

impl Drop for StreamSession {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
