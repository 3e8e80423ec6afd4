//! Session task.
//!
//! Owns the connection and processes one input at a time: a caller command,
//! an inbound frame, the auth deadline or cancellation.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use super::SessionConfig;
use super::listeners::{Listeners, Registry};
use crate::application::ports::{TransportError, WebSocketConnection, WebSocketConnector};
use crate::domain::normalize::{self, NormalizeError};
use crate::domain::stream::{
    AuthError, Channel, SessionEvent, StreamError, StreamSource, StreamState, SubscriptionSet,
};
use crate::infrastructure::alpaca::auth::Credentials;
use crate::infrastructure::alpaca::codec;
use crate::infrastructure::alpaca::messages::{
    ErrorMessage, InboundMessage, ListenRequest, SubscriptionRequest,
};
use crate::infrastructure::alpaca::reconnect::ReconnectPolicy;

/// Requests from the session handle.
#[derive(Debug)]
pub(super) enum Command {
    Connect,
    Subscribe {
        channel: Channel,
        symbols: Vec<String>,
    },
    Unsubscribe {
        channel: Channel,
        symbols: Vec<String>,
    },
    SetCredentials(Credentials),
}

/// Why a connection ended.
enum Exit {
    /// The session was closed.
    Closed,
    /// The transport dropped; reconnect.
    Lost(StreamError),
    /// The server refused us; wait for the caller.
    Fatal(StreamError),
}

type Step = Result<(), Exit>;

pub(super) struct Driver {
    config: SessionConfig,
    connector: Arc<dyn WebSocketConnector>,
    commands: mpsc::UnboundedReceiver<Command>,
    state_tx: watch::Sender<StreamState>,
    subscriptions_tx: watch::Sender<SubscriptionSet>,
    listeners: Arc<Listeners>,
    cancel: CancellationToken,
    policy: ReconnectPolicy,
    desired: SubscriptionSet,
    state: StreamState,
}

impl Driver {
    pub(super) fn new(
        config: SessionConfig,
        connector: Arc<dyn WebSocketConnector>,
        commands: mpsc::UnboundedReceiver<Command>,
        state_tx: watch::Sender<StreamState>,
        subscriptions_tx: watch::Sender<SubscriptionSet>,
        listeners: Arc<Listeners>,
        cancel: CancellationToken,
    ) -> Self {
        let policy = ReconnectPolicy::new(config.reconnect.clone());
        Self {
            config,
            connector,
            commands,
            state_tx,
            subscriptions_tx,
            listeners,
            cancel,
            policy,
            desired: SubscriptionSet::new(),
            state: StreamState::Disconnected,
        }
    }

    pub(super) async fn run(mut self) {
        while self.idle().await {
            self.connect_loop().await;
        }
        self.apply(SessionEvent::CloseRequested);
        tracing::info!(stream = %self.config.source, "Stream session closed");
    }

    // =========================================================================
    // Offline
    // =========================================================================

    /// Wait in `Disconnected` for a connect request. `false` once closed.
    async fn idle(&mut self) -> bool {
        loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => return false,
                command = self.commands.recv() => match command {
                    Some(Command::Connect) => return true,
                    Some(command) => self.update_offline(command),
                    None => return false,
                },
            }
        }
    }

    /// Wait out a backoff delay. `false` once closed.
    async fn backoff(&mut self, delay: Duration) -> bool {
        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => return false,
                () = &mut sleep => return true,
                command = self.commands.recv() => match command {
                    Some(Command::Connect) => return true,
                    Some(command) => self.update_offline(command),
                    None => return false,
                },
            }
        }
    }

    fn update_offline(&mut self, command: Command) {
        match command {
            Command::Connect => {}
            Command::Subscribe { channel, symbols } => {
                self.desired.insert(channel, symbols);
                self.publish_subscriptions();
            }
            Command::Unsubscribe { channel, symbols } => {
                self.desired.remove(channel, &symbols);
                self.publish_subscriptions();
            }
            Command::SetCredentials(credentials) => self.config.credentials = credentials,
        }
    }

    async fn connect_loop(&mut self) {
        let stream = self.config.source;

        loop {
            self.apply(SessionEvent::ConnectRequested);

            match self.connect_and_run().await {
                Exit::Closed => return,
                Exit::Fatal(error) => {
                    tracing::error!(stream = %stream, error = %error, "Stream stopped");
                    self.policy.reset();
                    self.listeners.emit_error(&error);
                    return;
                }
                Exit::Lost(error) => {
                    tracing::warn!(stream = %stream, error = %error, "Stream connection lost");
                    self.listeners.emit_error(&error);

                    let Some(delay) = self.policy.next_delay() else {
                        let error =
                            StreamError::MaxReconnectAttemptsExceeded(self.policy.attempt_count());
                        tracing::error!(stream = %stream, error = %error, "Giving up on stream");
                        self.policy.reset();
                        self.listeners.emit_error(&error);
                        return;
                    };

                    self.apply(SessionEvent::BackoffStarted);
                    tracing::info!(
                        stream = %stream,
                        attempt = self.policy.attempt_count(),
                        delay_ms = delay.as_millis(),
                        "Reconnecting to stream"
                    );

                    if !self.backoff(delay).await {
                        return;
                    }
                }
            }
        }
    }

    // =========================================================================
    // Online
    // =========================================================================

    async fn connect_and_run(&mut self) -> Exit {
        tracing::info!(stream = %self.config.source, url = %self.config.url, "Connecting to stream");

        let connected = tokio::select! {
            biased;
            () = self.cancel.cancelled() => return Exit::Closed,
            result = self.connector.connect(&self.config.url) => result,
        };

        let mut connection = match connected {
            Ok(connection) => connection,
            Err(e) => {
                self.apply(SessionEvent::TransportLost);
                return Exit::Lost(StreamError::Transport(e.to_string()));
            }
        };
        self.apply(SessionEvent::TransportOpened);

        let exit = self.drive(connection.as_mut()).await;

        if let Err(e) = connection.close().await {
            tracing::debug!(error = %e, "Error closing stream connection");
        }
        if matches!(exit, Exit::Lost(_)) {
            self.apply(SessionEvent::TransportLost);
        }
        exit
    }

    async fn drive(&mut self, connection: &mut dyn WebSocketConnection) -> Exit {
        // Alpaca expects the auth frame right after the handshake.
        tracing::debug!(stream = %self.config.source, "Sending authentication");
        let credentials = self.config.credentials.clone();
        if let Err(error) = send_auth(connection, self.config.source, &credentials).await {
            return Exit::Lost(error);
        }

        let deadline = tokio::time::sleep(self.config.auth_timeout);
        tokio::pin!(deadline);

        loop {
            let authenticating = self.state == StreamState::Authenticating;

            let step = tokio::select! {
                biased;
                () = self.cancel.cancelled() => return Exit::Closed,
                () = &mut deadline, if authenticating => {
                    self.apply(SessionEvent::AuthRejected);
                    return Exit::Fatal(AuthError::Timeout.into());
                }
                command = self.commands.recv() => match command {
                    Some(command) => self.handle_command(connection, command).await,
                    None => return Exit::Closed,
                },
                frame = connection.next_frame() => match frame {
                    Some(Ok(text)) => self.handle_frame(connection, &text).await,
                    Some(Err(e)) => Err(Exit::Lost(StreamError::Transport(e.to_string()))),
                    None => Err(Exit::Lost(StreamError::Transport(
                        TransportError::Closed.to_string(),
                    ))),
                },
            };

            if let Err(exit) = step {
                return exit;
            }
        }
    }

    async fn handle_command(
        &mut self,
        connection: &mut dyn WebSocketConnection,
        command: Command,
    ) -> Step {
        match command {
            Command::Connect => {
                tracing::debug!(stream = %self.config.source, "Already connected");
            }
            Command::SetCredentials(credentials) => {
                self.config.credentials = credentials;
                tracing::debug!("Credentials replaced; used from the next authentication");
            }
            Command::Subscribe { channel, symbols } => {
                let had_channel = !self.desired.symbols(channel).is_empty();
                let added = self.desired.insert(channel, symbols);
                self.publish_subscriptions();

                if added.is_empty() || !self.state.is_authenticated() {
                    return Ok(());
                }

                tracing::debug!(channel = %channel, symbols = ?added, "Subscribing");
                match self.config.source {
                    StreamSource::MarketData(_) => {
                        let request = SubscriptionRequest::subscribe().with(channel, added);
                        send(connection, &request).await.map_err(Exit::Lost)?;
                    }
                    StreamSource::Account => {
                        if had_channel {
                            return Ok(());
                        }
                        send(connection, &ListenRequest::trade_updates())
                            .await
                            .map_err(Exit::Lost)?;
                    }
                }
                self.apply(SessionEvent::SubscribeSent);
            }
            Command::Unsubscribe { channel, symbols } => {
                let removed = self.desired.remove(channel, &symbols);
                self.publish_subscriptions();

                if removed.is_empty() || !self.state.is_authenticated() {
                    return Ok(());
                }

                tracing::debug!(channel = %channel, symbols = ?removed, "Unsubscribing");
                match self.config.source {
                    StreamSource::MarketData(_) => {
                        let request = SubscriptionRequest::unsubscribe().with(channel, removed);
                        send(connection, &request).await.map_err(Exit::Lost)?;
                    }
                    StreamSource::Account => {
                        if self.desired.symbols(channel).is_empty() {
                            send(connection, &ListenRequest::none())
                                .await
                                .map_err(Exit::Lost)?;
                        }
                    }
                }
                if self.desired.is_empty() {
                    self.apply(SessionEvent::SubscriptionsCleared);
                }
            }
        }
        Ok(())
    }

    async fn handle_frame(&mut self, connection: &mut dyn WebSocketConnection, text: &str) -> Step {
        let messages = match codec::decode(text) {
            Ok(messages) => messages,
            Err(e) => {
                tracing::warn!(error = %e, "Undecodable stream frame");
                self.listeners.emit_error(&StreamError::Codec(e.to_string()));
                return Ok(());
            }
        };

        for message in messages {
            match message {
                Ok(message) => self.handle_message(connection, message).await?,
                Err(e) => {
                    tracing::warn!(error = %e, "Undecodable stream message");
                    self.listeners.emit_error(&StreamError::Codec(e.to_string()));
                }
            }
        }
        Ok(())
    }

    async fn handle_message(
        &mut self,
        connection: &mut dyn WebSocketConnection,
        message: InboundMessage,
    ) -> Step {
        let listeners = Arc::clone(&self.listeners);

        match message {
            InboundMessage::Success(success) => {
                if success.is_authenticated() {
                    self.on_authenticated(connection).await?;
                } else {
                    tracing::debug!(msg = %success.msg, "Stream says hello");
                }
            }
            InboundMessage::Authorization(authorization) => {
                if authorization.is_authorized() {
                    self.on_authenticated(connection).await?;
                } else {
                    self.reject();
                    return Err(Exit::Fatal(
                        AuthError::Unauthorized(authorization.status).into(),
                    ));
                }
            }
            InboundMessage::Error(error) => self.on_server_error(&error)?,
            InboundMessage::Subscription(ack) => {
                tracing::debug!(
                    trades = ?ack.trades,
                    quotes = ?ack.quotes,
                    bars = ?ack.bars,
                    "Subscription acknowledged"
                );
                self.acknowledge();
            }
            InboundMessage::Listening(listening) => {
                tracing::debug!(streams = ?listening.streams, "Listening acknowledged");
                self.acknowledge();
            }
            InboundMessage::Trade(raw) => {
                let symbol = raw.symbol.clone();
                self.dispatch(
                    Channel::Trades,
                    symbol.as_deref(),
                    raw,
                    normalize::trade,
                    &listeners.trades,
                );
            }
            InboundMessage::Quote(raw) => {
                let symbol = raw.symbol.clone();
                self.dispatch(
                    Channel::Quotes,
                    symbol.as_deref(),
                    raw,
                    normalize::quote,
                    &listeners.quotes,
                );
            }
            InboundMessage::Bar(raw) => {
                let symbol = raw.symbol.clone();
                self.dispatch(
                    Channel::Bars,
                    symbol.as_deref(),
                    raw,
                    normalize::bar,
                    &listeners.bars,
                );
            }
            InboundMessage::TradeUpdate(raw) => {
                let symbol = raw.order.symbol.clone();
                self.dispatch(
                    Channel::TradeUpdates,
                    Some(&symbol),
                    *raw,
                    normalize::trade_update,
                    &listeners.trade_updates,
                );
            }
            InboundMessage::Other(kind) => {
                tracing::trace!(kind = %kind, "Ignoring stream message");
            }
        }
        Ok(())
    }

    async fn on_authenticated(&mut self, connection: &mut dyn WebSocketConnection) -> Step {
        if self.state != StreamState::Authenticating {
            tracing::trace!(state = %self.state, "Ignoring repeated authentication");
            return Ok(());
        }

        self.apply(SessionEvent::AuthAccepted);
        self.policy.reset();
        tracing::info!(stream = %self.config.source, "Stream authenticated");

        let sent = match self.config.source {
            StreamSource::MarketData(_) => {
                let request = SubscriptionRequest::replay(&self.desired);
                if request.is_empty() {
                    false
                } else {
                    send(connection, &request).await.map_err(Exit::Lost)?;
                    true
                }
            }
            StreamSource::Account => {
                if self.desired.symbols(Channel::TradeUpdates).is_empty() {
                    false
                } else {
                    send(connection, &ListenRequest::trade_updates())
                        .await
                        .map_err(Exit::Lost)?;
                    true
                }
            }
        };

        if sent {
            tracing::debug!(entries = self.desired.len(), "Subscriptions replayed");
            self.apply(SessionEvent::SubscribeSent);
        }
        Ok(())
    }

    fn on_server_error(&mut self, message: &ErrorMessage) -> Step {
        let error = StreamError::from_server(message.code, &message.msg);

        if error.is_fatal() {
            self.reject();
            return Err(Exit::Fatal(error));
        }

        tracing::warn!(code = message.code, msg = %message.msg, "Stream error");
        self.listeners.emit_error(&error);
        Ok(())
    }

    /// Leave the connection after a fatal server answer.
    fn reject(&mut self) {
        let event = if self.state == StreamState::Authenticating {
            SessionEvent::AuthRejected
        } else {
            SessionEvent::ProtocolRejected
        };
        self.apply(event);
    }

    fn acknowledge(&mut self) {
        if matches!(
            self.state,
            StreamState::Subscribing | StreamState::Subscribed
        ) {
            self.apply(SessionEvent::SubscriptionAcknowledged);
        }
    }

    fn dispatch<R, T>(
        &self,
        channel: Channel,
        symbol: Option<&str>,
        raw: R,
        normalize: fn(R) -> Result<T, NormalizeError>,
        registry: &Registry<T>,
    ) {
        if !self.state.accepts_data() {
            tracing::warn!(channel = %channel, state = %self.state, "Dropping data frame before authentication");
            return;
        }

        let symbol = symbol.unwrap_or_default();
        if !self.desired.wants(channel, symbol) {
            tracing::trace!(channel = %channel, symbol = %symbol, "Dropping unsubscribed frame");
            return;
        }

        match normalize(raw) {
            Ok(value) => {
                registry.dispatch(symbol, &value);
            }
            Err(e) => {
                tracing::warn!(channel = %channel, error = %e, "Failed to normalize stream frame");
                self.listeners.emit_error(&e.into());
            }
        }
    }

    // =========================================================================
    // State
    // =========================================================================

    fn apply(&mut self, event: SessionEvent) {
        match self.state.on(event) {
            Ok(next) => {
                if next != self.state {
                    tracing::debug!(
                        stream = %self.config.source,
                        from = %self.state,
                        to = %next,
                        event = ?event,
                        "Stream state changed"
                    );
                }
                self.state = next;
                self.state_tx.send_if_modified(|current| {
                    if *current == next {
                        false
                    } else {
                        *current = next;
                        true
                    }
                });
            }
            Err(e) => tracing::warn!(error = %e, "Ignoring stream event"),
        }
    }

    fn publish_subscriptions(&self) {
        self.subscriptions_tx.send_replace(self.desired.clone());
    }
}

async fn send<T: Serialize + Sync>(
    connection: &mut dyn WebSocketConnection,
    message: &T,
) -> Result<(), StreamError> {
    let frame = codec::encode(message).map_err(|e| StreamError::Codec(e.to_string()))?;
    connection
        .send(frame)
        .await
        .map_err(|e| StreamError::Transport(e.to_string()))
}

async fn send_auth(
    connection: &mut dyn WebSocketConnection,
    source: StreamSource,
    credentials: &Credentials,
) -> Result<(), StreamError> {
    match source {
        StreamSource::MarketData(_) => send(connection, &credentials.market_data_auth()).await,
        StreamSource::Account => send(connection, &credentials.account_auth()).await,
    }
}
