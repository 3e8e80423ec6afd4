//! Stream Session Integration Tests
//!
//! Drives a session over a scripted in-memory WebSocket: authentication,
//! subscription replay across reconnects, dispatch filtering, fatal and
//! non-fatal server errors, and close during backoff.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};
use test_case::test_case;
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};
use tokio_test::{assert_err, assert_ok};

use alpaca_client::{
    AuthError, Channel, Credentials, DataSource, ReconnectConfig, SessionConfig, StreamError,
    StreamSession, StreamSource, StreamState, Trade, TradeUpdate, TradeUpdateEvent,
    TransportError, WebSocketConnection, WebSocketConnector,
};

const WAIT: Duration = Duration::from_secs(5);

// =============================================================================
// Scripted WebSocket
// =============================================================================

enum Frame {
    Text(String),
    Drop,
}

/// Server side of one scripted connection.
struct MockServer {
    frames: mpsc::UnboundedSender<Frame>,
    sent: mpsc::UnboundedReceiver<String>,
}

impl MockServer {
    fn push(&self, text: &str) {
        self.frames.send(Frame::Text(text.to_owned())).unwrap();
    }

    fn drop_connection(&self) {
        self.frames.send(Frame::Drop).unwrap();
    }

    async fn next_sent(&mut self) -> Value {
        let text = timeout(WAIT, self.sent.recv())
            .await
            .expect("timed out waiting for a client frame")
            .expect("connection gone");
        serde_json::from_str(&text).unwrap()
    }
}

struct MockConnection {
    frames: mpsc::UnboundedReceiver<Frame>,
    sent: mpsc::UnboundedSender<String>,
}

#[async_trait]
impl WebSocketConnection for MockConnection {
    async fn send(&mut self, text: String) -> Result<(), TransportError> {
        self.sent.send(text).map_err(|_| TransportError::Closed)
    }

    async fn next_frame(&mut self) -> Option<Result<String, TransportError>> {
        match self.frames.recv().await {
            Some(Frame::Text(text)) => Some(Ok(text)),
            Some(Frame::Drop) | None => None,
        }
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        Ok(())
    }
}

/// Hands out prepared connections in order, refusing once they run out.
#[derive(Default)]
struct MockConnector {
    pending: Mutex<VecDeque<MockConnection>>,
    attempts: AtomicUsize,
}

impl MockConnector {
    fn scripted(connections: usize) -> (Arc<Self>, Vec<MockServer>) {
        let connector = Arc::new(Self::default());
        let mut servers = Vec::new();

        for _ in 0..connections {
            let (frames_tx, frames_rx) = mpsc::unbounded_channel();
            let (sent_tx, sent_rx) = mpsc::unbounded_channel();
            connector.pending.lock().push_back(MockConnection {
                frames: frames_rx,
                sent: sent_tx,
            });
            servers.push(MockServer {
                frames: frames_tx,
                sent: sent_rx,
            });
        }

        (connector, servers)
    }

    fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WebSocketConnector for MockConnector {
    async fn connect(&self, _url: &str) -> Result<Box<dyn WebSocketConnection>, TransportError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        match self.pending.lock().pop_front() {
            Some(connection) => Ok(Box::new(connection)),
            None => Err(TransportError::WebSocket("connection refused".to_owned())),
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn fast_reconnect() -> ReconnectConfig {
    ReconnectConfig {
        initial_delay: Duration::from_millis(10),
        ..ReconnectConfig::default()
    }
    .without_jitter()
}

fn market_config() -> SessionConfig {
    SessionConfig::new(
        StreamSource::MarketData(DataSource::Iex),
        "wss://stream.test/v2/iex",
        Credentials::key_secret("key", "secret"),
    )
    .with_reconnect(fast_reconnect())
}

fn account_config() -> SessionConfig {
    SessionConfig::new(
        StreamSource::Account,
        "wss://paper.test/stream",
        Credentials::key_secret("key", "secret"),
    )
    .with_reconnect(fast_reconnect())
}

async fn wait_for_state(session: &StreamSession, target: StreamState) {
    let mut state = session.watch_state();
    timeout(WAIT, state.wait_for(|s| *s == target))
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for {target}"))
        .map(|_| ())
        .expect("session task gone");
}

fn trade_frame(symbol: &str, price: f64) -> String {
    json!([{
        "T": "t", "S": symbol, "i": 52_983_525_028_175_u64, "x": "V",
        "p": price, "s": 100, "t": "2024-01-02T15:30:00.123456789Z", "c": ["@"], "z": "C"
    }])
    .to_string()
}

const AUTHENTICATED: &str = r#"[{"T":"success","msg":"authenticated"}]"#;

fn trade_listener(session: &StreamSession, symbol: &str) -> mpsc::UnboundedReceiver<Trade> {
    let (tx, rx) = mpsc::unbounded_channel();
    assert_ok!(session.on_trade(symbol, move |trade| {
        let _ = tx.send(trade.clone());
    }));
    rx
}

fn error_listener(session: &StreamSession) -> mpsc::UnboundedReceiver<StreamError> {
    let (tx, rx) = mpsc::unbounded_channel();
    session.on_error(move |error| {
        let _ = tx.send(error.clone());
    });
    rx
}

async fn next<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> T {
    timeout(WAIT, rx.recv())
        .await
        .expect("timed out")
        .expect("listener channel closed")
}

// =============================================================================
// Market Data
// =============================================================================

#[tokio::test]
async fn subscribed_trade_reaches_listener_once() {
    let (connector, mut servers) = MockConnector::scripted(1);
    let session = StreamSession::spawn(market_config(), connector);
    let mut trades = trade_listener(&session, "AAPL");

    assert_ok!(session.subscribe(Channel::Trades, ["AAPL"]));
    assert_ok!(session.connect());

    let server = &mut servers[0];
    assert_eq!(
        server.next_sent().await,
        json!({"action": "auth", "key": "key", "secret": "secret"})
    );

    // Data before authentication is dropped.
    server.push(&trade_frame("AAPL", 1.0));
    server.push(r#"[{"T":"success","msg":"connected"}]"#);
    server.push(AUTHENTICATED);
    assert_eq!(
        server.next_sent().await,
        json!({"action": "subscribe", "trades": ["AAPL"], "quotes": [], "bars": []})
    );

    server.push(r#"[{"T":"subscription","trades":["AAPL"],"quotes":[],"bars":[]}]"#);
    wait_for_state(&session, StreamState::Subscribed).await;

    // MSFT is not subscribed; both trades arrive in one frame.
    let both = json!([
        {"T": "t", "S": "MSFT", "i": 1, "x": "V", "p": 410.0, "s": 5, "t": "2024-01-02T15:30:00Z", "z": "C"},
        {"T": "t", "S": "AAPL", "i": 2, "x": "V", "p": 187.5, "s": 10, "t": "2024-01-02T15:30:01Z", "z": "C"}
    ]);
    server.push(&both.to_string());

    let trade = next(&mut trades).await;
    assert_eq!(trade.symbol, "AAPL");
    assert_eq!(trade.price, 187.5);
    assert_eq!(trade.raw().id, 2);
    assert!(trades.try_recv().is_err());
}

#[tokio::test]
async fn reconnect_replays_exact_desired_set() {
    let (connector, mut servers) = MockConnector::scripted(2);
    let session = StreamSession::spawn(market_config(), connector.clone());
    let mut errors = error_listener(&session);

    assert_ok!(session.subscribe(Channel::Trades, ["AAPL"]));
    assert_ok!(session.subscribe(Channel::Quotes, ["MSFT"]));
    assert_ok!(session.connect());

    let expected = json!({"action": "subscribe", "trades": ["AAPL"], "quotes": ["MSFT"], "bars": []});

    let first = &mut servers[0];
    first.next_sent().await;
    first.push(AUTHENTICATED);
    assert_eq!(first.next_sent().await, expected);
    first.push(r#"[{"T":"subscription","trades":["AAPL"],"quotes":["MSFT"],"bars":[]}]"#);
    wait_for_state(&session, StreamState::Subscribed).await;

    first.drop_connection();
    assert!(matches!(next(&mut errors).await, StreamError::Transport(_)));

    let second = &mut servers[1];
    assert_eq!(second.next_sent().await["action"], "auth");
    wait_for_state(&session, StreamState::Authenticating).await;
    second.push(AUTHENTICATED);
    assert_eq!(second.next_sent().await, expected);
    wait_for_state(&session, StreamState::Subscribing).await;

    assert_eq!(connector.attempts(), 2);
    let desired = session.subscriptions();
    assert_eq!(desired.symbols(Channel::Trades), ["AAPL"]);
    assert_eq!(desired.symbols(Channel::Quotes), ["MSFT"]);
}

#[tokio::test]
async fn close_during_backoff_prevents_reconnect() {
    let (connector, mut servers) = MockConnector::scripted(1);
    let config = market_config().with_reconnect(
        ReconnectConfig {
            initial_delay: Duration::from_secs(60),
            ..ReconnectConfig::default()
        }
        .without_jitter(),
    );
    let session = StreamSession::spawn(config, connector.clone());

    assert_ok!(session.connect());
    let server = &mut servers[0];
    server.next_sent().await;
    server.push(AUTHENTICATED);
    wait_for_state(&session, StreamState::Authenticated).await;

    server.drop_connection();
    wait_for_state(&session, StreamState::Reconnecting).await;

    timeout(WAIT, session.close()).await.unwrap();
    assert_eq!(session.state(), StreamState::Closed);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(connector.attempts(), 1);
    assert_err!(session.connect());
}

#[tokio::test]
async fn failed_connect_backs_off_and_retries() {
    // The first attempt is refused, the second succeeds.
    let (connector, mut servers) = MockConnector::scripted(1);
    let refused = Arc::new(MockConnector::default());
    let flaky = Arc::new(FlakyConnector {
        first: refused,
        then: connector.clone(),
        calls: AtomicUsize::new(0),
    });
    let session = StreamSession::spawn(market_config(), flaky);

    assert_ok!(session.connect());
    assert_eq!(servers[0].next_sent().await["action"], "auth");
    assert_eq!(session.state(), StreamState::Authenticating);
}

struct FlakyConnector {
    first: Arc<MockConnector>,
    then: Arc<MockConnector>,
    calls: AtomicUsize,
}

#[async_trait]
impl WebSocketConnector for FlakyConnector {
    async fn connect(&self, url: &str) -> Result<Box<dyn WebSocketConnection>, TransportError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            self.first.connect(url).await
        } else {
            self.then.connect(url).await
        }
    }
}

#[tokio::test]
async fn fatal_auth_error_waits_for_new_credentials() {
    let (connector, mut servers) = MockConnector::scripted(2);
    let session = StreamSession::spawn(market_config(), connector.clone());
    let mut errors = error_listener(&session);

    assert_ok!(session.connect());
    servers[0].next_sent().await;
    servers[0].push(r#"[{"T":"error","code":402,"msg":"auth failed"}]"#);

    assert_eq!(
        next(&mut errors).await,
        StreamError::Auth(AuthError::InvalidCredentials)
    );
    wait_for_state(&session, StreamState::Disconnected).await;

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(connector.attempts(), 1);

    assert_ok!(session.set_credentials(Credentials::oauth("fresh-token")));
    assert_ok!(session.connect());
    assert_eq!(
        servers[1].next_sent().await,
        json!({"action": "auth", "oauth_token": "fresh-token"})
    );
    assert_eq!(connector.attempts(), 2);
}

#[tokio::test]
async fn non_fatal_error_keeps_connection() {
    let (connector, mut servers) = MockConnector::scripted(1);
    let session = StreamSession::spawn(market_config(), connector);
    let mut errors = error_listener(&session);

    assert_ok!(session.subscribe(Channel::Trades, ["AAPL"]));
    assert_ok!(session.connect());
    let server = &mut servers[0];
    server.next_sent().await;
    server.push(AUTHENTICATED);
    server.next_sent().await;
    server.push(r#"[{"T":"subscription","trades":["AAPL"],"quotes":[],"bars":[]}]"#);
    wait_for_state(&session, StreamState::Subscribed).await;

    server.push(r#"[{"T":"error","code":405,"msg":"symbol limit exceeded"}]"#);
    let error = next(&mut errors).await;
    assert!(matches!(error, StreamError::Subscription { code: 405, .. }));
    assert!(!error.is_fatal());
    assert_eq!(session.state(), StreamState::Subscribed);
}

#[test_case(400, StreamError::Protocol { code: 400, msg: "invalid syntax".to_owned(), fatal: true } ; "invalid syntax")]
#[test_case(406, StreamError::Auth(AuthError::ConnectionLimitExceeded) ; "connection limit")]
#[tokio::test]
async fn fatal_error_while_subscribed_stops_the_session(code: i32, expected: StreamError) {
    let (connector, mut servers) = MockConnector::scripted(2);
    let session = StreamSession::spawn(market_config(), connector.clone());
    let mut errors = error_listener(&session);

    assert_ok!(session.subscribe(Channel::Trades, ["AAPL"]));
    assert_ok!(session.connect());
    let server = &mut servers[0];
    server.next_sent().await;
    server.push(AUTHENTICATED);
    server.next_sent().await;
    server.push(r#"[{"T":"subscription","trades":["AAPL"],"quotes":[],"bars":[]}]"#);
    wait_for_state(&session, StreamState::Subscribed).await;

    let msg = if code == 400 { "invalid syntax" } else { "connection limit exceeded" };
    server.push(&json!([{"T": "error", "code": code, "msg": msg}]).to_string());

    let error = next(&mut errors).await;
    assert!(error.is_fatal());
    assert_eq!(error, expected);
    wait_for_state(&session, StreamState::Disconnected).await;

    sleep(Duration::from_millis(50)).await;
    assert_eq!(connector.attempts(), 1);
    assert_eq!(session.state(), StreamState::Disconnected);
}

#[tokio::test]
async fn reconnects_give_up_after_max_attempts() {
    // One live connection; the reconnect is refused.
    let (connector, mut servers) = MockConnector::scripted(1);
    let config = market_config().with_reconnect(ReconnectConfig {
        max_attempts: 1,
        ..fast_reconnect()
    });
    let session = StreamSession::spawn(config, connector.clone());
    let mut errors = error_listener(&session);

    assert_ok!(session.connect());
    let server = &mut servers[0];
    server.next_sent().await;
    server.push(AUTHENTICATED);
    wait_for_state(&session, StreamState::Authenticated).await;

    server.drop_connection();
    assert!(matches!(next(&mut errors).await, StreamError::Transport(_)));
    assert!(matches!(next(&mut errors).await, StreamError::Transport(_)));
    assert_eq!(
        next(&mut errors).await,
        StreamError::MaxReconnectAttemptsExceeded(1)
    );
    assert_eq!(session.state(), StreamState::Disconnected);

    sleep(Duration::from_millis(50)).await;
    assert_eq!(connector.attempts(), 2);
    assert_eq!(session.state(), StreamState::Disconnected);
}

#[tokio::test]
async fn removing_the_last_symbol_returns_to_authenticated() {
    let (connector, mut servers) = MockConnector::scripted(1);
    let session = StreamSession::spawn(market_config(), connector);

    assert_ok!(session.subscribe(Channel::Quotes, ["MSFT"]));
    assert_ok!(session.connect());
    let server = &mut servers[0];
    server.next_sent().await;
    server.push(AUTHENTICATED);
    server.next_sent().await;
    server.push(r#"[{"T":"subscription","trades":[],"quotes":["MSFT"],"bars":[]}]"#);
    wait_for_state(&session, StreamState::Subscribed).await;

    assert_ok!(session.unsubscribe(Channel::Quotes, ["MSFT"]));
    assert_eq!(
        server.next_sent().await,
        json!({"action": "unsubscribe", "trades": [], "quotes": ["MSFT"], "bars": []})
    );
    wait_for_state(&session, StreamState::Authenticated).await;

    // The empty acknowledgement does not claim a subscription.
    server.push(r#"[{"T":"subscription","trades":[],"quotes":[],"bars":[]}]"#);
    sleep(Duration::from_millis(50)).await;
    assert_eq!(session.state(), StreamState::Authenticated);
}

#[tokio::test]
async fn incremental_changes_while_connected() {
    let (connector, mut servers) = MockConnector::scripted(1);
    let session = StreamSession::spawn(market_config(), connector);

    assert_ok!(session.connect());
    let server = &mut servers[0];
    server.next_sent().await;
    server.push(AUTHENTICATED);
    wait_for_state(&session, StreamState::Authenticated).await;

    assert_ok!(session.subscribe(Channel::Bars, ["SPY", "QQQ"]));
    assert_eq!(
        server.next_sent().await,
        json!({"action": "subscribe", "trades": [], "quotes": [], "bars": ["SPY", "QQQ"]})
    );
    wait_for_state(&session, StreamState::Subscribing).await;

    assert_ok!(session.unsubscribe(Channel::Bars, ["QQQ"]));
    assert_eq!(
        server.next_sent().await,
        json!({"action": "unsubscribe", "trades": [], "quotes": [], "bars": ["QQQ"]})
    );
    assert_eq!(session.subscriptions().symbols(Channel::Bars), ["SPY"]);
}

#[tokio::test]
async fn wildcard_listener_sees_every_subscribed_symbol() {
    let (connector, mut servers) = MockConnector::scripted(1);
    let session = StreamSession::spawn(market_config(), connector);
    let mut trades = trade_listener(&session, "*");

    assert_ok!(session.subscribe(Channel::Trades, ["*"]));
    assert_ok!(session.connect());
    let server = &mut servers[0];
    server.next_sent().await;
    server.push(AUTHENTICATED);
    server.next_sent().await;

    server.push(&trade_frame("TSLA", 250.0));
    server.push(&trade_frame("NVDA", 480.0));

    assert_eq!(next(&mut trades).await.symbol, "TSLA");
    assert_eq!(next(&mut trades).await.symbol, "NVDA");
}

#[tokio::test]
async fn malformed_data_is_reported_not_dispatched() {
    let (connector, mut servers) = MockConnector::scripted(1);
    let session = StreamSession::spawn(market_config(), connector);
    let mut trades = trade_listener(&session, "AAPL");
    let mut errors = error_listener(&session);

    assert_ok!(session.subscribe(Channel::Trades, ["AAPL"]));
    assert_ok!(session.connect());
    let server = &mut servers[0];
    server.next_sent().await;
    server.push(AUTHENTICATED);
    server.next_sent().await;

    let bad_timestamp = json!([
        {"T": "t", "S": "AAPL", "i": 1, "x": "V", "p": 1.0, "s": 1, "t": "yesterday", "z": "C"}
    ]);
    server.push(&bad_timestamp.to_string());
    assert!(matches!(next(&mut errors).await, StreamError::Normalize(_)));

    server.push("not json");
    assert!(matches!(next(&mut errors).await, StreamError::Codec(_)));

    server.push(&trade_frame("AAPL", 2.0));
    assert_eq!(next(&mut trades).await.price, 2.0);
}

#[tokio::test(start_paused = true)]
async fn missing_auth_reply_times_out() {
    let (connector, mut servers) = MockConnector::scripted(1);
    let config = market_config().with_auth_timeout(Duration::from_secs(1));
    let session = StreamSession::spawn(config, connector.clone());
    let mut errors = error_listener(&session);

    assert_ok!(session.connect());
    servers[0].next_sent().await;

    assert_eq!(
        next(&mut errors).await,
        StreamError::Auth(AuthError::Timeout)
    );
    assert_eq!(session.state(), StreamState::Disconnected);
    assert_eq!(connector.attempts(), 1);
}

// =============================================================================
// Account Stream
// =============================================================================

fn trade_update_frame(symbol: &str) -> String {
    json!({
        "stream": "trade_updates",
        "data": {
            "event": "fill",
            "execution_id": "2f63ea93-423d-4169-b3f6-3fdafc10c418",
            "timestamp": "2024-01-02T14:30:00.123Z",
            "price": "187.50",
            "qty": "10",
            "position_qty": "10",
            "order": {
                "id": "61e69015-8549-4bfd-b9c3-01e75843f47d",
                "client_order_id": "eb9e2aaa-f71a-4f51-b5b4-52a6c565dad4",
                "created_at": "2024-01-02T14:29:59.000Z",
                "updated_at": "2024-01-02T14:30:00.123Z",
                "submitted_at": "2024-01-02T14:29:59.500Z",
                "filled_at": "2024-01-02T14:30:00.123Z",
                "asset_id": "b0b6dd9d-8b9b-48a9-ba46-b9d54906e415",
                "symbol": symbol,
                "asset_class": "us_equity",
                "qty": "10",
                "filled_qty": "10",
                "filled_avg_price": "187.50",
                "order_class": "",
                "type": "market",
                "side": "buy",
                "time_in_force": "day",
                "status": "filled",
                "extended_hours": false
            }
        }
    })
    .to_string()
}

#[tokio::test]
async fn account_stream_listens_and_dispatches_trade_updates() {
    let (connector, mut servers) = MockConnector::scripted(1);
    let session = StreamSession::spawn(account_config(), connector);

    let (tx, mut updates) = mpsc::unbounded_channel::<TradeUpdate>();
    assert_ok!(session.on_trade_update("*", move |update| {
        let _ = tx.send(update.clone());
    }));
    assert_ok!(session.subscribe(Channel::TradeUpdates, ["*"]));
    assert_ok!(session.connect());

    let server = &mut servers[0];
    assert_eq!(
        server.next_sent().await,
        json!({"action": "authenticate", "data": {"key_id": "key", "secret_key": "secret"}})
    );
    server.push(r#"{"stream":"authorization","data":{"status":"authorized","action":"authenticate"}}"#);
    assert_eq!(
        server.next_sent().await,
        json!({"action": "listen", "data": {"streams": ["trade_updates"]}})
    );
    server.push(r#"{"stream":"listening","data":{"streams":["trade_updates"]}}"#);
    wait_for_state(&session, StreamState::Subscribed).await;

    server.push(&trade_update_frame("AAPL"));
    let update = next(&mut updates).await;
    assert_eq!(update.event, TradeUpdateEvent::Fill);
    assert_eq!(update.symbol(), "AAPL");
    assert_eq!(update.price, Some(187.5));
}

#[tokio::test]
async fn unauthorized_account_stream_is_fatal() {
    let (connector, mut servers) = MockConnector::scripted(1);
    let session = StreamSession::spawn(account_config(), connector.clone());
    let mut errors = error_listener(&session);

    assert_ok!(session.connect());
    servers[0].next_sent().await;
    servers[0].push(r#"{"stream":"authorization","data":{"status":"unauthorized","action":"authenticate"}}"#);

    let error = next(&mut errors).await;
    assert!(matches!(error, StreamError::Auth(AuthError::Unauthorized(_))));
    wait_for_state(&session, StreamState::Disconnected).await;
    assert_eq!(connector.attempts(), 1);
}

async fn subscribed_account_session(
    connector: Arc<MockConnector>,
    server: &mut MockServer,
) -> StreamSession {
    let session = StreamSession::spawn(account_config(), connector);
    assert_ok!(session.subscribe(Channel::TradeUpdates, ["*"]));
    assert_ok!(session.connect());

    server.next_sent().await;
    server.push(r#"{"stream":"authorization","data":{"status":"authorized","action":"authenticate"}}"#);
    server.next_sent().await;
    server.push(r#"{"stream":"listening","data":{"streams":["trade_updates"]}}"#);
    wait_for_state(&session, StreamState::Subscribed).await;
    session
}

#[tokio::test]
async fn late_unauthorized_frame_disconnects() {
    let (connector, mut servers) = MockConnector::scripted(1);
    let session = subscribed_account_session(connector.clone(), &mut servers[0]).await;
    let mut errors = error_listener(&session);

    servers[0].push(r#"{"stream":"authorization","data":{"status":"unauthorized","action":"listen"}}"#);

    let error = next(&mut errors).await;
    assert!(matches!(error, StreamError::Auth(AuthError::Unauthorized(_))));
    wait_for_state(&session, StreamState::Disconnected).await;
    assert_eq!(connector.attempts(), 1);
}

#[tokio::test]
async fn stopping_trade_updates_returns_to_authenticated() {
    let (connector, mut servers) = MockConnector::scripted(1);
    let session = subscribed_account_session(connector, &mut servers[0]).await;

    assert_ok!(session.unsubscribe(Channel::TradeUpdates, ["*"]));
    assert_eq!(
        servers[0].next_sent().await,
        json!({"action": "listen", "data": {"streams": []}})
    );
    wait_for_state(&session, StreamState::Authenticated).await;
    assert!(session.subscriptions().is_empty());
}

#[tokio::test]
async fn channels_must_match_the_stream() {
    let (connector, _servers) = MockConnector::scripted(0);
    let account = StreamSession::spawn(account_config(), connector.clone());
    let market = StreamSession::spawn(market_config(), connector);

    assert!(matches!(
        account.subscribe(Channel::Trades, ["AAPL"]),
        Err(StreamError::ChannelNotSupported { channel: Channel::Trades, .. })
    ));
    assert!(account.on_quote("AAPL", |_| {}).is_err());
    assert!(matches!(
        market.subscribe(Channel::TradeUpdates, ["*"]),
        Err(StreamError::ChannelNotSupported { stream: StreamSource::MarketData(DataSource::Iex), .. })
    ));
}
