//! Alpaca Adapters
//!
//! - **REST**: trading and market data endpoints over `reqwest`
//! - **WebSocket**: `tokio-tungstenite` transport for the market data and
//!   account streams
//! - **Protocol**: credentials, control messages and the JSON frame codec

pub mod auth;
pub mod codec;
pub mod messages;
pub mod params;
pub mod reconnect;
pub mod rest;
pub mod websocket;

pub use auth::{AUTH_TIMEOUT, Credentials, CredentialsKind};
pub use codec::CodecError;
pub use params::{
    ClosePosition, GetAccountActivities, GetBars, GetOrders, GetQuotes, GetTrades,
    HistoricalRange, InvalidRequest, OrderQueryStatus, PlaceOrder, ReplaceOrder, SortDirection,
    StopLoss, TakeProfit, Timeframe, TimeframeUnit,
};
pub use reconnect::{ReconnectConfig, ReconnectPolicy};
pub use rest::{AlpacaClient, PositionClosure, ReqwestTransport};
pub use websocket::TungsteniteConnector;
