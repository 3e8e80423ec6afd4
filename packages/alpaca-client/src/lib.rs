#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::items_after_statements
    )
)]

//! Alpaca Client - Typed Brokerage Client
//!
//! Turns Alpaca's wire JSON into typed entities and keeps a streaming
//! session alive across reconnects.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: entities, normalization and the stream state machine
//!   - `entities`: raw wire structs and their parsed counterparts
//!   - `normalize`: pure raw → parsed conversions
//!   - `stream`: channels, states, errors and the desired subscription set
//!
//! - **Application**: ports and the stream session
//!   - `ports`: HTTP, rate limiter and WebSocket interfaces
//!   - `session`: the per-stream task with listeners and subscription replay
//!
//! - **Infrastructure**: adapters and external integrations
//!   - `alpaca`: REST client, WebSocket transport, wire messages and codec
//!   - `config`: environment-driven configuration
//!   - `rate_limit`: token bucket for REST calls
//!   - `telemetry`: tracing subscriber setup
//!
//! # Data Flow
//!
//! ```text
//! REST JSON ──► Raw entity ──► normalize ──► Parsed entity (raw() kept)
//!
//! WS frame ──► codec ──► session (state machine, desired set) ──► listeners
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Entities, normalization and stream state. No I/O.
pub mod domain;

/// Application layer - Ports and the stream session.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

/// REST client errors.
pub mod error;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::entities::*;
pub use domain::normalize::NormalizeError;
pub use domain::stream::{
    AuthError, Channel, SessionEvent, StreamError, StreamSource, StreamState, SubscriptionSet,
    WILDCARD,
};

// Application
pub use application::ports::{
    HttpMethod, HttpRequest, HttpTransport, RateLimiter, TransportError, WebSocketConnection,
    WebSocketConnector,
};
pub use application::session::{ListenerId, SessionConfig, StreamSession};

// Infrastructure
pub use infrastructure::alpaca::{
    AlpacaClient, Credentials, CredentialsKind, ReconnectConfig, TungsteniteConnector,
};
pub use infrastructure::config::{ClientConfig, ConfigError, Endpoints, Environment};
pub use infrastructure::rate_limit::{Unlimited, WindowRateLimiter};

// Errors
pub use error::{ApiErrorBody, ClientError};
