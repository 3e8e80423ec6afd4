//! Alpaca Credentials
//!
//! Alpaca accepts either an API key pair or an OAuth access token. The two
//! are mutually exclusive and select different REST headers and different
//! stream authentication frames.
//!
//! # REST Headers
//!
//! - key pair: `APCA-API-KEY-ID` and `APCA-API-SECRET-KEY`
//! - OAuth: `Authorization: Bearer <token>`
//!
//! # Stream Authentication
//!
//! ## Market Data Streams (IEX, SIP)
//! 1. Connect to WebSocket endpoint
//! 2. Send `{"action":"auth","key":"...","secret":"..."}`
//!    (or `{"action":"auth","oauth_token":"..."}`)
//! 3. Receive `{"T":"success","msg":"authenticated"}` or an error frame
//!
//! ## Account Stream (trade updates)
//! 1. Connect to WebSocket endpoint
//! 2. Send `{"action":"authenticate","data":{"key_id":"...","secret_key":"..."}}`
//!    (or `{"action":"authenticate","data":{"oauth_token":"..."}}`)
//! 3. Receive `{"stream":"authorization","data":{"status":"authorized",...}}`
//!
//! # References
//!
//! - [Stock Streaming Auth](https://docs.alpaca.markets/docs/streaming-market-data)
//! - [Trade Updates Auth](https://docs.alpaca.markets/docs/websocket-streaming)

use std::time::Duration;

use super::messages::{AccountAuthRequest, MarketDataAuthRequest};

/// Alpaca closes connections that don't authenticate within 10 seconds.
pub const AUTH_TIMEOUT: Duration = Duration::from_secs(10);

/// Header carrying the API key ID.
pub const KEY_ID_HEADER: &str = "APCA-API-KEY-ID";

/// Header carrying the API secret key.
pub const SECRET_KEY_HEADER: &str = "APCA-API-SECRET-KEY";

/// Which kind of credentials are held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialsKind {
    /// API key ID and secret key.
    KeySecret,
    /// OAuth access token.
    OAuth,
}

/// Alpaca API credentials.
///
/// The `Debug` implementation redacts secrets for safe logging.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// API key pair.
    KeySecret {
        /// API key ID.
        key: String,
        /// API secret key.
        secret: String,
    },
    /// OAuth access token.
    OAuth {
        /// Access token.
        token: String,
    },
}

impl Credentials {
    /// Key pair credentials.
    #[must_use]
    pub fn key_secret(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self::KeySecret {
            key: key.into(),
            secret: secret.into(),
        }
    }

    /// OAuth token credentials.
    #[must_use]
    pub fn oauth(token: impl Into<String>) -> Self {
        Self::OAuth {
            token: token.into(),
        }
    }

    /// Which kind of credentials these are.
    #[must_use]
    pub const fn kind(&self) -> CredentialsKind {
        match self {
            Self::KeySecret { .. } => CredentialsKind::KeySecret,
            Self::OAuth { .. } => CredentialsKind::OAuth,
        }
    }

    /// Whether any part of the credentials is empty.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::KeySecret { key, secret } => key.is_empty() || secret.is_empty(),
            Self::OAuth { token } => token.is_empty(),
        }
    }

    /// Headers to attach to every REST request.
    #[must_use]
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::KeySecret { key, secret } => vec![
                (KEY_ID_HEADER, key.clone()),
                (SECRET_KEY_HEADER, secret.clone()),
            ],
            Self::OAuth { token } => vec![("Authorization", format!("Bearer {token}"))],
        }
    }

    /// Authentication frame for market data streams.
    #[must_use]
    pub fn market_data_auth(&self) -> MarketDataAuthRequest {
        match self {
            Self::KeySecret { key, secret } => {
                MarketDataAuthRequest::key_secret(key.clone(), secret.clone())
            }
            Self::OAuth { token } => MarketDataAuthRequest::oauth(token.clone()),
        }
    }

    /// Authentication frame for the account stream.
    #[must_use]
    pub fn account_auth(&self) -> AccountAuthRequest {
        match self {
            Self::KeySecret { key, secret } => {
                AccountAuthRequest::key_secret(key.clone(), secret.clone())
            }
            Self::OAuth { token } => AccountAuthRequest::oauth(token.clone()),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::KeySecret { key, .. } => f
                .debug_struct("KeySecret")
                .field("key", key)
                .field("secret", &"[REDACTED]")
                .finish(),
            Self::OAuth { .. } => f
                .debug_struct("OAuth")
                .field("token", &"[REDACTED]")
                .finish(),
        }
    }
}
