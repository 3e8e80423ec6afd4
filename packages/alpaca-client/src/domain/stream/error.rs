//! Stream errors and server error code classification.
//!
//! # Server Error Codes
//!
//! | Code | Meaning | Fatal |
//! |---|---|---|
//! | 400 | invalid syntax | yes |
//! | 401 | not authenticated | yes |
//! | 402 | auth failed | yes |
//! | 403 | already authenticated | yes |
//! | 404 | auth timeout | yes |
//! | 405 | symbol limit exceeded | no |
//! | 406 | connection limit exceeded | yes |
//! | 407 | slow client | no |
//! | 408 | insufficient subscription | no |
//! | 409 | not allowed | no |
//! | 500 | internal error | no |
//!
//! A fatal error tears the connection down and disables reconnection until
//! the caller connects again.

use thiserror::Error;

use super::state::{SessionEvent, StreamState};
use super::{Channel, StreamSource};
use crate::domain::normalize::NormalizeError;

/// Authentication failures reported by the server.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Not authenticated (must authenticate before making requests).
    #[error("not authenticated: must authenticate before making requests")]
    NotAuthenticated,

    /// Invalid credentials.
    #[error("authentication failed: invalid credentials")]
    InvalidCredentials,

    /// The connection was already authenticated.
    #[error("already authenticated: connection is already authenticated")]
    AlreadyAuthenticated,

    /// Authentication took longer than the server allows.
    #[error("authentication timeout: must authenticate within 10 seconds")]
    Timeout,

    /// Too many concurrent connections for this account.
    #[error("connection limit exceeded: too many concurrent connections")]
    ConnectionLimitExceeded,

    /// The account stream answered `unauthorized`.
    #[error("authorization rejected: {0}")]
    Unauthorized(String),
}

impl AuthError {
    /// Map a server error code to an authentication failure.
    #[must_use]
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            401 => Some(Self::NotAuthenticated),
            402 => Some(Self::InvalidCredentials),
            403 => Some(Self::AlreadyAuthenticated),
            404 => Some(Self::Timeout),
            406 => Some(Self::ConnectionLimitExceeded),
            _ => None,
        }
    }
}

/// Errors surfaced by a stream session.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StreamError {
    /// Authentication failed. Fatal.
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// A subscription was refused; the connection stays up.
    #[error("subscription error ({code}): {msg}")]
    Subscription {
        /// Server error code.
        code: i32,
        /// Server message.
        msg: String,
    },

    /// Any other server error frame.
    #[error("protocol error ({code}): {msg}")]
    Protocol {
        /// Server error code.
        code: i32,
        /// Server message.
        msg: String,
        /// Whether the connection was torn down.
        fatal: bool,
    },

    /// The transport failed or closed. The session reconnects.
    #[error("transport error: {0}")]
    Transport(String),

    /// A data frame could not be normalized.
    #[error("normalize error: {0}")]
    Normalize(#[from] NormalizeError),

    /// A frame was not valid JSON or had an unexpected shape.
    #[error("codec error: {0}")]
    Codec(String),

    /// The state machine refused an event.
    #[error("invalid transition: {event:?} in state {from}")]
    InvalidTransition {
        /// State the event arrived in.
        from: StreamState,
        /// Refused event.
        event: SessionEvent,
    },

    /// The channel is not served by this stream.
    #[error("channel {channel} is not available on the {stream} stream")]
    ChannelNotSupported {
        /// Requested channel.
        channel: Channel,
        /// Stream of the session.
        stream: StreamSource,
    },

    /// The reconnect policy gave up.
    #[error("maximum reconnection attempts ({0}) exceeded")]
    MaxReconnectAttemptsExceeded(u32),

    /// The session task is gone.
    #[error("session closed")]
    SessionClosed,
}

impl StreamError {
    /// Classify a server error frame.
    #[must_use]
    pub fn from_server(code: i32, msg: &str) -> Self {
        if let Some(auth) = AuthError::from_code(code) {
            return Self::Auth(auth);
        }

        match code {
            405 | 408 => Self::Subscription {
                code,
                msg: msg.to_owned(),
            },
            400 => Self::Protocol {
                code,
                msg: msg.to_owned(),
                fatal: true,
            },
            _ => Self::Protocol {
                code,
                msg: msg.to_owned(),
                fatal: false,
            },
        }
    }

    /// Whether the session stops reconnecting after this error.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Auth(_)
                | Self::Protocol { fatal: true, .. }
                | Self::MaxReconnectAttemptsExceeded(_)
                | Self::SessionClosed
        )
    }
}
