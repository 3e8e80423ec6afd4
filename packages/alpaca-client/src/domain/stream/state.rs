//! Stream session state machine.
//!
//! ```text
//!                ConnectRequested          TransportOpened          AuthAccepted
//! Disconnected ───────────────────► Connecting ────────────► Authenticating ─────────► Authenticated
//!      ▲  │                             ▲                          │                        │
//!      │  │ BackoffStarted              │ ConnectRequested         │ AuthRejected           │ SubscribeSent
//!      │  ▼                             │                          ▼                        ▼
//!      │ Reconnecting ──────────────────┘                     Disconnected               Subscribing
//!      │                                                                                    │
//!      └──── TransportLost (any live state)                         SubscriptionAcknowledged │
//!                                                                                           ▼
//!                                   CloseRequested (any) ──► Closed                      Subscribed
//!
//! SubscriptionsCleared returns Subscribing/Subscribed to Authenticated once
//! the last symbol is unsubscribed.
//! ```

use super::error::StreamError;

/// Connection lifecycle state of a stream session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StreamState {
    /// No transport. Initial state and state after a drop or a fatal error.
    #[default]
    Disconnected,
    /// Opening the transport.
    Connecting,
    /// Transport open, auth message sent.
    Authenticating,
    /// Authenticated, nothing subscribed yet.
    Authenticated,
    /// Subscription request sent, awaiting acknowledgement.
    Subscribing,
    /// Subscription acknowledged.
    Subscribed,
    /// Waiting out a backoff delay before reconnecting.
    Reconnecting,
    /// Closed by the caller. Terminal.
    Closed,
}

/// Input to the session state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionEvent {
    /// The caller or the backoff timer asked for a connection.
    ConnectRequested,
    /// The transport opened.
    TransportOpened,
    /// The server accepted the credentials.
    AuthAccepted,
    /// The server rejected the credentials.
    AuthRejected,
    /// A subscribe request was written.
    SubscribeSent,
    /// The server acknowledged a subscription.
    SubscriptionAcknowledged,
    /// The last subscription was removed.
    SubscriptionsCleared,
    /// The transport closed or failed.
    TransportLost,
    /// A backoff delay started.
    BackoffStarted,
    /// The caller closed the session.
    CloseRequested,
    /// The server sent a fatal error after authentication.
    ProtocolRejected,
}

impl StreamState {
    /// Apply `event`, returning the next state.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::InvalidTransition`] for any pair not in the
    /// transition table.
    pub fn on(self, event: SessionEvent) -> Result<Self, StreamError> {
        use SessionEvent as E;

        let next = match (self, event) {
            (_, E::CloseRequested) => Self::Closed,
            (Self::Closed, _) => return Err(StreamError::InvalidTransition { from: self, event }),
            (_, E::TransportLost) => Self::Disconnected,
            (Self::Disconnected | Self::Reconnecting, E::ConnectRequested) => Self::Connecting,
            (Self::Connecting, E::TransportOpened) => Self::Authenticating,
            (Self::Authenticating, E::AuthAccepted) => Self::Authenticated,
            (Self::Authenticating, E::AuthRejected) => Self::Disconnected,
            (Self::Authenticated | Self::Subscribing, E::SubscribeSent) => Self::Subscribing,
            (Self::Subscribed, E::SubscribeSent) => Self::Subscribed,
            (Self::Subscribing | Self::Subscribed, E::SubscriptionAcknowledged) => {
                Self::Subscribed
            }
            (
                Self::Authenticated | Self::Subscribing | Self::Subscribed,
                E::SubscriptionsCleared,
            ) => Self::Authenticated,
            (Self::Authenticated | Self::Subscribing | Self::Subscribed, E::ProtocolRejected) => {
                Self::Disconnected
            }
            (Self::Disconnected, E::BackoffStarted) => Self::Reconnecting,
            _ => return Err(StreamError::InvalidTransition { from: self, event }),
        };

        Ok(next)
    }

    /// Whether data frames are dispatched in this state.
    #[must_use]
    pub const fn accepts_data(self) -> bool {
        matches!(
            self,
            Self::Authenticated | Self::Subscribing | Self::Subscribed
        )
    }

    /// Whether a transport is open.
    #[must_use]
    pub const fn is_connected(self) -> bool {
        matches!(
            self,
            Self::Authenticating | Self::Authenticated | Self::Subscribing | Self::Subscribed
        )
    }

    /// Whether the session is authenticated.
    #[must_use]
    pub const fn is_authenticated(self) -> bool {
        self.accepts_data()
    }

    /// Whether the session is closed for good.
    #[must_use]
    pub const fn is_closed(self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl std::fmt::Display for StreamState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Authenticating => "authenticating",
            Self::Authenticated => "authenticated",
            Self::Subscribing => "subscribing",
            Self::Subscribed => "subscribed",
            Self::Reconnecting => "reconnecting",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    use SessionEvent as E;
    use StreamState as S;

    #[test_case(S::Disconnected, E::ConnectRequested, S::Connecting ; "connect from disconnected")]
    #[test_case(S::Reconnecting, E::ConnectRequested, S::Connecting ; "connect after backoff")]
    #[test_case(S::Connecting, E::TransportOpened, S::Authenticating ; "open")]
    #[test_case(S::Authenticating, E::AuthAccepted, S::Authenticated ; "auth ok")]
    #[test_case(S::Authenticating, E::AuthRejected, S::Disconnected ; "auth rejected")]
    #[test_case(S::Authenticated, E::SubscribeSent, S::Subscribing ; "first subscribe")]
    #[test_case(S::Subscribing, E::SubscribeSent, S::Subscribing ; "subscribe while pending")]
    #[test_case(S::Subscribed, E::SubscribeSent, S::Subscribed ; "incremental subscribe")]
    #[test_case(S::Subscribing, E::SubscriptionAcknowledged, S::Subscribed ; "ack")]
    #[test_case(S::Subscribed, E::SubscriptionAcknowledged, S::Subscribed ; "repeat ack")]
    #[test_case(S::Subscribed, E::SubscriptionsCleared, S::Authenticated ; "last unsubscribe")]
    #[test_case(S::Subscribing, E::SubscriptionsCleared, S::Authenticated ; "unsubscribe while pending")]
    #[test_case(S::Subscribed, E::ProtocolRejected, S::Disconnected ; "fatal error frame")]
    #[test_case(S::Subscribed, E::TransportLost, S::Disconnected ; "drop while subscribed")]
    #[test_case(S::Connecting, E::TransportLost, S::Disconnected ; "connect failed")]
    #[test_case(S::Disconnected, E::BackoffStarted, S::Reconnecting ; "backoff")]
    #[test_case(S::Reconnecting, E::CloseRequested, S::Closed ; "close during backoff")]
    #[test_case(S::Closed, E::CloseRequested, S::Closed ; "close is idempotent")]
    fn valid_transitions(from: StreamState, event: SessionEvent, to: StreamState) {
        assert_eq!(from.on(event).unwrap(), to);
    }

    #[test_case(S::Disconnected, E::AuthAccepted ; "auth without transport")]
    #[test_case(S::Connecting, E::SubscribeSent ; "subscribe before auth")]
    #[test_case(S::Authenticating, E::SubscribeSent ; "subscribe while authenticating")]
    #[test_case(S::Authenticated, E::SubscriptionAcknowledged ; "ack without request")]
    #[test_case(S::Subscribed, E::BackoffStarted ; "backoff while live")]
    #[test_case(S::Closed, E::ConnectRequested ; "connect after close")]
    #[test_case(S::Closed, E::TransportLost ; "drop after close")]
    #[test_case(S::Authenticating, E::ProtocolRejected ; "protocol reject before auth")]
    #[test_case(S::Disconnected, E::SubscriptionsCleared ; "clear while offline")]
    fn invalid_transitions(from: StreamState, event: SessionEvent) {
        assert!(matches!(
            from.on(event),
            Err(StreamError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn data_states() {
        assert!(S::Authenticated.accepts_data());
        assert!(S::Subscribing.accepts_data());
        assert!(S::Subscribed.accepts_data());
        assert!(!S::Authenticating.accepts_data());
        assert!(!S::Reconnecting.accepts_data());
        assert!(!S::Closed.accepts_data());
    }
}
