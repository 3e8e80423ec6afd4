//! Application Layer - Port definitions and the stream session.
//!
//! The session drives the stream state machine over the ports; the
//! infrastructure layer supplies the production adapters.

/// Port interfaces for external systems (HTTP, rate limiting, WebSocket).
pub mod ports;

/// Stream session: connection lifecycle, subscriptions and dispatch.
pub mod session;
