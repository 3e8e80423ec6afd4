//! Infrastructure Layer - Adapters and external integrations.
//!
//! Concrete implementations of the application ports plus the Alpaca wire
//! protocol, configuration and logging setup.

/// Alpaca REST and WebSocket adapters.
pub mod alpaca;

/// Environment-driven configuration.
pub mod config;

/// REST rate limiting.
pub mod rate_limit;

/// Tracing subscriber setup.
pub mod telemetry;
