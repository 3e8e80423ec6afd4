//! Tracing Setup
//!
//! Installs a `tracing-subscriber` fmt layer filtered by `RUST_LOG`.
//! Library code only emits events; calling [`init`] is up to the binary or
//! test that embeds the client.
//!
//! # Usage
//!
//! ```ignore
//! alpaca_client::infrastructure::telemetry::init()?;
//! tracing::info!("client ready");
//! ```

use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::{Directive, ParseError};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};

/// Directive applied when `RUST_LOG` does not mention this crate.
pub const DEFAULT_DIRECTIVE: &str = "alpaca_client=info";

/// Telemetry setup failures.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// A filter directive did not parse.
    #[error("invalid filter directive: {0}")]
    Directive(#[from] ParseError),
    /// A global subscriber is already installed.
    #[error("tracing subscriber already installed: {0}")]
    AlreadyInitialized(#[from] TryInitError),
}

/// Telemetry configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Directives added on top of `RUST_LOG`.
    pub directives: Vec<String>,
    /// Include the event target in output.
    pub with_target: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            directives: vec![
                DEFAULT_DIRECTIVE.to_string(),
                "hyper=warn".to_string(),
                "rustls=warn".to_string(),
                "tungstenite=warn".to_string(),
            ],
            with_target: true,
        }
    }
}

impl TelemetryConfig {
    /// Build the filter: `RUST_LOG` plus the configured directives.
    ///
    /// # Errors
    ///
    /// Returns an error if a directive does not parse.
    pub fn env_filter(&self) -> Result<EnvFilter, TelemetryError> {
        let mut filter = EnvFilter::from_default_env();
        for directive in &self.directives {
            filter = filter.add_directive(directive.parse::<Directive>()?);
        }
        Ok(filter)
    }
}

/// Initialize logging with the default configuration.
///
/// # Errors
///
/// Returns an error if a global subscriber already exists.
pub fn init() -> Result<(), TelemetryError> {
    init_with_config(&TelemetryConfig::default())
}

/// Initialize logging with a custom configuration.
///
/// # Errors
///
/// Returns an error if a directive is invalid or a global subscriber
/// already exists.
pub fn init_with_config(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(config.with_target)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    tracing_subscriber::registry()
        .with(config.env_filter()?)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
