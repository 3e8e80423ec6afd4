//! Client Configuration Settings
//!
//! Configuration types for the client, loaded from environment variables
//! (after reading a `.env` file if one exists) or built in code.
//!
//! # Environment Variables
//!
//! | Variable | Default |
//! |---|---|
//! | `ALPACA_KEY` + `ALPACA_SECRET` | one credential kind required |
//! | `ALPACA_OAUTH_TOKEN` | one credential kind required |
//! | `ALPACA_PAPER` | `true` |
//! | `ALPACA_FEED` | `iex` |
//! | `ALPACA_RATE_LIMIT_PER_MINUTE` | `200` |
//! | `ALPACA_RECONNECT_DELAY_INITIAL_MS` | `500` |
//! | `ALPACA_RECONNECT_DELAY_MAX_SECS` | `30` |
//! | `ALPACA_RECONNECT_DELAY_MULTIPLIER` | `2.0` |
//! | `ALPACA_MAX_RECONNECT_ATTEMPTS` | `0` (unlimited) |
//! | `ALPACA_HTTP_TIMEOUT_SECS` | `30` |

use std::str::FromStr;
use std::time::Duration;

use crate::domain::entities::DataSource;
use crate::infrastructure::alpaca::auth::Credentials;
use crate::infrastructure::alpaca::reconnect::ReconnectConfig;
use crate::infrastructure::rate_limit::DEFAULT_REQUESTS_PER_MINUTE;

/// Trading environment (paper vs live).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    /// Paper trading environment (simulated).
    #[default]
    Paper,
    /// Live trading environment (real money).
    Live,
}

impl Environment {
    /// Environment selected by an `ALPACA_PAPER` style flag.
    #[must_use]
    pub const fn from_paper_flag(paper: bool) -> Self {
        if paper { Self::Paper } else { Self::Live }
    }

    /// Check if this is the live environment.
    #[must_use]
    pub const fn is_live(self) -> bool {
        matches!(self, Self::Live)
    }

    /// Get the environment name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Paper => "paper",
            Self::Live => "live",
        }
    }
}

/// Base URLs of every Alpaca surface the client talks to.
///
/// Market data is served from production hosts for both environments; only
/// the trading REST API and the account stream differ between paper and live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Trading REST API, including the `/v2` prefix.
    pub trading_rest: String,
    /// Market data REST API, including the `/v2` prefix.
    pub data_rest: String,
    /// Account (trade updates) stream.
    pub account_stream: String,
    /// Market data stream; the data source is appended as a path segment.
    pub market_data_stream: String,
}

impl Endpoints {
    /// Production endpoints for `environment`.
    #[must_use]
    pub fn for_environment(environment: Environment) -> Self {
        let (trading_rest, account_stream) = if environment.is_live() {
            (
                "https://api.alpaca.markets/v2",
                "wss://api.alpaca.markets/stream",
            )
        } else {
            (
                "https://paper-api.alpaca.markets/v2",
                "wss://paper-api.alpaca.markets/stream",
            )
        };

        Self {
            trading_rest: trading_rest.to_string(),
            data_rest: "https://data.alpaca.markets/v2".to_string(),
            account_stream: account_stream.to_string(),
            market_data_stream: "wss://stream.data.alpaca.markets/v2".to_string(),
        }
    }

    /// Every surface on one base URL. Used against mock servers and proxies.
    #[must_use]
    pub fn single_host(http_base: &str, ws_base: &str) -> Self {
        let http_base = http_base.trim_end_matches('/');
        let ws_base = ws_base.trim_end_matches('/');
        Self {
            trading_rest: format!("{http_base}/v2"),
            data_rest: format!("{http_base}/v2"),
            account_stream: format!("{ws_base}/stream"),
            market_data_stream: format!("{ws_base}/v2"),
        }
    }

    /// Stream URL for a market data source.
    #[must_use]
    pub fn market_data_stream_url(&self, source: DataSource) -> String {
        format!(
            "{}/{}",
            self.market_data_stream.trim_end_matches('/'),
            source.as_str()
        )
    }
}

/// Complete client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API credentials.
    pub credentials: Credentials,
    /// Trading environment.
    pub environment: Environment,
    /// Default market data source.
    pub feed: DataSource,
    /// REST requests allowed per minute (0 disables limiting).
    pub rate_limit_per_minute: u32,
    /// Stream reconnection backoff.
    pub reconnect: ReconnectConfig,
    /// REST request timeout.
    pub http_timeout: Duration,
    /// Service URLs.
    pub endpoints: Endpoints,
}

impl ClientConfig {
    /// Paper-trading configuration with default settings.
    #[must_use]
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            environment: Environment::Paper,
            feed: DataSource::default(),
            rate_limit_per_minute: DEFAULT_REQUESTS_PER_MINUTE,
            reconnect: ReconnectConfig::default(),
            http_timeout: Duration::from_secs(30),
            endpoints: Endpoints::for_environment(Environment::Paper),
        }
    }

    /// Switch environment, resetting the endpoints to its production URLs.
    #[must_use]
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self.endpoints = Endpoints::for_environment(environment);
        self
    }

    /// Override the endpoints.
    #[must_use]
    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Override the reconnection backoff.
    #[must_use]
    pub fn with_reconnect(mut self, reconnect: ReconnectConfig) -> Self {
        self.reconnect = reconnect;
        self
    }

    /// Load configuration from the process environment.
    ///
    /// Reads a `.env` file first when one exists; variables already set in
    /// the environment win.
    ///
    /// # Errors
    ///
    /// Returns an error if credentials are missing, empty or ambiguous, or
    /// if a variable cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv()
            && !e.not_found()
        {
            tracing::warn!(error = %e, "Failed to read .env file");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`ClientConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let credentials = credentials_from(&lookup)?;

        let environment =
            Environment::from_paper_flag(parse_env_bool(&lookup, "ALPACA_PAPER", true)?);

        let feed = match lookup("ALPACA_FEED") {
            Some(value) if !value.trim().is_empty() => {
                DataSource::from_str(value.trim()).map_err(|_| ConfigError::InvalidValue {
                    key: "ALPACA_FEED".to_string(),
                    value,
                })?
            }
            _ => DataSource::default(),
        };

        let defaults = ReconnectConfig::default();
        let reconnect = ReconnectConfig {
            initial_delay: parse_env_duration_millis(
                &lookup,
                "ALPACA_RECONNECT_DELAY_INITIAL_MS",
                defaults.initial_delay,
            )?,
            max_delay: parse_env_duration_secs(
                &lookup,
                "ALPACA_RECONNECT_DELAY_MAX_SECS",
                defaults.max_delay,
            )?,
            multiplier: parse_env(
                &lookup,
                "ALPACA_RECONNECT_DELAY_MULTIPLIER",
                defaults.multiplier,
            )?,
            jitter_factor: defaults.jitter_factor,
            max_attempts: parse_env(
                &lookup,
                "ALPACA_MAX_RECONNECT_ATTEMPTS",
                defaults.max_attempts,
            )?,
        };

        Ok(Self {
            credentials,
            environment,
            feed,
            rate_limit_per_minute: parse_env(
                &lookup,
                "ALPACA_RATE_LIMIT_PER_MINUTE",
                DEFAULT_REQUESTS_PER_MINUTE,
            )?,
            reconnect,
            http_timeout: parse_env_duration_secs(
                &lookup,
                "ALPACA_HTTP_TIMEOUT_SECS",
                Duration::from_secs(30),
            )?,
            endpoints: Endpoints::for_environment(environment),
        })
    }

    /// Stream URL for the configured market data feed.
    #[must_use]
    pub fn market_data_stream_url(&self) -> String {
        self.endpoints.market_data_stream_url(self.feed)
    }
}

/// Configuration error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    /// Environment variable has empty value.
    #[error("environment variable {0} cannot be empty")]
    EmptyValue(String),
    /// Both a key pair and an OAuth token were supplied.
    #[error("set either ALPACA_KEY/ALPACA_SECRET or ALPACA_OAUTH_TOKEN, not both")]
    ConflictingCredentials,
    /// Environment variable could not be parsed.
    #[error("environment variable {key} has invalid value {value:?}")]
    InvalidValue {
        /// Variable name.
        key: String,
        /// Offending value.
        value: String,
    },
}

fn credentials_from<F>(lookup: &F) -> Result<Credentials, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let key = lookup("ALPACA_KEY");
    let secret = lookup("ALPACA_SECRET");
    let token = lookup("ALPACA_OAUTH_TOKEN");

    match (key, secret, token) {
        (None, None, Some(token)) => {
            non_empty("ALPACA_OAUTH_TOKEN", &token)?;
            Ok(Credentials::oauth(token))
        }
        (Some(_), _, Some(_)) | (_, Some(_), Some(_)) => Err(ConfigError::ConflictingCredentials),
        (Some(key), Some(secret), None) => {
            non_empty("ALPACA_KEY", &key)?;
            non_empty("ALPACA_SECRET", &secret)?;
            Ok(Credentials::key_secret(key, secret))
        }
        (Some(_), None, None) => Err(ConfigError::MissingEnvVar("ALPACA_SECRET".to_string())),
        (None, _, None) => Err(ConfigError::MissingEnvVar("ALPACA_KEY".to_string())),
    }
}

fn non_empty(key: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::EmptyValue(key.to_string()));
    }
    Ok(())
}

fn parse_env<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(value) if !value.trim().is_empty() => {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue {
                    key: key.to_string(),
                    value,
                })
        }
        _ => Ok(default),
    }
}

fn parse_env_bool<F>(lookup: &F, key: &str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = lookup(key) else {
        return Ok(default);
    };

    match value.trim().to_lowercase().as_str() {
        "" => Ok(default),
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value,
        }),
    }
}

fn parse_env_duration_secs<F>(lookup: &F, key: &str, default: Duration) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    parse_env(lookup, key, default.as_secs()).map(Duration::from_secs)
}

fn parse_env_duration_millis<F>(
    lookup: &F,
    key: &str,
    default: Duration,
) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let default_ms = u64::try_from(default.as_millis()).unwrap_or(u64::MAX);
    parse_env(lookup, key, default_ms).map(Duration::from_millis)
}
