//! REST client error type.

use serde::Deserialize;
use thiserror::Error;

use crate::application::ports::TransportError;
use crate::domain::normalize::NormalizeError;
use crate::infrastructure::alpaca::params::InvalidRequest;
use crate::infrastructure::config::ConfigError;

/// Errors from the REST surface.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request failed in transit or the server answered non-2xx.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The response body was not the expected JSON.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// The response decoded but could not be normalized.
    #[error("normalize error: {0}")]
    Normalize(#[from] NormalizeError),

    /// Parameters were rejected before sending.
    #[error(transparent)]
    InvalidRequest(#[from] InvalidRequest),

    /// The client could not be built from configuration.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Error body Alpaca returns with non-2xx answers.
///
/// # Wire Format (JSON)
/// ```json
/// {"code": 40310000, "message": "insufficient buying power"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiErrorBody {
    /// Alpaca error code.
    #[serde(default)]
    pub code: Option<i64>,
    /// Human readable message.
    pub message: String,
}

impl ClientError {
    /// HTTP status of a non-2xx answer.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Transport(TransportError::Status { status, .. }) => Some(*status),
            _ => None,
        }
    }

    /// Alpaca's error body, when the server sent one.
    #[must_use]
    pub fn api_error(&self) -> Option<ApiErrorBody> {
        match self {
            Self::Transport(TransportError::Status { body, .. }) => {
                serde_json::from_str(body).ok()
            }
            _ => None,
        }
    }

    /// Whether the server reported that the resource does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self.status(), Some(404))
    }
}
