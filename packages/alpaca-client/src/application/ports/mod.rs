//! Port Interfaces
//!
//! Contracts the client needs from the outside world. Production adapters
//! live in [`crate::infrastructure`]; tests substitute in-memory ones.
//!
//! ## Driven Ports (Outbound)
//!
//! - [`HttpTransport`]: one HTTP request, body returned as text
//! - [`RateLimiter`]: awaited before every REST call
//! - [`WebSocketConnector`] / [`WebSocketConnection`]: a text-frame socket

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

// =============================================================================
// HTTP
// =============================================================================

/// HTTP method used by the REST wrappers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// GET
    Get,
    /// POST
    Post,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
}

impl HttpMethod {
    /// Method name as sent on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully resolved HTTP request.
#[derive(Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Method.
    pub method: HttpMethod,
    /// Absolute URL without query string.
    pub url: String,
    /// Query parameters, in order.
    pub query: Vec<(String, String)>,
    /// Extra headers (credentials).
    pub headers: Vec<(&'static str, String)>,
    /// JSON body.
    pub body: Option<String>,
}

impl HttpRequest {
    /// Request with no query, headers or body.
    #[must_use]
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Append query parameters.
    #[must_use]
    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query.extend(query);
        self
    }

    /// Append headers.
    #[must_use]
    pub fn with_headers(mut self, headers: Vec<(&'static str, String)>) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Set the JSON body.
    #[must_use]
    pub fn with_body(mut self, body: String) -> Self {
        self.body = Some(body);
        self
    }
}

// Header values are credentials; keep them out of logs.
impl fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header_names: Vec<&str> = self.headers.iter().map(|(name, _)| *name).collect();
        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("query", &self.query)
            .field("headers", &header_names)
            .field("body", &self.body)
            .finish()
    }
}

/// Transport-level failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The server answered with a non-2xx status. Body kept intact.
    #[error("HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },

    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(String),

    /// WebSocket handshake or framing failure.
    #[error("websocket error: {0}")]
    WebSocket(String),

    /// The socket is closed.
    #[error("connection closed")]
    Closed,
}

/// Port for issuing HTTP requests.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send `request` and return the response body of a 2xx answer.
    ///
    /// # Errors
    ///
    /// [`TransportError::Status`] for non-2xx answers,
    /// [`TransportError::Network`] when no answer arrived.
    async fn send(&self, request: HttpRequest) -> Result<String, TransportError>;
}

/// Port throttling outbound REST calls.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Wait until one more request may be sent.
    async fn acquire(&self);
}

// =============================================================================
// WebSocket
// =============================================================================

/// Port opening WebSocket connections.
#[async_trait]
pub trait WebSocketConnector: Send + Sync {
    /// Open a connection to `url`.
    async fn connect(&self, url: &str) -> Result<Box<dyn WebSocketConnection>, TransportError>;
}

/// An open text-frame WebSocket.
#[async_trait]
pub trait WebSocketConnection: Send {
    /// Send one text frame.
    async fn send(&mut self, text: String) -> Result<(), TransportError>;

    /// Next text frame. `None` once the peer closed the connection.
    async fn next_frame(&mut self) -> Option<Result<String, TransportError>>;

    /// Close the connection.
    async fn close(&mut self) -> Result<(), TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_hides_header_values() {
        let request = HttpRequest::new(HttpMethod::Get, "https://example.test/v2/account")
            .with_headers(vec![("APCA-API-SECRET-KEY", "hunter2".to_string())]);
        let debug = format!("{request:?}");
        assert!(debug.contains("APCA-API-SECRET-KEY"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn builder_appends() {
        let request = HttpRequest::new(HttpMethod::Post, "u")
            .with_query(vec![("a".into(), "1".into())])
            .with_query(vec![("b".into(), "2".into())])
            .with_body("{}".into());
        assert_eq!(request.query.len(), 2);
        assert_eq!(request.body.as_deref(), Some("{}"));
        assert_eq!(request.method.to_string(), "POST");
    }
}
