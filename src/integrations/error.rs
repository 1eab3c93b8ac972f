//! Error types for outbound HTTP operations.
//!
//! Two layers: [`HttpError`] for transport failures where no usable response
//! exists, and [`RemoteError`] for responses whose status code falls in the
//! classified failure table.

use thiserror::Error;

use super::HttpResponse;

/// Status reported in an envelope when a call failed without any response.
pub const DEFAULT_ERROR_STATUS: u16 = 500;

/// Error type for HTTP transport operations.
///
/// Describes what went wrong without dictating recovery strategy.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Network connection failed.
    ///
    /// This includes DNS resolution failures, connection refused,
    /// and other network-level errors.
    #[error("Connection error: {0}")]
    Connection(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Request timed out.
    ///
    /// The server did not respond within the configured timeout period.
    #[error("Request timed out")]
    Timeout,

    /// The provided URL is invalid.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The request could not be assembled (bad header value, unencodable body).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Classification of a remote failure by status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteErrorKind {
    /// Remote 5xx other than the gateway-timeout codes (500, 503).
    Server,
    /// Gateway-type failures (502, 504).
    Timeout,
    /// Failures caused by the request itself (400, 401, 404, 422, 429).
    Client,
}

impl RemoteErrorKind {
    /// Classifies a status code against the fixed failure table.
    ///
    /// Exact codes only: anything not listed returns `None` and is handled as
    /// a raw response.
    #[must_use]
    pub const fn classify(status: http::StatusCode) -> Option<Self> {
        match status.as_u16() {
            502 | 504 => Some(Self::Timeout),
            500 | 503 => Some(Self::Server),
            400 | 401 | 404 | 422 | 429 => Some(Self::Client),
            _ => None,
        }
    }

    /// Human-readable prefix used in error messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Server => "Server",
            Self::Timeout => "Timeout",
            Self::Client => "Client",
        }
    }
}

/// A classified remote failure.
///
/// Retains the raw response so the envelope built from it can carry the
/// original status and body.
#[derive(Debug, Error)]
#[error("{} error: {}, {}", .kind.label(), .response.status.as_u16(), .response.body_lossy())]
pub struct RemoteError {
    /// Which class of failure this is.
    pub kind: RemoteErrorKind,
    /// The response that triggered the failure.
    pub response: HttpResponse,
}

impl RemoteError {
    /// Passes a response through unless its status is in the failure table.
    ///
    /// # Errors
    ///
    /// Returns a [`RemoteError`] wrapping the response when its status code
    /// classifies as a server, timeout, or client error.
    pub fn check(response: HttpResponse) -> Result<HttpResponse, Self> {
        match RemoteErrorKind::classify(response.status) {
            Some(kind) => Err(Self { kind, response }),
            None => Ok(response),
        }
    }
}
