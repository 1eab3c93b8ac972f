//! The uniform result envelope returned by every outbound call.

use serde::Serialize;
use serde_json::Value;

use super::{DEFAULT_ERROR_STATUS, HttpError, RemoteError};

/// Parsed response content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ResponseBody {
    /// A structured document (parsed JSON).
    Json(Value),
    /// Raw text, kept as received.
    Text(String),
}

impl ResponseBody {
    /// The empty structured document `{}`.
    #[must_use]
    pub fn empty() -> Self {
        Self::Json(Value::Object(serde_json::Map::new()))
    }

    /// Returns the structured document, if this body is JSON.
    #[must_use]
    pub const fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Text(_) => None,
        }
    }

    /// Returns the raw text, if this body is text.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Json(_) => None,
        }
    }
}

/// Result of one outbound call.
///
/// Success is decided purely by `status`: see [`ApiResponse::is_success`].
/// Fields are private so an envelope cannot be altered after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiResponse {
    status: u16,
    body: ResponseBody,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_message: Option<String>,
}

impl ApiResponse {
    /// Creates an envelope without an error message.
    #[must_use]
    pub const fn new(status: u16, body: ResponseBody) -> Self {
        Self {
            status,
            body,
            error_message: None,
        }
    }

    /// Creates an envelope carrying an error message.
    #[must_use]
    pub fn failure(status: u16, body: ResponseBody, error_message: impl Into<String>) -> Self {
        Self {
            status,
            body,
            error_message: Some(error_message.into()),
        }
    }

    /// Builds the envelope for a call that never produced a response.
    #[must_use]
    pub fn from_transport_error(error: &HttpError) -> Self {
        Self::failure(DEFAULT_ERROR_STATUS, ResponseBody::empty(), error.to_string())
    }

    /// HTTP-style status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Parsed body.
    #[must_use]
    pub const fn body(&self) -> &ResponseBody {
        &self.body
    }

    /// Error message, set only on failure.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// True iff `status` is within 200..=299.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status <= 299
    }

    /// Negation of [`is_success`](Self::is_success).
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        !self.is_success()
    }
}

impl From<RemoteError> for ApiResponse {
    fn from(error: RemoteError) -> Self {
        let message = error.to_string();
        let status = error.response.status.as_u16();
        let body = ResponseBody::Text(error.response.body_lossy().into_owned());

        Self::failure(status, body, message)
    }
}
