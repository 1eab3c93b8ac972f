//! Wire-level request and response values, and the client seam.
//!
//! [`ApiClient`](super::ApiClient) assembles an [`HttpRequest`], hands it to
//! an [`HttpClient`], and interprets the buffered [`HttpResponse`]. Nothing in
//! this module classifies status codes.

use std::borrow::Cow;
use std::future::Future;
use std::time::Duration;

use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use url::Url;

use super::HttpError;

/// One outbound request, fully assembled.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// Request method.
    pub method: Method,
    /// Absolute URL with the query string already applied.
    pub url: Url,
    /// Headers in send order.
    pub headers: HeaderMap,
    /// Encoded body; `None` sends no body at all.
    pub body: Option<Vec<u8>>,
    /// Bound on the whole exchange, on top of the client's own.
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    /// A bare request: no headers, no body, no timeout.
    #[must_use]
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
            timeout: None,
        }
    }

    /// Shorthand for `new(Method::GET, url)`.
    #[must_use]
    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    /// Shorthand for `new(Method::POST, url)`.
    #[must_use]
    pub fn post(url: Url) -> Self {
        Self::new(Method::POST, url)
    }

    /// Attaches an encoded body.
    #[must_use]
    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// Appends one header value; repeated names keep every value.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Swaps in a complete header map.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Bounds the exchange.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// A response read to the end.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Status line code.
    pub status: StatusCode,
    /// Headers as received.
    pub headers: HeaderMap,
    /// Entire body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Wraps a status, headers and fully read body.
    #[must_use]
    pub const fn new(status: StatusCode, headers: HeaderMap, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// True for any 2xx status.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// The body as `&str`, or `None` when it is not UTF-8.
    #[must_use]
    pub fn body_text(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }

    /// The body as text with invalid sequences replaced.
    #[must_use]
    pub fn body_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// The `Content-Type` header, when present and visible ASCII.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
    }

    /// True when `Content-Type` mentions `application/json`.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.content_type()
            .is_some_and(|value| value.contains("application/json"))
    }
}

/// Sends an [`HttpRequest`] and buffers the reply.
///
/// [`ReqwestClient`](super::ReqwestClient) is the production implementation;
/// tests substitute canned or counting clients.
///
/// ```ignore
/// struct Canned(HttpResponse);
///
/// impl HttpClient for Canned {
///     async fn request(&self, _req: HttpRequest) -> Result<HttpResponse, HttpError> {
///         Ok(self.0.clone())
///     }
/// }
/// ```
pub trait HttpClient: Send + Sync {
    /// Performs one exchange.
    ///
    /// Any status code, including 4xx and 5xx, is an `Ok` response.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] when no response was obtained: the connection
    /// failed, the timeout elapsed, or the request could not be built.
    fn request(
        &self,
        req: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, HttpError>> + Send;
}
