//! Configured API client with uniform success/failure semantics.

use std::time::Duration;

use http::header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue};
use http::{HeaderMap, Method};
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::config::defaults;

use super::{
    ApiResponse, HttpClient, HttpError, HttpRequest, HttpResponse, RemoteError, ResponseBody,
};

/// Construction-time options for an [`ApiClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL that call paths are joined onto.
    pub base_url: Url,
    /// Value of the `Authorization` header, if any.
    pub auth: Option<String>,
    /// Headers merged into every request, overriding the defaults.
    pub additional_headers: HeaderMap,
    /// Media type used for request serialization and the `Content-Type` header.
    pub content_type: String,
    /// Bound on both connection and read phases.
    pub timeout: Duration,
}

impl ClientConfig {
    /// Creates a configuration with no auth, no extra headers, JSON content
    /// and the default timeout.
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            auth: None,
            additional_headers: HeaderMap::new(),
            content_type: defaults::CONTENT_TYPE.to_string(),
            timeout: defaults::timeout(),
        }
    }

    /// Sets the `Authorization` header value.
    #[must_use]
    pub fn with_auth(mut self, auth: impl Into<String>) -> Self {
        self.auth = Some(auth.into());
        self
    }

    /// Sets the headers merged into every request.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.additional_headers = headers;
        self
    }

    /// Sets the content type.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Sets the timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns true if bodies are serialized as JSON.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.content_type == defaults::CONTENT_TYPE
    }
}

/// HTTP client bound to one third-party API.
///
/// Every operation returns an [`ApiResponse`]; transport errors and
/// classified remote errors are folded into failure envelopes, so callers
/// branch on [`ApiResponse::is_success`] instead of handling errors.
///
/// # Example
///
/// ```no_run
/// use hookgate::integrations::{ApiClient, ClientConfig, ReqwestClient};
/// use url::Url;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ClientConfig::new(Url::parse("https://api.example.com/")?)
///     .with_auth("Bearer token");
/// let client = ApiClient::new(ReqwestClient::with_timeout(config.timeout)?, config);
///
/// let response = client.get("/repos", &[("page", "2")]).await;
/// if response.is_failure() {
///     eprintln!("{}", response.error_message().unwrap_or_default());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ApiClient<H> {
    http: H,
    config: ClientConfig,
}

impl<H> ApiClient<H> {
    /// Creates a client that sends through `http` using `config`.
    #[must_use]
    pub const fn new(http: H, config: ClientConfig) -> Self {
        Self { http, config }
    }

    /// Returns the client configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns the underlying HTTP client.
    #[must_use]
    pub const fn http(&self) -> &H {
        &self.http
    }
}

impl<H: HttpClient> ApiClient<H> {
    /// Performs a GET request with `params` as the query string.
    pub async fn get(&self, path: &str, params: &[(&str, &str)]) -> ApiResponse {
        self.request(Method::GET, path, params, None).await
    }

    /// Performs a POST request carrying `body`.
    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ApiResponse {
        match self.encode_body(body) {
            Ok(encoded) => self.request(Method::POST, path, &[], Some(encoded)).await,
            Err(e) => ApiResponse::from_transport_error(&e),
        }
    }

    /// Performs a PUT request carrying `body`.
    pub async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ApiResponse {
        match self.encode_body(body) {
            Ok(encoded) => self.request(Method::PUT, path, &[], Some(encoded)).await,
            Err(e) => ApiResponse::from_transport_error(&e),
        }
    }

    /// Performs a DELETE request with `params` as the query string.
    pub async fn delete(&self, path: &str, params: &[(&str, &str)]) -> ApiResponse {
        self.request(Method::DELETE, path, params, None).await
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, &str)],
        body: Option<Vec<u8>>,
    ) -> ApiResponse {
        let request = match self.build_request(method, path, params, body) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(path, error = %e, "Could not build outbound request");
                return ApiResponse::from_transport_error(&e);
            }
        };

        tracing::debug!(method = %request.method, url = %request.url, "Sending outbound request");

        match self.http.request(request).await {
            Ok(response) => handle_response(response),
            Err(e) => {
                tracing::warn!(path, error = %e, "Outbound request failed");
                ApiResponse::from_transport_error(&e)
            }
        }
    }

    fn build_request(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, &str)],
        body: Option<Vec<u8>>,
    ) -> Result<HttpRequest, HttpError> {
        let mut url = self.build_url(path)?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }

        let mut request = HttpRequest::new(method, url)
            .with_headers(self.default_headers()?)
            .with_timeout(self.config.timeout);
        request.body = body;

        Ok(request)
    }

    /// Joins `path` onto the base URL with standard URL-join semantics.
    fn build_url(&self, path: &str) -> Result<Url, HttpError> {
        self.config
            .base_url
            .join(path)
            .map_err(|e| HttpError::InvalidUrl(format!("{path}: {e}")))
    }

    /// Content type first, then auth, then additional headers on top.
    fn default_headers(&self) -> Result<HeaderMap, HttpError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            header_value("Content-Type", &self.config.content_type)?,
        );

        if let Some(auth) = &self.config.auth {
            let mut value = header_value("Authorization", auth)?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        for (name, value) in &self.config.additional_headers {
            headers.insert(name, value.clone());
        }

        Ok(headers)
    }

    /// JSON content types get a JSON document; anything else is sent as a
    /// plain string when the body is one, or form-encoded otherwise.
    fn encode_body<B: Serialize + ?Sized>(&self, body: &B) -> Result<Vec<u8>, HttpError> {
        if self.config.is_json() {
            return serde_json::to_vec(body).map_err(|e| HttpError::InvalidRequest(e.to_string()));
        }

        let value =
            serde_json::to_value(body).map_err(|e| HttpError::InvalidRequest(e.to_string()))?;
        match value {
            Value::String(text) => Ok(text.into_bytes()),
            Value::Object(map) => {
                let mut form = url::form_urlencoded::Serializer::new(String::new());
                for (key, value) in &map {
                    match value {
                        Value::String(text) => form.append_pair(key, text),
                        other => form.append_pair(key, &other.to_string()),
                    };
                }
                Ok(form.finish().into_bytes())
            }
            Value::Null => Ok(Vec::new()),
            other => Ok(other.to_string().into_bytes()),
        }
    }
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue, HttpError> {
    HeaderValue::from_str(value)
        .map_err(|e| HttpError::InvalidRequest(format!("invalid {name} header: {e}")))
}

/// Turns a raw response into an envelope: classified statuses become
/// failures, everything else is parsed and judged by the 2xx check.
fn handle_response(response: HttpResponse) -> ApiResponse {
    match RemoteError::check(response) {
        Ok(response) => build_success_response(&response),
        Err(remote) => {
            tracing::warn!(
                status = remote.response.status.as_u16(),
                kind = remote.kind.label(),
                "Remote call failed"
            );
            remote.into()
        }
    }
}

fn build_success_response(response: &HttpResponse) -> ApiResponse {
    let status = response.status.as_u16();
    let body = parse_body(response);

    if response.is_success() {
        ApiResponse::new(status, body)
    } else {
        ApiResponse::failure(status, body, format!("Unexpected status: {status}"))
    }
}

/// Empty bodies and unparseable JSON both yield `{}` rather than an error.
fn parse_body(response: &HttpResponse) -> ResponseBody {
    if response.body.is_empty() {
        return ResponseBody::empty();
    }

    if response.is_json() {
        return serde_json::from_slice(&response.body)
            .map_or_else(|_| ResponseBody::empty(), ResponseBody::Json);
    }

    ResponseBody::Text(response.body_lossy().into_owned())
}
