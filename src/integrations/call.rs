//! Integrations and single-shot cached calls.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use http::HeaderMap;
use serde_json::Value;
use tokio::sync::OnceCell;
use url::Url;

use crate::config::defaults;

use super::{ApiClient, ApiResponse, ClientConfig, HttpClient, HttpError, ReqwestClient};

/// A third-party API and the one call made against it.
///
/// Implementors supply the capability methods describing the remote API
/// and [`perform`](Integration::perform), which issues the request through
/// the [`ApiClient`] built from them.
///
/// # Example
///
/// ```
/// use hookgate::integrations::{ApiClient, ApiResponse, HttpClient, Integration};
/// use url::Url;
///
/// struct RepoStatus {
///     token: String,
/// }
///
/// impl Integration for RepoStatus {
///     fn base_url(&self) -> Url {
///         Url::parse("https://api.github.com/").unwrap()
///     }
///
///     fn auth(&self) -> Option<String> {
///         Some(format!("Bearer {}", self.token))
///     }
///
///     async fn perform<H: HttpClient>(&self, client: &ApiClient<H>) -> ApiResponse {
///         client.get("/repos/owner/repo", &[]).await
///     }
/// }
/// ```
pub trait Integration: Send + Sync {
    /// Base URL of the remote API.
    fn base_url(&self) -> Url;

    /// `Authorization` header value, if the API needs one.
    fn auth(&self) -> Option<String>;

    /// Extra headers sent with every request.
    fn additional_headers(&self) -> HeaderMap {
        HeaderMap::new()
    }

    /// Media type for request bodies.
    fn content_type(&self) -> &str {
        defaults::CONTENT_TYPE
    }

    /// Connect and read timeout.
    fn timeout(&self) -> Duration {
        defaults::timeout()
    }

    /// Issues the integration's call.
    fn perform<H: HttpClient>(
        &self,
        client: &ApiClient<H>,
    ) -> impl Future<Output = ApiResponse> + Send;

    /// Collects the capability methods into a [`ClientConfig`].
    fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::new(self.base_url())
            .with_headers(self.additional_headers())
            .with_content_type(self.content_type())
            .with_timeout(self.timeout());
        config.auth = self.auth();
        config
    }
}

/// One logical call against an [`Integration`], executed at most once.
///
/// The first [`execute`](OneShotCall::execute) issues the request; every later
/// access returns the same cached [`ApiResponse`] without touching the network.
/// Concurrent first accesses are coalesced into a single request. Independent
/// logical calls need independent instances.
pub struct OneShotCall<I, H> {
    integration: I,
    client: ApiClient<H>,
    result: OnceCell<ApiResponse>,
}

impl<I: Integration> OneShotCall<I, ReqwestClient> {
    /// Creates a call that sends through reqwest with the integration's timeout.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] if the reqwest client cannot be initialized.
    pub fn with_reqwest(integration: I) -> Result<Self, HttpError> {
        let http = ReqwestClient::with_timeout(integration.timeout())?;
        Ok(Self::new(integration, http))
    }
}

impl<I: Integration, H: HttpClient> OneShotCall<I, H> {
    /// Creates a call that sends through `http`.
    #[must_use]
    pub fn new(integration: I, http: H) -> Self {
        let client = ApiClient::new(http, integration.client_config());
        Self {
            integration,
            client,
            result: OnceCell::new(),
        }
    }

    /// Returns the call's result, performing the request on first access.
    pub async fn execute(&self) -> &ApiResponse {
        self.result
            .get_or_init(|| self.integration.perform(&self.client))
            .await
    }

    /// Returns the cached result without performing the request.
    #[must_use]
    pub fn result(&self) -> Option<&ApiResponse> {
        self.result.get()
    }

    /// Consumes the call and returns the cached result, if any.
    #[must_use]
    pub fn into_result(self) -> Option<ApiResponse> {
        self.result.into_inner()
    }

    /// Returns the integration.
    #[must_use]
    pub const fn integration(&self) -> &I {
        &self.integration
    }

    /// Returns the client the call sends through.
    #[must_use]
    pub const fn client(&self) -> &ApiClient<H> {
        &self.client
    }
}

impl<I: fmt::Debug, H> fmt::Debug for OneShotCall<I, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OneShotCall")
            .field("integration", &self.integration)
            .field("executed", &self.result.initialized())
            .finish_non_exhaustive()
    }
}

/// Method of a configured call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallMethod {
    /// `GET` with query parameters
    Get,
    /// `POST` with a body
    Post,
    /// `PUT` with a body
    Put,
    /// `DELETE` with query parameters
    Delete,
}

impl fmt::Display for CallMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

/// A single request described by data rather than code.
#[derive(Debug, Clone)]
pub struct CallSpec {
    /// Request method.
    pub method: CallMethod,
    /// Path joined onto the base URL.
    pub path: String,
    /// Query parameters (used by `GET` and `DELETE`).
    pub params: Vec<(String, String)>,
    /// Request body (used by `POST` and `PUT`); `None` sends `{}`.
    pub body: Option<Value>,
}

impl CallSpec {
    /// Creates a call with no parameters and no body.
    #[must_use]
    pub fn new(method: CallMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: Vec::new(),
            body: None,
        }
    }

    /// Adds a query parameter.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Sets the request body.
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// An integration assembled from configuration.
///
/// Backs the `call` subcommand: the API comes from a named config table and
/// the call from command-line arguments.
#[derive(Debug, Clone)]
pub struct ConfiguredIntegration {
    name: String,
    config: ClientConfig,
    call: CallSpec,
}

impl ConfiguredIntegration {
    /// Creates an integration named `name` that makes `call` against `config`.
    #[must_use]
    pub fn new(name: impl Into<String>, config: ClientConfig, call: CallSpec) -> Self {
        Self {
            name: name.into(),
            config,
            call,
        }
    }

    /// Returns the integration name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the configured call.
    #[must_use]
    pub const fn call(&self) -> &CallSpec {
        &self.call
    }
}

impl Integration for ConfiguredIntegration {
    fn base_url(&self) -> Url {
        self.config.base_url.clone()
    }

    fn auth(&self) -> Option<String> {
        self.config.auth.clone()
    }

    fn additional_headers(&self) -> HeaderMap {
        self.config.additional_headers.clone()
    }

    fn content_type(&self) -> &str {
        &self.config.content_type
    }

    fn timeout(&self) -> Duration {
        self.config.timeout
    }

    async fn perform<H: HttpClient>(&self, client: &ApiClient<H>) -> ApiResponse {
        let params: Vec<(&str, &str)> = self
            .call
            .params
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
            .collect();
        let empty = Value::Object(serde_json::Map::new());
        let body = self.call.body.as_ref().unwrap_or(&empty);

        tracing::info!(
            integration = %self.name,
            method = %self.call.method,
            path = %self.call.path,
            "Calling integration"
        );

        match self.call.method {
            CallMethod::Get => client.get(&self.call.path, &params).await,
            CallMethod::Post => client.post(&self.call.path, body).await,
            CallMethod::Put => client.put(&self.call.path, body).await,
            CallMethod::Delete => client.delete(&self.call.path, &params).await,
        }
    }
}
