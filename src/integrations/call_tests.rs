//! Tests for integrations and single-shot calls.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::{
    ApiClient, ApiResponse, CallMethod, CallSpec, ClientConfig, ConfiguredIntegration,
    HttpClient, HttpError, HttpRequest, HttpResponse, Integration, OneShotCall,
};

/// Counts requests and answers each with `{"call": n}`.
#[derive(Debug, Default)]
struct CountingClient {
    calls: AtomicUsize,
}

impl CountingClient {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl HttpClient for CountingClient {
    async fn request(&self, _req: HttpRequest) -> Result<HttpResponse, HttpError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(Duration::from_millis(10)).await;

        let mut headers = http::HeaderMap::new();
        headers.insert(
            http::header::CONTENT_TYPE,
            http::HeaderValue::from_static("application/json"),
        );
        Ok(HttpResponse::new(
            http::StatusCode::OK,
            headers,
            format!(r#"{{"call": {n}}}"#).into_bytes(),
        ))
    }
}

impl HttpClient for Arc<CountingClient> {
    async fn request(&self, req: HttpRequest) -> Result<HttpResponse, HttpError> {
        (**self).request(req).await
    }
}

/// Integration whose call is `GET /status`.
#[derive(Debug)]
struct StatusCheck;

impl Integration for StatusCheck {
    fn base_url(&self) -> url::Url {
        url::Url::parse("https://status.example.com/").unwrap()
    }

    fn auth(&self) -> Option<String> {
        Some("Bearer token".to_string())
    }

    async fn perform<H: HttpClient>(&self, client: &ApiClient<H>) -> ApiResponse {
        client.get("/status", &[]).await
    }
}

mod one_shot_call {
    use super::*;

    #[tokio::test]
    async fn execute_performs_request_once() {
        let http = Arc::new(CountingClient::default());
        let call = OneShotCall::new(StatusCheck, Arc::clone(&http));

        let first = call.execute().await.clone();
        let second = call.execute().await.clone();

        assert_eq!(http.calls(), 1);
        assert_eq!(first, second);
        assert_eq!(first.body().as_json(), Some(&json!({"call": 1})));
    }

    #[tokio::test]
    async fn repeated_access_returns_same_cached_value() {
        let call = OneShotCall::new(StatusCheck, CountingClient::default());

        let first: *const ApiResponse = call.execute().await;
        let second: *const ApiResponse = call.execute().await;

        assert!(std::ptr::eq(first, second));
    }

    #[tokio::test]
    async fn concurrent_first_access_issues_one_request() {
        let http = Arc::new(CountingClient::default());
        let call = OneShotCall::new(StatusCheck, Arc::clone(&http));

        let (a, b, c) = tokio::join!(call.execute(), call.execute(), call.execute());

        assert_eq!(http.calls(), 1);
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[tokio::test]
    async fn result_is_empty_until_executed() {
        let call = OneShotCall::new(StatusCheck, CountingClient::default());

        assert!(call.result().is_none());
        call.execute().await;
        assert!(call.result().is_some());
        assert!(call.into_result().unwrap().is_success());
    }

    #[tokio::test]
    async fn independent_instances_make_independent_calls() {
        let http = Arc::new(CountingClient::default());
        let first = OneShotCall::new(StatusCheck, Arc::clone(&http));
        let second = OneShotCall::new(StatusCheck, Arc::clone(&http));

        first.execute().await;
        second.execute().await;

        assert_eq!(http.calls(), 2);
        assert_eq!(
            second.execute().await.body().as_json(),
            Some(&json!({"call": 2}))
        );
    }

    #[test]
    fn client_is_built_from_capabilities() {
        let call = OneShotCall::new(StatusCheck, CountingClient::default());
        let config = call.client().config();

        assert_eq!(config.base_url.as_str(), "https://status.example.com/");
        assert_eq!(config.auth.as_deref(), Some("Bearer token"));
        assert_eq!(config.content_type, "application/json");
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn debug_reports_execution_state() {
        let call = OneShotCall::new(StatusCheck, CountingClient::default());

        assert!(format!("{call:?}").contains("executed: false"));
    }
}

mod configured_integration {
    use super::*;

    fn integration(server: &MockServer, call: CallSpec) -> ConfiguredIntegration {
        let config = ClientConfig::new(url::Url::parse(&server.uri()).unwrap())
            .with_timeout(Duration::from_secs(5));
        ConfiguredIntegration::new("example", config, call)
    }

    #[test]
    fn call_method_displays_verb() {
        assert_eq!(CallMethod::Get.to_string(), "GET");
        assert_eq!(CallMethod::Delete.to_string(), "DELETE");
    }

    #[test]
    fn capabilities_mirror_config() {
        let config = ClientConfig::new(url::Url::parse("https://api.example.com/").unwrap())
            .with_auth("token")
            .with_content_type("text/plain")
            .with_timeout(Duration::from_secs(3));
        let integration =
            ConfiguredIntegration::new("example", config, CallSpec::new(CallMethod::Get, "/"));

        assert_eq!(integration.name(), "example");
        assert_eq!(integration.auth().as_deref(), Some("token"));
        assert_eq!(integration.content_type(), "text/plain");
        assert_eq!(integration.timeout(), Duration::from_secs(3));
    }

    #[tokio::test]
    async fn get_sends_params() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(wiremock::matchers::query_param("q", "hooks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"hits": 1})))
            .expect(1)
            .mount(&server)
            .await;

        let spec = CallSpec::new(CallMethod::Get, "/search").with_param("q", "hooks");
        let call = OneShotCall::with_reqwest(integration(&server, spec)).unwrap();

        let response = call.execute().await;

        assert!(response.is_success());
        assert_eq!(response.body().as_json(), Some(&json!({"hits": 1})));
    }

    #[tokio::test]
    async fn post_without_body_sends_empty_document() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hooks"))
            .and(wiremock::matchers::body_json(json!({})))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let spec = CallSpec::new(CallMethod::Post, "/hooks");
        let call = OneShotCall::with_reqwest(integration(&server, spec)).unwrap();

        assert_eq!(call.execute().await.status(), 201);
    }

    #[tokio::test]
    async fn put_sends_given_body() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/hooks/1"))
            .and(wiremock::matchers::body_json(json!({"active": false})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let spec = CallSpec::new(CallMethod::Put, "/hooks/1").with_body(json!({"active": false}));
        let call = OneShotCall::with_reqwest(integration(&server, spec)).unwrap();

        assert!(call.execute().await.is_success());
    }

    #[tokio::test]
    async fn delete_failure_is_reported_in_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
            .mount(&server)
            .await;

        let spec = CallSpec::new(CallMethod::Delete, "/hooks/9");
        let call = OneShotCall::with_reqwest(integration(&server, spec)).unwrap();

        let response = call.execute().await;

        assert!(response.is_failure());
        assert_eq!(response.error_message(), Some("Client error: 404, Not Found"));
    }
}
