//! Tests for `ApiClient`.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use super::{
    ApiClient, ClientConfig, HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestClient,
    ResponseBody,
};

/// Mock HTTP client that returns a configurable sequence of responses.
#[derive(Debug)]
struct MockClient {
    responses: Mutex<Vec<Result<HttpResponse, HttpError>>>,
    requests: Mutex<Vec<HttpRequest>>,
    call_count: AtomicUsize,
}

impl MockClient {
    fn new(responses: Vec<Result<HttpResponse, HttpError>>) -> Self {
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
            call_count: AtomicUsize::new(0),
        }
    }

    fn replying(status: u16, content_type: Option<&'static str>, body: &str) -> Self {
        let mut headers = http::HeaderMap::new();
        if let Some(content_type) = content_type {
            headers.insert(
                http::header::CONTENT_TYPE,
                http::HeaderValue::from_static(content_type),
            );
        }
        Self::new(vec![Ok(HttpResponse::new(
            http::StatusCode::from_u16(status).unwrap(),
            headers,
            body.as_bytes().to_vec(),
        ))])
    }

    fn ok() -> Self {
        Self::replying(200, None, "")
    }

    fn failing(error: HttpError) -> Self {
        Self::new(vec![Err(error)])
    }

    fn calls(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    fn last_request(&self) -> HttpRequest {
        self.requests.lock().unwrap().last().cloned().unwrap()
    }
}

impl HttpClient for MockClient {
    async fn request(&self, req: HttpRequest) -> Result<HttpResponse, HttpError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(req);
        self.responses.lock().unwrap().remove(0)
    }
}

fn config() -> ClientConfig {
    ClientConfig::new(url::Url::parse("https://api.example.com/v1/").unwrap())
}

fn client(mock: MockClient) -> ApiClient<MockClient> {
    ApiClient::new(mock, config())
}

mod client_config {
    use super::*;

    #[test]
    fn new_applies_defaults() {
        let config = config();

        assert!(config.auth.is_none());
        assert!(config.additional_headers.is_empty());
        assert_eq!(config.content_type, "application/json");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.is_json());
    }

    #[test]
    fn builder_overrides_defaults() {
        let config = config()
            .with_auth("Bearer token")
            .with_content_type("application/x-www-form-urlencoded")
            .with_timeout(Duration::from_secs(5));

        assert_eq!(config.auth.as_deref(), Some("Bearer token"));
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert!(!config.is_json());
    }
}

mod request_building {
    use super::*;

    #[tokio::test]
    async fn relative_path_joins_onto_base() {
        let api = client(MockClient::ok());

        api.get("items", &[("page", "2"), ("q", "a b")]).await;

        assert_eq!(
            api.http().last_request().url.as_str(),
            "https://api.example.com/v1/items?page=2&q=a+b"
        );
    }

    #[tokio::test]
    async fn absolute_path_replaces_base_path() {
        let api = client(MockClient::ok());

        api.delete("/path", &[]).await;

        let request = api.http().last_request();
        assert_eq!(request.url.as_str(), "https://api.example.com/path");
        assert_eq!(request.method, http::Method::DELETE);
        assert!(request.body.is_none());
    }

    #[tokio::test]
    async fn default_headers_include_content_type_only_without_auth() {
        let api = client(MockClient::ok());

        api.get("items", &[]).await;

        let headers = api.http().last_request().headers;
        assert_eq!(headers[http::header::CONTENT_TYPE], "application/json");
        assert!(!headers.contains_key(http::header::AUTHORIZATION));
    }

    #[tokio::test]
    async fn auth_and_additional_headers_are_sent() {
        let mut extra = http::HeaderMap::new();
        extra.insert("x-trace", http::HeaderValue::from_static("abc"));
        extra.insert(
            http::header::CONTENT_TYPE,
            http::HeaderValue::from_static("application/vnd.api+json"),
        );
        let api = ApiClient::new(
            MockClient::ok(),
            config().with_auth("Bearer token").with_headers(extra),
        );

        api.get("items", &[]).await;

        let headers = api.http().last_request().headers;
        assert_eq!(headers[http::header::AUTHORIZATION], "Bearer token");
        assert_eq!(headers["x-trace"], "abc");
        assert_eq!(
            headers[http::header::CONTENT_TYPE],
            "application/vnd.api+json"
        );
    }

    #[tokio::test]
    async fn configured_timeout_is_attached() {
        let api = ApiClient::new(
            MockClient::ok(),
            config().with_timeout(Duration::from_secs(7)),
        );

        api.get("items", &[]).await;

        assert_eq!(
            api.http().last_request().timeout,
            Some(Duration::from_secs(7))
        );
    }

    #[tokio::test]
    async fn json_body_is_serialized() {
        let api = client(MockClient::ok());
        let body = json!({"name": "hook", "active": true});

        api.post("hooks", &body).await;

        let request = api.http().last_request();
        assert_eq!(request.method, http::Method::POST);
        let sent: serde_json::Value = serde_json::from_slice(&request.body.unwrap()).unwrap();
        assert_eq!(sent, body);
    }

    #[tokio::test]
    async fn form_content_type_encodes_objects() {
        let api = ApiClient::new(
            MockClient::ok(),
            config().with_content_type("application/x-www-form-urlencoded"),
        );

        api.put("hooks/1", &json!({"name": "a b", "count": 3})).await;

        let body = api.http().last_request().body.unwrap();
        assert_eq!(String::from_utf8(body).unwrap(), "count=3&name=a+b");
    }

    #[tokio::test]
    async fn non_json_string_body_is_sent_as_is() {
        let api = ApiClient::new(MockClient::ok(), config().with_content_type("text/plain"));

        api.post("notes", "plain words").await;

        let body = api.http().last_request().body.unwrap();
        assert_eq!(body, b"plain words".to_vec());
    }

    #[tokio::test]
    async fn invalid_auth_value_fails_without_sending() {
        let api = ApiClient::new(MockClient::ok(), config().with_auth("Bearer \nbroken"));

        let response = api.get("items", &[]).await;

        assert!(response.is_failure());
        assert_eq!(response.status(), 500);
        assert!(response.error_message().unwrap().contains("Authorization"));
        assert_eq!(api.http().calls(), 0);
    }
}

mod response_handling {
    use super::*;

    #[tokio::test]
    async fn classified_statuses_become_failures() {
        let table = [
            (500, "Server error"),
            (503, "Server error"),
            (502, "Timeout error"),
            (504, "Timeout error"),
            (400, "Client error"),
            (401, "Client error"),
            (404, "Client error"),
            (422, "Client error"),
            (429, "Client error"),
        ];

        for (status, prefix) in table {
            let api = client(MockClient::replying(status, None, "oops"));

            let response = api.get("items", &[]).await;

            assert!(response.is_failure(), "status {status}");
            assert_eq!(response.status(), status);
            assert_eq!(response.body().as_text(), Some("oops"));
            assert_eq!(
                response.error_message(),
                Some(format!("{prefix}: {status}, oops").as_str())
            );
        }
    }

    #[tokio::test]
    async fn json_success_body_is_parsed() {
        let api = client(MockClient::replying(
            200,
            Some("application/json"),
            r#"{"id": 7}"#,
        ));

        let response = api.get("items/7", &[]).await;

        assert!(response.is_success());
        assert_eq!(response.body(), &ResponseBody::Json(json!({"id": 7})));
        assert!(response.error_message().is_none());
    }

    #[tokio::test]
    async fn malformed_json_yields_empty_document() {
        let api = client(MockClient::replying(200, Some("application/json"), "{not json"));

        let response = api.get("items", &[]).await;

        assert!(response.is_success());
        assert_eq!(response.body(), &ResponseBody::empty());
    }

    #[tokio::test]
    async fn empty_body_yields_empty_document() {
        let api = client(MockClient::replying(204, Some("application/json"), ""));

        let response = api.delete("items/7", &[]).await;

        assert!(response.is_success());
        assert_eq!(response.status(), 204);
        assert_eq!(response.body(), &ResponseBody::empty());
    }

    #[tokio::test]
    async fn non_json_body_is_kept_as_text() {
        let api = client(MockClient::replying(200, Some("text/plain"), "pong"));

        let response = api.get("ping", &[]).await;

        assert_eq!(response.body().as_text(), Some("pong"));
    }

    #[tokio::test]
    async fn unclassified_non_2xx_is_a_failure() {
        let api = client(MockClient::replying(403, Some("text/plain"), "forbidden"));

        let response = api.get("secret", &[]).await;

        assert!(response.is_failure());
        assert_eq!(response.status(), 403);
        assert_eq!(response.body().as_text(), Some("forbidden"));
        assert_eq!(response.error_message(), Some("Unexpected status: 403"));
    }

    #[tokio::test]
    async fn transport_errors_become_failure_envelopes() {
        let errors = [
            HttpError::Timeout,
            HttpError::Connection(Box::new(std::io::Error::other("refused"))),
            HttpError::InvalidUrl("bad".to_string()),
        ];

        for error in errors {
            let message = error.to_string();
            let api = client(MockClient::failing(error));

            let response = api.get("items", &[]).await;

            assert!(response.is_failure());
            assert_eq!(response.status(), 500);
            assert_eq!(response.body(), &ResponseBody::empty());
            assert_eq!(response.error_message(), Some(message.as_str()));
        }
    }
}

mod against_server {
    use super::*;

    /// Replies with the request body under the request's content type.
    struct Echo;

    impl Respond for Echo {
        fn respond(&self, request: &Request) -> ResponseTemplate {
            ResponseTemplate::new(201).set_body_raw(request.body.clone(), "application/json")
        }
    }

    fn live_client(
        server: &MockServer,
        config: impl FnOnce(ClientConfig) -> ClientConfig,
    ) -> ApiClient<ReqwestClient> {
        let config = config(ClientConfig::new(url::Url::parse(&server.uri()).unwrap()));
        ApiClient::new(ReqwestClient::with_timeout(config.timeout).unwrap(), config)
    }

    #[tokio::test]
    async fn server_error_becomes_failure_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/path"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
            .expect(1)
            .mount(&server)
            .await;

        let response = live_client(&server, |c| c).get("/path", &[]).await;

        assert_eq!(response.status(), 500);
        assert!(response.is_failure());
        let message = response.error_message().unwrap();
        assert!(message.contains("Server error: 500"));
        assert!(message.contains("Internal Server Error"));
    }

    #[tokio::test]
    async fn json_body_round_trips_through_echo() {
        let server = MockServer::start().await;
        let body = json!({"action": "opened", "nested": {"ids": [1, 2, 3]}});
        Mock::given(method("POST"))
            .and(path("/echo"))
            .and(body_json(&body))
            .respond_with(Echo)
            .mount(&server)
            .await;

        let response = live_client(&server, |c| c).post("/echo", &body).await;

        assert!(response.is_success());
        assert_eq!(response.status(), 201);
        assert_eq!(response.body(), &ResponseBody::Json(body));
    }

    #[tokio::test]
    async fn put_body_round_trips_through_echo() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(Echo)
            .mount(&server)
            .await;

        let response = live_client(&server, |c| c)
            .put("/items/1", &json!({"name": "renamed"}))
            .await;

        assert_eq!(response.body().as_json(), Some(&json!({"name": "renamed"})));
    }

    #[tokio::test]
    async fn auth_header_and_query_reach_server() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos"))
            .and(header("Authorization", "Bearer token"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}])))
            .expect(1)
            .mount(&server)
            .await;

        let response = live_client(&server, |c| c.with_auth("Bearer token"))
            .get("/repos", &[("page", "2")])
            .await;

        assert!(response.is_success());
        assert_eq!(response.body().as_json(), Some(&json!([{"id": 1}])));
    }

    #[tokio::test]
    async fn slow_server_times_out_into_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let response = live_client(&server, |c| c.with_timeout(Duration::from_millis(100)))
            .get("/slow", &[])
            .await;

        assert!(response.is_failure());
        assert_eq!(response.status(), 500);
        assert_eq!(response.error_message(), Some("Request timed out"));
    }

    #[tokio::test]
    async fn refused_connection_becomes_failure() {
        let config = ClientConfig::new(url::Url::parse("http://127.0.0.1:1/").unwrap())
            .with_timeout(Duration::from_secs(2));
        let api = ApiClient::new(ReqwestClient::with_timeout(config.timeout).unwrap(), config);

        let response = api.get("/path", &[]).await;

        assert!(response.is_failure());
        assert_eq!(response.status(), 500);
        assert!(response.error_message().is_some());
    }
}
