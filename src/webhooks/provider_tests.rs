//! Tests for webhook providers.

use http::{HeaderMap, HeaderValue};
use serde_json::json;

use super::provider::{GithubProvider, WebhookProvider};
use super::verification::{SigningInput, compute_signature};

fn signed_headers(signature: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        "x-hub-signature-256",
        HeaderValue::from_str(signature).unwrap(),
    );
    headers
}

mod github {
    use super::*;

    #[test]
    fn identifies_itself() {
        let provider = GithubProvider::new("secret");

        assert_eq!(provider.name(), "github");
        assert_eq!(provider.signature_header(), "X-Hub-Signature-256");
        assert_eq!(provider.signing_secret(), b"secret");
        assert_eq!(provider.signing_input(), SigningInput::RawBody);
    }

    #[test]
    fn event_comes_from_action() {
        let provider = GithubProvider::new("secret");

        assert_eq!(
            provider.event_name(&json!({"action": "opened"})).as_deref(),
            Some("opened")
        );
        assert_eq!(provider.event_name(&json!({"zen": "Keep it simple"})), None);
        assert_eq!(provider.event_name(&json!({"action": ""})), None);
    }

    #[test]
    fn external_id_accepts_strings_and_numbers() {
        let provider = GithubProvider::new("secret");

        assert_eq!(
            provider.external_id(&json!({"hook_id": "42"})).as_deref(),
            Some("42")
        );
        assert_eq!(
            provider.external_id(&json!({"hook_id": 123_456_789})).as_deref(),
            Some("123456789")
        );
        assert_eq!(provider.external_id(&json!({"hook_id": null})), None);
        assert_eq!(provider.external_id(&json!({"hook_id": {"id": 1}})), None);
        assert_eq!(provider.external_id(&json!([])), None);
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let provider = GithubProvider::new("secret");
        let headers = signed_headers("abc=");

        assert_eq!(provider.signature(&headers), Some("abc="));
    }

    #[test]
    fn verifies_raw_body() {
        let provider = GithubProvider::new("secret");
        let raw = br#"{ "action": "opened" }"#;
        let payload = json!({"action": "opened"});
        let headers = signed_headers(&compute_signature(b"secret", raw));

        assert!(provider.verify(&headers, raw, &payload));
    }

    #[test]
    fn rejects_missing_header() {
        let provider = GithubProvider::new("secret");

        assert!(!provider.verify(&HeaderMap::new(), b"{}", &json!({})));
    }

    #[test]
    fn reserialized_input_verifies_canonical_form() {
        let provider = GithubProvider::new("secret").with_signing_input(SigningInput::Reserialized);
        let raw = br#"{ "action": "opened" }"#;
        let payload = json!({"action": "opened"});
        let headers = signed_headers(&compute_signature(b"secret", br#"{"action":"opened"}"#));

        assert!(provider.verify(&headers, raw, &payload));
    }

    #[test]
    fn debug_redacts_secret() {
        let debug = format!("{:?}", GithubProvider::new("hunter2"));

        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("hunter2"));
    }
}
