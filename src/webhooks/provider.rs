//! Webhook providers: how each sender signs and identifies its deliveries.

use std::fmt;

use http::HeaderMap;
use serde_json::Value;

use super::verification::{SigningInput, verify_signature};

/// A third-party service that pushes webhooks.
///
/// A provider names the header carrying the signature, the secret it was
/// computed with, which bytes were signed, and where the event name and
/// delivery identifier live in the payload.
pub trait WebhookProvider: Send + Sync {
    /// Route segment and `source_controller` of recorded webhooks.
    fn name(&self) -> &str;

    /// Shared HMAC secret.
    fn signing_secret(&self) -> &[u8];

    /// Name of the header carrying the signature.
    fn signature_header(&self) -> &str;

    /// Which bytes the sender signed.
    fn signing_input(&self) -> SigningInput {
        SigningInput::RawBody
    }

    /// Event name of a delivery, if the payload has one.
    fn event_name(&self, payload: &Value) -> Option<String>;

    /// Delivery identifier used for deduplication.
    fn external_id(&self, payload: &Value) -> Option<String>;

    /// Returns the signature header value, if present and valid UTF-8.
    fn signature<'a>(&self, headers: &'a HeaderMap) -> Option<&'a str> {
        headers
            .get(self.signature_header())
            .and_then(|value| value.to_str().ok())
    }

    /// Returns true if the request carries a valid signature.
    fn verify(&self, headers: &HeaderMap, raw: &[u8], payload: &Value) -> bool {
        let signed = self.signing_input().signed_bytes(raw, payload);
        verify_signature(self.signing_secret(), self.signature(headers), &signed)
    }
}

/// GitHub repository and organization webhooks.
///
/// The event comes from `action`; the delivery identifier from `hook_id`,
/// which may be a string or a number.
#[derive(Clone)]
pub struct GithubProvider {
    secret: Vec<u8>,
    signing_input: SigningInput,
}

impl GithubProvider {
    /// Route segment and record source.
    pub const NAME: &'static str = "github";

    /// Header carrying the signature.
    pub const SIGNATURE_HEADER: &'static str = "X-Hub-Signature-256";

    /// Creates a provider verifying against `secret` over the raw body.
    #[must_use]
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
            signing_input: SigningInput::RawBody,
        }
    }

    /// Sets which bytes are signed.
    #[must_use]
    pub const fn with_signing_input(mut self, signing_input: SigningInput) -> Self {
        self.signing_input = signing_input;
        self
    }
}

impl fmt::Debug for GithubProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GithubProvider")
            .field("secret", &"[REDACTED]")
            .field("signing_input", &self.signing_input)
            .finish()
    }
}

impl WebhookProvider for GithubProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn signing_secret(&self) -> &[u8] {
        &self.secret
    }

    fn signature_header(&self) -> &str {
        Self::SIGNATURE_HEADER
    }

    fn signing_input(&self) -> SigningInput {
        self.signing_input
    }

    fn event_name(&self, payload: &Value) -> Option<String> {
        string_field(payload, "action")
    }

    fn external_id(&self, payload: &Value) -> Option<String> {
        string_field(payload, "hook_id")
    }
}

/// Reads a top-level field as text, rendering numbers in decimal.
///
/// Empty strings count as absent.
fn string_field(payload: &Value, key: &str) -> Option<String> {
    match payload.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
