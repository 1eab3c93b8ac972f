//! Inbound webhook intake.
//!
//! This module provides:
//! - HMAC-SHA256 signature verification ([`verify_signature`])
//! - Provider capability sets ([`WebhookProvider`], [`GithubProvider`])
//! - Records and their processing lifecycle ([`InboundWebhook`], [`WebhookStatus`])
//! - Record storage ([`WebhookStore`], [`MemoryWebhookStore`], [`FileWebhookStore`])
//! - The verify-then-record handler ([`WebhookIntake`])
//!
//! # Lifecycle
//!
//! A verified delivery is recorded `pending` and immediately moved to
//! `processing`. Downstream consumers finish it as `processed`, `failed` or
//! `unhandled` through the store; nothing here sets a terminal state.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use hookgate::webhooks::{
//!     GithubProvider, IntakeOutcome, MemoryWebhookStore, WebhookIntake, compute_signature,
//! };
//! use http::HeaderMap;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let intake = WebhookIntake::new(Arc::new(MemoryWebhookStore::new()))
//!     .with_provider(GithubProvider::new("secret"));
//!
//! let body = br#"{"action":"opened","hook_id":"42"}"#;
//! let mut headers = HeaderMap::new();
//! headers.insert(
//!     "x-hub-signature-256",
//!     compute_signature(b"secret", body).parse().unwrap(),
//! );
//!
//! let outcome = intake.receive("github", &headers, None, body).await;
//! assert_eq!(outcome, IntakeOutcome::Accepted { id: 1 });
//! # }
//! ```

mod intake;
mod provider;
mod record;
pub mod store;
mod verification;

#[cfg(test)]
mod provider_tests;

pub use intake::{IntakeOutcome, WebhookIntake};
pub use provider::{GithubProvider, WebhookProvider};
pub use record::{
    InboundWebhook, NewInboundWebhook, ParseStatusError, ValidationError, WebhookStatus,
};
pub use store::{FileWebhookStore, MemoryWebhookStore, StoreError, WebhookStore};
pub use verification::{SigningInput, compute_signature, verify_signature};
