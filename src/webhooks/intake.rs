//! Verify-then-record handling of a single inbound delivery.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use http::{HeaderMap, StatusCode};
use serde_json::Value;

use super::provider::WebhookProvider;
use super::record::{NewInboundWebhook, WebhookStatus};
use super::store::{StoreError, WebhookStore};

/// What happened to one delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntakeOutcome {
    /// Recorded and marked `processing`.
    Accepted {
        /// Identifier of the new record.
        id: u64,
    },
    /// Already recorded; acknowledged without a second record.
    Duplicate {
        /// Identifier of the record from the first delivery.
        existing_id: u64,
    },
    /// Signature missing or wrong. Nothing recorded.
    Rejected,
    /// Body is not JSON or lacks the event name.
    Malformed,
    /// No provider is registered under the requested name.
    UnknownProvider,
    /// The store could not record the delivery.
    StoreFailed,
}

impl IntakeOutcome {
    /// HTTP status reported to the sender.
    ///
    /// Responses never carry a body, so rejections reveal nothing about why
    /// verification failed.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Accepted { .. } | Self::Duplicate { .. } => StatusCode::OK,
            Self::Rejected | Self::Malformed => StatusCode::BAD_REQUEST,
            Self::UnknownProvider => StatusCode::NOT_FOUND,
            Self::StoreFailed => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Routes deliveries to their provider and records verified ones.
pub struct WebhookIntake<S> {
    store: Arc<S>,
    providers: HashMap<String, Box<dyn WebhookProvider>>,
}

impl<S: WebhookStore> WebhookIntake<S> {
    /// Creates an intake with no providers.
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            providers: HashMap::new(),
        }
    }

    /// Registers `provider` under its name, replacing any previous one.
    #[must_use]
    pub fn with_provider(mut self, provider: impl WebhookProvider + 'static) -> Self {
        self.providers
            .insert(provider.name().to_string(), Box::new(provider));
        self
    }

    /// Returns the store records are written to.
    #[must_use]
    pub const fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Returns the registered provider names, sorted.
    #[must_use]
    pub fn provider_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.providers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Handles one delivery for the provider named `provider`.
    ///
    /// The body is parsed, then verified; only verified deliveries reach the
    /// store. A new record is created `pending` and moved to `processing`
    /// before the delivery is acknowledged.
    pub async fn receive(
        &self,
        provider: &str,
        headers: &HeaderMap,
        source_ip: Option<String>,
        body: &[u8],
    ) -> IntakeOutcome {
        let Some(handler) = self.providers.get(provider) else {
            tracing::debug!(provider, "Webhook for unknown provider");
            return IntakeOutcome::UnknownProvider;
        };

        let payload: Value = match serde_json::from_slice(body) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(provider, error = %e, "Malformed webhook payload");
                return IntakeOutcome::Malformed;
            }
        };

        if !handler.verify(headers, body, &payload) {
            tracing::warn!(provider, source_ip = ?source_ip, "Webhook signature rejected");
            return IntakeOutcome::Rejected;
        }

        let Some(event) = handler.event_name(&payload) else {
            tracing::warn!(provider, "Verified webhook has no event name");
            return IntakeOutcome::Malformed;
        };
        let external_id = handler.external_id(&payload);

        let mut webhook = NewInboundWebhook::new(event, payload, handler.name());
        webhook.source_ip = source_ip;
        webhook.external_id = external_id;

        self.record(provider, webhook).await
    }

    async fn record(&self, provider: &str, webhook: NewInboundWebhook) -> IntakeOutcome {
        let record = match self.store.insert(webhook).await {
            Ok(record) => record,
            Err(StoreError::Duplicate {
                external_id,
                existing_id,
            }) => {
                tracing::info!(
                    provider,
                    external_id = %external_id,
                    record_id = existing_id,
                    "Duplicate webhook delivery"
                );
                return self.resume_duplicate(provider, existing_id).await;
            }
            Err(e) => {
                tracing::error!(provider, error = %e, "Failed to record webhook");
                return IntakeOutcome::StoreFailed;
            }
        };

        if !self.start_processing(provider, record.id).await {
            return IntakeOutcome::StoreFailed;
        }

        tracing::info!(
            provider,
            record_id = record.id,
            event = %record.event,
            external_id = ?record.external_id,
            "Webhook recorded"
        );
        IntakeOutcome::Accepted { id: record.id }
    }

    /// Acknowledges a redelivery, first finishing the move to `processing`
    /// if the earlier attempt recorded the webhook but failed before that.
    async fn resume_duplicate(&self, provider: &str, existing_id: u64) -> IntakeOutcome {
        let pending = self
            .store
            .get(existing_id)
            .await
            .is_some_and(|record| record.status == WebhookStatus::Pending);

        if !pending {
            return IntakeOutcome::Duplicate { existing_id };
        }

        match self.store.mark_processing(existing_id).await {
            // A concurrent redelivery got there first.
            Ok(_) | Err(StoreError::InvalidTransition { .. }) => {
                IntakeOutcome::Duplicate { existing_id }
            }
            Err(e) => {
                tracing::error!(
                    provider,
                    record_id = existing_id,
                    error = %e,
                    "Failed to resume pending webhook"
                );
                IntakeOutcome::StoreFailed
            }
        }
    }

    async fn start_processing(&self, provider: &str, id: u64) -> bool {
        match self.store.mark_processing(id).await {
            Ok(_) => true,
            Err(e) => {
                tracing::error!(
                    provider,
                    record_id = id,
                    error = %e,
                    "Failed to mark webhook processing"
                );
                false
            }
        }
    }
}

impl<S> fmt::Debug for WebhookIntake<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut providers: Vec<&String> = self.providers.keys().collect();
        providers.sort_unstable();
        f.debug_struct("WebhookIntake")
            .field("providers", &providers)
            .finish_non_exhaustive()
    }
}
