//! Inbound webhook records and their processing lifecycle.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Processing state of a recorded webhook.
///
/// ```text
/// pending -> processing -> processed
///                       -> failed
///                       -> unhandled
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebhookStatus {
    /// Recorded, not yet picked up.
    #[default]
    Pending,
    /// Acknowledged and awaiting the downstream consumer.
    Processing,
    /// Handled successfully.
    Processed,
    /// Handling failed; see the record's error message.
    Failed,
    /// No handler exists for this event.
    Unhandled,
}

impl WebhookStatus {
    /// All states, in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Processing,
        Self::Processed,
        Self::Failed,
        Self::Unhandled,
    ];

    /// Lowercase name as stored.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Processed => "processed",
            Self::Failed => "failed",
            Self::Unhandled => "unhandled",
        }
    }

    /// True for `processed`, `failed` and `unhandled`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Processed | Self::Failed | Self::Unhandled)
    }

    /// Returns true if a record may move from `self` to `next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        match self {
            Self::Pending => matches!(next, Self::Processing),
            Self::Processing => next.is_terminal(),
            Self::Processed | Self::Failed | Self::Unhandled => false,
        }
    }
}

impl fmt::Display for WebhookStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown status name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown webhook status '{0}'")]
pub struct ParseStatusError(String);

impl FromStr for WebhookStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ParseStatusError(s.to_string()))
    }
}

/// A stored inbound webhook.
///
/// Only `status`, `error_message`, `processed_at` and `updated_at` change after
/// insertion, and only through the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundWebhook {
    /// Store-assigned identifier.
    pub id: u64,
    /// Event name derived from the payload.
    pub event: String,
    /// Payload as received.
    pub payload: Value,
    /// Provider that recorded the webhook.
    pub source_controller: String,
    /// Remote address of the sender.
    pub source_ip: Option<String>,
    /// Provider-supplied delivery identifier; unique when present.
    pub external_id: Option<String>,
    /// Processing state.
    pub status: WebhookStatus,
    /// Failure detail, set when the record fails.
    pub error_message: Option<String>,
    /// When the record left `processing`.
    pub processed_at: Option<DateTime<Utc>>,
    /// Insertion time.
    pub created_at: DateTime<Utc>,
    /// Time of the last status change.
    pub updated_at: DateTime<Utc>,
}

/// Validation failure for a [`NewInboundWebhook`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required text field is empty.
    #[error("{0} must not be empty")]
    Empty(&'static str),
    /// The payload is JSON null.
    #[error("payload must not be null")]
    NullPayload,
}

/// Fields of a webhook about to be recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct NewInboundWebhook {
    /// Event name.
    pub event: String,
    /// Payload as received.
    pub payload: Value,
    /// Provider recording the webhook.
    pub source_controller: String,
    /// Remote address of the sender.
    pub source_ip: Option<String>,
    /// Delivery identifier used for deduplication.
    pub external_id: Option<String>,
}

impl NewInboundWebhook {
    /// Creates a webhook with no source address and no external id.
    #[must_use]
    pub fn new(
        event: impl Into<String>,
        payload: Value,
        source_controller: impl Into<String>,
    ) -> Self {
        Self {
            event: event.into(),
            payload,
            source_controller: source_controller.into(),
            source_ip: None,
            external_id: None,
        }
    }

    /// Sets the sender's address.
    #[must_use]
    pub fn with_source_ip(mut self, source_ip: impl Into<String>) -> Self {
        self.source_ip = Some(source_ip.into());
        self
    }

    /// Sets the delivery identifier.
    #[must_use]
    pub fn with_external_id(mut self, external_id: impl Into<String>) -> Self {
        self.external_id = Some(external_id.into());
        self
    }

    /// Checks the required fields.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if `event` or `source_controller` is empty
    /// or the payload is null.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.event.trim().is_empty() {
            return Err(ValidationError::Empty("event"));
        }
        if self.source_controller.trim().is_empty() {
            return Err(ValidationError::Empty("source_controller"));
        }
        if self.payload.is_null() {
            return Err(ValidationError::NullPayload);
        }
        Ok(())
    }

    /// Builds the stored record in the `pending` state.
    #[must_use]
    pub fn into_record(self, id: u64, now: DateTime<Utc>) -> InboundWebhook {
        InboundWebhook {
            id,
            event: self.event,
            payload: self.payload,
            source_controller: self.source_controller,
            source_ip: self.source_ip,
            external_id: self.external_id,
            status: WebhookStatus::Pending,
            error_message: None,
            processed_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}
