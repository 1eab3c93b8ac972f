//! Persistence for inbound webhook records.
//!
//! [`WebhookStore`] is the storage seam used by the intake handler and by
//! downstream consumers that finish processing. Two implementations share the
//! same record table:
//!
//! - [`MemoryWebhookStore`] keeps records for the lifetime of the process.
//! - [`FileWebhookStore`] additionally writes every mutation to a JSON file.
//!
//! Both enforce `external_id` uniqueness under a single write lock, so two
//! concurrent deliveries of the same webhook produce exactly one record.

mod file;
mod memory;
mod table;

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;

pub use file::FileWebhookStore;
pub use memory::MemoryWebhookStore;

use std::future::Future;
use std::io;

use thiserror::Error;

use super::record::{InboundWebhook, NewInboundWebhook, ValidationError, WebhookStatus};

/// Errors returned by [`WebhookStore`] operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A record with the same `external_id` already exists.
    #[error("Webhook with external id '{external_id}' already recorded as {existing_id}")]
    Duplicate {
        /// The conflicting delivery identifier.
        external_id: String,
        /// Identifier of the record already holding it.
        existing_id: u64,
    },

    /// No record has the given identifier.
    #[error("Webhook {0} not found")]
    NotFound(u64),

    /// The lifecycle does not allow the requested status change.
    #[error("Webhook {id} cannot move from {from} to {to}")]
    InvalidTransition {
        /// Record identifier.
        id: u64,
        /// Current status.
        from: WebhookStatus,
        /// Requested status.
        to: WebhookStatus,
    },

    /// The record is missing required fields.
    #[error("Invalid webhook: {0}")]
    Validation(#[from] ValidationError),

    /// A failed status was requested without an error message.
    #[error("Webhook {0} cannot fail without an error message")]
    MissingErrorMessage(u64),

    /// Failed to read or write the store file.
    #[error("Failed to persist webhooks: {0}")]
    Persist(#[source] io::Error),

    /// Failed to serialize records.
    #[error("Failed to serialize webhooks: {0}")]
    Serialize(#[source] serde_json::Error),

    /// The store file exists but cannot be used.
    #[error("Webhook store file is unusable: {reason}")]
    Corrupted {
        /// What was wrong with the file.
        reason: String,
    },
}

impl StoreError {
    /// Returns the existing record id if this is a uniqueness violation.
    #[must_use]
    pub const fn duplicate_of(&self) -> Option<u64> {
        match self {
            Self::Duplicate { existing_id, .. } => Some(*existing_id),
            _ => None,
        }
    }
}

/// Storage for inbound webhook records.
///
/// Records are never deleted. Only the status fields change after insertion,
/// through [`transition`](WebhookStore::transition).
pub trait WebhookStore: Send + Sync {
    /// Validates and records a new webhook in the `pending` state.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Duplicate`] if `external_id` is already recorded,
    /// [`StoreError::Validation`] for missing fields, or a persistence error.
    fn insert(
        &self,
        webhook: NewInboundWebhook,
    ) -> impl Future<Output = Result<InboundWebhook, StoreError>> + Send;

    /// Moves a record to `status`.
    ///
    /// Leaving `processing` stamps `processed_at`. `error_message` is stored
    /// only for `failed`, where it is required.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`], [`StoreError::InvalidTransition`],
    /// [`StoreError::MissingErrorMessage`], or a persistence error.
    fn transition(
        &self,
        id: u64,
        status: WebhookStatus,
        error_message: Option<String>,
    ) -> impl Future<Output = Result<InboundWebhook, StoreError>> + Send;

    /// Returns the record with identifier `id`.
    fn get(&self, id: u64) -> impl Future<Output = Option<InboundWebhook>> + Send;

    /// Returns the record holding `external_id`.
    fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> impl Future<Output = Option<InboundWebhook>> + Send;

    /// Returns records with the given event name, oldest first.
    fn list_by_event(&self, event: &str) -> impl Future<Output = Vec<InboundWebhook>> + Send;

    /// Returns records in the given state, oldest first.
    fn list_by_status(
        &self,
        status: WebhookStatus,
    ) -> impl Future<Output = Vec<InboundWebhook>> + Send;

    /// Returns the number of records.
    fn count(&self) -> impl Future<Output = usize> + Send;

    /// Marks a pending record as `processing`.
    ///
    /// # Errors
    ///
    /// See [`transition`](WebhookStore::transition).
    fn mark_processing(
        &self,
        id: u64,
    ) -> impl Future<Output = Result<InboundWebhook, StoreError>> + Send {
        self.transition(id, WebhookStatus::Processing, None)
    }

    /// Marks a processing record as `processed`.
    ///
    /// # Errors
    ///
    /// See [`transition`](WebhookStore::transition).
    fn mark_processed(
        &self,
        id: u64,
    ) -> impl Future<Output = Result<InboundWebhook, StoreError>> + Send {
        self.transition(id, WebhookStatus::Processed, None)
    }

    /// Marks a processing record as `failed` with `error_message`.
    ///
    /// # Errors
    ///
    /// See [`transition`](WebhookStore::transition).
    fn mark_failed(
        &self,
        id: u64,
        error_message: impl Into<String>,
    ) -> impl Future<Output = Result<InboundWebhook, StoreError>> + Send {
        self.transition(id, WebhookStatus::Failed, Some(error_message.into()))
    }

    /// Marks a processing record as `unhandled`.
    ///
    /// # Errors
    ///
    /// See [`transition`](WebhookStore::transition).
    fn mark_unhandled(
        &self,
        id: u64,
    ) -> impl Future<Output = Result<InboundWebhook, StoreError>> + Send {
        self.transition(id, WebhookStatus::Unhandled, None)
    }
}
