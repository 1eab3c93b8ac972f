//! In-memory record table shared by the store implementations.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};

use super::StoreError;
use crate::webhooks::record::{InboundWebhook, NewInboundWebhook, WebhookStatus};

/// Records keyed by id plus the `external_id` uniqueness index.
#[derive(Debug, Clone, Default)]
pub(super) struct RecordTable {
    records: BTreeMap<u64, InboundWebhook>,
    by_external_id: HashMap<String, u64>,
    next_id: u64,
}

impl RecordTable {
    /// Rebuilds a table from persisted records.
    pub(super) fn from_records(records: Vec<InboundWebhook>) -> Result<Self, StoreError> {
        let mut table = Self::default();
        for record in records {
            if let Some(external_id) = &record.external_id {
                if let Some(&existing_id) = table.by_external_id.get(external_id) {
                    return Err(StoreError::Corrupted {
                        reason: format!(
                            "records {existing_id} and {} share external id '{external_id}'",
                            record.id
                        ),
                    });
                }
                table.by_external_id.insert(external_id.clone(), record.id);
            }
            if table.records.contains_key(&record.id) {
                return Err(StoreError::Corrupted {
                    reason: format!("duplicate record id {}", record.id),
                });
            }
            table.next_id = table.next_id.max(record.id);
            table.records.insert(record.id, record);
        }
        Ok(table)
    }

    /// Checks uniqueness and inserts in one step.
    pub(super) fn insert(
        &mut self,
        webhook: NewInboundWebhook,
        now: DateTime<Utc>,
    ) -> Result<InboundWebhook, StoreError> {
        webhook.validate()?;

        if let Some(external_id) = &webhook.external_id {
            if let Some(&existing_id) = self.by_external_id.get(external_id) {
                return Err(StoreError::Duplicate {
                    external_id: external_id.clone(),
                    existing_id,
                });
            }
        }

        self.next_id += 1;
        let record = webhook.into_record(self.next_id, now);
        if let Some(external_id) = &record.external_id {
            self.by_external_id.insert(external_id.clone(), record.id);
        }
        self.records.insert(record.id, record.clone());

        Ok(record)
    }

    pub(super) fn transition(
        &mut self,
        id: u64,
        status: WebhookStatus,
        error_message: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<InboundWebhook, StoreError> {
        let record = self.records.get_mut(&id).ok_or(StoreError::NotFound(id))?;

        if !record.status.can_transition_to(status) {
            return Err(StoreError::InvalidTransition {
                id,
                from: record.status,
                to: status,
            });
        }

        let error_message = match status {
            WebhookStatus::Failed => {
                Some(error_message.ok_or(StoreError::MissingErrorMessage(id))?)
            }
            _ => None,
        };

        if record.status == WebhookStatus::Processing {
            record.processed_at = Some(now);
        }
        record.status = status;
        record.error_message = error_message;
        record.updated_at = now;

        Ok(record.clone())
    }

    pub(super) fn get(&self, id: u64) -> Option<InboundWebhook> {
        self.records.get(&id).cloned()
    }

    pub(super) fn find_by_external_id(&self, external_id: &str) -> Option<InboundWebhook> {
        self.by_external_id
            .get(external_id)
            .and_then(|id| self.get(*id))
    }

    pub(super) fn filter(
        &self,
        predicate: impl Fn(&InboundWebhook) -> bool,
    ) -> Vec<InboundWebhook> {
        self.records
            .values()
            .filter(|record| predicate(record))
            .cloned()
            .collect()
    }

    pub(super) fn len(&self) -> usize {
        self.records.len()
    }

    /// Records in id order.
    pub(super) fn records(&self) -> impl Iterator<Item = &InboundWebhook> {
        self.records.values()
    }
}
