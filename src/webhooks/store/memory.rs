//! Process-local webhook store.

use tokio::sync::RwLock;

use super::table::RecordTable;
use super::{StoreError, WebhookStore};
use crate::time::{Clock, SystemClock};
use crate::webhooks::record::{InboundWebhook, NewInboundWebhook, WebhookStatus};

/// [`WebhookStore`] that keeps records in memory.
///
/// Records are lost when the store is dropped.
#[derive(Debug, Default)]
pub struct MemoryWebhookStore<C = SystemClock> {
    table: RwLock<RecordTable>,
    clock: C,
}

impl MemoryWebhookStore {
    /// Creates an empty store using the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl<C: Clock> MemoryWebhookStore<C> {
    /// Creates an empty store that timestamps records with `clock`.
    #[must_use]
    pub fn with_clock(clock: C) -> Self {
        Self {
            table: RwLock::new(RecordTable::default()),
            clock,
        }
    }
}

impl<C: Clock> WebhookStore for MemoryWebhookStore<C> {
    async fn insert(&self, webhook: NewInboundWebhook) -> Result<InboundWebhook, StoreError> {
        let mut table = self.table.write().await;
        table.insert(webhook, self.clock.now())
    }

    async fn transition(
        &self,
        id: u64,
        status: WebhookStatus,
        error_message: Option<String>,
    ) -> Result<InboundWebhook, StoreError> {
        let mut table = self.table.write().await;
        table.transition(id, status, error_message, self.clock.now())
    }

    async fn get(&self, id: u64) -> Option<InboundWebhook> {
        self.table.read().await.get(id)
    }

    async fn find_by_external_id(&self, external_id: &str) -> Option<InboundWebhook> {
        self.table.read().await.find_by_external_id(external_id)
    }

    async fn list_by_event(&self, event: &str) -> Vec<InboundWebhook> {
        self.table.read().await.filter(|record| record.event == event)
    }

    async fn list_by_status(&self, status: WebhookStatus) -> Vec<InboundWebhook> {
        self.table.read().await.filter(|record| record.status == status)
    }

    async fn count(&self) -> usize {
        self.table.read().await.len()
    }
}
