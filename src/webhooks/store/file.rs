//! File-backed webhook store.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::table::RecordTable;
use super::{StoreError, WebhookStore};
use crate::time::{Clock, SystemClock};
use crate::webhooks::record::{InboundWebhook, NewInboundWebhook, WebhookStatus};

/// Current store file format version.
///
/// Increment this when making breaking changes to the format.
const STORE_FILE_VERSION: u32 = 1;

/// On-disk store format.
///
/// Files with a different `version` are rejected rather than migrated.
#[derive(Debug, Serialize, Deserialize)]
struct StoreFile {
    version: u32,
    webhooks: Vec<InboundWebhook>,
}

impl StoreFile {
    fn new(table: &RecordTable) -> Self {
        Self {
            version: STORE_FILE_VERSION,
            webhooks: table.records().cloned().collect(),
        }
    }
}

/// [`WebhookStore`] that persists every mutation to a JSON file.
///
/// # Atomic Writes
///
/// Uses write-to-temp-then-rename so the file is either fully written or not
/// written at all:
/// 1. Write to `{path}.tmp`
/// 2. Rename `{path}.tmp` to `{path}`
///
/// A mutation that cannot be persisted is rolled back in memory and reported
/// as an error.
#[derive(Debug)]
pub struct FileWebhookStore<C = SystemClock> {
    path: PathBuf,
    table: RwLock<RecordTable>,
    clock: C,
}

impl FileWebhookStore {
    /// Opens the store at `path` using the system clock.
    ///
    /// # Errors
    ///
    /// See [`open_with_clock`](FileWebhookStore::open_with_clock).
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        Self::open_with_clock(path, SystemClock)
    }
}

impl<C: Clock> FileWebhookStore<C> {
    /// Opens the store at `path`, starting empty if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Persist`] if the file cannot be read and
    /// [`StoreError::Corrupted`] if it is not a compatible store file.
    pub fn open_with_clock(path: impl Into<PathBuf>, clock: C) -> Result<Self, StoreError> {
        let path = path.into();
        let table = Self::load(&path)?;

        tracing::debug!(path = %path.display(), records = table.len(), "Opened webhook store");

        Ok(Self {
            path,
            table: RwLock::new(table),
            clock,
        })
    }

    /// Returns the path to the store file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(path: &Path) -> Result<RecordTable, StoreError> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(RecordTable::default()),
            Err(e) => return Err(StoreError::Persist(e)),
        };

        let file: StoreFile =
            serde_json::from_str(&content).map_err(|e| StoreError::Corrupted {
                reason: format!("Invalid JSON: {e}"),
            })?;

        if file.version != STORE_FILE_VERSION {
            return Err(StoreError::Corrupted {
                reason: format!(
                    "Incompatible version: expected {STORE_FILE_VERSION}, got {}",
                    file.version
                ),
            });
        }

        RecordTable::from_records(file.webhooks)
    }

    async fn save(&self, table: &RecordTable) -> Result<(), StoreError> {
        let path = self.path.clone();
        let file = StoreFile::new(table);

        tokio::task::spawn_blocking(move || save_blocking(&path, &file))
            .await
            .expect("spawn_blocking task panicked")
    }

    /// Applies `mutation` and persists the result, restoring the previous
    /// table if either step fails. Holds the write lock throughout.
    async fn mutate<F>(&self, mutation: F) -> Result<InboundWebhook, StoreError>
    where
        F: FnOnce(&mut RecordTable) -> Result<InboundWebhook, StoreError> + Send,
    {
        let mut table = self.table.write().await;
        let previous = table.clone();

        let record = mutation(&mut *table)?;
        if let Err(e) = self.save(&table).await {
            tracing::error!(
                path = %self.path.display(),
                error = %e,
                "Failed to persist webhook store"
            );
            *table = previous;
            return Err(e);
        }

        Ok(record)
    }
}

impl<C: Clock> WebhookStore for FileWebhookStore<C> {
    async fn insert(&self, webhook: NewInboundWebhook) -> Result<InboundWebhook, StoreError> {
        let now = self.clock.now();
        self.mutate(move |table| table.insert(webhook, now)).await
    }

    async fn transition(
        &self,
        id: u64,
        status: WebhookStatus,
        error_message: Option<String>,
    ) -> Result<InboundWebhook, StoreError> {
        let now = self.clock.now();
        self.mutate(move |table| table.transition(id, status, error_message, now))
            .await
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

/// Performs the blocking save operation.
///
/// Separated out so it can be wrapped in `spawn_blocking`.
fn save_blocking(path: &Path, file: &StoreFile) -> Result<(), StoreError> {
    let content = serde_json::to_string_pretty(file).map_err(StoreError::Serialize)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(StoreError::Persist)?;
        }
    }

    // webhooks.json -> webhooks.json.tmp, not webhooks.tmp
    let temp_path = PathBuf::from(format!("{}.tmp", path.display()));

    std::fs::write(&temp_path, content).map_err(StoreError::Persist)?;
    std::fs::rename(&temp_path, path).map_err(StoreError::Persist)?;

    Ok(())
}
