//! Durable store seam for `TaskRecord`s. Mirrors
//! [`crate::registry::DurableCatalog`]: the core ships only an in-memory
//! implementation, a hosting process swaps in a real one. The in-memory cache
//! owned by [`crate::task_tracker::TaskTracker`] remains authoritative for
//! reads that immediately follow a write; this store exists for cold-start
//! hydration and for callers that bypass the cache.

use crate::error::Result;
use crate::models::TaskRecord;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[async_trait]
pub trait DurableTaskStore: Send + Sync {
    async fn save(&self, record: &TaskRecord) -> Result<()>;
    async fn update(&self, record: &TaskRecord) -> Result<()>;
    async fn load(&self, task_id: &str) -> Result<Option<TaskRecord>>;
    async fn load_all(&self) -> Result<Vec<TaskRecord>>;
}

/// Best-effort, process-local store. Entries do not survive a restart.
#[derive(Default)]
pub struct InMemoryTaskStore {
    entries: RwLock<HashMap<String, TaskRecord>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DurableTaskStore for InMemoryTaskStore {
    async fn save(&self, record: &TaskRecord) -> Result<()> {
        self.entries
            .write()
            .await
            .insert(record.task_id.clone(), record.clone());
        Ok(())
    }

    async fn update(&self, record: &TaskRecord) -> Result<()> {
        self.entries
            .write()
            .await
            .insert(record.task_id.clone(), record.clone());
        Ok(())
    }

    async fn load(&self, task_id: &str) -> Result<Option<TaskRecord>> {
        Ok(self.entries.read().await.get(task_id).cloned())
    }

    async fn load_all(&self) -> Result<Vec<TaskRecord>> {
        Ok(self.entries.read().await.values().cloned().collect())
    }
}
