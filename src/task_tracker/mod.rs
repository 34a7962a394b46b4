//! TaskTracker: owns the `TaskRecord` collection plus the two auxiliary
//! structures that drive its reaper and completion notifications: `timeouts:
//! task_id → deadline` and `callbacks: task_id → []callback_url`. A single
//! struct owns both collections behind `tokio::sync::Mutex`, with write-
//! through persistence, per-task timeout tracking, and a cooperative reaper
//! shaped like the health monitor's background sweep.

mod queue;
mod store;

pub use queue::TaskQueue;
pub use store::{DurableTaskStore, InMemoryTaskStore};

use crate::error::{CoreError, Result};
use crate::models::{Priority, TaskRecord, TaskState};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

struct Inner {
    tasks: HashMap<String, TaskRecord>,
    timeouts: HashMap<String, chrono::DateTime<chrono::Utc>>,
    callbacks: HashMap<String, Vec<String>>,
}

impl Inner {
    fn new() -> Self {
        Self {
            tasks: HashMap::new(),
            timeouts: HashMap::new(),
            callbacks: HashMap::new(),
        }
    }
}

pub struct TaskTracker {
    inner: Mutex<Inner>,
    store: Arc<dyn DurableTaskStore>,
    http_client: reqwest::Client,
    default_timeout: Duration,
    hydrated: AtomicBool,
    reaper_interval: Duration,
    handle: Mutex<Option<JoinHandle<()>>>,
    shutdown_tx: Mutex<Option<mpsc::Sender<()>>>,
    /// Auxiliary priority structure over not-yet-assigned task-ids. `create_task`
    /// pushes; any transition away from `PENDING` removes. Orchestrator dispatch
    /// today is synchronous and does not pop from this queue itself — it exists so
    /// a future queue-fed dispatcher, or a monitoring endpoint, has a real
    /// structure to read instead of scanning every pending record.
    pub queue: TaskQueue,
}

impl TaskTracker {
    pub fn new(store: Arc<dyn DurableTaskStore>, default_timeout: Duration, reaper_interval: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner::new()),
            store,
            http_client: reqwest::Client::new(),
            default_timeout,
            hydrated: AtomicBool::new(false),
            reaper_interval,
            handle: Mutex::new(None),
            shutdown_tx: Mutex::new(None),
            queue: TaskQueue::new(),
        }
    }

    /// Allocates a task id, inserts the record as `PENDING`, and records its
    /// deadline. `callback_url`, if given, is fired exactly once on the record's
    /// terminal transition.
    pub async fn create_task(
        &self,
        instruction: String,
        target_agent_id: Option<String>,
        user_id: Option<String>,
        intent: Option<serde_json::Value>,
        timeout: Option<Duration>,
        callback_url: Option<String>,
    ) -> Result<String> {
        let mut record = TaskRecord::new(instruction, user_id);
        record.target_agent_id = target_agent_id;
        record.intent = intent;
        let task_id = record.task_id.clone();

        let deadline = chrono::Utc::now()
            + chrono::Duration::from_std(timeout.unwrap_or(self.default_timeout)).unwrap_or_default();

        self.store.save(&record).await?;

        let mut inner = self.inner.lock().await;
        inner.timeouts.insert(task_id.clone(), deadline);
        if let Some(url) = callback_url {
            inner.callbacks.entry(task_id.clone()).or_default().push(url);
        }
        inner.tasks.insert(task_id.clone(), record);
        drop(inner);

        self.queue.push(task_id.clone(), Priority::Medium).await;

        tracing::info!(task_id = %task_id, "task created");
        Ok(task_id)
    }

    /// Applies a status transition, refusing it if the record is already
    /// terminal. Returns `Ok(false)` when the refusal applies;
    /// `Err(CoreError::NotFound)` when the task does not exist.
    pub async fn update_task_status(
        &self,
        task_id: &str,
        status: TaskState,
        result: Option<serde_json::Value>,
        error: Option<String>,
    ) -> Result<bool> {
        self.ensure_hydrated().await;

        let (updated, callback_urls) = {
            let mut inner = self.inner.lock().await;

            if !inner.tasks.contains_key(task_id) {
                if let Some(loaded) = self.store.load(task_id).await? {
                    inner.tasks.insert(task_id.to_string(), loaded);
                }
            }

            let record = match inner.tasks.get_mut(task_id) {
                Some(record) => record,
                None => return Err(CoreError::NotFound(task_id.to_string())),
            };

            if record.status.is_terminal() {
                tracing::warn!(task_id, "refusing update: task already terminal");
                return Ok(false);
            }

            record.status = status;
            record.updated_at = chrono::Utc::now();
            if result.is_some() {
                record.result = result;
            }
            if error.is_some() {
                record.error = error;
            }
            let record = record.clone();

            let callback_urls = if status.is_terminal() {
                inner.timeouts.remove(task_id);
                inner.callbacks.remove(task_id).unwrap_or_default()
            } else {
                Vec::new()
            };

            (record, callback_urls)
        };

        self.store.update(&updated).await?;

        if status != TaskState::Pending {
            self.queue.remove(task_id).await;
        }

        for url in callback_urls {
            self.dispatch_callback(url, updated.clone());
        }

        tracing::info!(task_id, status = ?status, "task status updated");
        Ok(true)
    }

    /// Cache-first lookup, falling through to the durable store on a miss
    /// and repopulating the cache.
    pub async fn get_task_status(&self, task_id: &str) -> Option<TaskRecord> {
        self.ensure_hydrated().await;

        {
            let inner = self.inner.lock().await;
            if let Some(record) = inner.tasks.get(task_id) {
                return Some(record.clone());
            }
        }

        let loaded = self.store.load(task_id).await.ok().flatten()?;
        let mut inner = self.inner.lock().await;
        inner.tasks.insert(task_id.to_string(), loaded.clone());
        Some(loaded)
    }

    /// Compound-filtered listing sorted by `created_at` descending, capped
    /// at `limit`.
    pub async fn list_tasks(
        &self,
        user_id: Option<&str>,
        status: Option<TaskState>,
        limit: usize,
    ) -> Vec<TaskRecord> {
        self.ensure_hydrated().await;

        let limit = limit.min(crate::constants::MAX_LIST_LIMIT);
        let inner = self.inner.lock().await;
        let mut matches: Vec<TaskRecord> = inner
            .tasks
            .values()
            .filter(|record| user_id.map(|id| record.user_id.as_deref() == Some(id)).unwrap_or(true))
            .filter(|record| status.map(|s| record.status == s).unwrap_or(true))
            .cloned()
            .collect();

        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matches.truncate(limit);
        matches
    }

    /// Starts the reaper. Idempotent.
    pub async fn start(self: &Arc<Self>) {
        if self.handle.lock().await.is_some() {
            tracing::warn!("task tracker reaper already running");
            return;
        }

        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        *self.shutdown_tx.lock().await = Some(shutdown_tx);

        let tracker = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(tracker.reaper_interval);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        tracker.reap_timeouts().await;
                    }
                    _ = shutdown_rx.recv() => {
                        tracing::info!("task tracker reaper shutting down");
                        break;
                    }
                }
            }
        });

        *self.handle.lock().await = Some(handle);
        tracing::info!("task tracker reaper started");
    }

    pub async fn stop(&self) {
        if let Some(sender) = self.shutdown_tx.lock().await.take() {
            let _ = sender.send(()).await;
        }
        if let Some(handle) = self.handle.lock().await.take() {
            let _ = handle.await;
        }
    }

    /// One sweep over `timeouts`: any deadline that has passed while its
    /// record is still `PENDING`/`RUNNING` fails with `"Task timeout"`. The
    /// entry is removed from `timeouts` regardless of outcome.
    pub async fn reap_timeouts(&self) {
        let now = chrono::Utc::now();
        let expired: Vec<String> = {
            let inner = self.inner.lock().await;
            inner
                .timeouts
                .iter()
                .filter(|(_, deadline)| **deadline <= now)
                .map(|(task_id, _)| task_id.clone())
                .collect()
        };

        for task_id in expired {
            let still_live = {
                let inner = self.inner.lock().await;
                inner
                    .tasks
                    .get(&task_id)
                    .map(|record| matches!(record.status, TaskState::Pending | TaskState::Running))
                    .unwrap_or(false)
            };

            if still_live {
                tracing::warn!(task_id = %task_id, "task timed out");
                let _ = self
                    .update_task_status(&task_id, TaskState::Failed, None, Some("Task timeout".to_string()))
                    .await;
            } else {
                self.inner.lock().await.timeouts.remove(&task_id);
            }
        }
    }

    fn dispatch_callback(&self, url: String, record: TaskRecord) {
        let client = self.http_client.clone();
        tokio::spawn(async move {
            let response = client
                .post(&url)
                .json(&record)
                .timeout(Duration::from_secs(10))
                .send()
                .await;
            if let Err(error) = response {
                tracing::error!(%url, %error, "failed to call task completion callback");
            }
        });
    }

    /// Hydrates the in-memory cache from the durable store the first time
    /// it's observed empty, mirroring [`crate::registry::Registry`]'s
    /// auto-load behavior.
    async fn ensure_hydrated(&self) {
        if self.hydrated.swap(true, Ordering::SeqCst) {
            return;
        }

        let is_empty = self.inner.lock().await.tasks.is_empty();
        if !is_empty {
            return;
        }

        let loaded = match self.store.load_all().await {
            Ok(records) => records,
            Err(error) => {
                tracing::warn!(%error, "failed to hydrate task tracker from durable store");
                return;
            }
        };

        let mut inner = self.inner.lock().await;
        for record in loaded {
            inner.tasks.insert(record.task_id.clone(), record);
        }
    }
}

#[cfg(test)]
mod tests;
