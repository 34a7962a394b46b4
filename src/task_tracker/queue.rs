//! `TaskQueue`: a priority structure over unassigned task-ids, ordered by
//! `(priority_desc, submission_order_asc)`.
//!
//! Non-durable by design — the durable store behind [`super::TaskTracker`]
//! is the synchronization point across restarts, so losing queue order on a
//! crash just means tasks get reconsidered in arrival order next time
//! they're listed, not lost. Backed by a binary heap with lazy deletion so
//! priority order doesn't need a full re-sort on every insertion.

use crate::models::Priority;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use tokio::sync::Mutex;

struct Entry {
    priority: Priority,
    submission_order: u64,
    task_id: String,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.submission_order == other.submission_order
    }
}
impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    /// `BinaryHeap` is a max-heap; priority ascending in the struct maps to
    /// "higher priority pops first", and ties break by lowest submission
    /// order first, so we reverse the order comparison.
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.submission_order.cmp(&self.submission_order))
    }
}

struct Inner {
    heap: BinaryHeap<Entry>,
    removed: HashSet<String>,
}

/// Priority queue of unassigned task-ids. Removal by id is lazy: a removed
/// marker is kept until that entry would otherwise surface from `pop`.
pub struct TaskQueue {
    inner: Mutex<Inner>,
    next_submission_order: AtomicU64,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                heap: BinaryHeap::new(),
                removed: HashSet::new(),
            }),
            next_submission_order: AtomicU64::new(0),
        }
    }

    pub async fn push(&self, task_id: impl Into<String>, priority: Priority) {
        let order = self.next_submission_order.fetch_add(1, AtomicOrdering::SeqCst);
        let task_id = task_id.into();
        let mut inner = self.inner.lock().await;
        inner.removed.remove(&task_id);
        inner.heap.push(Entry {
            priority,
            submission_order: order,
            task_id,
        });
    }

    /// Pops the highest-priority, earliest-submitted task-id still live.
    pub async fn pop(&self) -> Option<String> {
        let mut inner = self.inner.lock().await;
        loop {
            let entry = inner.heap.pop()?;
            if inner.removed.remove(&entry.task_id) {
                continue;
            }
            return Some(entry.task_id);
        }
    }

    /// Marks a task-id as no longer pending assignment (it was dispatched,
    /// cancelled, or otherwise left the queue out of pop order).
    pub async fn remove(&self, task_id: &str) {
        self.inner.lock().await.removed.insert(task_id.to_string());
    }

    /// Count of live (non-removed) entries still in the heap.
    pub async fn len(&self) -> usize {
        let inner = self.inner.lock().await;
        inner.heap.len() - inner.removed.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn higher_priority_pops_first() {
        let queue = TaskQueue::new();
        queue.push("low", Priority::Low).await;
        queue.push("critical", Priority::Critical).await;
        queue.push("medium", Priority::Medium).await;

        assert_eq!(queue.pop().await.as_deref(), Some("critical"));
        assert_eq!(queue.pop().await.as_deref(), Some("medium"));
        assert_eq!(queue.pop().await.as_deref(), Some("low"));
        assert!(queue.pop().await.is_none());
    }

    #[tokio::test]
    async fn equal_priority_breaks_tie_by_submission_order() {
        let queue = TaskQueue::new();
        queue.push("first", Priority::Medium).await;
        queue.push("second", Priority::Medium).await;

        assert_eq!(queue.pop().await.as_deref(), Some("first"));
        assert_eq!(queue.pop().await.as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn removed_entry_is_skipped_on_pop() {
        let queue = TaskQueue::new();
        queue.push("a", Priority::Medium).await;
        queue.push("b", Priority::Medium).await;
        queue.remove("a").await;

        assert_eq!(queue.pop().await.as_deref(), Some("b"));
        assert!(queue.pop().await.is_none());
    }

    #[tokio::test]
    async fn len_excludes_removed_entries() {
        let queue = TaskQueue::new();
        queue.push("a", Priority::Low).await;
        queue.push("b", Priority::Low).await;
        queue.remove("a").await;

        assert_eq!(queue.len().await, 1);
        assert!(!queue.is_empty().await);
    }
}
