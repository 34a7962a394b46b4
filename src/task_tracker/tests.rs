use super::*;
use crate::models::TaskState;

fn tracker() -> Arc<TaskTracker> {
    Arc::new(TaskTracker::new(
        Arc::new(InMemoryTaskStore::new()),
        Duration::from_secs(3600),
        Duration::from_secs(60),
    ))
}

#[tokio::test]
async fn create_task_starts_pending_and_is_retrievable() {
    let tracker = tracker();
    let task_id = tracker
        .create_task("do a thing".to_string(), Some("agent-1".to_string()), Some("u1".to_string()), None, None, None)
        .await
        .unwrap();

    let record = tracker.get_task_status(&task_id).await.unwrap();
    assert_eq!(record.status, TaskState::Pending);
    assert_eq!(record.target_agent_id.as_deref(), Some("agent-1"));
}

#[tokio::test]
async fn update_task_status_transitions_and_persists() {
    let tracker = tracker();
    let task_id = tracker
        .create_task("do a thing".to_string(), None, None, None, None, None)
        .await
        .unwrap();

    let updated = tracker
        .update_task_status(&task_id, TaskState::Running, None, None)
        .await
        .unwrap();
    assert!(updated);

    let record = tracker.get_task_status(&task_id).await.unwrap();
    assert_eq!(record.status, TaskState::Running);
}

#[tokio::test]
async fn update_on_terminal_task_is_refused() {
    let tracker = tracker();
    let task_id = tracker
        .create_task("do a thing".to_string(), None, None, None, None, None)
        .await
        .unwrap();

    tracker
        .update_task_status(&task_id, TaskState::Completed, Some(serde_json::json!({"ok": true})), None)
        .await
        .unwrap();

    let refused = tracker
        .update_task_status(&task_id, TaskState::Failed, None, Some("too late".to_string()))
        .await
        .unwrap();
    assert!(!refused);

    let record = tracker.get_task_status(&task_id).await.unwrap();
    assert_eq!(record.status, TaskState::Completed);
}

#[tokio::test]
async fn update_unknown_task_returns_not_found() {
    let tracker = tracker();
    let error = tracker
        .update_task_status("missing", TaskState::Running, None, None)
        .await
        .unwrap_err();
    assert!(matches!(error, CoreError::NotFound(_)));
}

#[tokio::test]
async fn terminal_transition_clears_timeout_entry() {
    let tracker = tracker();
    let task_id = tracker
        .create_task("do a thing".to_string(), None, None, None, None, None)
        .await
        .unwrap();

    tracker
        .update_task_status(&task_id, TaskState::Completed, None, None)
        .await
        .unwrap();

    assert!(!tracker.inner.lock().await.timeouts.contains_key(&task_id));
}

#[tokio::test]
async fn reaper_fails_tasks_past_their_deadline() {
    let tracker = tracker();
    let task_id = tracker
        .create_task(
            "do a thing".to_string(),
            None,
            None,
            None,
            Some(Duration::from_secs(0)),
            None,
        )
        .await
        .unwrap();

    tracker.reap_timeouts().await;

    let record = tracker.get_task_status(&task_id).await.unwrap();
    assert_eq!(record.status, TaskState::Failed);
    assert_eq!(record.error.as_deref(), Some("Task timeout"));
}

#[tokio::test]
async fn reaper_leaves_completed_tasks_alone() {
    let tracker = tracker();
    let task_id = tracker
        .create_task(
            "do a thing".to_string(),
            None,
            None,
            None,
            Some(Duration::from_secs(0)),
            None,
        )
        .await
        .unwrap();

    tracker
        .update_task_status(&task_id, TaskState::Completed, None, None)
        .await
        .unwrap();

    tracker.reap_timeouts().await;

    let record = tracker.get_task_status(&task_id).await.unwrap();
    assert_eq!(record.status, TaskState::Completed);
}

#[tokio::test]
async fn list_tasks_filters_by_user_and_status_sorted_newest_first() {
    let tracker = tracker();
    let first = tracker
        .create_task("a".to_string(), None, Some("u1".to_string()), None, None, None)
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    let second = tracker
        .create_task("b".to_string(), None, Some("u1".to_string()), None, None, None)
        .await
        .unwrap();
    tracker
        .create_task("c".to_string(), None, Some("u2".to_string()), None, None, None)
        .await
        .unwrap();

    tracker
        .update_task_status(&first, TaskState::Running, None, None)
        .await
        .unwrap();

    let results = tracker.list_tasks(Some("u1"), None, 100).await;
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].task_id, second);

    let running_only = tracker.list_tasks(Some("u1"), Some(TaskState::Running), 100).await;
    assert_eq!(running_only.len(), 1);
    assert_eq!(running_only[0].task_id, first);
}

#[tokio::test]
async fn start_and_stop_are_idempotent() {
    let tracker = tracker();
    tracker.start().await;
    tracker.start().await;
    tracker.stop().await;
    tracker.stop().await;
}
