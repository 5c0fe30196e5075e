use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use daywise::classify::Bucket;
use daywise::commands::*;
use daywise::error::PlannerError;
use daywise::models::{EstimatedHours, Priority, Task, TaskId};
use daywise::schedule::{EngineError, ScheduleRequestTask, ScheduledItem, SchedulingEngine};
use daywise::store::{LocalTaskStore, TaskStore};
use daywise::ValidationError;
use tempfile::TempDir;

fn test_db() -> (TempDir, LocalTaskStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalTaskStore::new(dir.path().join("daywise").join("tasks.json"));
    (dir, store)
}

async fn add(store: &LocalTaskStore, name: &str) -> Vec<Task> {
    cmd_add(store, name.into(), "Details".into(), None, "high".into(), "2".into(), true)
        .await
        .unwrap()
}

/// Engine stub that records how often it was called.
struct CountingEngine {
    calls: AtomicUsize,
    reply: Vec<ScheduledItem>,
}

impl CountingEngine {
    fn new(reply: Vec<ScheduledItem>) -> Self {
        Self { calls: AtomicUsize::new(0), reply }
    }
}

#[async_trait]
impl SchedulingEngine for CountingEngine {
    async fn suggest(&self, _tasks: &[ScheduleRequestTask]) -> Result<Vec<ScheduledItem>, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reply.clone())
    }
}

struct FailingEngine;

#[async_trait]
impl SchedulingEngine for FailingEngine {
    async fn suggest(&self, _tasks: &[ScheduleRequestTask]) -> Result<Vec<ScheduledItem>, EngineError> {
        Err(EngineError::Request("connection reset".into()))
    }
}

#[tokio::test]
async fn test_add_and_list() {
    let (_dir, store) = test_db();
    add(&store, "Test Task").await;

    let tasks = store.load_tasks().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].name, "Test Task");
    assert_eq!(tasks[0].priority, Priority::High);
    assert_eq!(tasks[0].estimated_hours.get(), 2.0);
    assert!(!tasks[0].completed);
    assert!(tasks[0].created_at.is_some());

    let buckets = cmd_list(&store, false, true).await.unwrap();
    assert_eq!(buckets.upcoming.len(), 1);
}

#[tokio::test]
async fn test_add_invalid_task_is_not_stored() {
    let (_dir, store) = test_db();
    let err = cmd_add(&store, "Task".into(), "".into(), None, "low".into(), "1".into(), true)
        .await
        .unwrap_err();
    assert!(matches!(err, PlannerError::Validation(ValidationError::EmptyDescription)));

    let err = cmd_add(&store, "Task".into(), "d".into(), None, "low".into(), "-1".into(), true)
        .await
        .unwrap_err();
    assert!(matches!(err, PlannerError::Validation(ValidationError::NonPositiveHours(_))));

    assert!(!store.path().exists());
}

#[tokio::test]
async fn test_ids_are_unique() {
    let (_dir, store) = test_db();
    add(&store, "One").await;
    let tasks = add(&store, "Two").await;
    assert_eq!(tasks.len(), 2);
    assert_ne!(tasks[0].id, tasks[1].id);
}

#[tokio::test]
async fn test_toggle_twice_restores_state() {
    let (_dir, store) = test_db();
    let tasks = add(&store, "Toggle me").await;
    let id = tasks[0].id.to_string();

    let tasks = cmd_toggle(&store, id[..8].to_string(), true).await.unwrap();
    assert!(tasks[0].completed);
    let buckets = cmd_list(&store, false, true).await.unwrap();
    assert_eq!(buckets.completed.len(), 1);

    let tasks = cmd_toggle(&store, id, true).await.unwrap();
    assert!(!tasks[0].completed);
    let buckets = cmd_list(&store, false, true).await.unwrap();
    assert_eq!(buckets.upcoming.len(), 1);
    assert!(buckets.completed.is_empty());
}

#[tokio::test]
async fn test_list_shows_completed_by_default() {
    let (_dir, store) = test_db();
    let tasks = add(&store, "Done already").await;
    cmd_toggle(&store, tasks[0].id.to_string(), true).await.unwrap();

    let buckets = cmd_list(&store, false, true).await.unwrap();
    assert_eq!(
        visible_buckets(&buckets, false),
        vec![Bucket::Today, Bucket::Upcoming, Bucket::Completed]
    );
    assert_eq!(visible_buckets(&buckets, true), vec![Bucket::Today, Bucket::Upcoming]);
}

#[tokio::test]
async fn test_remove_task() {
    let (_dir, store) = test_db();
    add(&store, "Keep").await;
    let tasks = add(&store, "Drop").await;
    let id = tasks[1].id.to_string();

    let tasks = cmd_remove(&store, id, true).await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(store.load_tasks().unwrap()[0].name, "Keep");
}

#[tokio::test]
async fn test_remove_unknown_task() {
    let (_dir, store) = test_db();
    add(&store, "Only").await;
    let err = cmd_remove(&store, "nope".into(), true).await.unwrap_err();
    assert!(matches!(err, PlannerError::NotFound(_)));
    assert_eq!(store.load_tasks().unwrap().len(), 1);
}

#[test]
fn test_resolve_id_prefix() {
    let mk = |id: &str| Task {
        id: TaskId::from(id),
        name: id.into(),
        description: "d".into(),
        due_date: None,
        priority: Priority::Low,
        estimated_hours: EstimatedHours::new(1.0).unwrap(),
        completed: false,
        created_at: None,
    };
    let tasks = vec![mk("abc1"), mk("abc2"), mk("7"), mk("70")];
    assert_eq!(resolve_id(&tasks, "abc1").unwrap().as_str(), "abc1");
    assert_eq!(resolve_id(&tasks, "7").unwrap().as_str(), "7");
    assert!(matches!(resolve_id(&tasks, "abc"), Err(PlannerError::AmbiguousId(_))));
    assert!(matches!(resolve_id(&tasks, "zz"), Err(PlannerError::NotFound(_))));
}

#[tokio::test]
async fn test_corrupt_file_is_an_error() {
    let (_dir, store) = test_db();
    std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
    std::fs::write(store.path(), "not json").unwrap();
    assert!(matches!(store.list().await, Err(PlannerError::Serialization(_))));
}

#[tokio::test]
async fn test_schedule_skips_engine_without_active_tasks() {
    let (_dir, store) = test_db();
    let tasks = add(&store, "Done already").await;
    cmd_toggle(&store, tasks[0].id.to_string(), true).await.unwrap();

    let engine = CountingEngine::new(vec![]);
    let board = cmd_schedule(&store, &engine, true).await.unwrap();
    assert!(board.is_empty());
    assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_schedule_shows_engine_result() {
    let (_dir, store) = test_db();
    add(&store, "Write report").await;

    let item = ScheduledItem {
        task_name: "Write report".into(),
        start_time: "2025-03-10T09:00:00Z".into(),
        end_time: "2025-03-10T11:00:00Z".into(),
        reasoning: "High priority, do it first".into(),
    };
    let engine = CountingEngine::new(vec![item.clone()]);
    let board = cmd_schedule(&store, &engine, true).await.unwrap();
    assert_eq!(board.items(), &[item]);
    assert_eq!(engine.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_schedule_failure_is_opaque() {
    let (_dir, store) = test_db();
    add(&store, "Write report").await;

    let err = cmd_schedule(&store, &FailingEngine, true).await.unwrap_err();
    assert_eq!(err.to_string(), "Failed to generate schedule. Please try again.");
}
