//! Task persistence.
//!
//! Two interchangeable backends implement [`TaskStore`]: a local JSON file
//! ([`LocalTaskStore`]) and a remote HTTP CRUD service ([`RemoteTaskStore`]).
//! The backend is picked once at startup from configuration.
//!
//! Every mutation returns the full, refreshed collection so callers never
//! patch their own copy.

pub mod local;
pub mod remote;

use async_trait::async_trait;

pub use local::LocalTaskStore;
pub use remote::RemoteTaskStore;

use crate::error::{PlannerError, Result};
use crate::models::{NewTask, Task, TaskId};

#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Returns every task in the collection.
    async fn list(&self) -> Result<Vec<Task>>;

    /// Adds a new incomplete task.
    async fn create(&self, task: NewTask) -> Result<Vec<Task>>;

    /// Sets the `completed` flag of one task.
    async fn set_completed(&self, id: &TaskId, completed: bool) -> Result<Vec<Task>>;

    /// Removes one task.
    async fn delete(&self, id: &TaskId) -> Result<Vec<Task>>;
}

/// Flips the `completed` flag of `id`.
pub async fn toggle_completed(store: &dyn TaskStore, id: &TaskId) -> Result<Vec<Task>> {
    let tasks = store.list().await?;
    let current = tasks
        .iter()
        .find(|t| &t.id == id)
        .map(|t| t.completed)
        .ok_or_else(|| PlannerError::NotFound(id.clone()))?;
    store.set_completed(id, !current).await
}
