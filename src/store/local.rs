use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use super::TaskStore;
use crate::error::{PlannerError, Result};
use crate::models::{NewTask, Task, TaskId};

/// Environment variable overriding the tasks file location.
pub const DB_ENV_VAR: &str = "DAYWISE_DB";

/// Returns the default path to the tasks database file (`tasks.json`).
///
/// The path is determined in the following order:
/// 1. `DAYWISE_DB` environment variable.
/// 2. `~/.local/share/daywise/tasks.json` (on Linux).
/// 3. `./tasks.json` (fallback).
pub fn default_db_path() -> PathBuf {
    std::env::var(DB_ENV_VAR).map(PathBuf::from).unwrap_or_else(|_| {
        let mut p = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
        p.push("daywise");
        p.push("tasks.json");
        p
    })
}

/// Task store backed by a single JSON file.
///
/// The whole collection is rewritten on every mutation.
#[derive(Debug, Clone)]
pub struct LocalTaskStore {
    path: PathBuf,
}

impl LocalTaskStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads all tasks from the storage file.
    ///
    /// A missing file is an empty collection. A file that exists but cannot
    /// be read or parsed is an error.
    pub fn load_tasks(&self) -> Result<Vec<Task>> {
        let mut f = match OpenOptions::new().read(true).open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut s = String::new();
        f.read_to_string(&mut s)?;
        if s.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&s)?)
    }

    /// Saves the given list of tasks to the storage file.
    ///
    /// Overwrites the existing file, creating parent directories as needed.
    pub fn save_tasks(&self, tasks: &[Task]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let s = serde_json::to_string_pretty(tasks)?;
        let mut f = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)?;
        f.write_all(s.as_bytes())?;
        debug!(path = %self.path.display(), tasks = tasks.len(), "saved tasks");
        Ok(())
    }
}

#[async_trait]
impl TaskStore for LocalTaskStore {
    async fn list(&self) -> Result<Vec<Task>> {
        self.load_tasks()
    }

    async fn create(&self, task: NewTask) -> Result<Vec<Task>> {
        let mut tasks = self.load_tasks()?;
        let mut id = TaskId::generate();
        while tasks.iter().any(|t| t.id == id) {
            id = TaskId::generate();
        }
        tasks.push(task.into_task(id, Utc::now()));
        self.save_tasks(&tasks)?;
        Ok(tasks)
    }

    async fn set_completed(&self, id: &TaskId, completed: bool) -> Result<Vec<Task>> {
        let mut tasks = self.load_tasks()?;
        let task = tasks
            .iter_mut()
            .find(|t| &t.id == id)
            .ok_or_else(|| PlannerError::NotFound(id.clone()))?;
        task.completed = completed;
        self.save_tasks(&tasks)?;
        Ok(tasks)
    }

    async fn delete(&self, id: &TaskId) -> Result<Vec<Task>> {
        let mut tasks = self.load_tasks()?;
        let len_before = tasks.len();
        tasks.retain(|t| &t.id != id);
        if tasks.len() == len_before {
            return Err(PlannerError::NotFound(id.clone()));
        }
        self.save_tasks(&tasks)?;
        Ok(tasks)
    }
}
