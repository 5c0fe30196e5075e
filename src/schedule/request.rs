use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};

use crate::models::{Priority, Task};

/// One active task, projected into the fields the scheduling engine reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRequestTask {
    pub name: String,
    pub description: String,
    /// UTC instant with millisecond precision, e.g. `2024-04-20T10:00:00.000Z`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    pub priority: Priority,
    /// Hours rendered as text: `2`, `0.5`.
    pub estimated_completion_time: String,
}

impl From<&Task> for ScheduleRequestTask {
    fn from(task: &Task) -> Self {
        ScheduleRequestTask {
            name: task.name.clone(),
            description: task.description.clone(),
            due_date: task
                .due_date
                .map(|d| d.to_rfc3339_opts(SecondsFormat::Millis, true)),
            priority: task.priority,
            estimated_completion_time: task.estimated_hours.to_string(),
        }
    }
}

/// Result of projecting a task collection for the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum ScheduleRequest {
    /// Nothing active to schedule. The engine must not be called.
    Empty,
    /// Non-empty, in collection order.
    Tasks(Vec<ScheduleRequestTask>),
}

/// Drops completed tasks and projects the rest, preserving order.
pub fn build_schedule_request(tasks: &[Task]) -> ScheduleRequest {
    let active: Vec<ScheduleRequestTask> = tasks
        .iter()
        .filter(|t| !t.completed)
        .map(ScheduleRequestTask::from)
        .collect();
    if active.is_empty() {
        ScheduleRequest::Empty
    } else {
        ScheduleRequest::Tasks(active)
    }
}
