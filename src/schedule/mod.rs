//! Daily schedule suggestions.
//!
//! [`suggest_schedule`] filters the collection down to active tasks, skips
//! the engine entirely when there is nothing to schedule, and reduces any
//! engine failure to one opaque message.

pub mod engine;
pub mod request;

use tracing::{error, info};

pub use engine::{
    parse_iso8601, EngineError, LlmEngineConfig, LlmSchedulingEngine, ScheduledItem, SchedulingEngine,
};
pub use request::{build_schedule_request, ScheduleRequest, ScheduleRequestTask};

use crate::models::Task;

/// Message shown for every scheduling failure.
pub const SCHEDULE_FAILED_MESSAGE: &str = "Failed to generate schedule. Please try again.";

/// Successful outcome of a schedule request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleOutcome {
    /// No active tasks; the engine was not contacted.
    NothingToSchedule,
    /// The engine's schedule, in the order it suggested. May be empty.
    Suggested(Vec<ScheduledItem>),
}

/// Opaque scheduling failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ScheduleError {
    pub message: String,
}

impl ScheduleError {
    fn opaque() -> Self {
        ScheduleError {
            message: SCHEDULE_FAILED_MESSAGE.to_owned(),
        }
    }
}

/// Asks `engine` for a schedule covering the incomplete tasks in `tasks`.
pub async fn suggest_schedule(
    engine: &dyn SchedulingEngine,
    tasks: &[Task],
) -> Result<ScheduleOutcome, ScheduleError> {
    let request = match build_schedule_request(tasks) {
        ScheduleRequest::Empty => return Ok(ScheduleOutcome::NothingToSchedule),
        ScheduleRequest::Tasks(request) => request,
    };
    match engine.suggest(&request).await {
        Ok(items) => {
            info!(items = items.len(), "schedule generated");
            Ok(ScheduleOutcome::Suggested(items))
        }
        Err(e) => {
            error!("Error generating schedule: {e}");
            Err(ScheduleError::opaque())
        }
    }
}

/// Best-effort lookup of the task a scheduled item refers to.
///
/// Matches on exact name first, then on a case-insensitive trimmed name.
/// Completed tasks are never matched.
pub fn match_task<'a>(tasks: &'a [Task], item: &ScheduledItem) -> Option<&'a Task> {
    let active = || tasks.iter().filter(|t| !t.completed);
    active()
        .find(|t| t.name == item.task_name)
        .or_else(|| {
            let wanted = item.task_name.trim().to_lowercase();
            active().find(|t| t.name.trim().to_lowercase() == wanted)
        })
}

/// The schedule currently on display.
///
/// Each new result replaces the previous one wholesale; nothing is merged,
/// and a failure leaves the board empty rather than stale.
#[derive(Debug, Default, Clone)]
pub struct ScheduleBoard {
    items: Vec<ScheduledItem>,
}

impl ScheduleBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, result: &Result<ScheduleOutcome, ScheduleError>) {
        self.items = match result {
            Ok(ScheduleOutcome::Suggested(items)) => items.clone(),
            Ok(ScheduleOutcome::NothingToSchedule) | Err(_) => Vec::new(),
        };
    }

    pub fn items(&self) -> &[ScheduledItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
