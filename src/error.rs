//! Error types shared by the stores, the classifier and the CLI.

use crate::models::TaskId;

/// Reasons a task draft is rejected before it reaches any store.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("task name is required")]
    EmptyName,

    #[error("description is required")]
    EmptyDescription,

    /// Hours text that is not a number at all.
    #[error("estimated time '{0}' is not a number (e.g. '1', '0.5')")]
    InvalidHours(String),

    #[error("estimated time must be greater than zero, got {0}")]
    NonPositiveHours(f64),

    #[error("invalid due date '{0}', use YYYY-MM-DD or an RFC 3339 timestamp")]
    InvalidDueDate(String),

    #[error("unknown priority '{0}', expected high, medium or low")]
    InvalidPriority(String),
}

/// Top-level error type for task store operations.
#[derive(Debug, thiserror::Error)]
pub enum PlannerError {
    /// The draft never left the process.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Network unreachable or a non-2xx status.
    #[error("transport error: {0}")]
    Transport(String),

    /// The remote service answered 2xx with a payload we do not recognize.
    #[error("unexpected format: {0}")]
    UnexpectedFormat(String),

    /// The remote service reported an error inside a successful response.
    #[error("remote error: {0}")]
    Remote(String),

    #[error("task {0} not found")]
    NotFound(TaskId),

    /// Remote mutations need a device identifier.
    #[error("no device identifier available")]
    MissingDevice,

    /// Opaque scheduling failure.
    #[error("{0}")]
    Schedule(#[from] crate::schedule::ScheduleError),

    /// An id prefix that matches more than one task.
    #[error("task id '{0}' is ambiguous")]
    AmbiguousId(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<reqwest::Error> for PlannerError {
    fn from(err: reqwest::Error) -> Self {
        PlannerError::Transport(err.to_string())
    }
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, PlannerError>;
