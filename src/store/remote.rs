//! Remote task store.
//!
//! The service exposes a single endpoint. Every request is a JSON object
//! whose `option` field selects the operation (`insert`, `all`, `update`,
//! `delete`). Replies are not uniform, so each one is sniffed by
//! [`ApiResponse::classify`] before being folded into an [`ApiResult`].
//!
//! Mutations are sent immediately and followed by a full `all` re-fetch.
//! There is no local cache and no optimistic update.

use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::TaskStore;
use crate::device::DeviceId;
use crate::error::{PlannerError, Result};
use crate::models::{parse_due_date, EstimatedHours, NewTask, Priority, Task, TaskId};

/// Status text the service uses for a finished task.
pub const STATUS_COMPLETED: &str = "Completed";
/// Status text the service uses for an open task.
pub const STATUS_NOT_STARTED: &str = "Not Started";

#[derive(Debug, Serialize)]
#[serde(tag = "option", rename_all = "lowercase")]
enum ApiRequest<'a> {
    Insert {
        task_name: &'a str,
        description: &'a str,
        /// `YYYY-MM-DD`, or empty for no deadline.
        due_date: String,
        priority: &'static str,
        estimated_hours: f64,
        device: &'a str,
    },
    All,
    Update {
        id: &'a str,
        status: &'static str,
    },
    Delete {
        id: &'a str,
    },
}

/// The shapes a 2xx reply body can take, checked in this order:
///
/// 1. [`ErrorField`](Self::ErrorField): an object carrying `error`. A
///    `null`, `false` or empty-string `error` counts as absent.
/// 2. [`StatusSuccess`](Self::StatusSuccess): `status: "success"` or
///    `success: true`, optionally with `message` and `data`.
/// 3. [`DataArray`](Self::DataArray): an object carrying a `data` array.
/// 4. [`BareArray`](Self::BareArray): a top-level array.
///
/// Anything else is [`Unexpected`](Self::Unexpected).
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    ErrorField(String),
    StatusSuccess {
        message: Option<String>,
        data: Option<Vec<Value>>,
    },
    DataArray(Vec<Value>),
    BareArray(Vec<Value>),
    Unexpected,
}

impl ApiResponse {
    pub fn classify(body: Value) -> Self {
        let mut obj = match body {
            Value::Array(rows) => return ApiResponse::BareArray(rows),
            Value::Object(obj) => obj,
            _ => return ApiResponse::Unexpected,
        };

        if let Some(err) = obj.remove("error") {
            let absent = match &err {
                Value::Null | Value::Bool(false) => true,
                Value::String(s) => s.is_empty(),
                _ => false,
            };
            if !absent {
                let message = match err {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                return ApiResponse::ErrorField(message);
            }
        }

        let data = match obj.remove("data") {
            Some(Value::Array(rows)) => Some(rows),
            _ => None,
        };

        let status_success = obj
            .get("status")
            .and_then(Value::as_str)
            .is_some_and(|s| s.eq_ignore_ascii_case("success"));
        let success_flag = obj.get("success").and_then(Value::as_bool) == Some(true);
        if status_success || success_flag {
            let message = obj
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_owned);
            return ApiResponse::StatusSuccess { message, data };
        }

        match data {
            Some(rows) => ApiResponse::DataArray(rows),
            None => ApiResponse::Unexpected,
        }
    }
}

/// Why a remote call did not succeed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiFailure {
    /// The reply carried an `error` field.
    #[error("{0}")]
    Remote(String),
    #[error("{0}")]
    UnexpectedFormat(String),
    #[error("{0}")]
    Transport(String),
}

impl From<ApiFailure> for PlannerError {
    fn from(failure: ApiFailure) -> Self {
        match failure {
            ApiFailure::Remote(m) => PlannerError::Remote(m),
            ApiFailure::UnexpectedFormat(m) => PlannerError::UnexpectedFormat(m),
            ApiFailure::Transport(m) => PlannerError::Transport(m),
        }
    }
}

/// Uniform result of one remote call.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResult {
    pub success: bool,
    pub data: Option<Vec<Value>>,
    pub message: Option<String>,
    pub error: Option<ApiFailure>,
}

impl ApiResult {
    fn ok(data: Option<Vec<Value>>, message: Option<String>) -> Self {
        ApiResult {
            success: true,
            data,
            message,
            error: None,
        }
    }

    fn failed(error: ApiFailure) -> Self {
        ApiResult {
            success: false,
            data: None,
            message: None,
            error: Some(error),
        }
    }

    pub fn into_result(self) -> std::result::Result<Option<Vec<Value>>, ApiFailure> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.data),
        }
    }
}

impl From<ApiResponse> for ApiResult {
    fn from(response: ApiResponse) -> Self {
        match response {
            ApiResponse::ErrorField(m) => ApiResult::failed(ApiFailure::Remote(m)),
            ApiResponse::StatusSuccess { message, data } => ApiResult::ok(data, message),
            ApiResponse::DataArray(rows) | ApiResponse::BareArray(rows) => {
                ApiResult::ok(Some(rows), None)
            }
            ApiResponse::Unexpected => ApiResult::failed(ApiFailure::UnexpectedFormat(
                "unexpected response format from task API".into(),
            )),
        }
    }
}

/// A task row as the service returns it.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiTask {
    pub id: Value,
    pub task_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub estimated_hours: Value,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub device: Option<String>,
}

impl ApiTask {
    /// Maps the row onto a [`Task`].
    ///
    /// Unknown priorities fall back to medium. Rows without a usable id or
    /// with non-positive hours are rejected.
    pub fn into_task(self) -> std::result::Result<Task, String> {
        let id = match &self.id {
            Value::String(s) if !s.is_empty() => s.clone(),
            Value::Number(n) => n.to_string(),
            other => return Err(format!("row has no usable id: {other}")),
        };

        let priority = match self.priority.as_deref() {
            Some(p) => p.parse().unwrap_or_else(|_| {
                warn!(task = %id, priority = p, "unknown priority, using medium");
                Priority::Medium
            }),
            None => Priority::Medium,
        };

        let estimated_hours = match &self.estimated_hours {
            Value::Number(n) => n.as_f64().map(EstimatedHours::new),
            Value::String(s) => Some(s.parse::<EstimatedHours>()),
            _ => None,
        }
        .ok_or_else(|| format!("task {id} has no estimated hours"))?
        .map_err(|e| format!("task {id}: {e}"))?;

        let due_date = match self.due_date.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(d) => Some(parse_due_date(d).map_err(|e| format!("task {id}: {e}"))?),
        };

        let completed = self
            .status
            .as_deref()
            .is_some_and(|s| s.trim().eq_ignore_ascii_case(STATUS_COMPLETED));

        Ok(Task {
            id: TaskId::from(id),
            name: self.task_name,
            description: self.description.unwrap_or_default(),
            due_date,
            priority,
            estimated_hours,
            completed,
            created_at: None,
        })
    }
}

/// Task store that talks to the remote CRUD endpoint.
pub struct RemoteTaskStore {
    client: reqwest::Client,
    endpoint: String,
    device: Option<DeviceId>,
}

impl RemoteTaskStore {
    /// Creates a store for `endpoint`.
    ///
    /// Without a device identifier only [`TaskStore::list`] is available.
    pub fn new(endpoint: impl Into<String>, device: Option<DeviceId>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            device,
        }
    }

    fn require_device(&self) -> Result<&DeviceId> {
        self.device.as_ref().ok_or(PlannerError::MissingDevice)
    }

    async fn call(&self, request: &ApiRequest<'_>) -> ApiResult {
        debug!(endpoint = %self.endpoint, ?request, "task API call");
        let response = match self.client.post(&self.endpoint).json(request).send().await {
            Ok(r) => r,
            Err(e) => return ApiResult::failed(ApiFailure::Transport(e.to_string())),
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(b) => b,
            Err(e) => return ApiResult::failed(ApiFailure::Transport(e.to_string())),
        };
        if !status.is_success() {
            return ApiResult::failed(ApiFailure::Transport(format!(
                "task API returned {status}: {}",
                body.trim()
            )));
        }

        match serde_json::from_str::<Value>(&body) {
            Ok(value) => ApiResponse::classify(value).into(),
            Err(_) => ApiResult::failed(ApiFailure::UnexpectedFormat(
                "task API returned a non-JSON body".into(),
            )),
        }
    }

    async fn fetch_all(&self) -> Result<Vec<Task>> {
        let rows = self.call(&ApiRequest::All).await.into_result()?;
        let Some(rows) = rows else {
            debug!("task API returned no rows");
            return Ok(Vec::new());
        };

        let mine = self.device.as_ref().map(DeviceId::as_str);
        let mut tasks = Vec::with_capacity(rows.len());
        for row in rows {
            let row: ApiTask = match serde_json::from_value(row) {
                Ok(r) => r,
                Err(e) => {
                    warn!("skipping malformed task row: {e}");
                    continue;
                }
            };
            if let (Some(mine), Some(theirs)) = (mine, row.device.as_deref()) {
                if mine != theirs {
                    continue;
                }
            }
            match row.into_task() {
                Ok(t) => tasks.push(t),
                Err(e) => warn!("skipping task row: {e}"),
            }
        }
        Ok(tasks)
    }

    async fn mutate(&self, request: ApiRequest<'_>) -> Result<Vec<Task>> {
        let result = self.call(&request).await;
        if let Some(message) = &result.message {
            debug!(message = %message, "task API accepted change");
        }
        result.into_result()?;
        self.fetch_all().await
    }
}

#[async_trait]
impl TaskStore for RemoteTaskStore {
    async fn list(&self) -> Result<Vec<Task>> {
        self.fetch_all().await
    }

    async fn create(&self, task: NewTask) -> Result<Vec<Task>> {
        let device = self.require_device()?;
        let due_date = task
            .due_date
            .map(|d: DateTime<Utc>| d.with_timezone(&Local).format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        self.mutate(ApiRequest::Insert {
            task_name: &task.name,
            description: &task.description,
            due_date,
            priority: task.priority.label(),
            estimated_hours: task.estimated_hours.get(),
            device: device.as_str(),
        })
        .await
    }

    async fn set_completed(&self, id: &TaskId, completed: bool) -> Result<Vec<Task>> {
        self.require_device()?;
        let status = if completed {
            STATUS_COMPLETED
        } else {
            STATUS_NOT_STARTED
        };
        self.mutate(ApiRequest::Update {
            id: id.as_str(),
            status,
        })
        .await
    }

    async fn delete(&self, id: &TaskId) -> Result<Vec<Task>> {
        self.require_device()?;
        self.mutate(ApiRequest::Delete { id: id.as_str() }).await
    }
}
