use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Local, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValidationError;

/// Opaque task identifier, unique within a collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Generates a fresh random identifier.
    pub fn generate() -> Self {
        TaskId(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        TaskId(s)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        TaskId(s.to_owned())
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Task priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }

    /// Title-cased label, as shown in lists and sent to the remote API.
    pub fn label(self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }
}

impl FromStr for Priority {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            _ => Err(ValidationError::InvalidPriority(s.to_owned())),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Estimated effort in hours. Always finite and strictly positive.
///
/// Deserializes from either a JSON number or a numeric string (`"2.50"`),
/// and serializes as a number.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct EstimatedHours(f64);

impl EstimatedHours {
    pub fn new(hours: f64) -> Result<Self, ValidationError> {
        if !hours.is_finite() || hours <= 0.0 {
            return Err(ValidationError::NonPositiveHours(hours));
        }
        Ok(EstimatedHours(hours))
    }

    pub fn get(self) -> f64 {
        self.0
    }
}

impl FromStr for EstimatedHours {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let hours: f64 = trimmed
            .parse()
            .map_err(|_| ValidationError::InvalidHours(s.to_owned()))?;
        EstimatedHours::new(hours)
    }
}

/// Shortest decimal form: `2.0` renders as `2`, `2.5` as `2.5`.
impl fmt::Display for EstimatedHours {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for EstimatedHours {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.0)
    }
}

impl<'de> Deserialize<'de> for EstimatedHours {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Text(String),
        }

        let hours = match Raw::deserialize(deserializer)? {
            Raw::Number(n) => EstimatedHours::new(n),
            Raw::Text(s) => s.parse(),
        };
        hours.map_err(serde::de::Error::custom)
    }
}

/// Represents a single task in the planner.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Task {
    /// Unique identifier for the task.
    pub id: TaskId,
    /// Short name of the task.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Optional deadline. `None` means no deadline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    pub priority: Priority,
    /// Estimated hours required to complete the task.
    pub estimated_hours: EstimatedHours,
    /// Whether the task has been completed.
    #[serde(default)]
    pub completed: bool,
    /// When the task was created, if the backing store records it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// A validated task draft, ready to be handed to a store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub name: String,
    pub description: String,
    pub due_date: Option<DateTime<Utc>>,
    pub priority: Priority,
    pub estimated_hours: EstimatedHours,
}

impl NewTask {
    /// Validates raw user input.
    ///
    /// Name and description must be non-blank, hours must parse to a
    /// positive number, and the due date (when given) must parse with
    /// [`parse_due_date`].
    pub fn parse(
        name: &str,
        description: &str,
        due: Option<&str>,
        priority: &str,
        hours: &str,
    ) -> Result<Self, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        let description = description.trim();
        if description.is_empty() {
            return Err(ValidationError::EmptyDescription);
        }
        let due_date = match due.map(str::trim) {
            Some(d) if !d.is_empty() => Some(parse_due_date(d)?),
            _ => None,
        };
        Ok(NewTask {
            name: name.to_owned(),
            description: description.to_owned(),
            due_date,
            priority: priority.parse()?,
            estimated_hours: hours.parse()?,
        })
    }

    /// Materializes the draft as an incomplete task.
    pub fn into_task(self, id: TaskId, created_at: DateTime<Utc>) -> Task {
        Task {
            id,
            name: self.name,
            description: self.description,
            due_date: self.due_date,
            priority: self.priority,
            estimated_hours: self.estimated_hours,
            completed: false,
            created_at: Some(created_at),
        }
    }
}

/// Parses a due date.
///
/// Accepts an RFC 3339 timestamp, a local `YYYY-MM-DDTHH:MM`,
/// a local `YYYY-MM-DD HH:MM:SS`, or a bare `YYYY-MM-DD` which is
/// taken as local midnight.
pub fn parse_due_date(s: &str) -> Result<DateTime<Utc>, ValidationError> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    let local = ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        });
    local
        .and_then(|naive| resolve_local(&Local, naive))
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| ValidationError::InvalidDueDate(s.to_owned()))
}

/// Pins a wall-clock time to `tz`.
///
/// Ambiguous times take the earlier instant. A time skipped by a forward
/// DST jump is moved one hour later, so midnight in a zone that springs
/// forward at 00:00 becomes 01:00.
pub(crate) fn resolve_local<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> Option<DateTime<Tz>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::None => tz.from_local_datetime(&(naive + Duration::hours(1))).earliest(),
        resolved => resolved.earliest(),
    }
}
