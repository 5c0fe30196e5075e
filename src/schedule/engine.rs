//! Scheduling engine boundary.
//!
//! The engine is an external LLM. [`LlmSchedulingEngine`] renders the task
//! list into a prompt, sends one non-streaming request to an
//! OpenAI-compatible `/v1/chat/completions` endpoint, and parses the JSON
//! schedule out of the reply.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::request::ScheduleRequestTask;
use crate::models::resolve_local;

/// Default provider base URL.
pub const DEFAULT_API_URL: &str = "https://api.openai.com";

/// Default model used for schedule suggestions.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

const SYSTEM_PROMPT: &str = "You are an AI scheduling assistant. Given a list of tasks, \
create a schedule for the user. Take into account the priority, due date, and estimated \
completion time of each task. Respond with JSON only.";

/// One slot of a suggested schedule, exactly as the engine returned it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledItem {
    /// Free text. Not guaranteed to match any task by identity.
    pub task_name: String,
    pub start_time: String,
    pub end_time: String,
    pub reasoning: String,
}

impl ScheduledItem {
    pub fn start(&self) -> Option<DateTime<FixedOffset>> {
        parse_iso8601(&self.start_time)
    }

    pub fn end(&self) -> Option<DateTime<FixedOffset>> {
        parse_iso8601(&self.end_time)
    }
}

/// Parses the ISO-8601 timestamps models tend to produce.
///
/// RFC 3339 first, then `YYYY-MM-DDTHH:MM[:SS[.fff]]` with an optional
/// trailing `Z`. Without `Z` or an offset the time is read as local.
pub fn parse_iso8601(s: &str) -> Option<DateTime<FixedOffset>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt);
    }
    let (body, utc) = match s.strip_suffix(['Z', 'z']) {
        Some(body) => (body, true),
        None => (s, false),
    };
    let naive = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(body, fmt).ok())?;
    if utc {
        Some(Utc.from_utc_datetime(&naive).fixed_offset())
    } else {
        resolve_local(&Local, naive).map(|dt| dt.fixed_offset())
    }
}

/// Engine failures. Callers outside this module only see an opaque message.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("engine returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed output: {0}")]
    MalformedOutput(String),
}

/// Something that turns a non-empty task list into an ordered schedule.
#[async_trait]
pub trait SchedulingEngine: Send + Sync {
    async fn suggest(
        &self,
        tasks: &[ScheduleRequestTask],
    ) -> Result<Vec<ScheduledItem>, EngineError>;
}

/// Connection settings for [`LlmSchedulingEngine`].
#[derive(Debug, Clone)]
pub struct LlmEngineConfig {
    pub base_url: String,
    pub model: String,
    /// Sent as a bearer token when present.
    pub api_key: Option<String>,
}

impl LlmEngineConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_API_URL.into(),
            model: model.into(),
            api_key: None,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }
}

impl Default for LlmEngineConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL)
    }
}

/// Scheduling engine backed by a chat-completions model.
pub struct LlmSchedulingEngine {
    client: reqwest::Client,
    config: LlmEngineConfig,
}

impl LlmSchedulingEngine {
    pub fn new(config: LlmEngineConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl SchedulingEngine for LlmSchedulingEngine {
    async fn suggest(
        &self,
        tasks: &[ScheduleRequestTask],
    ) -> Result<Vec<ScheduledItem>, EngineError> {
        let prompt = render_prompt(tasks);
        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        debug!(tasks = tasks.len(), model = %self.config.model, "requesting schedule");

        let mut request = self.client.post(self.endpoint()).json(&body);
        if let Some(key) = self.config.api_key.as_deref().filter(|k| !k.is_empty()) {
            request = request.bearer_auth(key);
        }
        let response = request
            .send()
            .await
            .map_err(|e| EngineError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let reply: ChatResponse = response
            .json()
            .await
            .map_err(|e| EngineError::MalformedOutput(e.to_string()))?;
        let content = reply
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| EngineError::MalformedOutput("response has no content".into()))?;

        parse_schedule(&content)
    }
}

/// Renders the user prompt listing every task.
pub fn render_prompt(tasks: &[ScheduleRequestTask]) -> String {
    let mut out = String::from("Tasks:\n");
    for task in tasks {
        out.push_str(&format!(
            "- Name: {}\n  Description: {}\n  Due Date: {}\n  Priority: {}\n  Estimated Completion Time: {} hours\n",
            task.name,
            task.description,
            task.due_date.as_deref().unwrap_or("none"),
            task.priority,
            task.estimated_completion_time,
        ));
    }
    out.push_str(
        "\nReturn a JSON object of the form \
{\"schedule\": [{\"taskName\": string, \"startTime\": ISO-8601 string, \
\"endTime\": ISO-8601 string, \"reasoning\": string}]} \
with the suggested schedule in chronological order and the reasoning for each task's placement.\n",
    );
    out
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ScheduleEnvelope {
    Wrapped { schedule: Vec<ScheduledItem> },
    Bare(Vec<ScheduledItem>),
}

/// Parses and validates the model's reply.
///
/// Accepts `{"schedule": [...]}` or a bare array, optionally wrapped in a
/// Markdown code fence. Every item needs non-empty reasoning and start and
/// end times accepted by [`parse_iso8601`]; one bad item fails the whole
/// reply.
pub fn parse_schedule(content: &str) -> Result<Vec<ScheduledItem>, EngineError> {
    let json = strip_code_fence(content);
    let items = match serde_json::from_str::<ScheduleEnvelope>(json)
        .map_err(|e| EngineError::MalformedOutput(e.to_string()))?
    {
        ScheduleEnvelope::Wrapped { schedule } => schedule,
        ScheduleEnvelope::Bare(items) => items,
    };

    for (i, item) in items.iter().enumerate() {
        if item.reasoning.trim().is_empty() {
            return Err(EngineError::MalformedOutput(format!(
                "item {i} has empty reasoning"
            )));
        }
        if item.start().is_none() || item.end().is_none() {
            return Err(EngineError::MalformedOutput(format!(
                "item {i} has an invalid timestamp"
            )));
        }
    }
    Ok(items)
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
