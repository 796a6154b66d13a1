//! Assistants service types
//!
//! This module defines the conversation and run types exchanged with the remote
//! assistants service, independent of the HTTP wire format.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::sync::OnceLock;
use std::time::Duration;

/// Error code the service uses when a run was rejected by rate limiting
pub const RATE_LIMIT_CODE: &str = "rate_limit_exceeded";

/// The only required-action type the session knows how to satisfy
pub const SUBMIT_TOOL_OUTPUTS: &str = "submit_tool_outputs";

/// Role of a message in a conversation thread
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Prompt sent by this program
    User,
    /// Reply written by the model
    Assistant,
    /// Tool output recorded on the thread
    Tool,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
            MessageRole::Tool => write!(f, "tool"),
        }
    }
}

/// A message on a conversation thread
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ThreadMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }

    /// Renders the message as `role: content`, indenting continuation lines
    pub fn render(&self) -> String {
        format!("{}: {}", self.role, self.content.replace('\n', "\n    "))
    }
}

/// Status of a run as reported by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Cancelled,
    Failed,
    Completed,
    Incomplete,
    Expired,
}

impl RunStatus {
    /// A terminal run never changes status again
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Cancelled
                | RunStatus::Failed
                | RunStatus::Completed
                | RunStatus::Incomplete
                | RunStatus::Expired
        )
    }

    /// Still executing on the service side; keep polling
    pub fn is_open(&self) -> bool {
        !self.is_terminal() && *self != RunStatus::RequiresAction
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Queued => "queued",
            RunStatus::InProgress => "in_progress",
            RunStatus::RequiresAction => "requires_action",
            RunStatus::Cancelling => "cancelling",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Failed => "failed",
            RunStatus::Completed => "completed",
            RunStatus::Incomplete => "incomplete",
            RunStatus::Expired => "expired",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tool invocation requested by the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Identifier the output must be submitted under
    pub id: String,
    /// Name of the function to invoke
    pub name: String,
    /// Serialized argument mapping, exactly as the model produced it
    pub arguments: String,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }
}

/// Result of one tool call, submitted back to the run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolOutput {
    pub tool_call_id: String,
    pub output: String,
}

/// Action the service needs from us before the run can continue
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequiredAction {
    SubmitToolOutputs { tool_calls: Vec<ToolCall> },
    /// Any action type this program does not understand
    Unsupported { kind: String },
}

impl RequiredAction {
    pub fn kind(&self) -> &str {
        match self {
            RequiredAction::SubmitToolOutputs { .. } => SUBMIT_TOOL_OUTPUTS,
            RequiredAction::Unsupported { kind } => kind,
        }
    }
}

/// Failure details attached to a failed run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunError {
    pub code: String,
    pub message: String,
}

impl RunError {
    pub fn is_rate_limit(&self) -> bool {
        self.code == RATE_LIMIT_CODE
    }

    /// Parses the delay out of messages like "Please try again in 30 seconds."
    pub fn retry_after(&self) -> Option<Duration> {
        static PATTERN: OnceLock<Regex> = OnceLock::new();
        let pattern = PATTERN.get_or_init(|| {
            Regex::new(r"(?i)try again in (\d+) seconds?").expect("valid retry-after pattern")
        });

        pattern
            .captures(&self.message)
            .and_then(|caps| caps[1].parse::<u64>().ok())
            .map(Duration::from_secs)
    }
}

/// Local snapshot of a run's state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub id: String,
    pub thread_id: String,
    pub status: RunStatus,
    pub required_action: Option<RequiredAction>,
    pub last_error: Option<RunError>,
}

impl Run {
    pub fn new(id: impl Into<String>, thread_id: impl Into<String>, status: RunStatus) -> Self {
        Self {
            id: id.into(),
            thread_id: thread_id.into(),
            status,
            required_action: None,
            last_error: None,
        }
    }
}

/// How the model may pick tools for a run
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ToolChoice {
    /// The model decides whether and which tool to call
    #[default]
    Auto,
    /// The model must call the named function immediately
    Function(String),
}

impl ToolChoice {
    pub fn forced(name: Option<&str>) -> Self {
        match name {
            Some(name) => ToolChoice::Function(name.to_string()),
            None => ToolChoice::Auto,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            ToolChoice::Auto => json!("auto"),
            ToolChoice::Function(name) => json!({
                "type": "function",
                "function": { "name": name }
            }),
        }
    }
}
