//! Assistants service abstraction layer
//!
//! This module provides a trait-based abstraction over the remote assistants
//! service (assistants, threads, runs, tool outputs), allowing the HTTP client
//! and the scripted mock to be used interchangeably.

mod azure;
mod client;
mod error;
mod mock;
mod types;

pub use azure::{AzureAssistantClient, Credential};
pub use client::AssistantClient;
pub use error::BackendError;
pub use mock::{AssistantRecord, CreatedRun, MockAssistantClient, MockRun};
pub use types::{
    MessageRole, RequiredAction, Run, RunError, RunStatus, ThreadMessage, ToolCall, ToolChoice,
    ToolOutput, RATE_LIMIT_CODE, SUBMIT_TOOL_OUTPUTS,
};
