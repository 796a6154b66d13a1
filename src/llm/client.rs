use super::error::BackendError;
use super::types::{Run, ThreadMessage, ToolChoice, ToolOutput};
use async_trait::async_trait;
use serde_json::Value;

/// Stateful conversation API used by an agent session.
///
/// Threads and runs are owned by the service; callers only hold their ids.
#[async_trait]
pub trait AssistantClient: Send + Sync {
    /// Registers an assistant and returns its id
    async fn create_assistant(
        &self,
        name: &str,
        instructions: &str,
        tools: &[Value],
    ) -> Result<String, BackendError>;

    /// Creates an empty thread and returns its id
    async fn create_thread(&self) -> Result<String, BackendError>;

    /// Appends a user message to a thread
    async fn add_message(&self, thread_id: &str, content: &str) -> Result<(), BackendError>;

    async fn create_run(
        &self,
        thread_id: &str,
        assistant_id: &str,
        tool_choice: &ToolChoice,
    ) -> Result<Run, BackendError>;

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run, BackendError>;

    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<Run, BackendError>;

    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: &[ToolOutput],
    ) -> Result<Run, BackendError>;

    /// All messages on the thread, oldest first
    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>, BackendError>;

    fn name(&self) -> &str;
}
