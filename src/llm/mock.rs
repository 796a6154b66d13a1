use super::client::AssistantClient;
use super::error::BackendError;
use super::types::{
    RequiredAction, Run, RunError, RunStatus, ThreadMessage, ToolCall, ToolChoice, ToolOutput,
    RATE_LIMIT_CODE,
};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// Scripted assistants service.
///
/// Every `retrieve_run` pops the next [`MockRun`] snapshot from the queue; all
/// other calls succeed and are recorded for later inspection.
pub struct MockAssistantClient {
    state: Mutex<MockState>,
    name: String,
}

#[derive(Default)]
struct MockState {
    scripted: VecDeque<MockRun>,
    threads: HashMap<String, Vec<ThreadMessage>>,
    assistants: Vec<AssistantRecord>,
    created_runs: Vec<CreatedRun>,
    submitted: Vec<Vec<ToolOutput>>,
    cancelled: Vec<String>,
    retrieve_count: usize,
    next_id: usize,
}

impl MockState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}_{}", prefix, self.next_id)
    }
}

/// One scripted run snapshot
#[derive(Debug, Clone)]
pub struct MockRun {
    pub status: RunStatus,
    pub required_action: Option<RequiredAction>,
    pub last_error: Option<RunError>,
    /// Assistant message appended to the thread when this snapshot is delivered
    pub reply: Option<String>,
}

impl MockRun {
    pub fn status(status: RunStatus) -> Self {
        Self {
            status,
            required_action: None,
            last_error: None,
            reply: None,
        }
    }

    pub fn in_progress() -> Self {
        Self::status(RunStatus::InProgress)
    }

    pub fn completed() -> Self {
        Self::status(RunStatus::Completed)
    }

    pub fn completed_with_reply(reply: impl Into<String>) -> Self {
        Self {
            reply: Some(reply.into()),
            ..Self::completed()
        }
    }

    pub fn requires_tool_calls(tool_calls: Vec<ToolCall>) -> Self {
        Self {
            required_action: Some(RequiredAction::SubmitToolOutputs { tool_calls }),
            ..Self::status(RunStatus::RequiresAction)
        }
    }

    pub fn requires_action(kind: impl Into<String>) -> Self {
        Self {
            required_action: Some(RequiredAction::Unsupported { kind: kind.into() }),
            ..Self::status(RunStatus::RequiresAction)
        }
    }

    pub fn failed(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            last_error: Some(RunError {
                code: code.into(),
                message: message.into(),
            }),
            ..Self::status(RunStatus::Failed)
        }
    }

    pub fn rate_limited(retry_secs: u64) -> Self {
        Self::failed(
            RATE_LIMIT_CODE,
            format!(
                "Rate limit is exceeded. Please try again in {} seconds.",
                retry_secs
            ),
        )
    }
}

/// An assistant registered through `create_assistant`
#[derive(Debug, Clone)]
pub struct AssistantRecord {
    pub id: String,
    pub name: String,
    pub instructions: String,
    pub tools: Vec<Value>,
}

/// A run started through `create_run`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedRun {
    pub run_id: String,
    pub thread_id: String,
    pub assistant_id: String,
    pub tool_choice: ToolChoice,
}

impl MockAssistantClient {
    pub fn new() -> Self {
        Self::with_name("MockAssistant")
    }

    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(MockState::default()),
            name: name.into(),
        }
    }

    pub fn add_run(&self, run: MockRun) {
        self.state.lock().unwrap().scripted.push_back(run);
    }

    pub fn add_runs(&self, runs: impl IntoIterator<Item = MockRun>) {
        let mut state = self.state.lock().unwrap();
        state.scripted.extend(runs);
    }

    pub fn remaining_runs(&self) -> usize {
        self.state.lock().unwrap().scripted.len()
    }

    pub fn retrieve_count(&self) -> usize {
        self.state.lock().unwrap().retrieve_count
    }

    pub fn assistants(&self) -> Vec<AssistantRecord> {
        self.state.lock().unwrap().assistants.clone()
    }

    pub fn created_runs(&self) -> Vec<CreatedRun> {
        self.state.lock().unwrap().created_runs.clone()
    }

    pub fn submitted_outputs(&self) -> Vec<Vec<ToolOutput>> {
        self.state.lock().unwrap().submitted.clone()
    }

    pub fn cancelled_runs(&self) -> Vec<String> {
        self.state.lock().unwrap().cancelled.clone()
    }

    pub fn thread_messages(&self, thread_id: &str) -> Vec<ThreadMessage> {
        self.state
            .lock()
            .unwrap()
            .threads
            .get(thread_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn tool_call(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: serde_json::Value,
    ) -> ToolCall {
        ToolCall::new(id, name, arguments.to_string())
    }
}

impl Default for MockAssistantClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AssistantClient for MockAssistantClient {
    async fn create_assistant(
        &self,
        name: &str,
        instructions: &str,
        tools: &[Value],
    ) -> Result<String, BackendError> {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id("asst");
        state.assistants.push(AssistantRecord {
            id: id.clone(),
            name: name.to_string(),
            instructions: instructions.to_string(),
            tools: tools.to_vec(),
        });
        Ok(id)
    }

    async fn create_thread(&self) -> Result<String, BackendError> {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id("thread");
        state.threads.insert(id.clone(), Vec::new());
        Ok(id)
    }

    async fn add_message(&self, thread_id: &str, content: &str) -> Result<(), BackendError> {
        let mut state = self.state.lock().unwrap();
        let thread = state
            .threads
            .get_mut(thread_id)
            .ok_or_else(|| BackendError::ApiError {
                message: format!("No thread found with id '{}'", thread_id),
                status_code: Some(404),
            })?;
        thread.push(ThreadMessage::user(content));
        Ok(())
    }

    async fn create_run(
        &self,
        thread_id: &str,
        assistant_id: &str,
        tool_choice: &ToolChoice,
    ) -> Result<Run, BackendError> {
        let mut state = self.state.lock().unwrap();
        let run_id = state.next_id("run");
        state.created_runs.push(CreatedRun {
            run_id: run_id.clone(),
            thread_id: thread_id.to_string(),
            assistant_id: assistant_id.to_string(),
            tool_choice: tool_choice.clone(),
        });
        Ok(Run::new(run_id, thread_id, RunStatus::Queued))
    }

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run, BackendError> {
        let mut state = self.state.lock().unwrap();
        state.retrieve_count += 1;

        let scripted = state
            .scripted
            .pop_front()
            .ok_or_else(|| BackendError::Other {
                message: "MockAssistantClient: No more scripted runs in queue".to_string(),
            })?;

        if let Some(reply) = scripted.reply {
            state
                .threads
                .entry(thread_id.to_string())
                .or_default()
                .push(ThreadMessage::assistant(reply));
        }

        Ok(Run {
            id: run_id.to_string(),
            thread_id: thread_id.to_string(),
            status: scripted.status,
            required_action: scripted.required_action,
            last_error: scripted.last_error,
        })
    }

    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<Run, BackendError> {
        let mut state = self.state.lock().unwrap();
        state.cancelled.push(run_id.to_string());
        Ok(Run::new(run_id, thread_id, RunStatus::Cancelling))
    }

    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: &[ToolOutput],
    ) -> Result<Run, BackendError> {
        let mut state = self.state.lock().unwrap();
        state.submitted.push(outputs.to_vec());
        Ok(Run::new(run_id, thread_id, RunStatus::Queued))
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>, BackendError> {
        Ok(self.thread_messages(thread_id))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for MockAssistantClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockAssistantClient")
            .field("name", &self.name)
            .field("remaining_runs", &self.remaining_runs())
            .finish()
    }
}
