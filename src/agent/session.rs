use super::error::SessionError;
use super::poller::{PollPolicy, RunPoller};
use crate::llm::{
    AssistantClient, RequiredAction, Run, RunStatus, ToolCall, ToolChoice, ToolOutput,
};
use crate::tools::ToolRegistry;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Used when a rate-limit message carries no retry hint
const FALLBACK_RETRY_AFTER: Duration = Duration::from_secs(20);

/// One assistant conversation with a fixed tool set.
///
/// A session owns its thread and drives runs against it one at a time:
/// polling, executing requested tools and resubmitting their outputs until
/// the run ends.
pub struct AgentSession {
    client: Arc<dyn AssistantClient>,
    registry: ToolRegistry,
    policy: PollPolicy,
    assistant_id: String,
    thread_id: String,
    last_run: Option<Run>,
    read_cursor: usize,
}

impl AgentSession {
    /// Creates the assistant, advertising every registered tool, and an empty thread
    pub async fn start(
        client: Arc<dyn AssistantClient>,
        name: &str,
        instructions: &str,
        registry: ToolRegistry,
        policy: PollPolicy,
    ) -> Result<Self, SessionError> {
        let assistant_id = client
            .create_assistant(name, instructions, &registry.advertisement())
            .await?;
        let thread_id = client.create_thread().await?;

        info!(
            assistant = name,
            assistant_id = %assistant_id,
            thread_id = %thread_id,
            tools = ?registry.tool_names(),
            "Started agent session"
        );

        Ok(Self {
            client,
            registry,
            policy,
            assistant_id,
            thread_id,
            last_run: None,
            read_cursor: 0,
        })
    }

    pub fn assistant_id(&self) -> &str {
        &self.assistant_id
    }

    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn last_run(&self) -> Option<&Run> {
        self.last_run.as_ref()
    }

    pub async fn add_prompt(&self, text: &str) -> Result<(), SessionError> {
        debug!(thread_id = %self.thread_id, chars = text.len(), "Adding prompt");
        self.client.add_message(&self.thread_id, text).await?;
        Ok(())
    }

    /// Runs the assistant over the thread until the run completes.
    ///
    /// With `forced_tool` the model must call that tool first. Rate-limited
    /// runs are re-issued with the same tool choice after the delay the
    /// service asks for, up to the policy's retry cap.
    pub async fn run_agent(&mut self, forced_tool: Option<&str>) -> Result<&Run, SessionError> {
        if let Some(name) = forced_tool {
            if !self.registry.contains(name) {
                return Err(SessionError::UnknownForcedTool(name.to_string()));
            }
        }

        let choice = ToolChoice::forced(forced_tool);
        let mut retries = 0;

        loop {
            let run = self
                .client
                .create_run(&self.thread_id, &self.assistant_id, &choice)
                .await?;
            info!(run_id = %run.id, tool_choice = ?choice, "Created run");

            let finished = self.drive(run).await?;
            self.last_run = Some(finished.clone());

            match finished.status {
                RunStatus::Completed => {
                    info!(run_id = %finished.id, "Run completed");
                    break;
                }
                RunStatus::Failed => {
                    let retry_after = match &finished.last_error {
                        Some(err) if err.is_rate_limit() => {
                            err.retry_after().unwrap_or(FALLBACK_RETRY_AFTER)
                        }
                        _ => {
                            return Err(SessionError::RunFailed {
                                run: Box::new(finished),
                            })
                        }
                    };

                    if retries >= self.policy.max_rate_limit_retries {
                        return Err(SessionError::RateLimitExceeded {
                            retries,
                            run: Box::new(finished),
                        });
                    }
                    retries += 1;

                    let delay = retry_after + self.policy.rate_limit_margin;
                    warn!(
                        run_id = %finished.id,
                        retry = retries,
                        delay_secs = delay.as_secs(),
                        "Run hit the rate limit, retrying"
                    );
                    sleep(delay).await;
                }
                _ => {
                    return Err(SessionError::RunEnded {
                        run: Box::new(finished),
                    })
                }
            }
        }

        self.last_run.as_ref().ok_or(SessionError::NoRun)
    }

    /// Polls one run, serving tool calls, until it is terminal
    async fn drive(&self, run: Run) -> Result<Run, SessionError> {
        let poller = RunPoller::new(self.client.as_ref(), &self.policy);
        let mut current = poller.await_transition(run).await?;

        while current.status == RunStatus::RequiresAction {
            let tool_calls = match &current.required_action {
                Some(RequiredAction::SubmitToolOutputs { tool_calls }) => tool_calls.clone(),
                other => {
                    let kind = other
                        .as_ref()
                        .map(|action| action.kind().to_string())
                        .unwrap_or_else(|| "none".to_string());
                    return Err(SessionError::UnsupportedActionType {
                        kind,
                        run: Box::new(current),
                    });
                }
            };

            let outputs = self.dispatch(&tool_calls).await;
            let resumed = self
                .client
                .submit_tool_outputs(&current.thread_id, &current.id, &outputs)
                .await?;
            current = poller.await_transition(resumed).await?;
        }

        Ok(current)
    }

    /// One output per call, in call order. Failures become output text.
    async fn dispatch(&self, tool_calls: &[ToolCall]) -> Vec<ToolOutput> {
        let mut outputs = Vec::with_capacity(tool_calls.len());
        for call in tool_calls {
            let output = match self.registry.invoke(&call.name, &call.arguments).await {
                Ok(output) => output,
                Err(e) => {
                    warn!(tool = %call.name, call_id = %call.id, error = %e, "Tool call rejected");
                    e.to_string()
                }
            };
            outputs.push(ToolOutput {
                tool_call_id: call.id.clone(),
                output,
            });
        }
        outputs
    }

    fn ensure_completed(&self) -> Result<(), SessionError> {
        match &self.last_run {
            None => Err(SessionError::NoRun),
            Some(run) if run.status != RunStatus::Completed => {
                Err(SessionError::RunNotCompleted { status: run.status })
            }
            Some(_) => Ok(()),
        }
    }

    /// The last `n` messages in chronological order, all of them when `n` is 0
    pub async fn get_results(&self, n: usize) -> Result<Vec<String>, SessionError> {
        self.ensure_completed()?;

        let messages = self.client.list_messages(&self.thread_id).await?;
        let skip = if n == 0 {
            0
        } else {
            messages.len().saturating_sub(n)
        };
        Ok(messages.iter().skip(skip).map(|m| m.render()).collect())
    }

    /// Messages added since the previous call
    pub async fn get_new_results_since_last_read(&mut self) -> Result<Vec<String>, SessionError> {
        self.ensure_completed()?;

        let messages = self.client.list_messages(&self.thread_id).await?;
        let start = self.read_cursor.min(messages.len());
        self.read_cursor = messages.len();
        Ok(messages[start..].iter().map(|m| m.render()).collect())
    }
}

impl std::fmt::Debug for AgentSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentSession")
            .field("client", &self.client.name())
            .field("assistant_id", &self.assistant_id)
            .field("thread_id", &self.thread_id)
            .field("last_run", &self.last_run)
            .finish()
    }
}
