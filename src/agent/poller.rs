use super::error::SessionError;
use crate::llm::{AssistantClient, Run};
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

/// Timing of the run polling loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollPolicy {
    /// Pause before the first status check of a fresh or resumed run
    pub initial_delay: Duration,
    /// Pause between status checks
    pub interval: Duration,
    /// How often a still-running run is reported
    pub progress_every: Duration,
    /// Budget for one stretch of waiting; the run is cancelled when exceeded
    pub stall_timeout: Duration,
    /// Added to the delay the service asks for after a rate limit
    pub rate_limit_margin: Duration,
    /// Fresh runs issued after rate limits within one `run_agent` call
    pub max_rate_limit_retries: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            interval: Duration::from_secs(2),
            progress_every: Duration::from_secs(10),
            stall_timeout: Duration::from_secs(120),
            rate_limit_margin: Duration::from_secs(5),
            max_rate_limit_retries: 3,
        }
    }
}

impl PollPolicy {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_stall_timeout(mut self, timeout: Duration) -> Self {
        self.stall_timeout = timeout;
        self
    }

    pub fn with_max_rate_limit_retries(mut self, retries: u32) -> Self {
        self.max_rate_limit_retries = retries;
        self
    }
}

/// Waits for a run to leave the open states.
pub struct RunPoller<'a> {
    client: &'a dyn AssistantClient,
    policy: &'a PollPolicy,
}

impl<'a> RunPoller<'a> {
    pub fn new(client: &'a dyn AssistantClient, policy: &'a PollPolicy) -> Self {
        Self { client, policy }
    }

    /// Polls `run` until it requires action or reaches a terminal status.
    ///
    /// A run that stays open past the stall timeout is cancelled and reported
    /// as [`SessionError::RunTimedOut`].
    pub async fn await_transition(&self, run: Run) -> Result<Run, SessionError> {
        let started = Instant::now();
        let mut last_report = started;

        sleep(self.policy.initial_delay).await;
        let mut current = self.client.retrieve_run(&run.thread_id, &run.id).await?;

        while current.status.is_open() {
            let waited = started.elapsed();
            if waited >= self.policy.stall_timeout {
                warn!(
                    run_id = %current.id,
                    status = %current.status,
                    waited_secs = waited.as_secs(),
                    "Run stalled, cancelling"
                );
                if let Err(e) = self.client.cancel_run(&current.thread_id, &current.id).await {
                    warn!(run_id = %current.id, error = %e, "Failed to cancel stalled run");
                }
                return Err(SessionError::RunTimedOut {
                    run_id: current.id,
                    status: current.status,
                    waited,
                });
            }

            if last_report.elapsed() >= self.policy.progress_every {
                info!(
                    run_id = %current.id,
                    status = %current.status,
                    waited_secs = waited.as_secs(),
                    "Waiting for run"
                );
                last_report = Instant::now();
            }

            sleep(self.policy.interval).await;
            current = self.client.retrieve_run(&current.thread_id, &current.id).await?;
        }

        debug!(
            run_id = %current.id,
            status = %current.status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Run left open state"
        );
        Ok(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{MockAssistantClient, MockRun, RunStatus};

    fn queued() -> Run {
        Run::new("run_1", "thread_1", RunStatus::Queued)
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_until_terminal() {
        let client = MockAssistantClient::new();
        client.add_runs(vec![
            MockRun::in_progress(),
            MockRun::in_progress(),
            MockRun::completed(),
        ]);
        let policy = PollPolicy::default();

        let started = Instant::now();
        let run = RunPoller::new(&client, &policy)
            .await_transition(queued())
            .await
            .unwrap();

        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(client.retrieve_count(), 3);
        // 1s initial delay plus two 2s intervals
        assert_eq!(started.elapsed(), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_requires_action_ends_wait() {
        let client = MockAssistantClient::new();
        client.add_runs(vec![MockRun::in_progress(), MockRun::requires_action("x")]);
        let policy = PollPolicy::default();

        let run = RunPoller::new(&client, &policy)
            .await_transition(queued())
            .await
            .unwrap();
        assert_eq!(run.status, RunStatus::RequiresAction);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stall_cancels_run() {
        let client = MockAssistantClient::new();
        client.add_runs((0..20).map(|_| MockRun::in_progress()));
        let policy = PollPolicy::default().with_stall_timeout(Duration::from_secs(10));

        let err = RunPoller::new(&client, &policy)
            .await_transition(queued())
            .await
            .unwrap_err();

        assert!(matches!(err, SessionError::RunTimedOut { .. }));
        assert_eq!(client.cancelled_runs(), vec!["run_1".to_string()]);
        assert!(client.remaining_runs() > 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_error_propagates() {
        let client = MockAssistantClient::new();
        let policy = PollPolicy::default();

        let err = RunPoller::new(&client, &policy)
            .await_transition(queued())
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Backend(_)));
    }
}
