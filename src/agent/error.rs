use crate::llm::{BackendError, Run, RunStatus};
use std::time::Duration;
use thiserror::Error;

/// Fatal conditions of an agent session.
///
/// Each variant that concerns a run carries the last snapshot so callers can
/// print the raw state before aborting.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Assistants service error: {0}")]
    Backend(#[from] BackendError),

    #[error("Run {} requires unsupported action type '{kind}'", .run.id)]
    UnsupportedActionType { kind: String, run: Box<Run> },

    #[error("Run {} failed: {}", .run.id, failure_reason(.run))]
    RunFailed { run: Box<Run> },

    #[error("Run {} is still rate limited after {retries} retries: {}", .run.id, failure_reason(.run))]
    RateLimitExceeded { retries: u32, run: Box<Run> },

    #[error("Run {run_id} made no progress for {}s (last status {status}), cancelled", .waited.as_secs())]
    RunTimedOut {
        run_id: String,
        status: RunStatus,
        waited: Duration,
    },

    #[error("Run {} ended with status {}", .run.id, .run.status)]
    RunEnded { run: Box<Run> },

    #[error("Results requested while the last run is {status}, expected completed")]
    RunNotCompleted { status: RunStatus },

    #[error("Results requested before any run was started")]
    NoRun,

    #[error("Forced tool '{0}' is not registered in this session")]
    UnknownForcedTool(String),
}

fn failure_reason(run: &Run) -> String {
    match &run.last_error {
        Some(err) => format!("{} ({})", err.message, err.code),
        None => "no error details reported".to_string(),
    }
}
