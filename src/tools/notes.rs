//! Files flagged for a second look, and feedback about the tools themselves.

use super::error::ToolError;
use std::mem;
use std::sync::{Mutex, PoisonError};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlaggedFile {
    pub file: String,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiFeedback {
    pub api: String,
    pub feedback: String,
}

#[derive(Debug, Default)]
pub struct ReviewNotes {
    flagged: Mutex<Vec<FlaggedFile>>,
    feedback: Mutex<Vec<ApiFeedback>>,
}

impl ReviewNotes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_file(&self, file: &str, reason: Option<String>) -> Result<String, ToolError> {
        let file = file.trim();
        if file.is_empty() {
            return Err(ToolError::InvalidArgument(
                "'file' must not be empty".to_string(),
            ));
        }

        let mut flagged = self.flagged.lock().unwrap_or_else(PoisonError::into_inner);
        if flagged.iter().any(|f| f.file == file) {
            return Ok(format!("{} is already marked for inspection.", file));
        }

        info!(file, reason = reason.as_deref().unwrap_or(""), "Marked file for inspection");
        flagged.push(FlaggedFile {
            file: file.to_string(),
            reason,
        });
        Ok(format!(
            "Marked {} for further inspection ({} pending).",
            file,
            flagged.len()
        ))
    }

    pub fn pending(&self) -> usize {
        self.flagged
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Removes and returns every flagged file
    pub fn take_flagged(&self) -> Vec<FlaggedFile> {
        mem::take(&mut *self.flagged.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn record_feedback(&self, api: &str, feedback: &str) -> String {
        info!(api, feedback, "API feedback");
        self.feedback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(ApiFeedback {
                api: api.to_string(),
                feedback: feedback.to_string(),
            });
        format!("Feedback for {} received, thank you.", api)
    }

    pub fn feedback(&self) -> Vec<ApiFeedback> {
        self.feedback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
