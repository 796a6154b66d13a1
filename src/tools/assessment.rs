//! License assessments recorded by the assistant.

use super::error::ToolError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Mutex, PoisonError};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    None,
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::None => "none",
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(Severity::None),
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            other => Err(ToolError::InvalidAssessment(format!(
                "unknown severity '{}', expected one of none, low, medium, high",
                other
            ))),
        }
    }
}

/// One structured finding about a package
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueRecord {
    pub file: String,
    pub has_issue: bool,
    pub severity: Severity,
    pub description: Option<String>,
}

impl IssueRecord {
    /// Checks the field combination and builds a record.
    ///
    /// An issue needs a severity other than none and a description; a clean
    /// result needs severity none and no description.
    pub fn validate(
        file: &str,
        has_issue: bool,
        severity: &str,
        description: Option<String>,
    ) -> Result<Self, ToolError> {
        if file.trim().is_empty() {
            return Err(ToolError::InvalidAssessment(
                "'file' must name the assessed package".to_string(),
            ));
        }

        let severity: Severity = severity.parse()?;
        let description = description.filter(|d| !d.trim().is_empty());

        if has_issue {
            if severity == Severity::None {
                return Err(ToolError::InvalidAssessment(
                    "when has_issue is true, severity must be low, medium or high".to_string(),
                ));
            }
            if description.is_none() {
                return Err(ToolError::InvalidAssessment(
                    "when has_issue is true, a description of the issue is required".to_string(),
                ));
            }
        } else {
            if severity != Severity::None {
                return Err(ToolError::InvalidAssessment(
                    "when has_issue is false, severity must be none".to_string(),
                ));
            }
            if description.is_some() {
                return Err(ToolError::InvalidAssessment(
                    "when has_issue is false, description must be omitted".to_string(),
                ));
            }
        }

        Ok(Self {
            file: file.to_string(),
            has_issue,
            severity,
            description,
        })
    }

    pub fn file_name(&self) -> &str {
        Path::new(&self.file)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&self.file)
    }

    /// `<basename>: [<severity>] <description>`
    pub fn summary_line(&self) -> String {
        format!(
            "{}: [{}] {}",
            self.file_name(),
            self.severity,
            self.description.as_deref().unwrap_or("no issues found")
        )
    }
}

/// Append-only list of recorded assessments
#[derive(Debug, Default)]
pub struct Findings {
    records: Mutex<Vec<IssueRecord>>,
}

impl Findings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, record: IssueRecord) -> usize {
        info!(
            file = %record.file,
            has_issue = record.has_issue,
            severity = %record.severity,
            "Recorded license assessment"
        );
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        records.push(record);
        records.len()
    }

    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn snapshot(&self) -> Vec<IssueRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Records appended at or after `offset`
    pub fn since(&self, offset: usize) -> Vec<IssueRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .skip(offset)
            .cloned()
            .collect()
    }
}
