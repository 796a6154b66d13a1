use crate::tools::{ApiFeedback, IssueRecord};
use chrono::{DateTime, Local};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

/// Default report location
pub const DEFAULT_REPORT_FILE: &str = "summary.txt";

/// Rendered conversation of one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    pub label: String,
    pub messages: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageReport {
    pub package: PathBuf,
    pub findings: Vec<IssueRecord>,
    pub transcripts: Vec<Transcript>,
}

impl PackageReport {
    pub fn file_name(&self) -> String {
        self.package
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.package.display().to_string())
    }

    pub fn has_issue(&self) -> bool {
        self.findings.iter().any(|f| f.has_issue)
    }
}

#[derive(Debug, Clone)]
pub struct ReviewReport {
    pub generated_at: DateTime<Local>,
    pub packages: Vec<PackageReport>,
    pub feedback: Vec<ApiFeedback>,
    /// Why the review stopped before every package was reviewed
    pub interrupted: Option<String>,
}

impl ReviewReport {
    pub fn new(packages: Vec<PackageReport>, feedback: Vec<ApiFeedback>) -> Self {
        Self {
            generated_at: Local::now(),
            packages,
            feedback,
            interrupted: None,
        }
    }

    pub fn with_interruption(mut self, reason: impl Into<String>) -> Self {
        self.interrupted = Some(reason.into());
        self
    }

    pub fn packages_with_issues(&self) -> usize {
        self.packages.iter().filter(|p| p.has_issue()).count()
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "License review by {} {} on {}",
            crate::NAME,
            crate::VERSION,
            self.generated_at.format("%Y-%m-%d %H:%M:%S %z")
        );
        let _ = writeln!(
            out,
            "{} package(s) reviewed, {} with license issues",
            self.packages.len(),
            self.packages_with_issues()
        );
        if let Some(reason) = &self.interrupted {
            let _ = writeln!(out, "Review incomplete: {}", reason);
        }

        for package in &self.packages {
            let _ = writeln!(out);
            let _ = writeln!(out, "=== {} ===", package.file_name());
            if package.findings.is_empty() {
                let _ = writeln!(out, "No assessment recorded");
            }
            for finding in &package.findings {
                let _ = writeln!(out, "{}", finding.summary_line());
            }

            for transcript in &package.transcripts {
                let _ = writeln!(out);
                let _ = writeln!(out, "--- {} transcript ---", transcript.label);
                for message in &transcript.messages {
                    let _ = writeln!(out, "{}", message);
                }
            }
        }

        if !self.feedback.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "=== API feedback ===");
            for entry in &self.feedback {
                let _ = writeln!(out, "{}: {}", entry.api, entry.feedback);
            }
        }

        out
    }

    pub fn write_to(&self, path: &Path) -> std::io::Result<()> {
        fs::write(path, self.render())
    }
}
