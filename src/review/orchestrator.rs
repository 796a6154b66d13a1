use super::prompts;
use super::report::{PackageReport, ReviewReport, Transcript};
use crate::agent::{AgentSession, PollPolicy, SessionError};
use crate::llm::AssistantClient;
use crate::tools::{FlaggedFile, RegistryError, ToolContext, ToolKind, ToolRegistry};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Flagged files handed to the analysis session per prompt
pub const FLAGGED_BATCH_SIZE: usize = 10;

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Failed to set up tools: {0}")]
    Registry(#[from] RegistryError),

    /// A package review failed; `partial` holds everything recorded before it
    #[error("Review of {} stopped: {source}", .package.display())]
    Interrupted {
        package: PathBuf,
        partial: Box<ReviewReport>,
        source: Box<ReviewError>,
    },
}

/// Input files split by role
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewInputs {
    /// Every file given, in order
    pub all: Vec<PathBuf>,
    /// Binary packages to review
    pub packages: Vec<PathBuf>,
    /// Source packages, used for deep scans
    pub source_packages: Vec<PathBuf>,
}

impl ReviewInputs {
    pub fn classify(files: &[PathBuf]) -> Self {
        let mut inputs = Self {
            all: files.to_vec(),
            ..Self::default()
        };

        for file in files {
            let name = file.to_string_lossy();
            if name.ends_with(".src.rpm") {
                inputs.source_packages.push(file.clone());
            } else if name.ends_with(".rpm") {
                inputs.packages.push(file.clone());
            }
        }
        inputs
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReviewOptions {
    pub deep_scan: bool,
    pub api_feedback: bool,
    pub policy: PollPolicy,
}

/// Drives the fixed prompt sequence for each package, one session at a time.
pub struct Reviewer {
    client: Arc<dyn AssistantClient>,
    context: Arc<ToolContext>,
    options: ReviewOptions,
}

impl Reviewer {
    pub fn new(
        client: Arc<dyn AssistantClient>,
        context: Arc<ToolContext>,
        options: ReviewOptions,
    ) -> Self {
        Self {
            client,
            context,
            options,
        }
    }

    pub fn context(&self) -> &Arc<ToolContext> {
        &self.context
    }

    pub async fn review(&self, inputs: &ReviewInputs) -> Result<ReviewReport, ReviewError> {
        if inputs.packages.is_empty() {
            warn!("No binary .rpm packages among the inputs, nothing to review");
        }

        let mut packages = Vec::with_capacity(inputs.packages.len());
        for (index, package) in inputs.packages.iter().enumerate() {
            info!(
                package = %package.display(),
                index = index + 1,
                total = inputs.packages.len(),
                "Reviewing package"
            );
            let offset = self.context.findings().len();
            match self.review_package(package, inputs).await {
                Ok(report) => packages.push(report),
                Err(source) => {
                    packages.push(PackageReport {
                        package: package.to_path_buf(),
                        findings: self.context.findings().since(offset),
                        transcripts: Vec::new(),
                    });
                    let partial = ReviewReport::new(packages, self.context.notes().feedback())
                        .with_interruption(format!("{}: {}", package.display(), source));
                    return Err(ReviewError::Interrupted {
                        package: package.to_path_buf(),
                        partial: Box::new(partial),
                        source: Box::new(source),
                    });
                }
            }
        }

        Ok(ReviewReport::new(packages, self.context.notes().feedback()))
    }

    async fn review_package(
        &self,
        package: &Path,
        inputs: &ReviewInputs,
    ) -> Result<PackageReport, ReviewError> {
        let offset = self.context.findings().len();
        let mut transcripts = Vec::new();

        let flagged = if self.options.deep_scan {
            let (flagged, transcript) = self.scan_sources(package, inputs).await?;
            transcripts.push(transcript);
            flagged
        } else {
            Vec::new()
        };

        let mut kinds = ToolKind::PACKAGE_REVIEW.to_vec();
        if self.options.deep_scan {
            kinds.push(ToolKind::SrpmReadFile);
        }
        if self.options.api_feedback {
            kinds.push(ToolKind::ApiFeedback);
        }
        let registry = ToolRegistry::with_tools(Arc::clone(&self.context), &kinds)?;

        let mut session = AgentSession::start(
            Arc::clone(&self.client),
            prompts::ASSISTANT_NAME,
            &prompts::instructions(),
            registry,
            self.options.policy.clone(),
        )
        .await?;

        session
            .add_prompt(&prompts::inventory(package, &inputs.all))
            .await?;
        session.run_agent(None).await?;

        let source = inputs.source_packages.first().map(PathBuf::as_path);
        for batch in flagged.chunks(FLAGGED_BATCH_SIZE) {
            session
                .add_prompt(&prompts::flagged_batch(batch, source))
                .await?;
            session.run_agent(None).await?;
        }

        session
            .add_prompt(&prompts::compare(package, &inputs.all))
            .await?;
        session.run_agent(None).await?;

        session.add_prompt(&prompts::declare(package)).await?;
        session
            .run_agent(Some(ToolKind::DeclareLicenseIssue.name()))
            .await?;

        if self.options.api_feedback {
            session.add_prompt(&prompts::api_feedback()).await?;
            session.run_agent(Some(ToolKind::ApiFeedback.name())).await?;
        }

        transcripts.push(Transcript {
            label: "analysis".to_string(),
            messages: session.get_results(0).await?,
        });

        let findings = self.context.findings().since(offset);
        if findings.is_empty() {
            warn!(package = %package.display(), "No assessment was recorded");
        }

        Ok(PackageReport {
            package: package.to_path_buf(),
            findings,
            transcripts,
        })
    }

    /// Runs the scanning session and collects the files it flagged
    async fn scan_sources(
        &self,
        package: &Path,
        inputs: &ReviewInputs,
    ) -> Result<(Vec<FlaggedFile>, Transcript), ReviewError> {
        let registry = ToolRegistry::with_tools(Arc::clone(&self.context), &ToolKind::SOURCE_SCAN)?;
        let mut scanner = AgentSession::start(
            Arc::clone(&self.client),
            prompts::SCANNER_NAME,
            &prompts::scan_instructions(),
            registry,
            self.options.policy.clone(),
        )
        .await?;

        scanner.add_prompt(&prompts::scan(package, &inputs.all)).await?;
        scanner.run_agent(None).await?;

        let flagged = self.context.notes().take_flagged();
        info!(
            package = %package.display(),
            flagged = flagged.len(),
            "Source scan finished"
        );

        let transcript = Transcript {
            label: "scan".to_string(),
            messages: scanner.get_results(0).await?,
        };
        Ok((flagged, transcript))
    }
}
