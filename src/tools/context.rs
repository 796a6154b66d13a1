use super::assessment::{Findings, IssueRecord};
use super::error::ToolError;
use super::notes::ReviewNotes;
use super::query::{PackageQuery, RpmCommand};
use super::request::ToolRequest;
use super::rpm::RpmInspector;
use super::spec_file::SpecReader;
use super::srpm::BuildTrees;
use std::path::PathBuf;
use std::sync::Arc;

/// State shared by all tool handlers of one review.
///
/// Owned by the review driver and handed to every registry it builds, so
/// findings and caches live exactly as long as the review.
pub struct ToolContext {
    rpm: RpmInspector,
    trees: BuildTrees,
    specs: SpecReader,
    findings: Findings,
    notes: ReviewNotes,
}

impl ToolContext {
    pub fn new(query: Arc<dyn PackageQuery>) -> Self {
        Self {
            rpm: RpmInspector::new(query),
            trees: BuildTrees::new(),
            specs: SpecReader::default(),
            findings: Findings::new(),
            notes: ReviewNotes::new(),
        }
    }

    /// Context backed by the system `rpm` tools
    pub fn with_rpm_tools() -> Self {
        Self::new(Arc::new(RpmCommand::new()))
    }

    pub fn with_build_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.trees = BuildTrees::with_default_root(root);
        self
    }

    pub fn with_spec_rereads(mut self, allow: bool) -> Self {
        self.specs = SpecReader::new(!allow);
        self
    }

    pub fn rpm(&self) -> &RpmInspector {
        &self.rpm
    }

    pub fn build_trees(&self) -> &BuildTrees {
        &self.trees
    }

    pub fn findings(&self) -> &Findings {
        &self.findings
    }

    pub fn notes(&self) -> &ReviewNotes {
        &self.notes
    }

    /// Runs one decoded tool call and renders its output
    pub async fn execute(&self, request: ToolRequest) -> Result<String, ToolError> {
        match request {
            ToolRequest::RpmFileList(args) => {
                let entries = self
                    .rpm
                    .list_contents(&args.rpm_file, &args.search_dir, args.max_depth)
                    .await?;
                Ok(render_list(entries, &args.search_dir))
            }
            ToolRequest::RpmName(args) => self.rpm.package_name(&args.rpm_file).await,
            ToolRequest::RpmDependencyInfo(args) => {
                let entries = self.rpm.dependency_info(&args.rpm_file).await?;
                Ok(entries.join("\n"))
            }
            ToolRequest::RpmReadFile(args) => {
                self.rpm
                    .read_file(&args.rpm_file, &args.file_path, args.max_lines)
                    .await
            }
            ToolRequest::SpecContents(args) => self.specs.read(&args.spec_file, args.force),
            ToolRequest::SrpmExploreFiles(args) => {
                let entries =
                    self.trees
                        .explore(&args.srpm_file, &args.search_dir, args.max_depth)?;
                Ok(render_list(entries, &args.search_dir))
            }
            ToolRequest::SrpmReadFile(args) => {
                self.trees
                    .read_file(&args.srpm_file, &args.file_path, args.max_lines)
            }
            ToolRequest::DeclareLicenseIssue(args) => {
                let record = IssueRecord::validate(
                    &args.file,
                    args.has_issue,
                    &args.severity,
                    args.description,
                )?;
                let message = format!("Assessment recorded for {}.", record.file);
                self.findings.record(record);
                Ok(message)
            }
            ToolRequest::MarkFileForInspection(args) => {
                self.notes.mark_file(&args.file, args.reason)
            }
            ToolRequest::ApiFeedback(args) => {
                Ok(self.notes.record_feedback(&args.api, &args.feedback))
            }
        }
    }
}

fn render_list(entries: Vec<String>, search_dir: &str) -> String {
    if entries.is_empty() {
        format!("No files found under {}", search_dir)
    } else {
        entries.join("\n")
    }
}
