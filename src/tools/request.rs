//! Typed decoding of tool-call argument blobs.

use super::definitions::ToolKind;
use super::error::ToolError;
use serde::de::DeserializeOwned;
use serde::Deserialize;

fn default_search_dir() -> String {
    "/".to_string()
}

fn default_source_dir() -> String {
    ".".to_string()
}

fn default_source_depth() -> i64 {
    2
}

fn default_max_lines() -> i64 {
    10
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RpmFileListArgs {
    pub rpm_file: String,
    #[serde(default = "default_search_dir")]
    pub search_dir: String,
    #[serde(default)]
    pub max_depth: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RpmFileArgs {
    pub rpm_file: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RpmReadFileArgs {
    pub rpm_file: String,
    pub file_path: String,
    #[serde(default = "default_max_lines")]
    pub max_lines: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpecContentsArgs {
    pub spec_file: String,
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SrpmExploreArgs {
    pub srpm_file: String,
    #[serde(default = "default_source_dir")]
    pub search_dir: String,
    #[serde(default = "default_source_depth")]
    pub max_depth: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SrpmReadFileArgs {
    pub srpm_file: String,
    pub file_path: String,
    #[serde(default = "default_max_lines")]
    pub max_lines: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeclareIssueArgs {
    pub file: String,
    pub has_issue: bool,
    pub severity: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MarkFileArgs {
    pub file: String,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiFeedbackArgs {
    pub api: String,
    pub feedback: String,
}

/// A decoded tool call, one variant per [`ToolKind`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolRequest {
    RpmFileList(RpmFileListArgs),
    RpmName(RpmFileArgs),
    RpmDependencyInfo(RpmFileArgs),
    RpmReadFile(RpmReadFileArgs),
    SpecContents(SpecContentsArgs),
    SrpmExploreFiles(SrpmExploreArgs),
    SrpmReadFile(SrpmReadFileArgs),
    DeclareLicenseIssue(DeclareIssueArgs),
    MarkFileForInspection(MarkFileArgs),
    ApiFeedback(ApiFeedbackArgs),
}

impl ToolRequest {
    /// Decodes a JSON argument blob for `kind`. An empty blob means no arguments.
    pub fn decode(kind: ToolKind, blob: &str) -> Result<Self, ToolError> {
        let blob = if blob.trim().is_empty() { "{}" } else { blob };

        let request = match kind {
            ToolKind::RpmFileList => ToolRequest::RpmFileList(parse(kind, blob)?),
            ToolKind::RpmName => ToolRequest::RpmName(parse(kind, blob)?),
            ToolKind::RpmDependencyInfo => ToolRequest::RpmDependencyInfo(parse(kind, blob)?),
            ToolKind::RpmReadFile => ToolRequest::RpmReadFile(parse(kind, blob)?),
            ToolKind::SpecContents => ToolRequest::SpecContents(parse(kind, blob)?),
            ToolKind::SrpmExploreFiles => ToolRequest::SrpmExploreFiles(parse(kind, blob)?),
            ToolKind::SrpmReadFile => ToolRequest::SrpmReadFile(parse(kind, blob)?),
            ToolKind::DeclareLicenseIssue => ToolRequest::DeclareLicenseIssue(parse(kind, blob)?),
            ToolKind::MarkFileForInspection => {
                ToolRequest::MarkFileForInspection(parse(kind, blob)?)
            }
            ToolKind::ApiFeedback => ToolRequest::ApiFeedback(parse(kind, blob)?),
        };
        Ok(request)
    }

    pub fn kind(&self) -> ToolKind {
        match self {
            ToolRequest::RpmFileList(_) => ToolKind::RpmFileList,
            ToolRequest::RpmName(_) => ToolKind::RpmName,
            ToolRequest::RpmDependencyInfo(_) => ToolKind::RpmDependencyInfo,
            ToolRequest::RpmReadFile(_) => ToolKind::RpmReadFile,
            ToolRequest::SpecContents(_) => ToolKind::SpecContents,
            ToolRequest::SrpmExploreFiles(_) => ToolKind::SrpmExploreFiles,
            ToolRequest::SrpmReadFile(_) => ToolKind::SrpmReadFile,
            ToolRequest::DeclareLicenseIssue(_) => ToolKind::DeclareLicenseIssue,
            ToolRequest::MarkFileForInspection(_) => ToolKind::MarkFileForInspection,
            ToolRequest::ApiFeedback(_) => ToolKind::ApiFeedback,
        }
    }
}

fn parse<T: DeserializeOwned>(kind: ToolKind, blob: &str) -> Result<T, ToolError> {
    serde_json::from_str(blob).map_err(|e| ToolError::InvalidArguments {
        tool: kind.name().to_string(),
        message: e.to_string(),
    })
}
