//! The closed set of inspection tools and their advertised schemas.

use serde_json::{json, Map, Value};
use std::fmt;

/// Every tool the assistant can be offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    RpmFileList,
    RpmName,
    RpmDependencyInfo,
    RpmReadFile,
    SpecContents,
    SrpmExploreFiles,
    SrpmReadFile,
    DeclareLicenseIssue,
    MarkFileForInspection,
    ApiFeedback,
}

impl ToolKind {
    pub const ALL: [ToolKind; 10] = [
        ToolKind::RpmFileList,
        ToolKind::RpmName,
        ToolKind::RpmDependencyInfo,
        ToolKind::RpmReadFile,
        ToolKind::SpecContents,
        ToolKind::SrpmExploreFiles,
        ToolKind::SrpmReadFile,
        ToolKind::DeclareLicenseIssue,
        ToolKind::MarkFileForInspection,
        ToolKind::ApiFeedback,
    ];

    /// Tools for reviewing a binary package against its spec file
    pub const PACKAGE_REVIEW: [ToolKind; 6] = [
        ToolKind::RpmFileList,
        ToolKind::RpmName,
        ToolKind::RpmDependencyInfo,
        ToolKind::RpmReadFile,
        ToolKind::SpecContents,
        ToolKind::DeclareLicenseIssue,
    ];

    /// Tools for walking an exploded source tree in deep-scan mode
    pub const SOURCE_SCAN: [ToolKind; 4] = [
        ToolKind::SpecContents,
        ToolKind::SrpmExploreFiles,
        ToolKind::SrpmReadFile,
        ToolKind::MarkFileForInspection,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::RpmFileList => "rpm_file_list",
            ToolKind::RpmName => "rpm_name",
            ToolKind::RpmDependencyInfo => "rpm_dependency_info",
            ToolKind::RpmReadFile => "rpm_read_file",
            ToolKind::SpecContents => "spec_contents",
            ToolKind::SrpmExploreFiles => "srpm_explore_files",
            ToolKind::SrpmReadFile => "srpm_read_file",
            ToolKind::DeclareLicenseIssue => "declare_license_issue",
            ToolKind::MarkFileForInspection => "mark_file_for_inspection",
            ToolKind::ApiFeedback => "api_feedback",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.name() == name)
    }

    pub fn description(&self) -> &'static str {
        match self {
            ToolKind::RpmFileList => {
                "Lists the files packaged in an RPM. Each entry is tagged as 'dir:', \
                 'license:', 'doc:' or 'file:'. Results are limited to search_dir and \
                 entries deeper than max_depth are shortened and end with '/...'. \
                 A max_depth of 0 means no limit."
            }
            ToolKind::RpmName => "Returns the package name of an RPM file.",
            ToolKind::RpmDependencyInfo => {
                "Returns the capabilities an RPM provides ('provides:') and the \
                 capabilities it depends on ('requires:')."
            }
            ToolKind::RpmReadFile => {
                "Extracts a file from an RPM and returns its first max_lines lines. \
                 Only text files can be read."
            }
            ToolKind::SpecContents => {
                "Returns the full contents of a .spec file. Each spec file can only be \
                 read once unless force is set to true."
            }
            ToolKind::SrpmExploreFiles => {
                "Lists files and directories in the unpacked and prepared build tree of a \
                 source RPM. Paths are relative to the build directory and may not \
                 contain '..'."
            }
            ToolKind::SrpmReadFile => {
                "Reads the first max_lines lines of a file from the unpacked build tree \
                 of a source RPM. Paths are relative to the build directory and may not \
                 contain '..'."
            }
            ToolKind::DeclareLicenseIssue => {
                "Records the final license assessment of a package. When has_issue is \
                 true, severity must be low, medium or high and a description is \
                 required. When has_issue is false, severity must be none and no \
                 description may be given."
            }
            ToolKind::MarkFileForInspection => {
                "Flags a file from the source tree so that it is examined for license \
                 information in a later step."
            }
            ToolKind::ApiFeedback => {
                "Gives feedback about how useful one of the provided tools was and how it \
                 could be improved."
            }
        }
    }

    pub fn parameters(&self) -> Vec<ParameterSpec> {
        use ParameterSpec as P;

        match self {
            ToolKind::RpmFileList => vec![
                P::string("rpm_file", "Path to the .rpm file"),
                P::string("search_dir", "Directory inside the package to list, defaults to '/'")
                    .optional(),
                P::integer("max_depth", "Maximum depth below search_dir, 0 for unlimited")
                    .optional(),
            ],
            ToolKind::RpmName | ToolKind::RpmDependencyInfo => {
                vec![P::string("rpm_file", "Path to the .rpm file")]
            }
            ToolKind::RpmReadFile => vec![
                P::string("rpm_file", "Path to the .rpm file"),
                P::string("file_path", "Absolute path of the file inside the package"),
                P::integer("max_lines", "Maximum number of lines to return, defaults to 10")
                    .optional(),
            ],
            ToolKind::SpecContents => vec![
                P::string("spec_file", "Path to the .spec file"),
                P::boolean("force", "Read the file again even if it was read before").optional(),
            ],
            ToolKind::SrpmExploreFiles => vec![
                P::string("srpm_file", "Path to the .src.rpm file"),
                P::string("search_dir", "Directory relative to the build directory, defaults to '.'")
                    .optional(),
                P::integer("max_depth", "Maximum depth below search_dir, 0 for unlimited, defaults to 2")
                    .optional(),
            ],
            ToolKind::SrpmReadFile => vec![
                P::string("srpm_file", "Path to the .src.rpm file"),
                P::string("file_path", "Path of the file relative to the build directory"),
                P::integer("max_lines", "Maximum number of lines to return, defaults to 10")
                    .optional(),
            ],
            ToolKind::DeclareLicenseIssue => vec![
                P::string("file", "The package file that was assessed"),
                P::boolean("has_issue", "Whether a license issue was found"),
                P::string("severity", "Severity of the issue")
                    .one_of(&["none", "low", "medium", "high"]),
                P::string("description", "Description of the issue, only when has_issue is true")
                    .optional(),
            ],
            ToolKind::MarkFileForInspection => vec![
                P::string("file", "Path of the file relative to the build directory"),
                P::string("reason", "Why the file should be inspected").optional(),
            ],
            ToolKind::ApiFeedback => vec![
                P::string("api", "Name of the tool the feedback is about"),
                P::string("feedback", "The feedback"),
            ],
        }
    }

    pub fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(self.name(), self.description(), self.parameters())
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterType {
    String,
    Integer,
    Boolean,
}

impl ParameterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterType::String => "string",
            ParameterType::Integer => "integer",
            ParameterType::Boolean => "boolean",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterSpec {
    pub name: &'static str,
    pub kind: ParameterType,
    pub required: bool,
    pub description: &'static str,
    pub allowed: Option<&'static [&'static str]>,
}

impl ParameterSpec {
    fn new(name: &'static str, kind: ParameterType, description: &'static str) -> Self {
        Self {
            name,
            kind,
            required: true,
            description,
            allowed: None,
        }
    }

    pub fn string(name: &'static str, description: &'static str) -> Self {
        Self::new(name, ParameterType::String, description)
    }

    pub fn integer(name: &'static str, description: &'static str) -> Self {
        Self::new(name, ParameterType::Integer, description)
    }

    pub fn boolean(name: &'static str, description: &'static str) -> Self {
        Self::new(name, ParameterType::Boolean, description)
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn one_of(mut self, allowed: &'static [&'static str]) -> Self {
        self.allowed = Some(allowed);
        self
    }

    fn to_json(&self) -> Value {
        let mut property = json!({
            "type": self.kind.as_str(),
            "description": self.description,
        });
        if let Some(allowed) = self.allowed {
            property["enum"] = json!(allowed);
        }
        property
    }
}

/// Immutable name, description and parameter schema of one tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ParameterSpec>,
}

impl ToolDescriptor {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Vec<ParameterSpec>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }

    /// JSON schema of the parameters; an empty object when there are none
    pub fn parameters_schema(&self) -> Value {
        if self.parameters.is_empty() {
            return json!({});
        }

        let properties: Map<String, Value> = self
            .parameters
            .iter()
            .map(|p| (p.name.to_string(), p.to_json()))
            .collect();
        let required: Vec<&str> = self
            .parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name)
            .collect();

        let mut schema = json!({
            "type": "object",
            "properties": properties,
        });
        if !required.is_empty() {
            schema["required"] = json!(required);
        }
        schema
    }

    /// Function-tool advertisement sent when creating an assistant
    pub fn to_json(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters_schema(),
            }
        })
    }
}
