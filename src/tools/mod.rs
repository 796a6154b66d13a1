//! Inspection tools offered to the assistant.

mod assessment;
mod cache;
mod context;
mod definitions;
mod error;
mod notes;
mod query;
mod registry;
mod request;
mod rpm;
mod spec_file;
mod srpm;
mod text;

pub use assessment::{Findings, IssueRecord, Severity};
pub use cache::ManifestCache;
pub use context::ToolContext;
pub use definitions::{ParameterSpec, ParameterType, ToolDescriptor, ToolKind};
pub use error::{RegistryError, ToolError};
pub use notes::{ApiFeedback, FlaggedFile, ReviewNotes};
pub use query::{PackageQuery, RpmCommand, MANIFEST_QUERY_FORMAT, NO_FILES_MARKER};
pub use registry::ToolRegistry;
pub use request::{
    ApiFeedbackArgs, DeclareIssueArgs, MarkFileArgs, RpmFileArgs, RpmFileListArgs,
    RpmReadFileArgs, SpecContentsArgs, SrpmExploreArgs, SrpmReadFileArgs, ToolRequest,
};
pub use rpm::{normalize_path, EntryKind, PackageManifest, RpmInspector};
pub use spec_file::SpecReader;
pub use srpm::{contain_path, reject_traversal, sanitize_path, BuildTrees};
