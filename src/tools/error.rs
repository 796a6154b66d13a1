use thiserror::Error;

/// Failures of an individual tool handler.
///
/// These never abort a review: the registry renders them into the tool output
/// so the model can read the message and correct its next call.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid arguments for tool '{tool}': {message}")]
    InvalidArguments { tool: String, message: String },

    #[error("File '{0}' does not appear to be a text file, refusing to print.")]
    NotTextFile(String),

    #[error("{command} command failed with return code {code}, error: {stderr}")]
    ExtractionFailed {
        command: String,
        code: i32,
        stderr: String,
    },

    #[error("{command} command failed: {message}")]
    CommandFailed { command: String, message: String },

    #[error("Path '{0}' cannot go outside the build directory, do not use '..' in the path.")]
    PathTraversalRejected(String),

    #[error("Spec file '{0}' has already been read. Set 'force' to true to read it again.")]
    AlreadyRead(String),

    #[error("No exploded build tree is available for '{0}'")]
    NoBuildTree(String),

    #[error("Invalid assessment: {0}")]
    InvalidAssessment(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures of the registry itself
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Tool already registered: {0}")]
    DuplicateTool(String),

    #[error("Function not found: {0}")]
    ToolNotFound(String),
}
