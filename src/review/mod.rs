//! License review of a set of packages and its report.

mod orchestrator;
pub mod prompts;
mod report;

pub use orchestrator::{
    ReviewError, ReviewInputs, ReviewOptions, Reviewer, FLAGGED_BATCH_SIZE,
};
pub use report::{PackageReport, ReviewReport, Transcript, DEFAULT_REPORT_FILE};
