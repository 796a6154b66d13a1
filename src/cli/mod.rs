pub mod commands;
pub mod handlers;

pub use commands::CliArgs;
pub use handlers::{build_context, handle_review, run_review};
