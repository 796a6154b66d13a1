use license_assistant::cli::{handle_review, CliArgs};
use license_assistant::util::{init_logging, LoggingConfig};
use license_assistant::VERSION;

use clap::Parser;
use tracing::debug;

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    init_logging(LoggingConfig::from_flags(
        args.log_level.as_deref(),
        args.verbose,
        args.quiet,
    ));

    debug!("license-assistant v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    let exit_code = handle_review(&args).await;

    std::process::exit(exit_code);
}
