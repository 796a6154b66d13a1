use super::commands::CliArgs;
use crate::agent::PollPolicy;
use crate::config::AssistantConfig;
use crate::llm::AssistantClient;
use crate::review::{ReviewError, ReviewInputs, ReviewOptions, ReviewReport, Reviewer};
use crate::tools::ToolContext;
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Runs a review from the command line and returns the process exit code
pub async fn handle_review(args: &CliArgs) -> i32 {
    let config = match AssistantConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return 1;
        }
    };
    if let Err(e) = config.validate() {
        error!("{}", e);
        return 1;
    }
    debug!("{}", config);

    let client = match config.create_client() {
        Ok(client) => client,
        Err(e) => {
            error!("{}", e);
            return 1;
        }
    };

    let mut policy = config.poll_policy();
    if let Some(secs) = args.run_timeout {
        policy = policy.with_stall_timeout(Duration::from_secs(secs));
    }

    let context = Arc::new(build_context(args));
    match run_review(args, client, context, policy).await {
        Ok(report) => {
            info!(
                report = %args.output.display(),
                packages = report.packages.len(),
                with_issues = report.packages_with_issues(),
                "Review finished"
            );
            0
        }
        Err(e) => {
            error!("Review failed: {:#}", e);
            error!("{:#?}", e);
            1
        }
    }
}

/// Tool context configured from the command line flags
pub fn build_context(args: &CliArgs) -> ToolContext {
    let mut context = ToolContext::with_rpm_tools().with_spec_rereads(args.allow_spec_rereads);
    if let Some(dir) = &args.build_dir {
        context = context.with_build_root(dir.clone());
    }
    context
}

/// Reviews the given files and writes the report to `args.output`
pub async fn run_review(
    args: &CliArgs,
    client: Arc<dyn AssistantClient>,
    context: Arc<ToolContext>,
    policy: PollPolicy,
) -> Result<ReviewReport> {
    for file in args.files.iter().filter(|f| !f.exists()) {
        warn!(file = %file.display(), "Input file does not exist");
    }
    if args.deepscan && args.build_dir.is_none() {
        warn!("--deepscan without --build-dir: the scanner has no build tree to explore");
    }

    let inputs = ReviewInputs::classify(&args.files);
    info!(
        packages = inputs.packages.len(),
        source_packages = inputs.source_packages.len(),
        client = client.name(),
        "Starting license review"
    );

    let reviewer = Reviewer::new(
        client,
        context,
        ReviewOptions {
            deep_scan: args.deepscan,
            api_feedback: args.api_feedback,
            policy,
        },
    );

    let result = reviewer.review(&inputs).await;
    if let Err(ReviewError::Interrupted { package, partial, .. }) = &result {
        warn!(
            package = %package.display(),
            report = %args.output.display(),
            reviewed = partial.packages.len(),
            "Writing partial report"
        );
        partial
            .write_to(&args.output)
            .with_context(|| format!("Failed to write report to {}", args.output.display()))?;
    }
    let report = result.context("License review aborted")?;

    report
        .write_to(&args.output)
        .with_context(|| format!("Failed to write report to {}", args.output.display()))?;

    Ok(report)
}
