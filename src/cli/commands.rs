use clap::Parser;
use std::path::PathBuf;

/// LLM-driven license review of RPM packages
#[derive(Parser, Debug)]
#[command(
    name = "license-assistant",
    about = "LLM-driven license review of RPM packages",
    version,
    author,
    long_about = "license-assistant asks an assistant model to inspect binary RPM packages, \
                  their source RPM and spec file, and to judge whether each package ships \
                  complete and correct license files. Findings and full transcripts are \
                  written to a summary report.\n\n\
                  Examples:\n  \
                  license-assistant tool-1.0-1.x86_64.rpm tool-1.0-1.src.rpm tool.spec\n  \
                  license-assistant *.rpm tool.spec --deepscan --build-dir ~/rpmbuild/BUILD\n  \
                  license-assistant tool-1.0-1.x86_64.rpm --output review.txt"
)]
pub struct CliArgs {
    #[arg(
        value_name = "FILES",
        required = true,
        num_args = 1..,
        help = "Packages to review plus their .src.rpm and .spec files"
    )]
    pub files: Vec<PathBuf>,

    #[arg(
        long,
        help = "Scan the exploded source tree first and hand flagged files to the reviewer"
    )]
    pub deepscan: bool,

    #[arg(
        short = 'o',
        long,
        value_name = "FILE",
        default_value = "summary.txt",
        help = "Where to write the report"
    )]
    pub output: PathBuf,

    #[arg(
        long,
        value_name = "DIR",
        help = "Prepared BUILD directory of the source package (rpmbuild -bp)"
    )]
    pub build_dir: Option<PathBuf>,

    #[arg(long, help = "Ask the assistant for feedback on the tools after each package")]
    pub api_feedback: bool,

    #[arg(long, help = "Allow spec files to be read more than once without forcing")]
    pub allow_spec_rereads: bool,

    #[arg(
        long,
        value_name = "SECONDS",
        help = "Cancel a run that makes no progress for this long (overrides LICENSE_ASSISTANT_RUN_TIMEOUT)"
    )]
    pub run_timeout: Option<u64>,

    #[arg(long, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, help = "Verbose output (debug logging)")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_args_verify() {
        CliArgs::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let args = CliArgs::parse_from(["license-assistant", "tool.rpm"]);

        assert_eq!(args.files, vec![PathBuf::from("tool.rpm")]);
        assert!(!args.deepscan);
        assert_eq!(args.output, PathBuf::from("summary.txt"));
        assert!(args.build_dir.is_none());
        assert!(!args.api_feedback);
        assert!(!args.allow_spec_rereads);
        assert!(args.run_timeout.is_none());
    }

    #[test]
    fn test_all_options() {
        let args = CliArgs::parse_from([
            "license-assistant",
            "tool.rpm",
            "tool.src.rpm",
            "tool.spec",
            "--deepscan",
            "--output",
            "out.txt",
            "--build-dir",
            "/tmp/BUILD",
            "--api-feedback",
            "--allow-spec-rereads",
            "--run-timeout",
            "300",
        ]);

        assert_eq!(args.files.len(), 3);
        assert!(args.deepscan);
        assert_eq!(args.output, PathBuf::from("out.txt"));
        assert_eq!(args.build_dir, Some(PathBuf::from("/tmp/BUILD")));
        assert!(args.api_feedback);
        assert!(args.allow_spec_rereads);
        assert_eq!(args.run_timeout, Some(300));
    }

    #[test]
    fn test_files_required() {
        let result = CliArgs::try_parse_from(["license-assistant"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_verbose_and_quiet_conflict() {
        assert!(CliArgs::try_parse_from(["license-assistant", "a.rpm", "-v", "-q"]).is_err());
    }

    #[test]
    fn test_log_level_flag() {
        let args = CliArgs::parse_from(["license-assistant", "--log-level", "debug", "a.rpm"]);
        assert_eq!(args.log_level, Some("debug".to_string()));
    }
}
