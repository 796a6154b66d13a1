//! Structured logging setup for license-assistant
//!
//! Initialization of the `tracing` subscriber. Output goes to stderr so the
//! report on stdout or in a file stays clean.
//!
//! # Features
//!
//! - Console output with pretty formatting (default)
//! - Optional JSON output
//! - Environment-based filtering via `RUST_LOG`
//! - Thread-safe, can only be initialized once
//!
//! # Example
//!
//! ```no_run
//! use license_assistant::util::logging;
//!
//! logging::init_from_env();
//!
//! use tracing::{info, warn};
//! info!("Review started");
//! warn!(tool = "rpm_file_list", "Tool execution failed");
//! ```

use std::env;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Ensures logging is only initialized once
static INIT: Once = Once::new();

pub const LOG_LEVEL_VAR: &str = "LICENSE_ASSISTANT_LOG_LEVEL";
pub const LOG_JSON_VAR: &str = "LICENSE_ASSISTANT_LOG_JSON";

/// Configuration for logging initialization
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Minimum log level to display
    pub level: Level,

    /// Use JSON output format
    pub use_json: bool,

    /// Include the module target (e.g., license_assistant::agent) in logs
    pub include_target: bool,

    /// Include file and line number information
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            use_json: false,
            include_target: true,
            include_location: false,
        }
    }
}

impl LoggingConfig {
    pub fn with_level(level: Level) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    /// Level from command line flags, falling back to `LICENSE_ASSISTANT_LOG_LEVEL`.
    ///
    /// An explicit `--log-level` wins over `-v`/`-q`.
    pub fn from_flags(log_level: Option<&str>, verbose: bool, quiet: bool) -> Self {
        let level = if let Some(level_str) = log_level {
            parse_level(level_str)
        } else if verbose {
            Level::DEBUG
        } else if quiet {
            Level::ERROR
        } else {
            let level_str = env::var(LOG_LEVEL_VAR).unwrap_or_else(|_| "info".to_string());
            parse_level(&level_str)
        };

        Self {
            level,
            use_json: json_from_env(),
            ..Default::default()
        }
    }
}

fn json_from_env() -> bool {
    env::var(LOG_JSON_VAR)
        .ok()
        .and_then(|v| v.parse::<bool>().ok())
        .unwrap_or(false)
}

/// Parses a log level from a string, case-insensitive; unknown values give `Level::INFO`
///
/// ```
/// use license_assistant::util::logging::parse_level;
/// use tracing::Level;
///
/// assert_eq!(parse_level("debug"), Level::DEBUG);
/// assert_eq!(parse_level("invalid"), Level::INFO);
/// ```
pub fn parse_level(level_str: &str) -> Level {
    match level_str.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => {
            eprintln!(
                "Invalid log level '{}', defaulting to INFO. Valid levels: trace, debug, info, warn, error",
                level_str
            );
            Level::INFO
        }
    }
}

fn build_filter(level: Level) -> EnvFilter {
    let mut directives = vec![format!("license_assistant={}", level)];
    if env::var("RUST_LOG").is_err() {
        directives.extend(["h2=warn", "hyper=warn", "reqwest=warn"].map(String::from));
    }

    directives
        .iter()
        .filter_map(|d| d.parse().ok())
        .fold(EnvFilter::from_default_env(), |filter, directive| {
            filter.add_directive(directive)
        })
}

/// Initializes the logging system; later calls are ignored
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let filter = build_filter(config.level);

        if config.use_json {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_target(config.include_target)
                        .with_file(config.include_location)
                        .with_line_number(config.include_location)
                        .with_writer(std::io::stderr),
                )
                .init();
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_target(config.include_target)
                        .with_file(config.include_location)
                        .with_line_number(config.include_location)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
    });
}

/// Initializes logging from `LICENSE_ASSISTANT_LOG_LEVEL` and `LICENSE_ASSISTANT_LOG_JSON`
pub fn init_from_env() {
    init_logging(LoggingConfig::from_flags(None, false, false));
}
