//! Configuration management for license-assistant
//!
//! Settings are read from environment variables, with defaults for everything
//! except the service location and credentials.
//!
//! # Environment Variables
//!
//! ## Service
//! - `AZURE_OPENAI_ENDPOINT`: Resource endpoint URL - **required**
//! - `CHAT_COMPLETIONS_DEPLOYMENT_NAME`: Model deployment used by the assistant - **required**
//! - `AZURE_OPENAI_API_KEY`: Resource key, sent as `api-key`
//! - `AZURE_OPENAI_AD_TOKEN`: Entra ID access token, used when no key is set
//! - `AZURE_OPENAI_API_VERSION`: API version - default: "2024-05-01-preview"
//!
//! ## Runtime
//! - `LICENSE_ASSISTANT_REQUEST_TIMEOUT`: HTTP timeout in seconds - default: "600"
//! - `LICENSE_ASSISTANT_POLL_INTERVAL`: Seconds between run status checks - default: "2"
//! - `LICENSE_ASSISTANT_RUN_TIMEOUT`: Seconds a run may stall before it is cancelled - default: "120"
//! - `LICENSE_ASSISTANT_MAX_RATE_LIMIT_RETRIES`: Fresh runs after rate limits - default: "3"
//! - `LICENSE_ASSISTANT_LOG_LEVEL`: Logging level - default: "info"
//!
//! # Example
//!
//! ```no_run
//! use license_assistant::AssistantConfig;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AssistantConfig::from_env()?;
//! config.validate()?;
//! let client = config.create_client()?;
//! # Ok(())
//! # }
//! ```

use crate::agent::PollPolicy;
use crate::llm::{AzureAssistantClient, BackendError, Credential};
use std::env;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub const ENDPOINT_VAR: &str = "AZURE_OPENAI_ENDPOINT";
pub const DEPLOYMENT_VAR: &str = "CHAT_COMPLETIONS_DEPLOYMENT_NAME";
pub const API_KEY_VAR: &str = "AZURE_OPENAI_API_KEY";
pub const AD_TOKEN_VAR: &str = "AZURE_OPENAI_AD_TOKEN";
pub const API_VERSION_VAR: &str = "AZURE_OPENAI_API_VERSION";

const DEFAULT_API_VERSION: &str = "2024-05-01-preview";
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 600;
const DEFAULT_POLL_INTERVAL_SECS: u64 = 2;
const DEFAULT_RUN_TIMEOUT_SECS: u64 = 120;
const DEFAULT_MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    MissingVariable(&'static str),

    #[error("No credentials configured. Set AZURE_OPENAI_API_KEY or AZURE_OPENAI_AD_TOKEN")]
    MissingCredentials,

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("Failed to parse {field}: {error}")]
    ParseError { field: String, error: String },

    #[error("Client initialization failed: {0}")]
    ClientInitError(#[from] BackendError),
}

#[derive(Debug, Clone)]
pub struct AssistantConfig {
    pub endpoint: String,

    /// Deployment name the assistant runs on
    pub deployment: String,

    pub api_version: String,

    pub credential: Credential,

    /// HTTP request timeout in seconds
    pub request_timeout_secs: u64,

    pub poll_interval_secs: u64,

    /// Seconds a run may stay open before it is cancelled
    pub run_timeout_secs: u64,

    pub max_rate_limit_retries: u32,

    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::MissingVariable(name))
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parsed<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: fmt::Display,
{
    match optional(name) {
        Some(raw) => raw.trim().parse::<T>().map_err(|e| ConfigError::ParseError {
            field: name.to_string(),
            error: e.to_string(),
        }),
        None => Ok(default),
    }
}

impl AssistantConfig {
    /// Loads the configuration from the environment
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingVariable` when the endpoint or deployment
    /// is not set and `ConfigError::MissingCredentials` when neither credential is.
    pub fn from_env() -> Result<Self, ConfigError> {
        let endpoint = required(ENDPOINT_VAR)?;
        let deployment = required(DEPLOYMENT_VAR)?;

        let credential = match (optional(API_KEY_VAR), optional(AD_TOKEN_VAR)) {
            (Some(key), _) => Credential::ApiKey(key),
            (None, Some(token)) => Credential::BearerToken(token),
            (None, None) => return Err(ConfigError::MissingCredentials),
        };

        Ok(Self {
            endpoint,
            deployment,
            api_version: optional(API_VERSION_VAR)
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            credential,
            request_timeout_secs: parsed(
                "LICENSE_ASSISTANT_REQUEST_TIMEOUT",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?,
            poll_interval_secs: parsed(
                "LICENSE_ASSISTANT_POLL_INTERVAL",
                DEFAULT_POLL_INTERVAL_SECS,
            )?,
            run_timeout_secs: parsed("LICENSE_ASSISTANT_RUN_TIMEOUT", DEFAULT_RUN_TIMEOUT_SECS)?,
            max_rate_limit_retries: parsed(
                "LICENSE_ASSISTANT_MAX_RATE_LIMIT_RETRIES",
                DEFAULT_MAX_RATE_LIMIT_RETRIES,
            )?,
            log_level: optional("LICENSE_ASSISTANT_LOG_LEVEL")
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string())
                .to_lowercase(),
        })
    }

    /// Validates the configuration
    ///
    /// Checks that:
    /// - The endpoint is an http(s) URL
    /// - Timeouts and intervals are in valid ranges
    /// - Log level is valid
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.endpoint.starts_with("https://") && !self.endpoint.starts_with("http://") {
            return Err(ConfigError::ValidationFailed(format!(
                "{} must be an http(s) URL, got '{}'",
                ENDPOINT_VAR, self.endpoint
            )));
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "Request timeout must be at least 1 second".to_string(),
            ));
        }
        if self.request_timeout_secs > 3600 {
            return Err(ConfigError::ValidationFailed(
                "Request timeout cannot exceed 1 hour".to_string(),
            ));
        }

        if self.poll_interval_secs == 0 || self.poll_interval_secs > 60 {
            return Err(ConfigError::ValidationFailed(
                "Poll interval must be between 1 and 60 seconds".to_string(),
            ));
        }
        if self.run_timeout_secs < self.poll_interval_secs {
            return Err(ConfigError::ValidationFailed(
                "Run timeout must not be shorter than the poll interval".to_string(),
            ));
        }

        if self.max_rate_limit_retries > 10 {
            return Err(ConfigError::ValidationFailed(
                "At most 10 rate limit retries are allowed".to_string(),
            ));
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        Ok(())
    }

    /// Polling behaviour derived from the runtime settings
    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy::default()
            .with_interval(Duration::from_secs(self.poll_interval_secs))
            .with_stall_timeout(Duration::from_secs(self.run_timeout_secs))
            .with_max_rate_limit_retries(self.max_rate_limit_retries)
    }

    pub fn create_client(&self) -> Result<Arc<AzureAssistantClient>, ConfigError> {
        let client = AzureAssistantClient::new(
            self.endpoint.clone(),
            self.deployment.clone(),
            self.api_version.clone(),
            self.credential.clone(),
            Duration::from_secs(self.request_timeout_secs),
        )?;
        Ok(Arc::new(client))
    }
}

impl fmt::Display for AssistantConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "License Assistant Configuration:")?;
        writeln!(f, "  Endpoint: {}", self.endpoint)?;
        writeln!(f, "  Deployment: {}", self.deployment)?;
        writeln!(f, "  API Version: {}", self.api_version)?;
        writeln!(f, "  Credential: {:?}", self.credential)?;
        writeln!(f, "  Request Timeout: {}s", self.request_timeout_secs)?;
        writeln!(f, "  Poll Interval: {}s", self.poll_interval_secs)?;
        writeln!(f, "  Run Timeout: {}s", self.run_timeout_secs)?;
        writeln!(f, "  Rate Limit Retries: {}", self.max_rate_limit_retries)?;
        writeln!(f, "  Log Level: {}", self.log_level)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    /// Helper to temporarily set environment variables for testing
    struct EnvGuard {
        key: String,
        old_value: Option<String>,
    }

    impl EnvGuard {
        fn set(key: &str, value: &str) -> Self {
            let old_value = env::var(key).ok();
            env::set_var(key, value);
            Self {
                key: key.to_string(),
                old_value,
            }
        }

        fn unset(key: &str) -> Self {
            let old_value = env::var(key).ok();
            env::remove_var(key);
            Self {
                key: key.to_string(),
                old_value,
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            match &self.old_value {
                Some(v) => env::set_var(&self.key, v),
                None => env::remove_var(&self.key),
            }
        }
    }

    fn base_env() -> Vec<EnvGuard> {
        vec![
            EnvGuard::set(ENDPOINT_VAR, "https://example.openai.azure.com/"),
            EnvGuard::set(DEPLOYMENT_VAR, "gpt-4o"),
            EnvGuard::set(API_KEY_VAR, "secret-key"),
            EnvGuard::unset(AD_TOKEN_VAR),
            EnvGuard::unset(API_VERSION_VAR),
            EnvGuard::unset("LICENSE_ASSISTANT_REQUEST_TIMEOUT"),
            EnvGuard::unset("LICENSE_ASSISTANT_POLL_INTERVAL"),
            EnvGuard::unset("LICENSE_ASSISTANT_RUN_TIMEOUT"),
            EnvGuard::unset("LICENSE_ASSISTANT_MAX_RATE_LIMIT_RETRIES"),
            EnvGuard::unset("LICENSE_ASSISTANT_LOG_LEVEL"),
        ]
    }

    #[test]
    #[serial]
    fn test_default_configuration() {
        let _guards = base_env();

        let config = AssistantConfig::from_env().unwrap();

        assert_eq!(config.deployment, "gpt-4o");
        assert_eq!(config.api_version, DEFAULT_API_VERSION);
        assert_eq!(config.credential, Credential::ApiKey("secret-key".to_string()));
        assert_eq!(config.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
        assert_eq!(config.poll_interval_secs, DEFAULT_POLL_INTERVAL_SECS);
        assert_eq!(config.run_timeout_secs, DEFAULT_RUN_TIMEOUT_SECS);
        assert_eq!(config.max_rate_limit_retries, DEFAULT_MAX_RATE_LIMIT_RETRIES);
        assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_environment_variable_parsing() {
        let mut guards = base_env();
        guards.push(EnvGuard::set("LICENSE_ASSISTANT_POLL_INTERVAL", "5"));
        guards.push(EnvGuard::set("LICENSE_ASSISTANT_RUN_TIMEOUT", "300"));
        guards.push(EnvGuard::set("LICENSE_ASSISTANT_MAX_RATE_LIMIT_RETRIES", "1"));
        guards.push(EnvGuard::set("LICENSE_ASSISTANT_LOG_LEVEL", "DEBUG"));
        guards.push(EnvGuard::set(API_VERSION_VAR, "2024-02-15-preview"));

        let config = AssistantConfig::from_env().unwrap();

        assert_eq!(config.poll_interval_secs, 5);
        assert_eq!(config.run_timeout_secs, 300);
        assert_eq!(config.max_rate_limit_retries, 1);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.api_version, "2024-02-15-preview");

        let policy = config.poll_policy();
        assert_eq!(policy.interval, Duration::from_secs(5));
        assert_eq!(policy.stall_timeout, Duration::from_secs(300));
        assert_eq!(policy.max_rate_limit_retries, 1);
    }

    #[test]
    #[serial]
    fn test_missing_endpoint() {
        let mut guards = base_env();
        guards.push(EnvGuard::unset(ENDPOINT_VAR));

        let err = AssistantConfig::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::MissingVariable(ENDPOINT_VAR)));
    }

    #[test]
    #[serial]
    fn test_missing_deployment() {
        let mut guards = base_env();
        guards.push(EnvGuard::set(DEPLOYMENT_VAR, "  "));

        let err = AssistantConfig::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::MissingVariable(DEPLOYMENT_VAR)));
    }

    #[test]
    #[serial]
    fn test_token_used_without_key() {
        let mut guards = base_env();
        guards.push(EnvGuard::unset(API_KEY_VAR));
        guards.push(EnvGuard::set(AD_TOKEN_VAR, "token"));

        let config = AssistantConfig::from_env().unwrap();
        assert_eq!(config.credential, Credential::BearerToken("token".to_string()));
    }

    #[test]
    #[serial]
    fn test_missing_credentials() {
        let mut guards = base_env();
        guards.push(EnvGuard::unset(API_KEY_VAR));

        assert!(matches!(
            AssistantConfig::from_env(),
            Err(ConfigError::MissingCredentials)
        ));
    }

    #[test]
    #[serial]
    fn test_unparseable_number() {
        let mut guards = base_env();
        guards.push(EnvGuard::set("LICENSE_ASSISTANT_RUN_TIMEOUT", "soon"));

        let err = AssistantConfig::from_env().unwrap_err();
        assert!(err.to_string().contains("LICENSE_ASSISTANT_RUN_TIMEOUT"));
    }

    #[test]
    #[serial]
    fn test_configuration_validation_invalid_values() {
        let _guards = base_env();
        let config = AssistantConfig::from_env().unwrap();

        let mut bad = config.clone();
        bad.poll_interval_secs = 0;
        assert!(bad.validate().is_err());

        let mut bad = config.clone();
        bad.run_timeout_secs = 1;
        assert!(bad.validate().is_err());

        let mut bad = config.clone();
        bad.log_level = "invalid".to_string();
        assert!(bad.validate().is_err());

        let mut bad = config;
        bad.endpoint = "example.com".to_string();
        assert!(bad.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_config_display_masks_secret() {
        let _guards = base_env();
        let config = AssistantConfig::from_env().unwrap();

        let display = format!("{}", config);
        assert!(display.contains("License Assistant Configuration:"));
        assert!(display.contains("Deployment: gpt-4o"));
        assert!(!display.contains("secret-key"));
    }
}
