//! Transport errors for the assistants service
//!
//! These describe failures talking to the remote service itself. Failures a run
//! reports about its own execution (rate limits, model errors) arrive as a
//! [`RunError`](super::types::RunError) on the run snapshot instead.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Errors that can occur during service operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BackendError {
    /// API request failed with the given message
    ApiError {
        message: String,
        status_code: Option<u16>,
    },

    /// Authentication failed or credentials are invalid
    AuthenticationError { message: String },

    /// Request timed out after the specified duration (in seconds)
    TimeoutError { seconds: u64 },

    /// HTTP-level rate limit still in force after retrying
    RateLimitError { retry_after: Option<u64> },

    /// Invalid or malformed response from the service
    InvalidResponse {
        message: String,
        raw_response: Option<String>,
    },

    /// Configuration error (missing credentials, bad endpoint, etc.)
    ConfigurationError { message: String },

    /// Network-related error
    NetworkError { message: String },

    /// Generic error for other cases
    Other { message: String },
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::ApiError {
                message,
                status_code,
            } => {
                if let Some(code) = status_code {
                    write!(f, "API error ({}): {}", code, message)
                } else {
                    write!(f, "API error: {}", message)
                }
            }
            BackendError::AuthenticationError { message } => {
                write!(f, "Authentication failed: {}", message)
            }
            BackendError::TimeoutError { seconds } => {
                write!(f, "Request timed out after {} seconds", seconds)
            }
            BackendError::RateLimitError { retry_after } => {
                if let Some(seconds) = retry_after {
                    write!(f, "Rate limit exceeded, retry after {} seconds", seconds)
                } else {
                    write!(f, "Rate limit exceeded")
                }
            }
            BackendError::InvalidResponse { message, .. } => {
                write!(f, "Invalid response from service: {}", message)
            }
            BackendError::ConfigurationError { message } => {
                write!(f, "Configuration error: {}", message)
            }
            BackendError::NetworkError { message } => {
                write!(f, "Network error: {}", message)
            }
            BackendError::Other { message } => {
                write!(f, "Error: {}", message)
            }
        }
    }
}

impl std::error::Error for BackendError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let with_code = BackendError::ApiError {
            message: "bad request".to_string(),
            status_code: Some(400),
        };
        assert_eq!(with_code.to_string(), "API error (400): bad request");

        let without_code = BackendError::ApiError {
            message: "bad request".to_string(),
            status_code: None,
        };
        assert_eq!(without_code.to_string(), "API error: bad request");
    }

    #[test]
    fn test_rate_limit_display() {
        let err = BackendError::RateLimitError {
            retry_after: Some(12),
        };
        assert!(err.to_string().contains("12 seconds"));
        assert_eq!(
            BackendError::RateLimitError { retry_after: None }.to_string(),
            "Rate limit exceeded"
        );
    }
}
