//! Error types for tbl-ai

use std::time::Duration;
use thiserror::Error;

/// Result type alias using tbl-ai Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when talking to the completion service
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// API returned an error response
    #[error("API error: {message} (type: {error_type})")]
    Api { error_type: String, message: String },

    /// Rate limit or quota exceeded
    #[error("Rate limited: retry after {retry_after:?} seconds")]
    RateLimited { retry_after: Option<u64> },

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Invalid API key
    #[error("Invalid or missing API key")]
    InvalidApiKey,

    /// Response did not have the expected shape
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// The request did not finish in time
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
}

impl Error {
    /// Create an API error from type and message
    pub fn api(error_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            error_type: error_type.into(),
            message: message.into(),
        }
    }

    /// Check if resubmitting the same message could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(_) | Error::RateLimited { .. } | Error::Timeout(_) => true,
            Error::Api {
                error_type,
                message,
            } => {
                let et = error_type.to_lowercase();
                let msg = message.to_lowercase();
                et.contains("server_error")
                    || et.starts_with("http_5")
                    || et.contains("rate_limit")
                    || msg.contains("rate limit")
                    || msg.contains("overloaded")
                    || msg.contains("too many requests")
            }
            _ => false,
        }
    }

    /// Check if this error means the API key is missing or rejected
    pub fn is_auth(&self) -> bool {
        match self {
            Error::Auth(_) | Error::InvalidApiKey => true,
            Error::Api { error_type, .. } => {
                let et = error_type.to_lowercase();
                et.contains("invalid_api_key") || et.contains("authentication")
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_typed_variants() {
        assert!(Error::RateLimited { retry_after: Some(5) }.is_retryable());
        assert!(Error::Timeout(Duration::from_secs(120)).is_retryable());
    }

    #[test]
    fn test_retryable_api_server_error() {
        let e = Error::api("server_error", "The server had an error processing your request");
        assert!(e.is_retryable());
    }

    #[test]
    fn test_retryable_gateway_status() {
        assert!(Error::api("http_502", "Bad Gateway").is_retryable());
        assert!(!Error::api("http_400", "Bad Request").is_retryable());
    }

    #[test]
    fn test_retryable_api_rate_limit_message() {
        let e = Error::api("requests", "Rate limit reached for gpt-4o-mini");
        assert!(e.is_retryable());
    }

    #[test]
    fn test_not_retryable_quota() {
        let e = Error::api("insufficient_quota", "You exceeded your current quota");
        assert!(!e.is_retryable());
    }

    #[test]
    fn test_not_retryable_non_api() {
        assert!(!Error::InvalidApiKey.is_retryable());
        assert!(!Error::UnexpectedResponse("no choices".into()).is_retryable());
    }

    #[test]
    fn test_auth_detection() {
        assert!(Error::InvalidApiKey.is_auth());
        assert!(Error::Auth("401".into()).is_auth());
        assert!(Error::api("invalid_api_key", "Incorrect API key provided").is_auth());
        assert!(!Error::api("server_error", "boom").is_auth());
    }
}
