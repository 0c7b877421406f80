//! Error types for the preview core.
use std::time::Duration;

use thiserror::Error;

/// Retry delay used when a 429 response does not say how long to wait.
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Closed taxonomy of everything that can go wrong while generating a preview.
///
/// `Display` gives the human-readable detail shown next to the error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreviewError {
    /// The user has not configured dietary preferences yet.
    #[error("Set your dietary preferences before requesting an AI modification")]
    NoPreferences,
    /// The recipe does not exist or is not visible to the caller.
    #[error("Recipe not found")]
    NotFound,
    /// Too many preview requests; retry after the given delay.
    #[error("Too many AI modification requests, try again in {retry_after_secs} seconds")]
    RateLimit { retry_after_secs: u64 },
    /// The AI provider is down or timed out.
    #[error("The AI service is temporarily unavailable")]
    ServiceUnavailable,
    /// Anything else, with a best-effort message.
    #[error("{}", .message.as_deref().unwrap_or("An unexpected error occurred"))]
    Unknown { message: Option<String> },
}

impl PreviewError {
    /// Build an `Unknown` error carrying `message`.
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::Unknown { message: Some(message.into()) }
    }

    /// Retry delay for rate limit errors.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimit { retry_after_secs } => Some(Duration::from_secs(*retry_after_secs)),
            _ => None,
        }
    }

    /// Whether the user can retry straight away.
    ///
    /// Rate limits wait for their timer; missing preferences need a detour through the
    /// profile; not-found and unavailable stay put for now.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unknown { .. })
    }

    /// Stable machine-readable name of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NoPreferences => "no_preferences",
            Self::NotFound => "not_found",
            Self::RateLimit { .. } => "rate_limit",
            Self::ServiceUnavailable => "service_unavailable",
            Self::Unknown { .. } => "unknown",
        }
    }
}

/// The generation capability could not produce any response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// Outcome of calling the AI modifier collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// The modifier did not answer in time.
    #[error("AI generation timed out after {elapsed:?} (limit: {timeout:?})")]
    Timeout { elapsed: Duration, timeout: Duration },
    /// The modifier reported that the provider is unavailable.
    #[error("AI service unavailable: {0}")]
    Unavailable(String),
}

impl GenerationError {
    /// Check if this error is due to timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Failure of the recipe/preferences persistence collaborator.
#[derive(Debug, Error)]
#[error("recipe repository failed: {0}")]
pub struct RepositoryError(#[from] pub Box<dyn std::error::Error + Send + Sync>);

impl RepositoryError {
    pub fn msg(message: impl Into<String>) -> Self {
        let message: String = message.into();
        Self(message.into())
    }
}

/// Errors produced when validating configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("max_requests must be > 0 (got {provided})")]
    InvalidMaxRequests { provided: u32 },
    #[error("window must be > 0 (got {0:?})")]
    InvalidWindow(Duration),
    #[error("sweep_interval must be > 0 (got {0:?})")]
    InvalidSweepInterval(Duration),
    #[error("timeout must be > 0 (got {0:?})")]
    InvalidTimeout(Duration),
    #[error("base_url must be an absolute http(s) URL (got {0:?})")]
    InvalidBaseUrl(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_display_falls_back_to_generic_message() {
        assert_eq!(
            PreviewError::Unknown { message: None }.to_string(),
            "An unexpected error occurred"
        );
        assert_eq!(PreviewError::unknown("Bad request").to_string(), "Bad request");
    }

    #[test]
    fn rate_limit_carries_retry_delay() {
        let err = PreviewError::RateLimit { retry_after_secs: 42 };
        assert_eq!(err.retry_after(), Some(Duration::from_secs(42)));
        assert!(err.to_string().contains("42"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn kinds_are_stable() {
        let kinds: Vec<_> = [
            PreviewError::NoPreferences,
            PreviewError::NotFound,
            PreviewError::RateLimit { retry_after_secs: 1 },
            PreviewError::ServiceUnavailable,
            PreviewError::Unknown { message: None },
        ]
        .iter()
        .map(PreviewError::kind)
        .collect();
        assert_eq!(
            kinds,
            ["no_preferences", "not_found", "rate_limit", "service_unavailable", "unknown"]
        );
    }

    #[test]
    fn only_unknown_is_retryable() {
        assert!(PreviewError::unknown("boom").is_retryable());
        assert!(!PreviewError::NotFound.is_retryable());
        assert!(!PreviewError::ServiceUnavailable.is_retryable());
        assert!(!PreviewError::NoPreferences.is_retryable());
    }

    #[test]
    fn timeout_display_mentions_limit() {
        let err = GenerationError::Timeout {
            elapsed: Duration::from_millis(30_100),
            timeout: Duration::from_secs(30),
        };
        assert!(err.is_timeout());
        assert!(err.to_string().contains("timed out"));
    }
}
