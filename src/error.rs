//! Error types for Tax Assist.

use std::time::Duration;

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Field schema errors. These are startup-time fatal.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Field schema is empty")]
    Empty,

    #[error("Field at position {index} has a blank name")]
    BlankName { index: usize },

    #[error("Duplicate field name: {0}")]
    DuplicateName(String),

    #[error("Failed to parse field schema: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} rate limited, retry after {retry_after:?}")]
    RateLimited {
        provider: String,
        retry_after: Option<Duration>,
    },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },
}

/// Faults surfaced by a dialogue turn.
///
/// A `Rejected` validation outcome is not an error; everything here is an
/// infrastructure fault the caller may retry.
#[derive(Debug, thiserror::Error)]
pub enum DialogueError {
    #[error("Completion oracle unavailable: {reason}")]
    OracleUnavailable { reason: String },

    #[error("Completion oracle timed out after {after:?}")]
    OracleTimeout { after: Duration },

    #[error("Completion oracle rate limited, retry after {retry_after:?}")]
    OracleRateLimited { retry_after: Option<Duration> },

    /// `raw` holds the oracle text for logs only; it is not part of the message.
    #[error("Validation reply was malformed: {reason}")]
    ValidationMalformed { reason: String, raw: String },
}

impl DialogueError {
    /// Whether the caller may retry the same turn.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::OracleUnavailable { .. }
                | Self::OracleTimeout { .. }
                | Self::OracleRateLimited { .. }
                | Self::ValidationMalformed { .. }
        )
    }

    /// Short machine-readable label, used in logs and HTTP error bodies.
    pub fn label(&self) -> &'static str {
        match self {
            Self::OracleUnavailable { .. } => "oracle_unavailable",
            Self::OracleTimeout { .. } => "oracle_timeout",
            Self::OracleRateLimited { .. } => "oracle_rate_limited",
            Self::ValidationMalformed { .. } => "validation_malformed",
        }
    }
}

impl From<LlmError> for DialogueError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::RateLimited { retry_after, .. } => Self::OracleRateLimited { retry_after },
            other => Self::OracleUnavailable {
                reason: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_stays_distinct() {
        let err: DialogueError = LlmError::RateLimited {
            provider: "openai".into(),
            retry_after: Some(Duration::from_secs(7)),
        }
        .into();
        match err {
            DialogueError::OracleRateLimited { retry_after } => {
                assert_eq!(retry_after, Some(Duration::from_secs(7)));
            }
            other => panic!("Expected OracleRateLimited, got {:?}", other),
        }
    }

    #[test]
    fn other_provider_errors_become_unavailable() {
        let err: DialogueError = LlmError::RequestFailed {
            provider: "openai".into(),
            reason: "connection reset".into(),
        }
        .into();
        assert!(matches!(err, DialogueError::OracleUnavailable { .. }));
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn empty_completion_is_unavailable() {
        let err: DialogueError = LlmError::InvalidResponse {
            provider: "anthropic".into(),
            reason: "empty completion".into(),
        }
        .into();
        assert!(matches!(err, DialogueError::OracleUnavailable { .. }));
        assert!(err.is_retryable());
    }

    #[test]
    fn malformed_message_hides_raw_text() {
        let err = DialogueError::ValidationMalformed {
            reason: "expected JSON object".into(),
            raw: "secret oracle text".into(),
        };
        assert!(!err.to_string().contains("secret oracle text"));
        assert!(err.is_retryable());
        assert_eq!(err.label(), "validation_malformed");
    }
}
