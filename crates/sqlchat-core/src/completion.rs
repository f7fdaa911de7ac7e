//! Text-completion service interface.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Failure reported by a completion backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompletionError {
    /// The request could not be sent or the backend answered with an error status.
    #[error("completion request failed{}: {message}", status_suffix(.status_code))]
    Process {
        status_code: Option<u16>,
        message: String,
        is_retryable: bool,
        retry_after: Option<Duration>,
    },

    /// The backend answered but produced no usable text.
    #[error("completion service returned empty text")]
    Empty,

    /// Any other failure (unparsable body, missing credentials).
    #[error("{0}")]
    Other(String),
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|code| format!(" (HTTP {code})")).unwrap_or_default()
}

impl CompletionError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, CompletionError::Process { is_retryable: true, .. })
    }
}

/// `complete(prompt) -> text`, used by both synthesizers with different templates.
///
/// Implementations make no latency or determinism guarantee.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn process_error_mentions_status() {
        let err = CompletionError::Process {
            status_code: Some(503),
            message: "overloaded".into(),
            is_retryable: true,
            retry_after: None,
        };
        assert_eq!(err.to_string(), "completion request failed (HTTP 503): overloaded");
        assert!(err.is_retryable());
    }

    #[test]
    fn transport_error_has_no_status() {
        let err = CompletionError::Process {
            status_code: None,
            message: "connection refused".into(),
            is_retryable: false,
            retry_after: None,
        };
        assert_eq!(err.to_string(), "completion request failed: connection refused");
    }
}
