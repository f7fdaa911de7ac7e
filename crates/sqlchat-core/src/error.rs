//! Error types for the sqlchat pipeline.

use thiserror::Error;

/// A shared error type for the entire sqlchat workspace.
///
/// The first four variants form the pipeline taxonomy: each external call
/// site converts its failure into one of them. The remaining variants cover
/// the ambient concerns (configuration, files, input validation).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SqlChatError {
    /// The database handle could not be established.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The completion service failed while generating SQL.
    #[error("SQL synthesis unavailable: {0}")]
    SynthesisUnavailable(String),

    /// The database rejected the statement or failed while running it.
    #[error("Query failed: {0}")]
    Execution(String),

    /// The completion service failed while writing the answer.
    #[error("Response unavailable: {0}")]
    ResponseUnavailable(String),

    /// Configuration error (missing field, unreadable file, bad value)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A caller passed input that violates an operation's preconditions.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON"
        message: String,
    },

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SqlChatError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a Connection error
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Creates a SynthesisUnavailable error
    pub fn synthesis_unavailable(message: impl Into<String>) -> Self {
        Self::SynthesisUnavailable(message.into())
    }

    /// Creates an Execution error
    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution(message.into())
    }

    /// Creates a ResponseUnavailable error
    pub fn response_unavailable(message: impl Into<String>) -> Self {
        Self::ResponseUnavailable(message.into())
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an InvalidInput error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    pub fn is_synthesis_unavailable(&self) -> bool {
        matches!(self, Self::SynthesisUnavailable(_))
    }

    pub fn is_execution(&self) -> bool {
        matches!(self, Self::Execution(_))
    }

    pub fn is_response_unavailable(&self) -> bool {
        matches!(self, Self::ResponseUnavailable(_))
    }

    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for SqlChatError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for SqlChatError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for SqlChatError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, SqlChatError>`.
pub type Result<T> = std::result::Result<T, SqlChatError>;
