//! Error types for StudyHub.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::timeout::TimeoutError;

/// A shared error type for the entire StudyHub client.
///
/// Variants follow the failure taxonomy of the dashboard: not-found rows,
/// transport and timeout failures, permission/validation rejections from the
/// backend, and local configuration or serialization problems.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StudyhubError {
    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// A bounded wait elapsed before the operation resolved
    #[error("Timed out after {after_ms}ms: {operation}")]
    Timeout {
        operation: &'static str,
        after_ms: u64,
    },

    /// Transport failure talking to the backend
    #[error("Network error: {0}")]
    Network(String),

    /// Row-level security or credential rejection
    #[error("Permission denied: {0}")]
    Permission(String),

    /// The backend rejected the payload
    #[error("Validation error: {0}")]
    Validation(String),

    /// Authentication flow error (bad credentials, no signed-in user)
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl StudyhubError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    pub fn permission(message: impl Into<String>) -> Self {
        Self::Permission(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    pub fn is_permission(&self) -> bool {
        matches!(self, Self::Permission(_))
    }

    /// Check if this is a config error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Whether the failure came from the remote side being slow or unreachable
    /// rather than from a definite answer.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout { .. })
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<TimeoutError> for StudyhubError {
    fn from(err: TimeoutError) -> Self {
        Self::Timeout {
            operation: err.operation,
            after_ms: err.after.as_millis() as u64,
        }
    }
}

impl From<std::io::Error> for StudyhubError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for StudyhubError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for StudyhubError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for StudyhubError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// Conversion from anyhow::Error (used at the binary boundary)
impl From<anyhow::Error> for StudyhubError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A type alias for `Result<T, StudyhubError>`.
pub type Result<T> = std::result::Result<T, StudyhubError>;
