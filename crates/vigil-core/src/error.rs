//! Error types for the Vigil application.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the entire Vigil application.
///
/// This provides typed, structured error variants with automatic conversion
/// from common error types via the `From` trait. There is no fatal variant:
/// every failure degrades to "investigation stopped, prior results retained".
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum VigilError {
    /// Connection-level fault on an HTTP request or push stream
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// Non-success HTTP response from a collaborator
    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },

    /// A pushed frame that is not valid structured data.
    ///
    /// Treated as a transport fault by the session state machine; a silent
    /// gap would corrupt the step-ordering invariant.
    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    /// Operator input rejected before any request was issued
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl VigilError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a Transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates an Http error
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// Creates a MalformedMessage error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedMessage(message.into())
    }

    /// Creates an InvalidInput error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a Transport error
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// Check if this is a MalformedMessage error
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedMessage(_))
    }

    /// True for errors that terminate an investigation stream.
    ///
    /// Both connection faults and malformed frames freeze the session at
    /// `Failed`; malformed frames are not skipped.
    pub fn is_stream_fault(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::Http { .. } | Self::MalformedMessage(_)
        )
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for VigilError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for VigilError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, VigilError>`.
pub type Result<T> = std::result::Result<T, VigilError>;
