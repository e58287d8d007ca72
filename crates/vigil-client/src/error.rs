//! Error types for the moderation client.

use thiserror::Error;

/// Moderation client error type.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network failure, non-success status, or unparseable response.
    #[error("Failed to moderate content: {message}")]
    Transport {
        /// HTTP status code, when the service answered.
        status: Option<u16>,
        /// Description of the underlying failure.
        message: String,
    },

    /// The client configuration is unusable.
    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),
}

impl ClientError {
    /// Creates a transport error without a status code.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            status: None,
            message: message.into(),
        }
    }

    /// Creates a transport error from a non-success HTTP status.
    pub fn status(status: reqwest::StatusCode) -> Self {
        let message = match status.canonical_reason() {
            Some(reason) => format!("{} {}", status.as_u16(), reason),
            None => status.as_u16().to_string(),
        };
        Self::Transport {
            status: Some(status.as_u16()),
            message,
        }
    }

    /// Returns the HTTP status code, if the service answered.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => *status,
            Self::InvalidConfig(_) => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => Self::status(status),
            None => Self::transport(e.to_string()),
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        Self::transport(format!("invalid response body: {}", e))
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
