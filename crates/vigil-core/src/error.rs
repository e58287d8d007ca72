//! Error types for payload encoding.

use thiserror::Error;

use crate::types::ModerationType;

/// Errors raised while turning user input into a transport payload.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// The input shape does not fit the declared moderation type.
    #[error("invalid input for {expected} moderation: got {found}")]
    InvalidInputKind {
        /// The moderation type the caller asked for.
        expected: ModerationType,
        /// Short description of what was actually supplied.
        found: &'static str,
    },

    /// The data-URI body is not valid standard base64.
    #[error("invalid base64 image data: {0}")]
    InvalidBase64(String),
}

impl From<base64::DecodeError> for EncodeError {
    fn from(e: base64::DecodeError) -> Self {
        EncodeError::InvalidBase64(e.to_string())
    }
}

/// Result type for encoding operations.
pub type Result<T> = std::result::Result<T, EncodeError>;
