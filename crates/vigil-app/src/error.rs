//! Submission error types.

use thiserror::Error;

/// Any failure between user input and a moderation result.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// The input could not be encoded.
    #[error(transparent)]
    Encode(#[from] vigil_core::EncodeError),

    /// The moderation service could not be reached or answered badly.
    #[error(transparent)]
    Transport(#[from] vigil_client::ClientError),
}

impl SubmitError {
    /// Returns the message shown to the user.
    pub fn user_message(&self) -> String {
        format!("Failed in analyzing content: {}", self)
    }
}
