//! Vigil App - submission lifecycle and console front end.
//!
//! [`Submitter`] owns the visible submission state and fences out stale
//! completions; the `vigil` binary drives it from the command line.

pub mod error;
pub mod preview;
pub mod report;
pub mod submission;

pub use error::SubmitError;
pub use preview::generate_preview;
pub use submission::{SubmissionState, Submitter};
