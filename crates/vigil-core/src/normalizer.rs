//! Response normalizer.
//!
//! Maps the service's [`RawVerdict`] onto a [`ModerationResult`]. Pure and
//! total: every verdict shape, including a missing verdict, produces a result.
//!
//! ## Missing fields
//!
//! | Field        | When absent                                 |
//! |--------------|---------------------------------------------|
//! | `is_toxic`   | `is_safe = false`, result marked incomplete |
//! | `confidence` | `confidence = 0`, result marked incomplete  |
//! | `summary`    | empty string                                |

use crate::types::{ModerationInput, ModerationResult, ModerationType, RawVerdict};

/// Scales a confidence fraction to a whole percentage.
///
/// Rounds to the nearest integer to absorb floating point noise
/// (`0.57 * 100.0` is `56.99999999999999`). Out-of-range values pass
/// through unclamped, so `1.2` becomes `120`.
pub fn scale_confidence(fraction: f64) -> i64 {
    (fraction * 100.0).round() as i64
}

/// Returns the displayable form of the original input.
///
/// Text is returned unchanged. Image files become a data-URI built from the
/// original bytes; data-URIs are returned as given.
pub fn display_content(input: &ModerationInput) -> String {
    match input {
        ModerationInput::Text(text) => text.clone(),
        ModerationInput::File(file) => file.to_data_uri(),
        ModerationInput::DataUri(uri) => uri.clone(),
    }
}

/// Builds the canonical result for a completed request.
pub fn normalize(
    verdict: Option<&RawVerdict>,
    moderation_type: ModerationType,
    input: &ModerationInput,
) -> ModerationResult {
    let empty = RawVerdict::default();
    let verdict = verdict.unwrap_or(&empty);

    let incomplete = verdict.is_toxic.is_none() || verdict.confidence.is_none();
    if incomplete {
        tracing::debug!(
            has_is_toxic = verdict.is_toxic.is_some(),
            has_confidence = verdict.confidence.is_some(),
            "verdict is missing fields"
        );
    }

    ModerationResult {
        moderation_type,
        // Unknown toxicity is never reported as safe.
        is_safe: verdict.is_toxic.map(|toxic| !toxic).unwrap_or(false),
        confidence: verdict.confidence.map(scale_confidence).unwrap_or(0),
        content: display_content(input),
        summary: verdict.summary.clone().unwrap_or_default(),
        incomplete,
    }
}
