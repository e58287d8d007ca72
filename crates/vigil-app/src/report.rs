//! Human-readable rendering of submission outcomes.

use vigil_core::ModerationResult;

use crate::submission::SubmissionState;

/// Longest content excerpt shown in a report.
const EXCERPT_LEN: usize = 80;

/// Renders a terminal state for the console.
pub fn render(state: &SubmissionState) -> String {
    match state {
        SubmissionState::Idle => "Nothing submitted".to_string(),
        SubmissionState::Analyzing => "Analyzing...".to_string(),
        SubmissionState::Done(result) => render_result(result),
        SubmissionState::Failed { reason } => format!("Error: {}", reason),
    }
}

fn render_result(result: &ModerationResult) -> String {
    let verdict = if result.is_safe { "SAFE" } else { "UNSAFE" };
    let mut out = format!(
        "{} ({} moderation, {}% confidence)",
        verdict, result.moderation_type, result.confidence
    );
    if !result.summary.is_empty() {
        out.push_str(&format!("\n  {}", result.summary));
    }
    out.push_str(&format!("\n  content: {}", excerpt(&result.content)));
    if result.incomplete {
        out.push_str("\n  note: service returned an incomplete verdict");
    }
    out
}

/// Truncates long content (notably data-URIs) on a character boundary.
fn excerpt(content: &str) -> String {
    match content.char_indices().nth(EXCERPT_LEN) {
        Some((idx, _)) => format!("{}...", &content[..idx]),
        None => content.to_string(),
    }
}
