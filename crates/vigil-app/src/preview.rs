//! Off-thread preview generation for selected image files.

use std::sync::Arc;

use vigil_core::{ImageFile, Preview, PreviewGenerator};

/// Generates the blurred preview of a selected file.
///
/// Decoding and blurring run on the blocking pool. Returns `None` for files that
/// are not decodable images; the failure never reaches the submission state.
pub async fn generate_preview(generator: Arc<PreviewGenerator>, file: &ImageFile) -> Option<Preview> {
    let data = file.data.clone();
    match tokio::task::spawn_blocking(move || generator.try_generate(&data)).await {
        Ok(preview) => preview,
        Err(e) => {
            tracing::warn!("Preview task failed: {}", e);
            None
        }
    }
}
