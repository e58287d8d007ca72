//! Blurred image previews.
//!
//! Produces a small, heavily blurred JPEG of a selected image so the user can
//! confirm the selection without seeing the content in full. The preview is
//! display-only and is never part of a transport payload.

use base64::{engine::general_purpose::STANDARD, Engine};

/// MIME type of generated previews.
pub const PREVIEW_MIME_TYPE: &str = "image/jpeg";

/// Error types for preview generation.
#[derive(Debug, thiserror::Error)]
pub enum PreviewError {
    /// The selected file could not be decoded as an image.
    #[error("Image decode error: {0}")]
    Decode(String),

    /// The preview could not be encoded.
    #[error("Image encode error: {0}")]
    Encode(String),

    /// Preview feature not enabled.
    #[error("preview feature not enabled - rebuild with --features preview")]
    FeatureDisabled,
}

/// Configuration for the preview generator.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewConfig {
    /// Factor applied to both dimensions (default: 0.2).
    pub scale: f32,
    /// Gaussian blur sigma in pixels of the downscaled image (default: 8.0).
    pub blur_sigma: f32,
    /// JPEG quality, 1-100 (default: 70).
    pub jpeg_quality: u8,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            scale: 0.2,
            blur_sigma: 8.0,
            jpeg_quality: 70,
        }
    }
}

/// A generated preview image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    /// JPEG-encoded bytes.
    pub data: Vec<u8>,
    /// Preview width in pixels.
    pub width: u32,
    /// Preview height in pixels.
    pub height: u32,
}

impl Preview {
    /// Renders the preview as a `data:image/jpeg;base64,...` URI.
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", PREVIEW_MIME_TYPE, STANDARD.encode(&self.data))
    }
}

/// Scales a dimension, truncating like a raster surface does, never below 1.
pub fn scaled_dimension(value: u32, scale: f32) -> u32 {
    ((value as f32 * scale) as u32).max(1)
}

/// Downscale, blur and JPEG-encode pipeline.
#[derive(Debug, Clone, Default)]
pub struct PreviewGenerator {
    config: PreviewConfig,
}

impl PreviewGenerator {
    /// Creates a generator with the given config.
    pub fn new(config: PreviewConfig) -> Self {
        Self { config }
    }

    /// Returns the config.
    pub fn config(&self) -> &PreviewConfig {
        &self.config
    }

    /// Generates a preview, returning None if the image cannot be processed.
    pub fn try_generate(&self, image_data: &[u8]) -> Option<Preview> {
        match self.generate(image_data) {
            Ok(preview) => Some(preview),
            Err(e) => {
                tracing::debug!("No preview generated: {}", e);
                None
            }
        }
    }

    /// Generates a blurred preview from encoded image bytes.
    #[cfg(feature = "preview")]
    pub fn generate(&self, image_data: &[u8]) -> Result<Preview, PreviewError> {
        use image::codecs::jpeg::JpegEncoder;
        use image::imageops::FilterType;

        let img = image::load_from_memory(image_data)
            .map_err(|e| PreviewError::Decode(e.to_string()))?;

        let width = scaled_dimension(img.width(), self.config.scale);
        let height = scaled_dimension(img.height(), self.config.scale);

        let small = img.resize_exact(width, height, FilterType::Triangle);
        let blurred = small.blur(self.config.blur_sigma);

        // JPEG has no alpha channel
        let rgb = blurred.to_rgb8();

        let mut data = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut data, self.config.jpeg_quality);
        encoder
            .encode_image(&rgb)
            .map_err(|e| PreviewError::Encode(e.to_string()))?;

        Ok(Preview {
            data,
            width,
            height,
        })
    }

    /// Generates a preview (preview feature not enabled).
    #[cfg(not(feature = "preview"))]
    pub fn generate(&self, _image_data: &[u8]) -> Result<Preview, PreviewError> {
        Err(PreviewError::FeatureDisabled)
    }
}
