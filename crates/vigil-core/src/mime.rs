//! MIME type sniffing for data-URIs and raw image bytes.

use once_cell::sync::Lazy;
use regex::Regex;

/// MIME type assumed when a data-URI does not declare one.
pub const DEFAULT_MIME_TYPE: &str = "image/png";

/// Extension assumed when the MIME type has no subtype.
pub const DEFAULT_EXTENSION: &str = "png";

static DATA_URI_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^data:([^;]+);base64,").expect("Invalid regex pattern"));

/// MIME type and file extension extracted from a data-URI prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MimeInfo {
    /// Full MIME type, e.g. `image/jpeg`.
    pub mime_type: String,
    /// File extension derived from the subtype, e.g. `jpeg`.
    pub extension: String,
}

impl MimeInfo {
    /// Builds the info for a MIME type, deriving the extension from its subtype.
    ///
    /// The extension is the second `/`-separated segment only.
    pub fn from_mime_type(mime_type: impl Into<String>) -> Self {
        let mime_type = mime_type.into();
        let extension = match mime_type.split('/').nth(1) {
            Some(subtype) if !subtype.is_empty() => subtype.to_string(),
            _ => DEFAULT_EXTENSION.to_string(),
        };
        Self {
            mime_type,
            extension,
        }
    }

    /// Returns the upload file name, `image.<extension>`.
    pub fn filename(&self) -> String {
        format!("image.{}", self.extension)
    }
}

impl Default for MimeInfo {
    fn default() -> Self {
        Self::from_mime_type(DEFAULT_MIME_TYPE)
    }
}

/// Extracts the MIME type and extension from a data-URI prefix.
///
/// The prefix must look like `data:<mime>;base64,`. Anything else yields
/// `image/png` / `png`. Total over all inputs.
pub fn sniff_data_uri(prefix: &str) -> MimeInfo {
    match DATA_URI_PREFIX.captures(prefix).and_then(|c| c.get(1)) {
        Some(mime) => MimeInfo::from_mime_type(mime.as_str()),
        None => MimeInfo::default(),
    }
}

/// Detects image format from magic bytes.
pub fn detect_image_format(data: &[u8]) -> Option<&'static str> {
    if data.len() < 4 {
        return None;
    }

    // JPEG: FF D8 FF
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some("image/jpeg");
    }

    // PNG: 89 50 4E 47 0D 0A 1A 0A
    if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some("image/png");
    }

    if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        return Some("image/gif");
    }

    // WebP: RIFF....WEBP
    if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
        return Some("image/webp");
    }

    if data.starts_with(b"BM") {
        return Some("image/bmp");
    }

    None
}
