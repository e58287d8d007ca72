//! Moderation data model.
//!
//! Covers the three shapes a submission passes through:
//!
//! ```text
//! ModerationInput ─encode→ TransportPayload ─(service)→ RawVerdict ─normalize→ ModerationResult
//! ```

use std::fmt;
use std::io;
use std::path::Path;

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};

use crate::mime::{detect_image_format, DEFAULT_MIME_TYPE};

/// Kind of content submitted for moderation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModerationType {
    /// Plain UTF-8 text.
    Text,
    /// A single image.
    Image,
}

impl ModerationType {
    /// Returns the type as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
        }
    }
}

impl fmt::Display for ModerationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An image selected by the user, held as raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    /// The raw file contents.
    pub data: Vec<u8>,
    /// File name as selected, if known.
    pub filename: Option<String>,
    /// Declared MIME type, if known.
    pub mime_type: Option<String>,
}

impl ImageFile {
    /// Creates an image file from raw bytes with no name or declared type.
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            filename: None,
            mime_type: None,
        }
    }

    /// Sets the file name.
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Sets the declared MIME type.
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Reads an image file from disk, keeping its file name.
    pub fn from_path(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let mut file = Self::new(data);
        file.filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
        Ok(file)
    }

    /// Returns the declared MIME type, or the one detected from magic bytes.
    pub fn detected_mime_type(&self) -> Option<&str> {
        self.mime_type
            .as_deref()
            .filter(|m| !m.is_empty())
            .or_else(|| detect_image_format(&self.data))
    }

    /// Returns true if the file is declared as, or looks like, an image.
    pub fn is_image(&self) -> bool {
        match self.mime_type.as_deref() {
            Some(m) if m.starts_with("image/") => true,
            _ => detect_image_format(&self.data).is_some(),
        }
    }

    /// Encodes the file as a base64 data-URI.
    ///
    /// Falls back to `image/png` when no type is declared or detectable.
    pub fn to_data_uri(&self) -> String {
        let mime = self.detected_mime_type().unwrap_or(DEFAULT_MIME_TYPE);
        format!("data:{};base64,{}", mime, STANDARD.encode(&self.data))
    }
}

/// Raw user input, before encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModerationInput {
    /// A text string (text mode).
    Text(String),
    /// A binary image handle (image mode).
    File(ImageFile),
    /// A base64 data-URI string (image mode).
    DataUri(String),
}

impl ModerationInput {
    /// Short description of the input shape, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::File(_) => "image file",
            Self::DataUri(_) => "data URI",
        }
    }

    /// Returns true for text that is empty after trimming.
    ///
    /// Image inputs are never blank.
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Text(text) if text.trim().is_empty())
    }
}

impl From<&str> for ModerationInput {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for ModerationInput {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<ImageFile> for ModerationInput {
    fn from(file: ImageFile) -> Self {
        Self::File(file)
    }
}

/// Binary image part of a transport payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePart {
    /// The image bytes as they will be sent.
    pub data: Vec<u8>,
    /// File name reported in the multipart field.
    pub filename: String,
    /// MIME type of the part.
    pub mime_type: String,
}

/// Transport-ready payload. Exactly one multipart field is populated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportPayload {
    /// The `text` field.
    Text(String),
    /// The `image` field.
    Image(ImagePart),
}

impl TransportPayload {
    /// Returns the moderation type this payload was built for.
    pub fn moderation_type(&self) -> ModerationType {
        match self {
            Self::Text(_) => ModerationType::Text,
            Self::Image(_) => ModerationType::Image,
        }
    }

    /// Returns the multipart field name.
    pub fn field_name(&self) -> &'static str {
        self.moderation_type().as_str()
    }

    /// Returns the text field, if this is a text payload.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Image(_) => None,
        }
    }

    /// Returns the image field, if this is an image payload.
    pub fn image(&self) -> Option<&ImagePart> {
        match self {
            Self::Text(_) => None,
            Self::Image(part) => Some(part),
        }
    }
}

/// The service's raw judgment. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawVerdict {
    /// Whether the content was judged toxic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_toxic: Option<bool>,
    /// Confidence as a fraction in [0, 1].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// Short explanation of the verdict.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// Response envelope: `{ "result": RawVerdict }`. A missing `result` is valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModerationEnvelope {
    /// The verdict, if the service returned one.
    #[serde(default)]
    pub result: Option<RawVerdict>,
}

/// Canonical moderation result shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationResult {
    /// Kind of content that was moderated.
    #[serde(rename = "type")]
    pub moderation_type: ModerationType,
    /// True when the service did not flag the content as toxic.
    pub is_safe: bool,
    /// Confidence as a percentage. Not clamped.
    pub confidence: i64,
    /// Original text, or a displayable URL for images.
    pub content: String,
    /// Service summary.
    pub summary: String,
    /// True when the service omitted the toxicity flag or the confidence.
    pub incomplete: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    // ==================== ModerationType Tests ====================

    #[test]
    fn test_moderation_type_as_str() {
        assert_eq!(ModerationType::Text.as_str(), "text");
        assert_eq!(ModerationType::Image.as_str(), "image");
        assert_eq!(format!("{}", ModerationType::Image), "image");
    }

    #[test]
    fn test_moderation_type_serialization() {
        let json = serde_json::to_string(&ModerationType::Text).unwrap();
        assert_eq!(json, "\"text\"");

        let parsed: ModerationType = serde_json::from_str("\"image\"").unwrap();
        assert_eq!(parsed, ModerationType::Image);
    }

    // ==================== ImageFile Tests ====================

    #[test]
    fn test_image_file_detects_png() {
        let file = ImageFile::new(PNG_MAGIC.to_vec());
        assert_eq!(file.detected_mime_type(), Some("image/png"));
        assert!(file.is_image());
    }

    #[test]
    fn test_image_file_declared_type_wins() {
        let file = ImageFile::new(PNG_MAGIC.to_vec()).with_mime_type("image/webp");
        assert_eq!(file.detected_mime_type(), Some("image/webp"));
    }

    #[test]
    fn test_image_file_not_an_image() {
        let file = ImageFile::new(b"hello world".to_vec()).with_mime_type("text/plain");
        assert!(!file.is_image());
    }

    #[test]
    fn test_image_file_to_data_uri() {
        let file = ImageFile::new(vec![1, 2, 3]);
        assert_eq!(file.to_data_uri(), "data:image/png;base64,AQID");

        let jpeg = ImageFile::new(vec![0xFF, 0xD8, 0xFF, 0xE0]);
        assert!(jpeg.to_data_uri().starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn test_image_file_from_path_keeps_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cat.png");
        std::fs::write(&path, PNG_MAGIC).unwrap();

        let file = ImageFile::from_path(&path).unwrap();
        assert_eq!(file.filename.as_deref(), Some("cat.png"));
        assert_eq!(file.data, PNG_MAGIC.to_vec());
    }

    // ==================== ModerationInput Tests ====================

    #[test]
    fn test_input_is_blank() {
        assert!(ModerationInput::from("   \n\t").is_blank());
        assert!(ModerationInput::from("").is_blank());
        assert!(!ModerationInput::from(" hi ").is_blank());
        assert!(!ModerationInput::File(ImageFile::new(Vec::new())).is_blank());
    }

    // ==================== TransportPayload Tests ====================

    #[test]
    fn test_payload_field_names() {
        let text = TransportPayload::Text("hi".to_string());
        assert_eq!(text.field_name(), "text");
        assert_eq!(text.text(), Some("hi"));
        assert!(text.image().is_none());

        let image = TransportPayload::Image(ImagePart {
            data: vec![1],
            filename: "image.png".to_string(),
            mime_type: "image/png".to_string(),
        });
        assert_eq!(image.field_name(), "image");
        assert_eq!(image.moderation_type(), ModerationType::Image);
        assert!(image.text().is_none());
    }

    // ==================== Envelope Tests ====================

    #[test]
    fn test_envelope_full() {
        let json = r#"{"result":{"is_toxic":true,"confidence":0.87,"summary":"insult"}}"#;
        let envelope: ModerationEnvelope = serde_json::from_str(json).unwrap();
        let verdict = envelope.result.unwrap();
        assert_eq!(verdict.is_toxic, Some(true));
        assert_eq!(verdict.confidence, Some(0.87));
        assert_eq!(verdict.summary.as_deref(), Some("insult"));
    }

    #[test]
    fn test_envelope_without_result() {
        let envelope: ModerationEnvelope = serde_json::from_str("{}").unwrap();
        assert!(envelope.result.is_none());

        let envelope: ModerationEnvelope = serde_json::from_str(r#"{"result":null}"#).unwrap();
        assert!(envelope.result.is_none());
    }

    #[test]
    fn test_envelope_partial_verdict() {
        let envelope: ModerationEnvelope =
            serde_json::from_str(r#"{"result":{"summary":"only a summary"}}"#).unwrap();
        let verdict = envelope.result.unwrap();
        assert!(verdict.is_toxic.is_none());
        assert!(verdict.confidence.is_none());
    }

    #[test]
    fn test_result_serializes_camel_case() {
        let result = ModerationResult {
            moderation_type: ModerationType::Text,
            is_safe: true,
            confidence: 95,
            content: "hello".to_string(),
            summary: "fine".to_string(),
            incomplete: false,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["type"], "text");
        assert_eq!(json["isSafe"], true);
        assert_eq!(json["confidence"], 95);
    }
}
