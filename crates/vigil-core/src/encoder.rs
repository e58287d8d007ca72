//! Content encoder.
//!
//! Turns a [`ModerationInput`] into the [`TransportPayload`] for a given
//! [`ModerationType`]:
//!
//! - **Text**: the string is sent verbatim in the `text` field.
//! - **Image file**: the bytes are sent as-is under the file's own name
//!   (`image.png` when it has none).
//! - **Image data-URI**: the base64 body after the first comma is decoded and
//!   sent as `image.<ext>`, with the MIME type sniffed from the prefix.

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::error::{EncodeError, Result};
use crate::mime::{sniff_data_uri, MimeInfo};
use crate::types::{ImageFile, ImagePart, ModerationInput, ModerationType, TransportPayload};

/// MIME type used for binary files whose type is neither declared nor detectable.
pub const FALLBACK_BINARY_MIME_TYPE: &str = "application/octet-stream";

/// Encodes user input into a transport payload.
///
/// Fails with [`EncodeError::InvalidInputKind`] when the input shape does not
/// match the moderation type, and with [`EncodeError::InvalidBase64`] when a
/// data-URI body cannot be decoded.
pub fn encode(moderation_type: ModerationType, input: &ModerationInput) -> Result<TransportPayload> {
    match (moderation_type, input) {
        (ModerationType::Text, ModerationInput::Text(text)) => {
            Ok(TransportPayload::Text(text.clone()))
        }
        (ModerationType::Image, ModerationInput::File(file)) => {
            Ok(TransportPayload::Image(encode_file(file)))
        }
        (ModerationType::Image, ModerationInput::DataUri(uri)) => {
            encode_data_uri(uri).map(TransportPayload::Image)
        }
        (expected, other) => Err(EncodeError::InvalidInputKind {
            expected,
            found: other.kind_name(),
        }),
    }
}

fn encode_file(file: &ImageFile) -> ImagePart {
    let filename = file
        .filename
        .as_deref()
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| MimeInfo::default().filename());

    ImagePart {
        data: file.data.clone(),
        filename,
        mime_type: file
            .detected_mime_type()
            .unwrap_or(FALLBACK_BINARY_MIME_TYPE)
            .to_string(),
    }
}

/// Decodes a base64 data-URI into an image part.
pub fn encode_data_uri(uri: &str) -> Result<ImagePart> {
    let Some((prefix, body)) = uri.split_once(',') else {
        return Err(EncodeError::InvalidInputKind {
            expected: ModerationType::Image,
            found: "string without base64 data",
        });
    };

    let data = STANDARD.decode(body)?;
    let mime = sniff_data_uri(&format!("{},", prefix));

    tracing::debug!(
        mime_type = %mime.mime_type,
        bytes = data.len(),
        "decoded data-URI image"
    );

    Ok(ImagePart {
        filename: mime.filename(),
        mime_type: mime.mime_type,
        data,
    })
}
