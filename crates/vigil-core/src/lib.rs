//! Vigil Core - payload encoding, verdict normalization, and previews.
//!
//! This crate holds the pure parts of the moderation pipeline. It does no
//! network I/O; see `vigil-client` for the transport and `vigil-app` for the
//! submission lifecycle.
//!
//! ## Pipeline
//!
//! ```text
//! ModerationInput ─encoder→ TransportPayload ─(vigil-client)→ RawVerdict ─normalizer→ ModerationResult
//! ```
//!
//! ## Example
//!
//! ```
//! use vigil_core::{encode, normalize, ModerationInput, ModerationType, RawVerdict};
//!
//! let input = ModerationInput::from("hello world");
//! let payload = encode(ModerationType::Text, &input).unwrap();
//! assert_eq!(payload.text(), Some("hello world"));
//!
//! let verdict = RawVerdict {
//!     is_toxic: Some(false),
//!     confidence: Some(0.95),
//!     summary: Some("benign greeting".to_string()),
//! };
//! let result = normalize(Some(&verdict), ModerationType::Text, &input);
//! assert!(result.is_safe);
//! assert_eq!(result.confidence, 95);
//! ```

pub mod encoder;
pub mod error;
pub mod mime;
pub mod normalizer;
pub mod preview;
pub mod types;

pub use encoder::encode;
pub use error::{EncodeError, Result};
pub use mime::{detect_image_format, sniff_data_uri, MimeInfo};
pub use normalizer::normalize;
pub use preview::{Preview, PreviewConfig, PreviewError, PreviewGenerator};
pub use types::{
    ImageFile, ImagePart, ModerationEnvelope, ModerationInput, ModerationResult, ModerationType,
    RawVerdict, TransportPayload,
};
