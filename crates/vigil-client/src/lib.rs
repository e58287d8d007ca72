//! Vigil Client - transport to the moderation service.
//!
//! ## Endpoints
//!
//! - `POST /moderate` - multipart form with exactly one `text` or `image` field,
//!   answered with `{"result": {"is_toxic": .., "confidence": .., "summary": ..}}`
//! - `GET /health` - `{"status": "healthy"}`
//!
//! ## Example
//!
//! ```no_run
//! use vigil_client::{ClientConfig, ModerationClient};
//! use vigil_core::TransportPayload;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ClientConfig::new("http://localhost:8000").unwrap();
//!     let client = ModerationClient::new(config).unwrap();
//!     let verdict = client
//!         .submit(TransportPayload::Text("hello world".to_string()))
//!         .await
//!         .unwrap();
//!     println!("{:?}", verdict);
//! }
//! ```

mod client;
pub mod config;
pub mod error;

pub use client::{build_form, HealthStatus, ModerationClient, Moderator};
pub use config::{ClientConfig, DEFAULT_BASE_URL};
pub use error::{ClientError, Result};
