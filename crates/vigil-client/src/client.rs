//! HTTP transport to the moderation service.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};

use vigil_core::encoder::FALLBACK_BINARY_MIME_TYPE;
use vigil_core::{ImagePart, ModerationEnvelope, RawVerdict, TransportPayload};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};

/// Anything that can turn a transport payload into a raw verdict.
///
/// A missing verdict (`Ok(None)`) is a valid outcome, not an error.
#[async_trait]
pub trait Moderator: Send + Sync {
    /// Submits one payload and returns the service's verdict, if any.
    async fn moderate(&self, payload: TransportPayload) -> Result<Option<RawVerdict>>;
}

/// Health report from the moderation service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Service-reported status, `healthy` when all is well.
    pub status: String,
}

impl HealthStatus {
    /// Returns true if the service reports itself healthy.
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// Client for the `/moderate` endpoint.
///
/// One multipart POST per call; no retries and no timeout.
#[derive(Debug, Clone)]
pub struct ModerationClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl ModerationClient {
    /// Creates a client with the given configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ClientError::InvalidConfig(e.to_string()))?;

        Ok(Self { http, config })
    }

    /// Creates a client for the default local service.
    pub fn with_defaults() -> Result<Self> {
        Self::new(ClientConfig::default())
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Submits a payload and returns the `result` field of the response.
    ///
    /// Every failure is logged and returned as [`ClientError::Transport`].
    pub async fn submit(&self, payload: TransportPayload) -> Result<Option<RawVerdict>> {
        let field = payload.field_name();
        match self.send(payload).await {
            Ok(verdict) => {
                tracing::debug!(field, has_result = verdict.is_some(), "moderation response");
                Ok(verdict)
            }
            Err(e) => {
                tracing::error!(field, status = ?e.status_code(), "Error moderating content: {}", e);
                Err(e)
            }
        }
    }

    async fn send(&self, payload: TransportPayload) -> Result<Option<RawVerdict>> {
        let form = build_form(payload)?;
        let url = self.config.moderate_url();

        let response = self.http.post(&url).multipart(form).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::status(status));
        }

        let body = response.bytes().await?;
        let envelope: ModerationEnvelope = serde_json::from_slice(&body)?;
        Ok(envelope.result)
    }

    /// Queries the service health endpoint.
    pub async fn health(&self) -> Result<HealthStatus> {
        let response = self.http.get(self.config.health_url()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::status(status));
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl Moderator for ModerationClient {
    async fn moderate(&self, payload: TransportPayload) -> Result<Option<RawVerdict>> {
        self.submit(payload).await
    }
}

/// Builds the multipart form for a payload: one `text` or one `image` field.
pub fn build_form(payload: TransportPayload) -> Result<Form> {
    match payload {
        TransportPayload::Text(text) => Ok(Form::new().text("text", text)),
        TransportPayload::Image(part) => Ok(Form::new().part("image", image_part(part)?)),
    }
}

fn image_part(part: ImagePart) -> Result<Part> {
    // A malformed declared type would fail header construction; send the
    // bytes as opaque binary instead.
    let mime_type = if looks_like_mime(&part.mime_type) {
        part.mime_type
    } else {
        tracing::debug!(declared = %part.mime_type, "replacing malformed MIME type");
        FALLBACK_BINARY_MIME_TYPE.to_string()
    };

    Part::bytes(part.data)
        .file_name(part.filename)
        .mime_str(&mime_type)
        .map_err(|e| ClientError::transport(format!("invalid image part: {}", e)))
}

fn looks_like_mime(value: &str) -> bool {
    match value.split_once('/') {
        Some((kind, subtype)) => {
            !kind.is_empty()
                && !subtype.is_empty()
                && !subtype.contains('/')
                && value.chars().all(|c| c.is_ascii_graphic())
        }
        None => false,
    }
}
