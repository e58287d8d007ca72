//! Client configuration.

use reqwest::Url;

use crate::error::{ClientError, Result};

/// Default moderation service base URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Path of the moderation endpoint, relative to the base URL.
pub const MODERATE_PATH: &str = "moderate";

/// Path of the health endpoint, relative to the base URL.
pub const HEALTH_PATH: &str = "health";

/// Moderation client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Service base URL, without a trailing slash.
    base_url: String,
    /// User-Agent header sent with every request.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: default_user_agent(),
        }
    }
}

impl ClientConfig {
    /// Creates a config for the given base URL.
    ///
    /// Only `http` and `https` URLs are accepted.
    pub fn new(base_url: &str) -> Result<Self> {
        Self::default().with_base_url(base_url)
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        let url = Url::parse(base_url)
            .map_err(|e| ClientError::InvalidConfig(format!("{}: {}", base_url, e)))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ClientError::InvalidConfig(format!(
                "unsupported scheme '{}' in {}",
                url.scheme(),
                base_url
            )));
        }

        self.base_url = base_url.trim_end_matches('/').to_string();
        Ok(self)
    }

    /// Sets the User-Agent header.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the full URL of an endpoint below the base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Returns the moderation endpoint URL.
    pub fn moderate_url(&self) -> String {
        self.endpoint(MODERATE_PATH)
    }

    /// Returns the health endpoint URL.
    pub fn health_url(&self) -> String {
        self.endpoint(HEALTH_PATH)
    }
}

fn default_user_agent() -> String {
    format!("vigil/{}", env!("CARGO_PKG_VERSION"))
}
