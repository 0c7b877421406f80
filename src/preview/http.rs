//! reqwest-backed generation capability talking to the preview endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;

use crate::error::{ConfigError, TransportError};
use crate::preview::{BackendResponse, PreviewBackend};
use crate::rate_limit::middleware::IDENTITY_HEADER;

/// Validated client configuration.
#[derive(Debug, Clone)]
pub struct PreviewClientConfig {
    base_url: Url,
    bearer_token: Option<String>,
    identity: Option<String>,
    request_timeout: Duration,
}

impl PreviewClientConfig {
    /// Default request timeout. AI generation is slow; the server's own generation timeout
    /// should fire first.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    /// `base_url` must be an absolute http(s) URL.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        let url = Url::parse(base_url)
            .ok()
            .filter(|url| matches!(url.scheme(), "http" | "https"))
            .ok_or_else(|| ConfigError::InvalidBaseUrl(base_url.to_owned()))?;
        Ok(Self {
            base_url: url,
            bearer_token: None,
            identity: None,
            request_timeout: Self::DEFAULT_TIMEOUT,
        })
    }

    /// Send `Authorization: Bearer <token>` with every request.
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Send the identity header directly, for deployments without an auth proxy.
    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = Some(identity.into());
        self
    }

    /// Override the request timeout; must be > 0.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Result<Self, ConfigError> {
        if timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout(timeout));
        }
        self.request_timeout = timeout;
        Ok(self)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }
}

/// Calls `POST {base_url}/recipes/{recipe_id}/ai-preview`.
#[derive(Debug, Clone)]
pub struct HttpPreviewClient {
    client: reqwest::Client,
    config: PreviewClientConfig,
}

impl HttpPreviewClient {
    pub fn new(config: PreviewClientConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self { client, config })
    }

    /// URL of the preview endpoint for `recipe_id`, with the id percent-encoded.
    pub fn preview_url(&self, recipe_id: &str) -> Url {
        let mut url = self.config.base_url.clone();
        // http(s) URLs always have path segments.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["recipes", recipe_id, "ai-preview"]);
        }
        url
    }
}

#[async_trait]
impl PreviewBackend for HttpPreviewClient {
    async fn request_preview(&self, recipe_id: &str) -> Result<BackendResponse, TransportError> {
        let url = self.preview_url(recipe_id);
        tracing::debug!(%url, "Requesting AI preview");

        let mut request = self.client.post(url);
        if let Some(token) = &self.config.bearer_token {
            request = request.bearer_auth(token);
        }
        if let Some(identity) = &self.config.identity {
            request = request.header(IDENTITY_HEADER, identity);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(status, error = %e, "Failed to read preview response body");
                String::new()
            }
        };
        Ok(BackendResponse { status, body })
    }
}
