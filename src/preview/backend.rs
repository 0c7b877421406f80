//! The generation capability the orchestrator drives.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TransportError;
use crate::rate_limit::{Decision, RateLimiter};
use crate::recipe::ApiErrorBody;

/// Raw HTTP-equivalent answer from the generation capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendResponse {
    pub status: u16,
    pub body: String,
}

impl BackendResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into() }
    }

    /// Serialize `body` as JSON.
    pub fn json<T: serde::Serialize>(status: u16, body: &T) -> Self {
        Self::new(status, serde_json::to_string(body).unwrap_or_default())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Asks for an AI preview of a recipe.
///
/// `Err` means no response was obtained at all; every HTTP status, error statuses included,
/// comes back as `Ok`.
#[async_trait]
pub trait PreviewBackend: Send + Sync {
    async fn request_preview(&self, recipe_id: &str) -> Result<BackendResponse, TransportError>;
}

#[async_trait]
impl<B: PreviewBackend + ?Sized> PreviewBackend for Arc<B> {
    async fn request_preview(&self, recipe_id: &str) -> Result<BackendResponse, TransportError> {
        (**self).request_preview(recipe_id).await
    }
}

/// Checks a [`RateLimiter`] before delegating to the inner backend.
///
/// A denial is answered locally with the same 429 response the preview endpoint sends, so it
/// classifies exactly like a server-side limit.
#[derive(Debug)]
pub struct GuardedBackend<B, L> {
    inner: B,
    limiter: L,
    identity: String,
}

impl<B, L> GuardedBackend<B, L> {
    pub fn new(inner: B, limiter: L, identity: impl Into<String>) -> Self {
        Self { inner, limiter, identity: identity.into() }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }
}

#[async_trait]
impl<B, L> PreviewBackend for GuardedBackend<B, L>
where
    B: PreviewBackend,
    L: RateLimiter,
{
    async fn request_preview(&self, recipe_id: &str) -> Result<BackendResponse, TransportError> {
        if let Decision::Denied { retry_after_secs } = self.limiter.check(&self.identity) {
            return Ok(BackendResponse::json(429, &ApiErrorBody::rate_limited(retry_after_secs)));
        }
        self.inner.request_preview(recipe_id).await
    }
}
