use std::convert::Infallible;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::extract::Request;
use axum::response::{IntoResponse, Response};
use futures::future::BoxFuture;
use tower_layer::Layer;
use tower_service::Service;

use crate::rate_limit::{Decision, RateLimiter};
use crate::server::ApiError;

/// Header carrying the authenticated user id, set by the auth proxy in front of the service.
pub const IDENTITY_HEADER: &str = "x-user-id";

/// Identity the request was rate limited under. Inserted into request extensions once the
/// limiter admits the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity(pub String);

type IdentifyFn = Arc<dyn Fn(&Request) -> Option<String> + Send + Sync>;

fn identity_from_header(req: &Request) -> Option<String> {
    req.headers()
        .get(IDENTITY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}

/// A layer that enforces per-identity limits using a [`RateLimiter`].
pub struct RateLimitLayer<L> {
    limiter: Arc<L>,
    identify: IdentifyFn,
}

impl<L> RateLimitLayer<L> {
    /// Create a layer keyed by the [`IDENTITY_HEADER`] header.
    pub fn new(limiter: Arc<L>) -> Self {
        Self { limiter, identify: Arc::new(identity_from_header) }
    }

    /// Override how the identity is read from a request.
    pub fn with_identity<F>(mut self, identify: F) -> Self
    where
        F: Fn(&Request) -> Option<String> + Send + Sync + 'static,
    {
        self.identify = Arc::new(identify);
        self
    }
}

impl<L> Clone for RateLimitLayer<L> {
    fn clone(&self) -> Self {
        Self { limiter: self.limiter.clone(), identify: self.identify.clone() }
    }
}

impl<S, L> Layer<S> for RateLimitLayer<L> {
    type Service = RateLimitService<S, L>;

    fn layer(&self, service: S) -> Self::Service {
        RateLimitService {
            inner: service,
            limiter: self.limiter.clone(),
            identify: self.identify.clone(),
        }
    }
}

/// Middleware service that enforces rate limits.
pub struct RateLimitService<S, L> {
    inner: S,
    limiter: Arc<L>,
    identify: IdentifyFn,
}

impl<S: Clone, L> Clone for RateLimitService<S, L> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            limiter: self.limiter.clone(),
            identify: self.identify.clone(),
        }
    }
}

impl<S, L> Service<Request> for RateLimitService<S, L>
where
    S: Service<Request, Response = Response, Error = Infallible> + Clone + Send + 'static,
    S::Future: Send + 'static,
    L: RateLimiter + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response, Infallible>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        let Some(identity) = (self.identify)(&req) else {
            return Box::pin(async { Ok(ApiError::Unauthorized.into_response()) });
        };

        match self.limiter.check(&identity) {
            Decision::Denied { retry_after_secs } => {
                let response = ApiError::RateLimited { retry_after_secs }.into_response();
                Box::pin(async move { Ok(response) })
            }
            Decision::Allowed { .. } => {
                req.extensions_mut().insert(Identity(identity));
                // The service polled ready handles this request; the clone waits for the next.
                let clone = self.inner.clone();
                let mut inner = std::mem::replace(&mut self.inner, clone);
                Box::pin(async move { inner.call(req).await })
            }
        }
    }
}
