//! Convenient re-exports for wiring the preview endpoint and client.
pub use crate::{
    error::{GenerationError, PreviewError, TransportError},
    preview::{
        HttpPreviewClient, PreviewBackend, PreviewClientConfig, PreviewOrchestrator, PreviewState,
    },
    rate_limit::{Decision, FixedWindowLimiter, RateLimitConfig, RateLimitLayer, RateLimiter},
    recipe::{DietaryPreferences, Modification, PreviewPayload, Recipe},
    server::{router, serve, AppState, RecipeModifier, RecipeRepository},
    timeout::TimeoutPolicy,
};
