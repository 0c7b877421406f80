//! The AI preview endpoint.
//!
//! `POST /recipes/{recipe_id}/ai-preview` runs behind [`RateLimitLayer`], which admits at
//! most N requests per window per user and answers the rest with 429 + `Retry-After`.
//! Admitted requests load the recipe and the caller's dietary preferences, then ask the
//! [`RecipeModifier`] for a modification under a [`TimeoutPolicy`]. Nothing is persisted: the
//! client decides whether to save the preview as a new recipe.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Path, State};
use axum::routing::post;
use axum::{Extension, Json, Router};
use tokio::net::TcpListener;
use tracing::{info, warn};

pub mod error;
pub mod repository;

pub use error::ApiError;
pub use repository::{InMemoryRecipeRepository, RecipeModifier, RecipeRepository};

use crate::rate_limit::{FixedWindowLimiter, Identity, RateLimitLayer};
use crate::recipe::PreviewPayload;
use crate::timeout::TimeoutPolicy;

/// Route of the preview endpoint.
pub const PREVIEW_ROUTE: &str = "/recipes/{recipe_id}/ai-preview";

/// Shared handles the endpoint runs on.
#[derive(Clone)]
pub struct AppState {
    pub limiter: Arc<FixedWindowLimiter>,
    pub recipes: Arc<dyn RecipeRepository>,
    pub modifier: Arc<dyn RecipeModifier>,
    pub generation_timeout: TimeoutPolicy,
}

impl AppState {
    /// State with the default limiter (10 requests per minute) and generation timeout.
    pub fn new(recipes: Arc<dyn RecipeRepository>, modifier: Arc<dyn RecipeModifier>) -> Self {
        Self {
            limiter: Arc::new(FixedWindowLimiter::default()),
            recipes,
            modifier,
            generation_timeout: TimeoutPolicy::default(),
        }
    }

    pub fn with_limiter(mut self, limiter: Arc<FixedWindowLimiter>) -> Self {
        self.limiter = limiter;
        self
    }

    pub fn with_generation_timeout(mut self, timeout: TimeoutPolicy) -> Self {
        self.generation_timeout = timeout;
        self
    }
}

/// Router serving the preview endpoint.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(PREVIEW_ROUTE, post(preview_handler))
        .route_layer(RateLimitLayer::new(state.limiter.clone()))
        .with_state(state)
}

pub async fn preview_handler(
    State(state): State<AppState>,
    Extension(Identity(user_id)): Extension<Identity>,
    Path(recipe_id): Path<String>,
) -> Result<Json<PreviewPayload>, ApiError> {
    let recipe_id = recipe_id.trim();
    if recipe_id.is_empty() {
        return Err(ApiError::MissingRecipeId);
    }

    let recipe =
        state.recipes.find_recipe(&user_id, recipe_id).await?.ok_or(ApiError::RecipeNotFound)?;

    let preferences = state
        .recipes
        .find_preferences(&user_id)
        .await?
        .filter(|prefs| !prefs.is_empty())
        .ok_or(ApiError::NoPreferences)?;

    let start = Instant::now();
    let (modifier, recipe_ref, prefs_ref) = (&state.modifier, &recipe, &preferences);
    let modification = state
        .generation_timeout
        .execute(|| async move { modifier.modify(recipe_ref, prefs_ref).await })
        .await
        .inspect_err(|e| {
            warn!(user_id = %user_id, recipe_id, error = %e, "AI modification failed")
        })?;

    info!(
        user_id = %user_id,
        recipe_id,
        model = %modification.ai_metadata.model,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "AI preview generated"
    );

    Ok(Json(PreviewPayload {
        original_recipe: recipe,
        modified_recipe: modification.modified_recipe,
        ai_metadata: modification.ai_metadata,
        applied_preferences: preferences,
    }))
}

/// Serve the preview endpoint until `shutdown` resolves.
///
/// Starts the limiter's sweeper for the lifetime of the server and shuts the limiter down
/// afterwards.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let limiter = state.limiter.clone();
    limiter.start_sweeper();

    info!("Server running on {}", listener.local_addr()?);
    let result = axum::serve(listener, router(state)).with_graceful_shutdown(shutdown).await;

    limiter.shutdown();
    info!("Server shut down");
    result
}

/// Resolves on Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                warn!(error = %e, "Failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
