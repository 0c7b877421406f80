#![forbid(unsafe_code)]
#![cfg_attr(not(test), deny(clippy::all))]

//! # HealthyMeal preview core
//!
//! The pieces behind "modify this recipe for my diet":
//!
//! - **Rate limiting**: per-user fixed windows (10 AI previews per minute by default) with lazy
//!   expiry and a background sweep, plus a tower layer enforcing it on HTTP routes.
//! - **Preview endpoint**: `POST /recipes/{recipe_id}/ai-preview`, which loads the recipe and
//!   the user's dietary preferences and asks an AI modifier for a modified version under a
//!   timeout.
//! - **Preview state machine**: a client-side orchestrator that calls the endpoint and
//!   publishes exactly one of idle, loading, success or a classified error.
//!
//! Authentication, persistence and the AI provider are collaborators: the endpoint reads the
//! user id placed on the request by the auth proxy and talks to storage and the model through
//! the [`RecipeRepository`] and [`RecipeModifier`] traits.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use healthymeal::{HttpPreviewClient, PreviewClientConfig, PreviewOrchestrator, PreviewState};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = PreviewClientConfig::new("http://127.0.0.1:9")
//!         .unwrap()
//!         .with_identity("user-1");
//!     let orchestrator = PreviewOrchestrator::new(HttpPreviewClient::new(config).unwrap());
//!
//!     orchestrator.generate("recipe-1").await;
//!     match orchestrator.state() {
//!         PreviewState::Success(preview) => println!("{}", preview.modified_recipe.title),
//!         PreviewState::Error(err) => println!("{} ({})", err, err.kind()),
//!         _ => unreachable!("generate always ends in a terminal state"),
//!     }
//! }
//! ```

pub mod adaptive;
pub mod clock;
pub mod error;
pub mod prelude;
pub mod preview;
pub mod rate_limit;
pub mod recipe;
pub mod server;
pub mod telemetry;
pub mod timeout;

// Re-exports
pub use adaptive::DynamicConfig;
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use error::{ConfigError, GenerationError, PreviewError, RepositoryError, TransportError};
pub use preview::{
    BackendResponse, GuardedBackend, HttpPreviewClient, PreviewBackend, PreviewClientConfig,
    PreviewOrchestrator, PreviewState,
};
pub use rate_limit::{Decision, FixedWindowLimiter, RateLimitConfig, RateLimitLayer, RateLimiter};
pub use recipe::{
    AiMetadata, ApiErrorBody, DietaryPreferences, Modification, ModifiedRecipe, PreviewPayload,
    Recipe,
};
pub use server::{
    router, serve, ApiError, AppState, InMemoryRecipeRepository, RecipeModifier, RecipeRepository,
};
pub use timeout::TimeoutPolicy;
