use axum::http::{header::RETRY_AFTER, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::error::{GenerationError, RepositoryError};
use crate::recipe::ApiErrorBody;

/// Errors the preview endpoint answers with.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Recipe ID is required")]
    MissingRecipeId,

    #[error("Rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Recipe not found")]
    RecipeNotFound,

    #[error("No dietary preferences")]
    NoPreferences,

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::MissingRecipeId | ApiError::NoPreferences => StatusCode::BAD_REQUEST,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::RecipeNotFound => StatusCode::NOT_FOUND,
            ApiError::Generation(GenerationError::Timeout { .. }) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Generation(GenerationError::Unavailable(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ApiError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ApiErrorBody {
        match self {
            ApiError::Unauthorized => ApiErrorBody::new("Unauthorized", "Authentication required"),
            ApiError::MissingRecipeId => ApiErrorBody::new("Bad request", "Recipe ID is required"),
            ApiError::RateLimited { retry_after_secs } => {
                ApiErrorBody::rate_limited(*retry_after_secs)
            }
            ApiError::RecipeNotFound => ApiErrorBody::new(
                "Recipe not found",
                "The recipe does not exist or you do not have access to it.",
            ),
            ApiError::NoPreferences => ApiErrorBody::no_preferences(),
            ApiError::Generation(GenerationError::Timeout { .. }) => ApiErrorBody::new(
                "AI service timeout",
                "The AI service took too long to respond. Please try again.",
            ),
            ApiError::Generation(GenerationError::Unavailable(_)) => ApiErrorBody::new(
                "AI service unavailable",
                "The AI service is temporarily unavailable. Please try again later.",
            ),
            ApiError::Repository(_) => {
                ApiErrorBody::new("Internal server error", "An unexpected error occurred")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, %status, "Preview request failed");
        }

        let body = Json(self.body());
        match self {
            ApiError::RateLimited { retry_after_secs } => {
                (status, [(RETRY_AFTER, retry_after_secs.to_string())], body).into_response()
            }
            _ => (status, body).into_response(),
        }
    }
}
