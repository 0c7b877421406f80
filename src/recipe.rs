//! Recipe payloads exchanged by the preview endpoint and its clients.
//!
//! Field names are snake_case on the wire.

use serde::{Deserialize, Serialize};

/// A stored recipe as the preview endpoint sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    pub title: String,
    pub ingredients: String,
    pub instructions: String,
}

/// AI-generated candidate modification. Not persisted until the user saves it as a new recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifiedRecipe {
    pub title: String,
    pub ingredients: String,
    pub instructions: String,
    /// Why the AI changed what it changed.
    pub explanation: String,
}

/// Provenance of a generated modification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiMetadata {
    pub model: String,
    pub provider: String,
    /// Milliseconds spent waiting for the provider.
    pub generation_duration: u64,
    pub raw_response: String,
}

/// A user's dietary preferences.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DietaryPreferences {
    #[serde(default)]
    pub diet_type: Option<String>,
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub disliked_ingredients: Vec<String>,
}

impl DietaryPreferences {
    /// True when nothing is set, which the preview endpoint treats like missing preferences.
    pub fn is_empty(&self) -> bool {
        !matches!(self.diet_type.as_deref(), Some(diet) if !diet.trim().is_empty())
            && self.allergies.is_empty()
            && self.disliked_ingredients.is_empty()
    }
}

/// What the AI modifier collaborator returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modification {
    pub modified_recipe: ModifiedRecipe,
    pub ai_metadata: AiMetadata,
}

/// Successful preview response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewPayload {
    pub original_recipe: Recipe,
    pub modified_recipe: ModifiedRecipe,
    pub ai_metadata: AiMetadata,
    pub applied_preferences: DietaryPreferences,
}

/// Generic error response body.
///
/// `action` accompanies missing-preferences errors; `retry_after` accompanies rate limits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

/// `error` value marking a 400 caused by missing dietary preferences.
pub const NO_PREFERENCES_ERROR: &str = "No dietary preferences";
/// `error` value of a 429 response.
pub const RATE_LIMIT_ERROR: &str = "Rate limit exceeded";
/// `message` value of a 429 response.
pub const RATE_LIMIT_MESSAGE: &str =
    "You've made too many AI modification requests. Please wait before trying again.";

impl ApiErrorBody {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self { error: Some(error.into()), message: Some(message.into()), ..Self::default() }
    }

    /// Body of a 429 response.
    pub fn rate_limited(retry_after_secs: u64) -> Self {
        Self {
            retry_after: Some(retry_after_secs),
            ..Self::new(RATE_LIMIT_ERROR, RATE_LIMIT_MESSAGE)
        }
    }

    /// Body of a 400 response for a user without dietary preferences.
    pub fn no_preferences() -> Self {
        Self {
            action: Some("Set your dietary preferences in your profile".into()),
            ..Self::new(
                NO_PREFERENCES_ERROR,
                "You need to set your dietary preferences before using AI modification.",
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn preferences_emptiness() {
        assert!(DietaryPreferences::default().is_empty());
        assert!(DietaryPreferences { diet_type: Some("  ".into()), ..Default::default() }
            .is_empty());
        assert!(!DietaryPreferences { allergies: vec!["peanuts".into()], ..Default::default() }
            .is_empty());
        assert!(!DietaryPreferences { diet_type: Some("vegan".into()), ..Default::default() }
            .is_empty());
    }

    #[test]
    fn error_body_tolerates_missing_fields() {
        let body: ApiErrorBody =
            serde_json::from_value(json!({ "retry_after": 42 })).expect("valid body");
        assert_eq!(body.retry_after, Some(42));
        assert_eq!(body.error, None);
    }

    #[test]
    fn rate_limited_body_shape() {
        let value = serde_json::to_value(ApiErrorBody::rate_limited(17)).expect("serializable");
        assert_eq!(
            value,
            json!({
                "error": "Rate limit exceeded",
                "message": RATE_LIMIT_MESSAGE,
                "retry_after": 17
            })
        );
    }

    #[test]
    fn preferences_default_missing_lists() {
        let prefs: DietaryPreferences =
            serde_json::from_value(json!({ "diet_type": "keto" })).expect("valid prefs");
        assert_eq!(prefs.diet_type.as_deref(), Some("keto"));
        assert!(prefs.allergies.is_empty());
    }
}
