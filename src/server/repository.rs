//! Persistence collaborators for the preview endpoint.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::error::{GenerationError, RepositoryError};
use crate::recipe::{DietaryPreferences, Modification, Recipe};

/// Read access to recipes and preferences, scoped to the requesting user.
#[async_trait]
pub trait RecipeRepository: Send + Sync {
    /// The recipe, if it exists and belongs to `user_id`.
    async fn find_recipe(
        &self,
        user_id: &str,
        recipe_id: &str,
    ) -> Result<Option<Recipe>, RepositoryError>;

    /// The user's dietary preferences, if any were saved.
    async fn find_preferences(
        &self,
        user_id: &str,
    ) -> Result<Option<DietaryPreferences>, RepositoryError>;
}

/// Produces an AI modification of a recipe. The provider integration lives elsewhere.
#[async_trait]
pub trait RecipeModifier: Send + Sync {
    async fn modify(
        &self,
        recipe: &Recipe,
        preferences: &DietaryPreferences,
    ) -> Result<Modification, GenerationError>;
}

#[derive(Debug, Default)]
struct Tables {
    // (user_id, recipe_id) -> recipe
    recipes: HashMap<(String, String), Recipe>,
    preferences: HashMap<String, DietaryPreferences>,
}

/// Simple in-memory repository for tests and local runs.
#[derive(Default, Clone, Debug)]
pub struct InMemoryRecipeRepository {
    data: Arc<Mutex<Tables>>,
}

impl InMemoryRecipeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, RepositoryError> {
        self.data.lock().map_err(|_| RepositoryError::msg("in-memory repository lock poisoned"))
    }

    /// Store `recipe` as owned by `user_id`, replacing any recipe with the same id.
    pub fn insert_recipe(
        &self,
        user_id: impl Into<String>,
        recipe: Recipe,
    ) -> Result<(), RepositoryError> {
        self.lock()?.recipes.insert((user_id.into(), recipe.id.clone()), recipe);
        Ok(())
    }

    pub fn set_preferences(
        &self,
        user_id: impl Into<String>,
        preferences: DietaryPreferences,
    ) -> Result<(), RepositoryError> {
        self.lock()?.preferences.insert(user_id.into(), preferences);
        Ok(())
    }
}

#[async_trait]
impl RecipeRepository for InMemoryRecipeRepository {
    async fn find_recipe(
        &self,
        user_id: &str,
        recipe_id: &str,
    ) -> Result<Option<Recipe>, RepositoryError> {
        let tables = self.lock()?;
        Ok(tables.recipes.get(&(user_id.to_owned(), recipe_id.to_owned())).cloned())
    }

    async fn find_preferences(
        &self,
        user_id: &str,
    ) -> Result<Option<DietaryPreferences>, RepositoryError> {
        Ok(self.lock()?.preferences.get(user_id).cloned())
    }
}
