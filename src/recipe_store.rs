//! SQLite persistence for generated recipes and the generation audit trail.
//!
//! Each operation is a single statement against the pool; there are no
//! long-lived transactions. Macro snapshots are captured at save time and
//! never recomputed, even if the nutrition service's data changes later.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use thiserror::Error;
use uuid::Uuid;

use crate::macro_aggregator::MacroTotals;
use crate::recipe_schema::{
    CookingTime, CuisineType, DietaryRestriction, DifficultyLevel, IngredientQuantity, MealType,
    RecipeSpec,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("stored record is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("invalid rating {0}: must be between 1 and 5")]
    InvalidRating(i64),
}

/// A persisted recipe: the validated spec plus persistence metadata and the
/// macro snapshots taken when it was saved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredRecipe {
    pub id: String,
    pub title: String,
    pub servings: u32,
    pub ingredients: Vec<IngredientQuantity>,
    pub steps: Vec<String>,
    pub dietary_restriction: DietaryRestriction,
    pub cuisine_type: Option<CuisineType>,
    pub meal_type: Option<MealType>,
    pub cooking_time: Option<CookingTime>,
    pub difficulty_level: Option<DifficultyLevel>,
    pub nutrition_per_recipe: MacroTotals,
    pub nutrition_per_serving: MacroTotals,
    pub created_at: DateTime<Utc>,
    pub rating: Option<u8>,
    pub is_favorite: bool,
    pub tags: Vec<String>,
}

/// One generation attempt, successful or not. Append-only; entries are never
/// mutated and only removed by [`RecipeStore::clear_all`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationLogEntry {
    pub input_ingredients: String,
    pub recipe_id: Option<String>,
    pub success: bool,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Category predicates for stored-recipe queries. `None` fields match
/// everything, equivalent to omitting the predicate.
#[derive(Debug, Clone, Default)]
pub struct RecipeFilter {
    pub dietary_restriction: Option<DietaryRestriction>,
    pub cuisine_type: Option<CuisineType>,
    pub meal_type: Option<MealType>,
    pub cooking_time: Option<CookingTime>,
    pub difficulty_level: Option<DifficultyLevel>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StoreStats {
    pub total_recipes: i64,
    pub favorite_recipes: i64,
    pub average_rating: f64,
    pub total_attempts: i64,
    pub success_rate: f64,
}

#[derive(Debug, FromRow)]
struct RecipeRow {
    id: String,
    title: String,
    servings: i64,
    ingredients: String,
    steps: String,
    nutrition_per_recipe: String,
    nutrition_per_serving: String,
    created_at: DateTime<Utc>,
    rating: Option<i64>,
    is_favorite: bool,
    tags: Option<String>,
    dietary_restriction: Option<String>,
    cuisine_type: Option<String>,
    meal_type: Option<String>,
    cooking_time: Option<String>,
    difficulty_level: Option<String>,
}

const RECIPE_COLUMNS: &str = "id, title, servings, ingredients, steps, \
nutrition_per_recipe, nutrition_per_serving, created_at, rating, is_favorite, tags, \
dietary_restriction, cuisine_type, meal_type, cooking_time, difficulty_level";

impl RecipeRow {
    fn into_stored(self) -> Result<StoredRecipe, StoreError> {
        Ok(StoredRecipe {
            id: self.id,
            title: self.title,
            servings: self.servings.max(0) as u32,
            ingredients: serde_json::from_str(&self.ingredients)?,
            steps: serde_json::from_str(&self.steps)?,
            dietary_restriction: self
                .dietary_restriction
                .as_deref()
                .and_then(DietaryRestriction::from_str)
                .unwrap_or_default(),
            cuisine_type: self.cuisine_type.as_deref().and_then(CuisineType::from_str),
            meal_type: self.meal_type.as_deref().and_then(MealType::from_str),
            cooking_time: self.cooking_time.as_deref().and_then(CookingTime::from_str),
            difficulty_level: self
                .difficulty_level
                .as_deref()
                .and_then(DifficultyLevel::from_str),
            nutrition_per_recipe: serde_json::from_str(&self.nutrition_per_recipe)?,
            nutrition_per_serving: serde_json::from_str(&self.nutrition_per_serving)?,
            created_at: self.created_at,
            rating: self.rating.map(|r| r.clamp(1, 5) as u8),
            is_favorite: self.is_favorite,
            tags: match self.tags {
                Some(tags) => serde_json::from_str(&tags)?,
                None => Vec::new(),
            },
        })
    }
}

#[derive(Debug, FromRow)]
struct HistoryRow {
    input_ingredients: String,
    recipe_id: Option<String>,
    success: bool,
    error_message: Option<String>,
    created_at: DateTime<Utc>,
}

pub struct RecipeStore {
    pool: SqlitePool,
}

impl RecipeStore {
    /// Open (creating if needed) a store at the given path and bring its
    /// schema up to date.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// In-memory store for tests. A single connection keeps every statement
    /// on the same database.
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// Create the base tables and apply column additions for stores created
    /// before the category fields existed. Idempotent: re-running is a no-op.
    async fn init_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS recipes (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                servings INTEGER NOT NULL,
                ingredients TEXT NOT NULL,
                steps TEXT NOT NULL,
                nutrition_per_recipe TEXT NOT NULL,
                nutrition_per_serving TEXT NOT NULL,
                created_at TEXT NOT NULL,
                rating INTEGER,
                is_favorite BOOLEAN NOT NULL DEFAULT FALSE,
                tags TEXT
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS generation_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                input_ingredients TEXT NOT NULL,
                recipe_id TEXT,
                success BOOLEAN NOT NULL,
                error_message TEXT,
                created_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        // Category columns arrived after the first deployed schema. SQLite
        // has no ADD COLUMN IF NOT EXISTS, so apply each defensively.
        const CATEGORY_MIGRATIONS: &[&str] = &[
            "ALTER TABLE recipes ADD COLUMN dietary_restriction TEXT",
            "ALTER TABLE recipes ADD COLUMN cuisine_type TEXT",
            "ALTER TABLE recipes ADD COLUMN meal_type TEXT",
            "ALTER TABLE recipes ADD COLUMN cooking_time TEXT",
            "ALTER TABLE recipes ADD COLUMN difficulty_level TEXT",
        ];
        for statement in CATEGORY_MIGRATIONS {
            if let Err(err) = sqlx::query(statement).execute(&self.pool).await {
                if !err.to_string().contains("duplicate column name") {
                    return Err(err.into());
                }
            }
        }

        Ok(())
    }

    /// Persist a repaired recipe with its macro snapshots. Returns the new id.
    pub async fn save_recipe(
        &self,
        recipe: &RecipeSpec,
        nutrition_per_recipe: &MacroTotals,
        nutrition_per_serving: &MacroTotals,
        tags: &[String],
    ) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO recipes (
                id, title, servings, ingredients, steps,
                nutrition_per_recipe, nutrition_per_serving, created_at, tags,
                dietary_restriction, cuisine_type, meal_type, cooking_time, difficulty_level
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&recipe.title)
        .bind(i64::from(recipe.servings))
        .bind(serde_json::to_string(&recipe.ingredients)?)
        .bind(serde_json::to_string(&recipe.steps)?)
        .bind(serde_json::to_string(nutrition_per_recipe)?)
        .bind(serde_json::to_string(nutrition_per_serving)?)
        .bind(Utc::now())
        .bind(serde_json::to_string(tags)?)
        .bind(recipe.dietary_restriction.as_str())
        .bind(recipe.cuisine_type.map(|v| v.as_str()))
        .bind(recipe.meal_type.map(|v| v.as_str()))
        .bind(recipe.cooking_time.map(|v| v.as_str()))
        .bind(recipe.difficulty_level.map(|v| v.as_str()))
        .execute(&self.pool)
        .await?;
        Ok(id)
    }

    pub async fn get_recipe(&self, id: &str) -> Result<Option<StoredRecipe>, StoreError> {
        let row: Option<RecipeRow> = sqlx::query_as(&format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(RecipeRow::into_stored).transpose()
    }

    pub async fn list_recipes(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<StoredRecipe>, StoreError> {
        let rows: Vec<RecipeRow> = sqlx::query_as(&format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes ORDER BY created_at DESC LIMIT ? OFFSET ?"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(RecipeRow::into_stored).collect()
    }

    /// Match a substring against recipe titles or the ingredient JSON blob.
    pub async fn search_recipes(
        &self,
        query: &str,
        limit: i64,
    ) -> Result<Vec<StoredRecipe>, StoreError> {
        let pattern = format!("%{query}%");
        let rows: Vec<RecipeRow> = sqlx::query_as(&format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes \
             WHERE title LIKE ? OR ingredients LIKE ? \
             ORDER BY created_at DESC LIMIT ?"
        ))
        .bind(&pattern)
        .bind(&pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(RecipeRow::into_stored).collect()
    }

    /// Stored recipes matching every present category predicate, newest
    /// first. An empty filter returns everything.
    pub async fn filter_recipes(
        &self,
        filter: &RecipeFilter,
    ) -> Result<Vec<StoredRecipe>, StoreError> {
        let mut predicates = Vec::new();
        let mut values = Vec::new();
        if let Some(v) = filter.dietary_restriction {
            predicates.push("dietary_restriction = ?");
            values.push(v.as_str());
        }
        if let Some(v) = filter.cuisine_type {
            predicates.push("cuisine_type = ?");
            values.push(v.as_str());
        }
        if let Some(v) = filter.meal_type {
            predicates.push("meal_type = ?");
            values.push(v.as_str());
        }
        if let Some(v) = filter.cooking_time {
            predicates.push("cooking_time = ?");
            values.push(v.as_str());
        }
        if let Some(v) = filter.difficulty_level {
            predicates.push("difficulty_level = ?");
            values.push(v.as_str());
        }

        let where_clause = if predicates.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", predicates.join(" AND "))
        };
        let sql = format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes{where_clause} ORDER BY created_at DESC"
        );

        let mut query = sqlx::query_as::<_, RecipeRow>(&sql);
        for value in values {
            query = query.bind(value);
        }
        let rows = query.fetch_all(&self.pool).await?;
        rows.into_iter().map(RecipeRow::into_stored).collect()
    }

    pub async fn favorites(&self) -> Result<Vec<StoredRecipe>, StoreError> {
        let rows: Vec<RecipeRow> = sqlx::query_as(&format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes WHERE is_favorite = TRUE ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(RecipeRow::into_stored).collect()
    }

    /// Set a recipe's rating. Returns whether a row was updated; ratings
    /// outside 1..=5 are rejected without touching the store.
    pub async fn update_rating(&self, id: &str, rating: i64) -> Result<bool, StoreError> {
        if !(1..=5).contains(&rating) {
            return Err(StoreError::InvalidRating(rating));
        }
        let result = sqlx::query("UPDATE recipes SET rating = ? WHERE id = ?")
            .bind(rating)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Flip a recipe's favorite flag. Returns whether a row was updated.
    pub async fn toggle_favorite(&self, id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE recipes SET is_favorite = NOT is_favorite WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Permanently delete a recipe. History entries keep their weak
    /// reference to the deleted id.
    pub async fn delete_recipe(&self, id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM recipes WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Record a generation attempt in the audit trail.
    pub async fn log_generation(
        &self,
        input_ingredients: &str,
        recipe_id: Option<&str>,
        success: bool,
        error_message: Option<&str>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO generation_log (
                input_ingredients, recipe_id, success, error_message, created_at
            ) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(input_ingredients)
        .bind(recipe_id)
        .bind(success)
        .bind(error_message)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn recent_history(&self, limit: i64) -> Result<Vec<GenerationLogEntry>, StoreError> {
        let rows: Vec<HistoryRow> = sqlx::query_as(
            "SELECT input_ingredients, recipe_id, success, error_message, created_at \
             FROM generation_log ORDER BY created_at DESC, id DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|row| GenerationLogEntry {
                input_ingredients: row.input_ingredients,
                recipe_id: row.recipe_id,
                success: row.success,
                error_message: row.error_message,
                created_at: row.created_at,
            })
            .collect())
    }

    pub async fn stats(&self) -> Result<StoreStats, StoreError> {
        let total_recipes: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM recipes")
            .fetch_one(&self.pool)
            .await?;
        let favorite_recipes: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM recipes WHERE is_favorite = TRUE")
                .fetch_one(&self.pool)
                .await?;
        let average_rating: Option<f64> =
            sqlx::query_scalar("SELECT AVG(rating) FROM recipes WHERE rating IS NOT NULL")
                .fetch_one(&self.pool)
                .await?;
        let total_attempts: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM generation_log")
            .fetch_one(&self.pool)
            .await?;
        let successful_attempts: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM generation_log WHERE success = TRUE")
                .fetch_one(&self.pool)
                .await?;

        let success_rate = if total_attempts > 0 {
            (successful_attempts as f64 / total_attempts as f64 * 10_000.0).round() / 100.0
        } else {
            0.0
        };

        Ok(StoreStats {
            total_recipes,
            favorite_recipes,
            average_rating: (average_rating.unwrap_or(0.0) * 100.0).round() / 100.0,
            total_attempts,
            success_rate,
        })
    }

    /// Wipe recipes and the generation log together.
    pub async fn clear_all(&self) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM recipes").execute(&self.pool).await?;
        sqlx::query("DELETE FROM generation_log")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::macro_aggregator::per_serving;

    fn sample_recipe() -> RecipeSpec {
        RecipeSpec {
            title: "Chicken and Quinoa Bowl".to_string(),
            servings: 2,
            ingredients: vec![
                IngredientQuantity {
                    name: "chicken breast".to_string(),
                    grams: 300.0,
                },
                IngredientQuantity {
                    name: "quinoa".to_string(),
                    grams: 150.0,
                },
            ],
            steps: vec![
                "Rinse and simmer the quinoa.".to_string(),
                "Sear the chicken.".to_string(),
                "Assemble the bowl.".to_string(),
            ],
            dietary_restriction: DietaryRestriction::None,
            cuisine_type: Some(CuisineType::Mediterranean),
            meal_type: Some(MealType::Dinner),
            cooking_time: Some(CookingTime::Medium),
            difficulty_level: Some(DifficultyLevel::Beginner),
        }
    }

    fn sample_totals() -> MacroTotals {
        MacroTotals {
            protein_g: 99.0,
            carbs_g: 96.0,
            fat_g: 14.0,
            fiber_g: 10.5,
            calories: 906.0,
        }
    }

    #[tokio::test]
    async fn save_and_get_round_trips() {
        let store = RecipeStore::open_in_memory().await.unwrap();
        let recipe = sample_recipe();
        let totals = sample_totals();
        let per = per_serving(&totals, recipe.servings);

        let id = store
            .save_recipe(&recipe, &totals, &per, &["healthy".to_string()])
            .await
            .unwrap();
        let stored = store.get_recipe(&id).await.unwrap().unwrap();

        assert_eq!(stored.title, recipe.title);
        assert_eq!(stored.servings, 2);
        assert_eq!(stored.ingredients, recipe.ingredients);
        assert_eq!(stored.steps, recipe.steps);
        assert_eq!(stored.cuisine_type, Some(CuisineType::Mediterranean));
        assert_eq!(stored.cooking_time, Some(CookingTime::Medium));
        assert_eq!(stored.nutrition_per_recipe, totals);
        assert_eq!(stored.nutrition_per_serving, per);
        assert_eq!(stored.tags, vec!["healthy".to_string()]);
        assert_eq!(stored.rating, None);
        assert!(!stored.is_favorite);
    }

    #[tokio::test]
    async fn missing_recipe_is_none() {
        let store = RecipeStore::open_in_memory().await.unwrap();
        assert!(store.get_recipe("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn rating_bounds_are_enforced() {
        let store = RecipeStore::open_in_memory().await.unwrap();
        let totals = sample_totals();
        let id = store
            .save_recipe(&sample_recipe(), &totals, &totals, &[])
            .await
            .unwrap();

        for bad in [0, 6, -1] {
            assert!(matches!(
                store.update_rating(&id, bad).await,
                Err(StoreError::InvalidRating(_))
            ));
        }
        assert_eq!(store.get_recipe(&id).await.unwrap().unwrap().rating, None);

        assert!(store.update_rating(&id, 4).await.unwrap());
        assert_eq!(store.get_recipe(&id).await.unwrap().unwrap().rating, Some(4));

        // Unknown id: valid rating, no row touched.
        assert!(!store.update_rating("nope", 3).await.unwrap());
    }

    #[tokio::test]
    async fn favorite_toggles_in_place() {
        let store = RecipeStore::open_in_memory().await.unwrap();
        let totals = sample_totals();
        let id = store
            .save_recipe(&sample_recipe(), &totals, &totals, &[])
            .await
            .unwrap();

        assert!(store.toggle_favorite(&id).await.unwrap());
        assert!(store.get_recipe(&id).await.unwrap().unwrap().is_favorite);
        assert_eq!(store.favorites().await.unwrap().len(), 1);

        assert!(store.toggle_favorite(&id).await.unwrap());
        assert!(!store.get_recipe(&id).await.unwrap().unwrap().is_favorite);
        assert!(store.favorites().await.unwrap().is_empty());

        assert!(!store.toggle_favorite("nope").await.unwrap());
    }

    #[tokio::test]
    async fn delete_is_permanent() {
        let store = RecipeStore::open_in_memory().await.unwrap();
        let totals = sample_totals();
        let id = store
            .save_recipe(&sample_recipe(), &totals, &totals, &[])
            .await
            .unwrap();

        assert!(store.delete_recipe(&id).await.unwrap());
        assert!(store.get_recipe(&id).await.unwrap().is_none());
        assert!(!store.delete_recipe(&id).await.unwrap());
    }

    #[tokio::test]
    async fn filters_intersect_and_empty_filter_matches_all() {
        let store = RecipeStore::open_in_memory().await.unwrap();
        let totals = sample_totals();

        let mediterranean = sample_recipe();
        store
            .save_recipe(&mediterranean, &totals, &totals, &[])
            .await
            .unwrap();

        let mut thai = sample_recipe();
        thai.title = "Tofu Pad Thai".to_string();
        thai.cuisine_type = Some(CuisineType::Thai);
        thai.dietary_restriction = DietaryRestriction::Vegan;
        store.save_recipe(&thai, &totals, &totals, &[]).await.unwrap();

        let all = store.filter_recipes(&RecipeFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);

        let vegan_thai = store
            .filter_recipes(&RecipeFilter {
                dietary_restriction: Some(DietaryRestriction::Vegan),
                cuisine_type: Some(CuisineType::Thai),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(vegan_thai.len(), 1);
        assert_eq!(vegan_thai[0].title, "Tofu Pad Thai");

        let vegan_french = store
            .filter_recipes(&RecipeFilter {
                dietary_restriction: Some(DietaryRestriction::Vegan),
                cuisine_type: Some(CuisineType::French),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(vegan_french.is_empty());
    }

    #[tokio::test]
    async fn search_matches_title_and_ingredients() {
        let store = RecipeStore::open_in_memory().await.unwrap();
        let totals = sample_totals();
        store
            .save_recipe(&sample_recipe(), &totals, &totals, &[])
            .await
            .unwrap();

        assert_eq!(store.search_recipes("Quinoa", 10).await.unwrap().len(), 1);
        assert_eq!(store.search_recipes("chicken", 10).await.unwrap().len(), 1);
        assert!(store.search_recipes("tiramisu", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn generation_log_records_failures() {
        let store = RecipeStore::open_in_memory().await.unwrap();
        store
            .log_generation("chicken, rice", None, false, Some("no JSON found"))
            .await
            .unwrap();

        let history = store.recent_history(10).await.unwrap();
        assert_eq!(history.len(), 1);
        assert!(!history[0].success);
        assert_eq!(history[0].recipe_id, None);
        assert_eq!(history[0].error_message.as_deref(), Some("no JSON found"));
    }

    #[tokio::test]
    async fn stats_cover_recipes_and_attempts() {
        let store = RecipeStore::open_in_memory().await.unwrap();

        let empty = store.stats().await.unwrap();
        assert_eq!(empty.total_recipes, 0);
        assert_eq!(empty.total_attempts, 0);
        assert_eq!(empty.success_rate, 0.0);
        assert_eq!(empty.average_rating, 0.0);

        let totals = sample_totals();
        let id = store
            .save_recipe(&sample_recipe(), &totals, &totals, &[])
            .await
            .unwrap();
        store.update_rating(&id, 5).await.unwrap();
        store.toggle_favorite(&id).await.unwrap();
        store
            .log_generation("chicken, quinoa", Some(&id), true, None)
            .await
            .unwrap();
        store
            .log_generation("gravel", None, false, Some("validation failed"))
            .await
            .unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total_recipes, 1);
        assert_eq!(stats.favorite_recipes, 1);
        assert_eq!(stats.average_rating, 5.0);
        assert_eq!(stats.total_attempts, 2);
        assert_eq!(stats.success_rate, 50.0);
    }

    #[tokio::test]
    async fn clear_all_wipes_recipes_and_history() {
        let store = RecipeStore::open_in_memory().await.unwrap();
        let totals = sample_totals();
        store
            .save_recipe(&sample_recipe(), &totals, &totals, &[])
            .await
            .unwrap();
        store
            .log_generation("chicken", None, true, None)
            .await
            .unwrap();

        store.clear_all().await.unwrap();
        assert!(store.list_recipes(10, 0).await.unwrap().is_empty());
        assert!(store.recent_history(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn schema_init_is_idempotent() {
        let store = RecipeStore::open_in_memory().await.unwrap();
        store.init_schema().await.unwrap();
        store.init_schema().await.unwrap();
    }

    #[tokio::test]
    async fn migration_adds_columns_to_a_legacy_store() {
        // A store created with the original schema, before the category
        // columns existed.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy.db");

        {
            let options = SqliteConnectOptions::new()
                .filename(&path)
                .create_if_missing(true);
            let pool = SqlitePoolOptions::new().connect_with(options).await.unwrap();
            sqlx::query(
                "CREATE TABLE recipes (
                    id TEXT PRIMARY KEY,
                    title TEXT NOT NULL,
                    servings INTEGER NOT NULL,
                    ingredients TEXT NOT NULL,
                    steps TEXT NOT NULL,
                    nutrition_per_recipe TEXT NOT NULL,
                    nutrition_per_serving TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    rating INTEGER,
                    is_favorite BOOLEAN NOT NULL DEFAULT FALSE,
                    tags TEXT
                )",
            )
            .execute(&pool)
            .await
            .unwrap();
            pool.close().await;
        }

        let store = RecipeStore::open(&path).await.unwrap();
        let totals = sample_totals();
        let id = store
            .save_recipe(&sample_recipe(), &totals, &totals, &[])
            .await
            .unwrap();
        let stored = store.get_recipe(&id).await.unwrap().unwrap();
        assert_eq!(stored.cuisine_type, Some(CuisineType::Mediterranean));

        // Re-opening runs the migrations again without error.
        drop(store);
        let reopened = RecipeStore::open(&path).await.unwrap();
        assert_eq!(reopened.list_recipes(10, 0).await.unwrap().len(), 1);
    }
}
