//! Recipe repository
//!
//! Ingredients are stored by weight. The quantity and unit they were
//! entered with are kept for display only.

use anyhow::Result;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RecipeRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub servings: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Ingredient joined with the per-100g values of its food
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct IngredientRow {
    pub id: Uuid,
    pub recipe_id: Uuid,
    pub food_item_id: Uuid,
    pub food_name: String,
    pub grams: Decimal,
    pub quantity: Decimal,
    pub unit: String,
    pub sort_order: i32,
    pub calories: Decimal,
    pub protein_g: Decimal,
    pub carbs_g: Decimal,
    pub fat_g: Decimal,
}

#[derive(Debug, Clone)]
pub struct CreateRecipe {
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub servings: Decimal,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateRecipe {
    pub name: Option<String>,
    pub description: Option<String>,
    pub servings: Option<Decimal>,
}

#[derive(Debug, Clone)]
pub struct NewIngredient {
    pub food_item_id: Uuid,
    pub grams: Decimal,
    pub quantity: Decimal,
    pub unit: String,
}

const RECIPE_COLUMNS: &str = "id, user_id, name, description, servings, created_at, updated_at";

const INGREDIENT_SELECT: &str = r#"
    SELECT ri.id, ri.recipe_id, ri.food_item_id, f.name AS food_name,
           ri.grams, ri.quantity, ri.unit, ri.sort_order,
           f.calories, f.protein_g, f.carbs_g, f.fat_g
    FROM recipe_ingredients ri
    JOIN food_items f ON f.id = ri.food_item_id
"#;

pub struct RecipeRepository;

impl RecipeRepository {
    /// Create a recipe and its ingredients in one transaction
    pub async fn create(
        db: &PgPool,
        input: CreateRecipe,
        ingredients: Vec<NewIngredient>,
    ) -> Result<RecipeRecord> {
        let mut tx = db.begin().await?;

        let recipe = sqlx::query_as::<_, RecipeRecord>(&format!(
            r#"
            INSERT INTO recipes (user_id, name, description, servings)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            RECIPE_COLUMNS
        ))
        .bind(input.user_id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.servings)
        .fetch_one(&mut *tx)
        .await?;

        for (index, ingredient) in ingredients.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO recipe_ingredients (recipe_id, food_item_id, grams, quantity, unit, sort_order)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(recipe.id)
            .bind(ingredient.food_item_id)
            .bind(ingredient.grams)
            .bind(ingredient.quantity)
            .bind(&ingredient.unit)
            .bind(index as i32)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(recipe)
    }

    pub async fn find_by_id_and_user(
        db: &PgPool,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<RecipeRecord>> {
        let recipe = sqlx::query_as::<_, RecipeRecord>(&format!(
            "SELECT {} FROM recipes WHERE id = $1 AND user_id = $2",
            RECIPE_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await?;

        Ok(recipe)
    }

    pub async fn list_by_user(db: &PgPool, user_id: Uuid) -> Result<Vec<RecipeRecord>> {
        let recipes = sqlx::query_as::<_, RecipeRecord>(&format!(
            "SELECT {} FROM recipes WHERE user_id = $1 ORDER BY name ASC",
            RECIPE_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(db)
        .await?;

        Ok(recipes)
    }

    pub async fn update(
        db: &PgPool,
        id: Uuid,
        user_id: Uuid,
        input: UpdateRecipe,
    ) -> Result<Option<RecipeRecord>> {
        let recipe = sqlx::query_as::<_, RecipeRecord>(&format!(
            r#"
            UPDATE recipes SET
                name        = COALESCE($3, name),
                description = COALESCE($4, description),
                servings    = COALESCE($5, servings),
                updated_at  = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {}
            "#,
            RECIPE_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.servings)
        .fetch_optional(db)
        .await?;

        Ok(recipe)
    }

    /// Delete a recipe; its ingredients and diary rows go with it
    /// Diary rows that log a recipe
    pub async fn usage_count(db: &PgPool, id: Uuid) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM food_logs WHERE recipe_id = $1")
                .bind(id)
                .fetch_one(db)
                .await?;

        Ok(count)
    }

    pub async fn delete(db: &PgPool, id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM recipes WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Append an ingredient after the existing ones
    pub async fn add_ingredient(
        db: &PgPool,
        recipe_id: Uuid,
        ingredient: NewIngredient,
    ) -> Result<Uuid> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO recipe_ingredients (recipe_id, food_item_id, grams, quantity, unit, sort_order)
            VALUES ($1, $2, $3, $4, $5,
                    COALESCE((SELECT MAX(sort_order) + 1 FROM recipe_ingredients WHERE recipe_id = $1), 0))
            RETURNING id
            "#,
        )
        .bind(recipe_id)
        .bind(ingredient.food_item_id)
        .bind(ingredient.grams)
        .bind(ingredient.quantity)
        .bind(&ingredient.unit)
        .fetch_one(db)
        .await?;

        sqlx::query("UPDATE recipes SET updated_at = NOW() WHERE id = $1")
            .bind(recipe_id)
            .execute(db)
            .await?;

        Ok(id)
    }

    pub async fn remove_ingredient(db: &PgPool, recipe_id: Uuid, ingredient_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM recipe_ingredients WHERE id = $1 AND recipe_id = $2")
            .bind(ingredient_id)
            .bind(recipe_id)
            .execute(db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn ingredients(db: &PgPool, recipe_id: Uuid) -> Result<Vec<IngredientRow>> {
        let rows = sqlx::query_as::<_, IngredientRow>(&format!(
            "{} WHERE ri.recipe_id = $1 ORDER BY ri.sort_order ASC",
            INGREDIENT_SELECT
        ))
        .bind(recipe_id)
        .fetch_all(db)
        .await?;

        Ok(rows)
    }

    /// Ingredients of several recipes at once
    pub async fn ingredients_for(db: &PgPool, recipe_ids: &[Uuid]) -> Result<Vec<IngredientRow>> {
        if recipe_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, IngredientRow>(&format!(
            "{} WHERE ri.recipe_id = ANY($1) ORDER BY ri.recipe_id, ri.sort_order ASC",
            INGREDIENT_SELECT
        ))
        .bind(recipe_ids)
        .fetch_all(db)
        .await?;

        Ok(rows)
    }
}
