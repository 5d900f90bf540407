//! Food database repository
//!
//! Nutrition columns are per 100 g. A food is visible to a user when it is
//! public or the user created it; only the creator may change it.

use anyhow::Result;
use chrono::{DateTime, Utc};
use nutrition_tracker_shared::ServingSize;
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FoodItemRecord {
    pub id: Uuid,
    pub name: String,
    pub brand: Option<String>,
    pub calories: Decimal,
    pub protein_g: Decimal,
    pub carbs_g: Decimal,
    pub fat_g: Decimal,
    pub serving_sizes: Json<Vec<ServingSize>>,
    pub image_url: Option<String>,
    pub created_by: Option<Uuid>,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateFoodItem {
    pub name: String,
    pub brand: Option<String>,
    pub calories: Decimal,
    pub protein_g: Decimal,
    pub carbs_g: Decimal,
    pub fat_g: Decimal,
    pub serving_sizes: Vec<ServingSize>,
    pub image_url: Option<String>,
    pub created_by: Uuid,
    pub is_public: bool,
}

/// Partial update; `None` keeps the stored value
#[derive(Debug, Clone, Default)]
pub struct UpdateFoodItem {
    pub name: Option<String>,
    pub brand: Option<String>,
    pub calories: Option<Decimal>,
    pub protein_g: Option<Decimal>,
    pub carbs_g: Option<Decimal>,
    pub fat_g: Option<Decimal>,
    pub serving_sizes: Option<Vec<ServingSize>>,
    pub image_url: Option<String>,
    pub is_public: Option<bool>,
}

const FOOD_COLUMNS: &str = "id, name, brand, calories, protein_g, carbs_g, fat_g, \
     serving_sizes, image_url, created_by, is_public, created_at, updated_at";

pub struct FoodItemRepository;

impl FoodItemRepository {
    /// Case-insensitive substring search over name and brand.
    /// Exact matches first, then prefix matches, then shorter names.
    pub async fn search(
        db: &PgPool,
        user_id: Uuid,
        query: &str,
        limit: i64,
    ) -> Result<Vec<FoodItemRecord>> {
        let escaped = query
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");

        let items = sqlx::query_as::<_, FoodItemRecord>(&format!(
            r#"
            SELECT {}
            FROM food_items
            WHERE (is_public OR created_by = $1)
              AND (name ILIKE $2 OR brand ILIKE $2)
            ORDER BY
                LOWER(name) = LOWER($3) DESC,
                name ILIKE $4 DESC,
                LENGTH(name) ASC,
                name ASC
            LIMIT $5
            "#,
            FOOD_COLUMNS
        ))
        .bind(user_id)
        .bind(format!("%{}%", escaped))
        .bind(query)
        .bind(format!("{}%", escaped))
        .bind(limit)
        .fetch_all(db)
        .await?;

        Ok(items)
    }

    /// Foods created by the user, newest first
    pub async fn list_own(db: &PgPool, user_id: Uuid, limit: i64) -> Result<Vec<FoodItemRecord>> {
        let items = sqlx::query_as::<_, FoodItemRecord>(&format!(
            "SELECT {} FROM food_items WHERE created_by = $1 ORDER BY created_at DESC LIMIT $2",
            FOOD_COLUMNS
        ))
        .bind(user_id)
        .bind(limit)
        .fetch_all(db)
        .await?;

        Ok(items)
    }

    /// Find a food the user is allowed to see
    pub async fn find_visible(
        db: &PgPool,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<FoodItemRecord>> {
        let item = sqlx::query_as::<_, FoodItemRecord>(&format!(
            "SELECT {} FROM food_items WHERE id = $1 AND (is_public OR created_by = $2)",
            FOOD_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await?;

        Ok(item)
    }

    pub async fn create(db: &PgPool, input: CreateFoodItem) -> Result<FoodItemRecord> {
        let item = sqlx::query_as::<_, FoodItemRecord>(&format!(
            r#"
            INSERT INTO food_items (
                name, brand, calories, protein_g, carbs_g, fat_g,
                serving_sizes, image_url, created_by, is_public
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            FOOD_COLUMNS
        ))
        .bind(&input.name)
        .bind(&input.brand)
        .bind(input.calories)
        .bind(input.protein_g)
        .bind(input.carbs_g)
        .bind(input.fat_g)
        .bind(Json(&input.serving_sizes))
        .bind(&input.image_url)
        .bind(input.created_by)
        .bind(input.is_public)
        .fetch_one(db)
        .await?;

        Ok(item)
    }

    /// Update a food owned by the user. `None` when missing or not owned.
    pub async fn update(
        db: &PgPool,
        id: Uuid,
        user_id: Uuid,
        input: UpdateFoodItem,
    ) -> Result<Option<FoodItemRecord>> {
        let item = sqlx::query_as::<_, FoodItemRecord>(&format!(
            r#"
            UPDATE food_items SET
                name          = COALESCE($3, name),
                brand         = COALESCE($4, brand),
                calories      = COALESCE($5, calories),
                protein_g     = COALESCE($6, protein_g),
                carbs_g       = COALESCE($7, carbs_g),
                fat_g         = COALESCE($8, fat_g),
                serving_sizes = COALESCE($9, serving_sizes),
                image_url     = COALESCE($10, image_url),
                is_public     = COALESCE($11, is_public),
                updated_at    = NOW()
            WHERE id = $1 AND created_by = $2
            RETURNING {}
            "#,
            FOOD_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .bind(&input.name)
        .bind(&input.brand)
        .bind(input.calories)
        .bind(input.protein_g)
        .bind(input.carbs_g)
        .bind(input.fat_g)
        .bind(input.serving_sizes.as_ref().map(Json))
        .bind(&input.image_url)
        .bind(input.is_public)
        .fetch_optional(db)
        .await?;

        Ok(item)
    }

    /// Diary rows and recipe ingredients that reference a food
    pub async fn usage_count(db: &PgPool, id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT (SELECT COUNT(*) FROM food_logs WHERE food_item_id = $1)
                 + (SELECT COUNT(*) FROM recipe_ingredients WHERE food_item_id = $1)
            "#,
        )
        .bind(id)
        .fetch_one(db)
        .await?;

        Ok(count)
    }

    pub async fn delete(db: &PgPool, id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM food_items WHERE id = $1 AND created_by = $2")
            .bind(id)
            .bind(user_id)
            .execute(db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
