//! Food diary repository
//!
//! A diary row references either a food or a recipe. Marker rows
//! (`original_unit = HIDDEN_MEAL`) reference neither and only hide their
//! meal slot for the day.

use anyhow::Result;
use chrono::NaiveDate;
use nutrition_tracker_shared::HIDDEN_MEAL_MARKER;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

/// Diary row joined with its food's per-100g values and display name
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FoodLogRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub log_date: NaiveDate,
    pub meal_slot: String,
    pub food_item_id: Option<Uuid>,
    pub recipe_id: Option<Uuid>,
    pub name: String,
    pub grams: Decimal,
    pub quantity: Decimal,
    pub original_unit: String,
    pub consumed: bool,
    pub sort_order: i32,
    pub calories: Option<Decimal>,
    pub protein_g: Option<Decimal>,
    pub carbs_g: Option<Decimal>,
    pub fat_g: Option<Decimal>,
}

#[derive(Debug, Clone)]
pub struct NewFoodLog {
    pub user_id: Uuid,
    pub log_date: NaiveDate,
    pub meal_slot: String,
    pub food_item_id: Option<Uuid>,
    pub recipe_id: Option<Uuid>,
    pub grams: Decimal,
    pub quantity: Decimal,
    pub original_unit: String,
    pub consumed: bool,
}

/// Partial update; `None` keeps the stored value
#[derive(Debug, Clone, Default)]
pub struct UpdateFoodLog {
    pub grams: Option<Decimal>,
    pub quantity: Option<Decimal>,
    pub original_unit: Option<String>,
    pub meal_slot: Option<String>,
    pub log_date: Option<NaiveDate>,
    pub sort_order: Option<i32>,
}

/// Wraps a statement producing `food_logs` rows in the display join
fn joined(source: &str, filter: &str) -> String {
    format!(
        r#"
        WITH l AS ({})
        SELECT l.id, l.user_id, l.log_date, l.meal_slot, l.food_item_id, l.recipe_id,
               COALESCE(f.name, r.name, '') AS name,
               l.grams, l.quantity, l.original_unit, l.consumed, l.sort_order,
               f.calories, f.protein_g, f.carbs_g, f.fat_g
        FROM l
        LEFT JOIN food_items f ON f.id = l.food_item_id
        LEFT JOIN recipes r ON r.id = l.recipe_id
        {}
        "#,
        source, filter
    )
}

pub struct FoodLogRepository;

impl FoodLogRepository {
    /// Insert at the end of its slot
    pub async fn create(db: &PgPool, input: NewFoodLog) -> Result<FoodLogRow> {
        let row = sqlx::query_as::<_, FoodLogRow>(&joined(
            r#"
            INSERT INTO food_logs (
                user_id, log_date, meal_slot, food_item_id, recipe_id,
                grams, quantity, original_unit, consumed, sort_order
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9,
                    COALESCE((SELECT MAX(sort_order) + 1 FROM food_logs
                              WHERE user_id = $1 AND log_date = $2 AND meal_slot = $3), 0))
            RETURNING *
            "#,
            "",
        ))
        .bind(input.user_id)
        .bind(input.log_date)
        .bind(&input.meal_slot)
        .bind(input.food_item_id)
        .bind(input.recipe_id)
        .bind(input.grams)
        .bind(input.quantity)
        .bind(&input.original_unit)
        .bind(input.consumed)
        .fetch_one(db)
        .await?;

        Ok(row)
    }

    pub async fn find_by_id(db: &PgPool, user_id: Uuid, id: Uuid) -> Result<Option<FoodLogRow>> {
        let row = sqlx::query_as::<_, FoodLogRow>(&joined(
            "SELECT * FROM food_logs WHERE id = $1 AND user_id = $2",
            "",
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await?;

        Ok(row)
    }

    /// Rows of a date range, markers included
    pub async fn by_range(
        db: &PgPool,
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<FoodLogRow>> {
        let rows = sqlx::query_as::<_, FoodLogRow>(&joined(
            "SELECT * FROM food_logs WHERE user_id = $1 AND log_date BETWEEN $2 AND $3",
            "ORDER BY l.log_date, l.sort_order, l.created_at",
        ))
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(db)
        .await?;

        Ok(rows)
    }

    /// Change portion, slot, date or position. Marker rows are never touched.
    pub async fn update(
        db: &PgPool,
        user_id: Uuid,
        id: Uuid,
        input: UpdateFoodLog,
    ) -> Result<Option<FoodLogRow>> {
        let row = sqlx::query_as::<_, FoodLogRow>(&joined(
            r#"
            UPDATE food_logs SET
                grams         = COALESCE($3, grams),
                quantity      = COALESCE($4, quantity),
                original_unit = COALESCE($5, original_unit),
                meal_slot     = COALESCE($6, meal_slot),
                log_date      = COALESCE($7, log_date),
                sort_order    = COALESCE($8, sort_order),
                updated_at    = NOW()
            WHERE id = $1 AND user_id = $2 AND original_unit <> $9
            RETURNING *
            "#,
            "",
        ))
        .bind(id)
        .bind(user_id)
        .bind(input.grams)
        .bind(input.quantity)
        .bind(&input.original_unit)
        .bind(&input.meal_slot)
        .bind(input.log_date)
        .bind(input.sort_order)
        .bind(HIDDEN_MEAL_MARKER)
        .fetch_optional(db)
        .await?;

        Ok(row)
    }

    pub async fn set_consumed(db: &PgPool, user_id: Uuid, id: Uuid, consumed: bool) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE food_logs SET consumed = $3, updated_at = NOW()
            WHERE id = $1 AND user_id = $2 AND original_unit <> $4
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(consumed)
        .bind(HIDDEN_MEAL_MARKER)
        .execute(db)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a food or recipe row; returns its date so the caller can drop
    /// cached state. Marker rows are left alone.
    pub async fn delete(db: &PgPool, user_id: Uuid, id: Uuid) -> Result<Option<NaiveDate>> {
        let date: Option<NaiveDate> = sqlx::query_scalar(
            r#"
            DELETE FROM food_logs
            WHERE id = $1 AND user_id = $2 AND original_unit <> $3
            RETURNING log_date
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(HIDDEN_MEAL_MARKER)
        .fetch_optional(db)
        .await?;

        Ok(date)
    }

    /// Add or remove the marker row of a slot. Idempotent.
    pub async fn set_hidden(
        db: &PgPool,
        user_id: Uuid,
        date: NaiveDate,
        meal_slot: &str,
        hidden: bool,
    ) -> Result<()> {
        if hidden {
            sqlx::query(
                r#"
                INSERT INTO food_logs (user_id, log_date, meal_slot, original_unit)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (user_id, log_date, meal_slot) WHERE original_unit = 'HIDDEN_MEAL'
                DO NOTHING
                "#,
            )
            .bind(user_id)
            .bind(date)
            .bind(meal_slot)
            .bind(HIDDEN_MEAL_MARKER)
            .execute(db)
            .await?;
        } else {
            sqlx::query(
                r#"
                DELETE FROM food_logs
                WHERE user_id = $1 AND log_date = $2 AND meal_slot = $3 AND original_unit = $4
                "#,
            )
            .bind(user_id)
            .bind(date)
            .bind(meal_slot)
            .bind(HIDDEN_MEAL_MARKER)
            .execute(db)
            .await?;
        }
        Ok(())
    }

    /// Copy the food rows of one slot onto another day/slot as not yet
    /// consumed, after whatever is already there. Returns rows copied.
    pub async fn copy_slot(
        db: &PgPool,
        user_id: Uuid,
        from_date: NaiveDate,
        from_slot: &str,
        to_date: NaiveDate,
        to_slot: &str,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            INSERT INTO food_logs (
                user_id, log_date, meal_slot, food_item_id, recipe_id,
                grams, quantity, original_unit, consumed, sort_order
            )
            SELECT user_id, $4, $5, food_item_id, recipe_id,
                   grams, quantity, original_unit, FALSE,
                   sort_order + COALESCE((SELECT MAX(sort_order) + 1 FROM food_logs
                                          WHERE user_id = $1 AND log_date = $4 AND meal_slot = $5), 0)
            FROM food_logs
            WHERE user_id = $1 AND log_date = $2 AND meal_slot = $3 AND original_unit <> $6
            "#,
        )
        .bind(user_id)
        .bind(from_date)
        .bind(from_slot)
        .bind(to_date)
        .bind(to_slot)
        .bind(HIDDEN_MEAL_MARKER)
        .execute(db)
        .await?;

        Ok(result.rows_affected())
    }
}
