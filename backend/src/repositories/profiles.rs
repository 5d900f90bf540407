//! Profile repository

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProfileRecord {
    pub user_id: Uuid,
    pub display_name: Option<String>,
    pub sex: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub height_cm: Option<Decimal>,
    pub weight_kg: Option<Decimal>,
    pub activity_level: String,
    pub goal: String,
    pub target_calories: Option<Decimal>,
    pub target_protein_g: Option<Decimal>,
    pub target_carbs_g: Option<Decimal>,
    pub target_fat_g: Option<Decimal>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update; `None` keeps the stored value
#[derive(Debug, Clone, Default)]
pub struct UpdateProfile {
    pub display_name: Option<String>,
    pub sex: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub height_cm: Option<Decimal>,
    pub weight_kg: Option<Decimal>,
    pub activity_level: Option<String>,
    pub goal: Option<String>,
    pub target_calories: Option<Decimal>,
    pub target_protein_g: Option<Decimal>,
    pub target_carbs_g: Option<Decimal>,
    pub target_fat_g: Option<Decimal>,
    /// Null all custom targets before applying the new ones
    pub clear_custom_targets: bool,
}

const PROFILE_COLUMNS: &str = "user_id, display_name, sex, birth_date, height_cm, weight_kg, \
     activity_level, goal, target_calories, target_protein_g, target_carbs_g, target_fat_g, \
     updated_at";

pub struct ProfileRepository;

impl ProfileRepository {
    pub async fn get(pool: &PgPool, user_id: Uuid) -> Result<Option<ProfileRecord>> {
        let profile = sqlx::query_as::<_, ProfileRecord>(&format!(
            "SELECT {} FROM profiles WHERE user_id = $1",
            PROFILE_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(profile)
    }

    /// Update a profile, creating it first if missing
    pub async fn upsert(pool: &PgPool, user_id: Uuid, input: UpdateProfile) -> Result<ProfileRecord> {
        sqlx::query("INSERT INTO profiles (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
            .bind(user_id)
            .execute(pool)
            .await?;

        let profile = sqlx::query_as::<_, ProfileRecord>(&format!(
            r#"
            UPDATE profiles SET
                display_name     = COALESCE($2, profiles.display_name),
                sex              = COALESCE($3, profiles.sex),
                birth_date       = COALESCE($4, profiles.birth_date),
                height_cm        = COALESCE($5, profiles.height_cm),
                weight_kg        = COALESCE($6, profiles.weight_kg),
                activity_level   = COALESCE($7, profiles.activity_level),
                goal             = COALESCE($8, profiles.goal),
                target_calories  = COALESCE($9,  CASE WHEN $13 THEN NULL ELSE profiles.target_calories END),
                target_protein_g = COALESCE($10, CASE WHEN $13 THEN NULL ELSE profiles.target_protein_g END),
                target_carbs_g   = COALESCE($11, CASE WHEN $13 THEN NULL ELSE profiles.target_carbs_g END),
                target_fat_g     = COALESCE($12, CASE WHEN $13 THEN NULL ELSE profiles.target_fat_g END),
                updated_at       = NOW()
            WHERE user_id = $1
            RETURNING {}
            "#,
            PROFILE_COLUMNS
        ))
        .bind(user_id)
        .bind(&input.display_name)
        .bind(&input.sex)
        .bind(input.birth_date)
        .bind(input.height_cm)
        .bind(input.weight_kg)
        .bind(&input.activity_level)
        .bind(&input.goal)
        .bind(input.target_calories)
        .bind(input.target_protein_g)
        .bind(input.target_carbs_g)
        .bind(input.target_fat_g)
        .bind(input.clear_custom_targets)
        .fetch_one(pool)
        .await?;

        Ok(profile)
    }

    /// Keep the profile weight in step with the latest measurement
    pub async fn set_weight(pool: &PgPool, user_id: Uuid, weight_kg: Decimal) -> Result<()> {
        sqlx::query("UPDATE profiles SET weight_kg = $2, updated_at = NOW() WHERE user_id = $1")
            .bind(user_id)
            .bind(weight_kg)
            .execute(pool)
            .await?;
        Ok(())
    }
}
