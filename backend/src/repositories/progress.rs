//! Body measurements and progress photos

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MeasurementRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub measured_on: NaiveDate,
    pub weight_kg: Option<Decimal>,
    pub waist_cm: Option<Decimal>,
    pub hip_cm: Option<Decimal>,
    pub chest_cm: Option<Decimal>,
    pub arm_cm: Option<Decimal>,
    pub thigh_cm: Option<Decimal>,
    pub body_fat_pct: Option<Decimal>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct CreateMeasurement {
    pub measured_on: NaiveDate,
    pub weight_kg: Option<Decimal>,
    pub waist_cm: Option<Decimal>,
    pub hip_cm: Option<Decimal>,
    pub chest_cm: Option<Decimal>,
    pub arm_cm: Option<Decimal>,
    pub thigh_cm: Option<Decimal>,
    pub body_fat_pct: Option<Decimal>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PhotoRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub taken_on: NaiveDate,
    pub image_url: String,
    pub pose: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreatePhoto {
    pub taken_on: NaiveDate,
    pub image_url: String,
    pub pose: Option<String>,
    pub notes: Option<String>,
}

const MEASUREMENT_COLUMNS: &str = "id, user_id, measured_on, weight_kg, waist_cm, hip_cm, \
     chest_cm, arm_cm, thigh_cm, body_fat_pct, notes, created_at";

pub struct ProgressRepository;

impl ProgressRepository {
    pub async fn create_measurement(
        db: &PgPool,
        user_id: Uuid,
        input: CreateMeasurement,
    ) -> Result<MeasurementRecord> {
        let record = sqlx::query_as::<_, MeasurementRecord>(&format!(
            r#"
            INSERT INTO body_measurements (
                user_id, measured_on, weight_kg, waist_cm, hip_cm,
                chest_cm, arm_cm, thigh_cm, body_fat_pct, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            MEASUREMENT_COLUMNS
        ))
        .bind(user_id)
        .bind(input.measured_on)
        .bind(input.weight_kg)
        .bind(input.waist_cm)
        .bind(input.hip_cm)
        .bind(input.chest_cm)
        .bind(input.arm_cm)
        .bind(input.thigh_cm)
        .bind(input.body_fat_pct)
        .bind(&input.notes)
        .fetch_one(db)
        .await?;

        Ok(record)
    }

    pub async fn measurements(
        db: &PgPool,
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<MeasurementRecord>> {
        let records = sqlx::query_as::<_, MeasurementRecord>(&format!(
            r#"
            SELECT {}
            FROM body_measurements
            WHERE user_id = $1 AND measured_on BETWEEN $2 AND $3
            ORDER BY measured_on ASC, created_at ASC
            "#,
            MEASUREMENT_COLUMNS
        ))
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(db)
        .await?;

        Ok(records)
    }

    /// Most recently measured weight
    pub async fn latest_weight(db: &PgPool, user_id: Uuid) -> Result<Option<Decimal>> {
        let weight: Option<Decimal> = sqlx::query_scalar(
            r#"
            SELECT weight_kg FROM body_measurements
            WHERE user_id = $1 AND weight_kg IS NOT NULL
            ORDER BY measured_on DESC, created_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(db)
        .await?;

        Ok(weight)
    }

    pub async fn delete_measurement(db: &PgPool, user_id: Uuid, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM body_measurements WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn create_photo(db: &PgPool, user_id: Uuid, input: CreatePhoto) -> Result<PhotoRecord> {
        let record = sqlx::query_as::<_, PhotoRecord>(
            r#"
            INSERT INTO progress_photos (user_id, taken_on, image_url, pose, notes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, taken_on, image_url, pose, notes, created_at
            "#,
        )
        .bind(user_id)
        .bind(input.taken_on)
        .bind(&input.image_url)
        .bind(&input.pose)
        .bind(&input.notes)
        .fetch_one(db)
        .await?;

        Ok(record)
    }

    pub async fn photos(db: &PgPool, user_id: Uuid) -> Result<Vec<PhotoRecord>> {
        let records = sqlx::query_as::<_, PhotoRecord>(
            r#"
            SELECT id, user_id, taken_on, image_url, pose, notes, created_at
            FROM progress_photos
            WHERE user_id = $1
            ORDER BY taken_on DESC, created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await?;

        Ok(records)
    }

    pub async fn delete_photo(db: &PgPool, user_id: Uuid, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM progress_photos WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
