//! Water intake repository

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WaterLogRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub log_date: NaiveDate,
    pub amount_ml: Decimal,
    pub created_at: DateTime<Utc>,
}

pub struct WaterRepository;

impl WaterRepository {
    pub async fn create(
        db: &PgPool,
        user_id: Uuid,
        date: NaiveDate,
        amount_ml: Decimal,
    ) -> Result<WaterLogRecord> {
        let record = sqlx::query_as::<_, WaterLogRecord>(
            r#"
            INSERT INTO water_logs (user_id, log_date, amount_ml)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, log_date, amount_ml, created_at
            "#,
        )
        .bind(user_id)
        .bind(date)
        .bind(amount_ml)
        .fetch_one(db)
        .await?;

        Ok(record)
    }

    pub async fn by_range(
        db: &PgPool,
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<WaterLogRecord>> {
        let records = sqlx::query_as::<_, WaterLogRecord>(
            r#"
            SELECT id, user_id, log_date, amount_ml, created_at
            FROM water_logs
            WHERE user_id = $1 AND log_date BETWEEN $2 AND $3
            ORDER BY log_date, created_at
            "#,
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(db)
        .await?;

        Ok(records)
    }

    /// Delete an entry; returns its date
    pub async fn delete(db: &PgPool, user_id: Uuid, id: Uuid) -> Result<Option<NaiveDate>> {
        let date: Option<NaiveDate> = sqlx::query_scalar(
            "DELETE FROM water_logs WHERE id = $1 AND user_id = $2 RETURNING log_date",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await?;

        Ok(date)
    }
}
