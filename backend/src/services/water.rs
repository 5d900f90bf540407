//! Water intake service

use crate::error::ApiError;
use crate::repositories::{dec_to_f64, f64_to_dec, WaterLogRecord, WaterRepository};
use crate::services::diary::{check_date, DiaryCache, DiaryService};
use nutrition_tracker_shared::types::{LogWaterRequest, WaterLogResponse};
use nutrition_tracker_shared::validation::validate_water_ml;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

pub struct WaterService;

pub fn to_response(record: &WaterLogRecord) -> WaterLogResponse {
    WaterLogResponse {
        id: record.id.to_string(),
        date: record.log_date,
        amount_ml: dec_to_f64(record.amount_ml),
        created_at: record.created_at,
    }
}

/// Total of a day's entries
pub fn total_ml(records: &[WaterLogRecord]) -> f64 {
    records.iter().map(|r| dec_to_f64(r.amount_ml)).sum()
}

impl WaterService {
    pub async fn add(
        db: &PgPool,
        cache: &DiaryCache,
        user_id: Uuid,
        req: LogWaterRequest,
    ) -> Result<WaterLogResponse, ApiError> {
        req.validate()?;
        check_date(req.date, "date")?;
        validate_water_ml(req.amount_ml).map_err(|message| ApiError::InvalidField {
            field: "amount_ml".to_string(),
            message,
        })?;

        let record = WaterRepository::create(db, user_id, req.date, f64_to_dec(req.amount_ml))
            .await
            .map_err(ApiError::Internal)?;

        DiaryService::invalidate(cache, user_id, record.log_date).await;
        Ok(to_response(&record))
    }

    pub async fn delete(
        db: &PgPool,
        cache: &DiaryCache,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<(), ApiError> {
        let date = WaterRepository::delete(db, user_id, id)
            .await
            .map_err(ApiError::Internal)?
            .ok_or_else(|| ApiError::NotFound("Water entry not found".to_string()))?;

        DiaryService::invalidate(cache, user_id, date).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use rust_decimal::Decimal;

    fn record(ml: i64) -> WaterLogRecord {
        WaterLogRecord {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            log_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            amount_ml: Decimal::new(ml, 0),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_total_ml() {
        assert_eq!(total_ml(&[]), 0.0);
        assert_eq!(total_ml(&[record(250), record(500)]), 750.0);
    }

    #[test]
    fn test_to_response() {
        let rec = record(330);
        let response = to_response(&rec);
        assert_eq!(response.amount_ml, 330.0);
        assert_eq!(response.id, rec.id.to_string());
    }
}
