//! CSV export of diary data
//!
//! Two tables are available: one row per diary entry, or one row per day
//! with consumed and planned totals. Hidden-slot markers are never exported.

use crate::error::ApiError;
use crate::services::diary::DiaryService;
use chrono::NaiveDate;
use nutrition_tracker_shared::daily::DayTotals;
use nutrition_tracker_shared::types::FoodLogResponse;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

/// One diary entry
#[derive(Debug, Serialize)]
pub struct FoodLogCsvRow {
    pub date: String,
    pub meal_slot: String,
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub grams: f64,
    pub consumed: bool,
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

/// One day of totals
#[derive(Debug, Serialize)]
pub struct DailyCsvRow {
    pub date: String,
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    pub planned_calories: f64,
    pub water_ml: f64,
}

impl From<&FoodLogResponse> for FoodLogCsvRow {
    fn from(entry: &FoodLogResponse) -> Self {
        Self {
            date: entry.date.format("%Y-%m-%d").to_string(),
            meal_slot: entry.meal_slot.to_string(),
            name: entry.name.clone(),
            quantity: entry.quantity,
            unit: entry.unit.clone(),
            grams: entry.grams,
            consumed: entry.consumed,
            calories: entry.macros.calories,
            protein_g: entry.macros.protein_g,
            carbs_g: entry.macros.carbs_g,
            fat_g: entry.macros.fat_g,
        }
    }
}

impl From<&DayTotals> for DailyCsvRow {
    fn from(day: &DayTotals) -> Self {
        let consumed = day.consumed.round(1);
        Self {
            date: day.date.format("%Y-%m-%d").to_string(),
            calories: consumed.calories,
            protein_g: consumed.protein_g,
            carbs_g: consumed.carbs_g,
            fat_g: consumed.fat_g,
            planned_calories: day.planned.round(1).calories,
            water_ml: day.water_ml,
        }
    }
}

pub struct ExportService;

impl ExportService {
    pub async fn food_logs_csv(
        db: &PgPool,
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<String, ApiError> {
        let entries = DiaryService::entries_in_range(db, user_id, start, end).await?;
        let rows: Vec<FoodLogCsvRow> = entries.iter().map(FoodLogCsvRow::from).collect();
        Self::to_csv(&rows)
    }

    pub async fn daily_totals_csv(
        db: &PgPool,
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<String, ApiError> {
        let days = DiaryService::range_totals(db, user_id, start, end).await?;
        let rows: Vec<DailyCsvRow> = days.iter().map(DailyCsvRow::from).collect();
        Self::to_csv(&rows)
    }

    /// Convert data to CSV string
    pub fn to_csv<T: Serialize>(data: &[T]) -> Result<String, ApiError> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        for record in data {
            wtr.serialize(record)
                .map_err(|e| ApiError::Internal(anyhow::anyhow!("CSV serialization error: {}", e)))?;
        }
        let bytes = wtr
            .into_inner()
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("CSV flush error: {}", e)))?;
        String::from_utf8(bytes)
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("CSV encoding error: {}", e)))
    }
}
