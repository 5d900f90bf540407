//! Body measurements, progress photos and progress charts

use crate::error::ApiError;
use crate::repositories::{
    opt_dec_to_f64, opt_f64_to_dec, CreateMeasurement, CreatePhoto, MeasurementRecord,
    PhotoRecord, ProfileRepository, ProgressRepository,
};
use crate::services::diary::{check_date, DiaryCache, DiaryService};
use crate::services::profile::ProfileService;
use chrono::{NaiveDate, Utc};
use nutrition_tracker_shared::daily::DayTotals;
use nutrition_tracker_shared::targets::{calculate_bmi, MacroTargets};
use nutrition_tracker_shared::types::{
    CreateMeasurementRequest, CreatePhotoRequest, MeasurementResponse, PhotoResponse,
    ProgressChartResponse, WeightPoint,
};
use nutrition_tracker_shared::validation::{
    validate_date_range, validate_measurement_cm, validate_weight,
};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

/// A day counts as on target within this fraction of the calorie goal
const ON_TARGET_TOLERANCE: f64 = 0.10;

pub struct ProgressService;

fn measurement_response(record: MeasurementRecord, height_cm: Option<f64>) -> MeasurementResponse {
    let weight_kg = opt_dec_to_f64(record.weight_kg);
    let bmi = match (weight_kg, height_cm) {
        (Some(weight), Some(height)) => {
            calculate_bmi(weight, height).map(|bmi| (bmi * 10.0).round() / 10.0)
        }
        _ => None,
    };
    MeasurementResponse {
        id: record.id.to_string(),
        measured_on: record.measured_on,
        weight_kg,
        waist_cm: opt_dec_to_f64(record.waist_cm),
        hip_cm: opt_dec_to_f64(record.hip_cm),
        chest_cm: opt_dec_to_f64(record.chest_cm),
        arm_cm: opt_dec_to_f64(record.arm_cm),
        thigh_cm: opt_dec_to_f64(record.thigh_cm),
        body_fat_pct: opt_dec_to_f64(record.body_fat_pct),
        bmi,
        notes: record.notes,
    }
}

fn photo_response(record: PhotoRecord) -> PhotoResponse {
    PhotoResponse {
        id: record.id.to_string(),
        taken_on: record.taken_on,
        image_url: record.image_url,
        pose: record.pose,
        notes: record.notes,
    }
}

fn check_circumferences(req: &CreateMeasurementRequest) -> Result<(), ApiError> {
    let fields = [
        ("waist_cm", req.waist_cm),
        ("hip_cm", req.hip_cm),
        ("chest_cm", req.chest_cm),
        ("arm_cm", req.arm_cm),
        ("thigh_cm", req.thigh_cm),
    ];
    for (field, value) in fields {
        if let Some(value) = value {
            validate_measurement_cm(value).map_err(|message| ApiError::InvalidField {
                field: field.to_string(),
                message,
            })?;
        }
    }
    Ok(())
}

/// Mean consumed calories over days with something consumed, and the number
/// of days within tolerance of the calorie target
pub fn chart_stats(days: &[DayTotals], targets: &MacroTargets) -> (f64, usize) {
    let eaten: Vec<f64> = days
        .iter()
        .map(|d| d.consumed.calories)
        .filter(|kcal| *kcal > 0.0)
        .collect();
    let average = if eaten.is_empty() {
        0.0
    } else {
        (eaten.iter().sum::<f64>() / eaten.len() as f64).round()
    };
    let on_target = if targets.calories <= 0.0 {
        0
    } else {
        eaten
            .iter()
            .filter(|kcal| ((**kcal - targets.calories) / targets.calories).abs() <= ON_TARGET_TOLERANCE)
            .count()
    };
    (average, on_target)
}

impl ProgressService {
    async fn height_cm(db: &PgPool, user_id: Uuid) -> Result<Option<f64>, ApiError> {
        Ok(ProfileRepository::get(db, user_id)
            .await
            .map_err(ApiError::Internal)?
            .and_then(|p| opt_dec_to_f64(p.height_cm)))
    }

    /// Keep the profile weight equal to the most recent measured weight
    async fn sync_profile_weight(
        db: &PgPool,
        cache: &DiaryCache,
        user_id: Uuid,
    ) -> Result<(), ApiError> {
        let latest = ProgressRepository::latest_weight(db, user_id)
            .await
            .map_err(ApiError::Internal)?;
        if let Some(weight) = latest {
            ProfileRepository::set_weight(db, user_id, weight)
                .await
                .map_err(ApiError::Internal)?;
            DiaryService::invalidate_user(cache, user_id).await;
        }
        Ok(())
    }

    pub async fn add_measurement(
        db: &PgPool,
        cache: &DiaryCache,
        user_id: Uuid,
        req: CreateMeasurementRequest,
    ) -> Result<MeasurementResponse, ApiError> {
        req.validate()?;
        if let Some(weight) = req.weight_kg {
            validate_weight(weight).map_err(|message| ApiError::InvalidField {
                field: "weight_kg".to_string(),
                message,
            })?;
        }
        check_circumferences(&req)?;
        if let Some(date) = req.measured_on {
            check_date(date, "measured_on")?;
        }
        let has_value = req.weight_kg.is_some()
            || req.waist_cm.is_some()
            || req.hip_cm.is_some()
            || req.chest_cm.is_some()
            || req.arm_cm.is_some()
            || req.thigh_cm.is_some()
            || req.body_fat_pct.is_some();
        if !has_value {
            return Err(ApiError::Validation(
                "At least one measurement is required".to_string(),
            ));
        }

        let record = ProgressRepository::create_measurement(
            db,
            user_id,
            CreateMeasurement {
                measured_on: req.measured_on.unwrap_or_else(|| Utc::now().date_naive()),
                weight_kg: opt_f64_to_dec(req.weight_kg),
                waist_cm: opt_f64_to_dec(req.waist_cm),
                hip_cm: opt_f64_to_dec(req.hip_cm),
                chest_cm: opt_f64_to_dec(req.chest_cm),
                arm_cm: opt_f64_to_dec(req.arm_cm),
                thigh_cm: opt_f64_to_dec(req.thigh_cm),
                body_fat_pct: opt_f64_to_dec(req.body_fat_pct),
                notes: req.notes,
            },
        )
        .await
        .map_err(ApiError::Internal)?;

        if record.weight_kg.is_some() {
            Self::sync_profile_weight(db, cache, user_id).await?;
        }

        info!(measurement_id = %record.id, "Measurement recorded");
        let height = Self::height_cm(db, user_id).await?;
        Ok(measurement_response(record, height))
    }

    pub async fn measurements(
        db: &PgPool,
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<MeasurementResponse>, ApiError> {
        validate_date_range(start, end).map_err(ApiError::Validation)?;
        let records = ProgressRepository::measurements(db, user_id, start, end)
            .await
            .map_err(ApiError::Internal)?;
        let height = Self::height_cm(db, user_id).await?;
        Ok(records
            .into_iter()
            .map(|r| measurement_response(r, height))
            .collect())
    }

    pub async fn delete_measurement(
        db: &PgPool,
        cache: &DiaryCache,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<(), ApiError> {
        let deleted = ProgressRepository::delete_measurement(db, user_id, id)
            .await
            .map_err(ApiError::Internal)?;
        if !deleted {
            return Err(ApiError::NotFound("Measurement not found".to_string()));
        }
        Self::sync_profile_weight(db, cache, user_id).await
    }

    pub async fn add_photo(
        db: &PgPool,
        user_id: Uuid,
        req: CreatePhotoRequest,
    ) -> Result<PhotoResponse, ApiError> {
        req.validate()?;
        if let Some(date) = req.taken_on {
            check_date(date, "taken_on")?;
        }
        let record = ProgressRepository::create_photo(
            db,
            user_id,
            CreatePhoto {
                taken_on: req.taken_on.unwrap_or_else(|| Utc::now().date_naive()),
                image_url: req.image_url,
                pose: req.pose.filter(|p| !p.trim().is_empty()),
                notes: req.notes,
            },
        )
        .await
        .map_err(ApiError::Internal)?;

        Ok(photo_response(record))
    }

    pub async fn photos(db: &PgPool, user_id: Uuid) -> Result<Vec<PhotoResponse>, ApiError> {
        let records = ProgressRepository::photos(db, user_id)
            .await
            .map_err(ApiError::Internal)?;
        Ok(records.into_iter().map(photo_response).collect())
    }

    pub async fn delete_photo(db: &PgPool, user_id: Uuid, id: Uuid) -> Result<(), ApiError> {
        let deleted = ProgressRepository::delete_photo(db, user_id, id)
            .await
            .map_err(ApiError::Internal)?;
        if !deleted {
            return Err(ApiError::NotFound("Photo not found".to_string()));
        }
        Ok(())
    }

    /// Daily totals against current targets, plus the weight trend
    pub async fn chart(
        db: &PgPool,
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<ProgressChartResponse, ApiError> {
        let days = DiaryService::range_totals(db, user_id, start, end).await?;
        let targets = ProfileService::targets(db, user_id).await?;
        let weight = ProgressRepository::measurements(db, user_id, start, end)
            .await
            .map_err(ApiError::Internal)?
            .into_iter()
            .filter_map(|m| {
                opt_dec_to_f64(m.weight_kg).map(|weight_kg| WeightPoint {
                    date: m.measured_on,
                    weight_kg,
                })
            })
            .collect();

        let (average_calories, days_on_target) = chart_stats(&days, &targets);

        Ok(ProgressChartResponse {
            start,
            end,
            targets,
            days,
            weight,
            average_calories,
            days_on_target,
        })
    }
}
