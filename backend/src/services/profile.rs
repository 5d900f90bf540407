//! Profile service and effective macro targets
//!
//! Custom targets win over computed ones. Computed targets need sex, birth
//! date, height and weight; until all four are known the defaults apply and
//! the response lists what is missing.

use crate::error::ApiError;
use crate::repositories::{
    dec_to_f64, opt_dec_to_f64, opt_f64_to_dec, ProfileRecord, ProfileRepository, UpdateProfile,
};
use chrono::{NaiveDate, Utc};
use nutrition_tracker_shared::targets::{
    ActivityLevel, BiologicalSex, BodyProfile, GoalKind, MacroTargets,
};
use nutrition_tracker_shared::types::{ProfileResponse, UpdateProfileRequest};
use nutrition_tracker_shared::validation::{validate_height_cm, validate_weight};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

/// Macro shares used to fill custom targets that only set calories
const FILL_PROTEIN_SHARE: f64 = 0.25;
const FILL_CARBS_SHARE: f64 = 0.50;
const FILL_FAT_SHARE: f64 = 0.25;

pub struct ProfileService;

/// Age in whole years on `today`
fn age_on(birth_date: NaiveDate, today: NaiveDate) -> Option<i32> {
    today.years_since(birth_date).map(|y| y as i32)
}

/// Targets in effect for a profile, plus the fields still needed to compute them
pub fn effective_targets(profile: &ProfileRecord, today: NaiveDate) -> (MacroTargets, Vec<String>) {
    let weight_kg = opt_dec_to_f64(profile.weight_kg);

    if let Some(calories) = profile.target_calories.map(dec_to_f64) {
        let pick = |value: Option<rust_decimal::Decimal>, share: f64, kcal_per_g: f64| {
            value
                .map(dec_to_f64)
                .unwrap_or_else(|| (calories * share / kcal_per_g).round())
        };
        let mut targets = MacroTargets::custom(
            calories,
            pick(profile.target_protein_g, FILL_PROTEIN_SHARE, 4.0),
            pick(profile.target_carbs_g, FILL_CARBS_SHARE, 4.0),
            pick(profile.target_fat_g, FILL_FAT_SHARE, 9.0),
        );
        if let Some(weight) = weight_kg {
            targets.water_ml = (weight * 35.0).round();
        }
        return (targets, Vec::new());
    }

    let sex = profile.sex.as_deref().and_then(|s| s.parse::<BiologicalSex>().ok());
    let age = profile.birth_date.and_then(|d| age_on(d, today));
    let height_cm = opt_dec_to_f64(profile.height_cm);

    let mut missing = Vec::new();
    if sex.is_none() {
        missing.push("sex".to_string());
    }
    if age.is_none() {
        missing.push("birth_date".to_string());
    }
    if height_cm.is_none() {
        missing.push("height_cm".to_string());
    }
    if weight_kg.is_none() {
        missing.push("weight_kg".to_string());
    }

    match (sex, age, height_cm, weight_kg) {
        (Some(sex), Some(age_years), Some(height_cm), Some(weight_kg)) => {
            let body = BodyProfile {
                height_cm,
                weight_kg,
                age_years,
                sex,
                activity_level: profile.activity_level.parse().unwrap_or_default(),
                goal: profile.goal.parse().unwrap_or_default(),
            };
            (MacroTargets::from_profile(&body), missing)
        }
        _ => (MacroTargets::default(), missing),
    }
}

fn to_response(profile: ProfileRecord) -> ProfileResponse {
    let (targets, missing_fields) = effective_targets(&profile, Utc::now().date_naive());
    ProfileResponse {
        custom_targets: profile.target_calories.is_some(),
        display_name: profile.display_name,
        sex: profile.sex,
        birth_date: profile.birth_date,
        height_cm: opt_dec_to_f64(profile.height_cm),
        weight_kg: opt_dec_to_f64(profile.weight_kg),
        activity_level: profile.activity_level,
        goal: profile.goal,
        targets,
        missing_fields,
    }
}

fn invalid(field: &str, message: impl Into<String>) -> ApiError {
    ApiError::InvalidField {
        field: field.to_string(),
        message: message.into(),
    }
}

impl ProfileService {
    async fn load(db: &PgPool, user_id: Uuid) -> Result<ProfileRecord, ApiError> {
        match ProfileRepository::get(db, user_id)
            .await
            .map_err(ApiError::Internal)?
        {
            Some(profile) => Ok(profile),
            None => ProfileRepository::upsert(db, user_id, UpdateProfile::default())
                .await
                .map_err(ApiError::Internal),
        }
    }

    pub async fn get(db: &PgPool, user_id: Uuid) -> Result<ProfileResponse, ApiError> {
        Ok(to_response(Self::load(db, user_id).await?))
    }

    /// Targets the diary and the diet planner measure against
    pub async fn targets(db: &PgPool, user_id: Uuid) -> Result<MacroTargets, ApiError> {
        let profile = Self::load(db, user_id).await?;
        Ok(effective_targets(&profile, Utc::now().date_naive()).0)
    }

    pub async fn update(
        db: &PgPool,
        user_id: Uuid,
        req: UpdateProfileRequest,
    ) -> Result<ProfileResponse, ApiError> {
        req.validate()?;

        let sex = req
            .sex
            .as_deref()
            .map(|s| s.parse::<BiologicalSex>().map_err(|e| invalid("sex", e)))
            .transpose()?;
        let activity_level = req
            .activity_level
            .as_deref()
            .map(|s| s.parse::<ActivityLevel>().map_err(|e| invalid("activity_level", e)))
            .transpose()?;
        let goal = req
            .goal
            .as_deref()
            .map(|s| s.parse::<GoalKind>().map_err(|e| invalid("goal", e)))
            .transpose()?;

        if let Some(birth_date) = req.birth_date {
            let age = age_on(birth_date, Utc::now().date_naive());
            if !matches!(age, Some(13..=120)) {
                return Err(invalid("birth_date", "Age must be between 13 and 120 years"));
            }
        }
        if let Some(height) = req.height_cm {
            validate_height_cm(height).map_err(|e| invalid("height_cm", e))?;
        }
        if let Some(weight) = req.weight_kg {
            validate_weight(weight).map_err(|e| invalid("weight_kg", e))?;
        }
        let sets_macro = req.target_protein_g.is_some()
            || req.target_carbs_g.is_some()
            || req.target_fat_g.is_some();
        if sets_macro && req.target_calories.is_none() {
            let existing = ProfileRepository::get(db, user_id)
                .await
                .map_err(ApiError::Internal)?;
            let has_calories = existing.map_or(false, |p| p.target_calories.is_some());
            if !has_calories || req.clear_custom_targets {
                return Err(invalid(
                    "target_calories",
                    "Custom macro targets need a calorie target",
                ));
            }
        }

        let input = UpdateProfile {
            display_name: req.display_name.map(|n| n.trim().to_string()),
            sex: sex.map(|s| match s {
                BiologicalSex::Male => "male".to_string(),
                BiologicalSex::Female => "female".to_string(),
            }),
            birth_date: req.birth_date,
            height_cm: opt_f64_to_dec(req.height_cm),
            weight_kg: opt_f64_to_dec(req.weight_kg),
            activity_level: activity_level.map(|a| a.as_str().to_string()),
            goal: goal.map(|g| g.as_str().to_string()),
            target_calories: opt_f64_to_dec(req.target_calories),
            target_protein_g: opt_f64_to_dec(req.target_protein_g),
            target_carbs_g: opt_f64_to_dec(req.target_carbs_g),
            target_fat_g: opt_f64_to_dec(req.target_fat_g),
            clear_custom_targets: req.clear_custom_targets,
        };

        let profile = ProfileRepository::upsert(db, user_id, input)
            .await
            .map_err(ApiError::Internal)?;

        Ok(to_response(profile))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn record() -> ProfileRecord {
        ProfileRecord {
            user_id: Uuid::new_v4(),
            display_name: None,
            sex: None,
            birth_date: None,
            height_cm: None,
            weight_kg: None,
            activity_level: "moderately_active".to_string(),
            goal: "maintain".to_string(),
            target_calories: None,
            target_protein_g: None,
            target_carbs_g: None,
            target_fat_g: None,
            updated_at: Utc::now(),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn test_incomplete_profile_uses_defaults() {
        let mut profile = record();
        profile.sex = Some("male".to_string());
        let (targets, missing) = effective_targets(&profile, today());
        assert_eq!(targets, MacroTargets::default());
        assert_eq!(missing, vec!["birth_date", "height_cm", "weight_kg"]);
    }

    #[test]
    fn test_complete_profile_is_computed() {
        let mut profile = record();
        profile.sex = Some("male".to_string());
        profile.birth_date = NaiveDate::from_ymd_opt(1994, 6, 1);
        profile.height_cm = Some(Decimal::new(180, 0));
        profile.weight_kg = Some(Decimal::new(80, 0));
        let (targets, missing) = effective_targets(&profile, today());
        assert!(missing.is_empty());
        // 30 years old: BMR 1780 x 1.55
        assert_eq!(targets.calories, 2759.0);
    }

    #[test]
    fn test_custom_calories_fill_missing_macros() {
        let mut profile = record();
        profile.target_calories = Some(Decimal::new(2000, 0));
        profile.target_protein_g = Some(Decimal::new(150, 0));
        let (targets, missing) = effective_targets(&profile, today());
        assert!(missing.is_empty());
        assert_eq!(targets.calories, 2000.0);
        assert_eq!(targets.protein_g, 150.0);
        assert_eq!(targets.carbs_g, 250.0);
        assert_eq!(targets.fat_g, 56.0);
        assert_eq!(targets.water_ml, MacroTargets::default().water_ml);
    }

    #[test]
    fn test_age_on() {
        let birth = NaiveDate::from_ymd_opt(2000, 6, 2).unwrap();
        assert_eq!(age_on(birth, today()), Some(23));
        assert_eq!(age_on(today(), birth), None);
    }
}
