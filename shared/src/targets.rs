//! Daily macro targets
//!
//! Targets are derived from the user's profile (Mifflin-St Jeor BMR, activity
//! multiplier, goal adjustment) unless the user has set custom values.
//!
//! # Macro split
//!
//! - Protein: 2.0 g/kg when losing weight, 1.8 g/kg otherwise
//! - Fat: 25% of calories
//! - Carbohydrates: whatever calories remain

use crate::nutrients::Macros;
use serde::{Deserialize, Serialize};

/// Calorie floor for any generated target
pub const MIN_CALORIES: f64 = 1200.0;

const FAT_CALORIE_SHARE: f64 = 0.25;
const WATER_ML_PER_KG: f64 = 35.0;

// ============================================================================
// Profile Types
// ============================================================================

/// Biological sex for energy calculations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BiologicalSex {
    Male,
    Female,
}

impl std::str::FromStr for BiologicalSex {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "male" | "m" | "hombre" => Ok(BiologicalSex::Male),
            "female" | "f" | "mujer" => Ok(BiologicalSex::Female),
            _ => Err(format!("Unknown biological sex: {}", s)),
        }
    }
}

/// Activity level for TDEE calculation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    /// Little or no exercise
    Sedentary,
    /// Light exercise 1-3 days/week
    #[default]
    LightlyActive,
    /// Moderate exercise 3-5 days/week
    ModeratelyActive,
    /// Hard exercise 6-7 days/week
    VeryActive,
    /// Very hard exercise, physical job
    ExtraActive,
}

impl ActivityLevel {
    /// Get the activity multiplier for TDEE calculation
    pub fn multiplier(&self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::LightlyActive => 1.375,
            ActivityLevel::ModeratelyActive => 1.55,
            ActivityLevel::VeryActive => 1.725,
            ActivityLevel::ExtraActive => 1.9,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityLevel::Sedentary => "sedentary",
            ActivityLevel::LightlyActive => "lightly_active",
            ActivityLevel::ModeratelyActive => "moderately_active",
            ActivityLevel::VeryActive => "very_active",
            ActivityLevel::ExtraActive => "extra_active",
        }
    }
}

impl std::str::FromStr for ActivityLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sedentary" => Ok(ActivityLevel::Sedentary),
            "lightly_active" => Ok(ActivityLevel::LightlyActive),
            "moderately_active" => Ok(ActivityLevel::ModeratelyActive),
            "very_active" => Ok(ActivityLevel::VeryActive),
            "extra_active" => Ok(ActivityLevel::ExtraActive),
            _ => Err(format!("Unknown activity level: {}", s)),
        }
    }
}

/// What the user is trying to do with their weight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GoalKind {
    Lose,
    #[default]
    Maintain,
    Gain,
}

impl GoalKind {
    /// Daily calorie adjustment applied on top of TDEE
    pub fn calorie_adjustment(&self) -> f64 {
        match self {
            GoalKind::Lose => -500.0,
            GoalKind::Maintain => 0.0,
            GoalKind::Gain => 300.0,
        }
    }

    fn protein_g_per_kg(&self) -> f64 {
        match self {
            GoalKind::Lose => 2.0,
            GoalKind::Maintain | GoalKind::Gain => 1.8,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GoalKind::Lose => "lose",
            GoalKind::Maintain => "maintain",
            GoalKind::Gain => "gain",
        }
    }
}

impl std::str::FromStr for GoalKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lose" | "loss" | "perder" => Ok(GoalKind::Lose),
            "maintain" | "maintenance" | "mantener" => Ok(GoalKind::Maintain),
            "gain" | "ganar" => Ok(GoalKind::Gain),
            _ => Err(format!("Unknown goal: {}", s)),
        }
    }
}

/// Body data needed to derive targets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodyProfile {
    pub height_cm: f64,
    pub weight_kg: f64,
    pub age_years: i32,
    pub sex: BiologicalSex,
    pub activity_level: ActivityLevel,
    pub goal: GoalKind,
}

// ============================================================================
// Energy
// ============================================================================

/// Basal Metabolic Rate using the Mifflin-St Jeor equation
///
/// Men: BMR = 10 × weight(kg) + 6.25 × height(cm) - 5 × age(y) + 5
/// Women: BMR = 10 × weight(kg) + 6.25 × height(cm) - 5 × age(y) - 161
pub fn calculate_bmr(weight_kg: f64, height_cm: f64, age_years: i32, sex: BiologicalSex) -> f64 {
    let base = 10.0 * weight_kg + 6.25 * height_cm - 5.0 * age_years as f64;
    match sex {
        BiologicalSex::Male => base + 5.0,
        BiologicalSex::Female => base - 161.0,
    }
}

/// Total Daily Energy Expenditure = BMR × activity multiplier
pub fn calculate_tdee(profile: &BodyProfile) -> f64 {
    calculate_bmr(
        profile.weight_kg,
        profile.height_cm,
        profile.age_years,
        profile.sex,
    ) * profile.activity_level.multiplier()
}

/// BMI = weight(kg) / height(m)²
pub fn calculate_bmi(weight_kg: f64, height_cm: f64) -> Option<f64> {
    if height_cm <= 0.0 || weight_kg <= 0.0 {
        return None;
    }
    let height_m = height_cm / 100.0;
    Some(weight_kg / (height_m * height_m))
}

// ============================================================================
// Targets
// ============================================================================

/// Daily targets the diary is measured against
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacroTargets {
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    pub water_ml: f64,
}

impl Default for MacroTargets {
    fn default() -> Self {
        Self {
            calories: 2000.0,
            protein_g: 120.0,
            carbs_g: 225.0,
            fat_g: 67.0,
            water_ml: 2500.0,
        }
    }
}

impl MacroTargets {
    /// Derive targets from body data
    pub fn from_profile(profile: &BodyProfile) -> Self {
        let calories =
            (calculate_tdee(profile) + profile.goal.calorie_adjustment()).max(MIN_CALORIES);
        let protein_g = profile.weight_kg * profile.goal.protein_g_per_kg();
        let fat_g = calories * FAT_CALORIE_SHARE / 9.0;
        let carbs_g = ((calories - protein_g * 4.0 - fat_g * 9.0) / 4.0).max(0.0);

        Self {
            calories: calories.round(),
            protein_g: protein_g.round(),
            carbs_g: carbs_g.round(),
            fat_g: fat_g.round(),
            water_ml: (profile.weight_kg * WATER_ML_PER_KG).round(),
        }
    }

    /// Targets entered by hand; water falls back to the default
    pub fn custom(calories: f64, protein_g: f64, carbs_g: f64, fat_g: f64) -> Self {
        Self {
            calories,
            protein_g,
            carbs_g,
            fat_g,
            water_ml: MacroTargets::default().water_ml,
        }
    }

    pub fn macros(&self) -> Macros {
        Macros::new(self.calories, self.protein_g, self.carbs_g, self.fat_g)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn profile(goal: GoalKind) -> BodyProfile {
        BodyProfile {
            height_cm: 180.0,
            weight_kg: 80.0,
            age_years: 30,
            sex: BiologicalSex::Male,
            activity_level: ActivityLevel::ModeratelyActive,
            goal,
        }
    }

    #[test]
    fn test_bmr_mifflin() {
        // 10*80 + 6.25*180 - 5*30 + 5 = 1780
        let bmr = calculate_bmr(80.0, 180.0, 30, BiologicalSex::Male);
        assert!((bmr - 1780.0).abs() < 1e-9);
        let bmr = calculate_bmr(80.0, 180.0, 30, BiologicalSex::Female);
        assert!((bmr - 1614.0).abs() < 1e-9);
    }

    #[test]
    fn test_targets_maintain() {
        let t = MacroTargets::from_profile(&profile(GoalKind::Maintain));
        // 1780 * 1.55 = 2759
        assert_eq!(t.calories, 2759.0);
        assert_eq!(t.protein_g, 144.0);
        assert_eq!(t.fat_g, 77.0);
        assert_eq!(t.water_ml, 2800.0);
        assert!(t.carbs_g > 0.0);
    }

    #[test]
    fn test_targets_lose_has_deficit() {
        let maintain = MacroTargets::from_profile(&profile(GoalKind::Maintain));
        let lose = MacroTargets::from_profile(&profile(GoalKind::Lose));
        assert_eq!(maintain.calories - lose.calories, 500.0);
        assert!(lose.protein_g > maintain.protein_g);
    }

    #[test]
    fn test_targets_never_below_floor() {
        let tiny = BodyProfile {
            height_cm: 145.0,
            weight_kg: 40.0,
            age_years: 80,
            sex: BiologicalSex::Female,
            activity_level: ActivityLevel::Sedentary,
            goal: GoalKind::Lose,
        };
        assert_eq!(MacroTargets::from_profile(&tiny).calories, MIN_CALORIES);
    }

    #[test]
    fn test_bmi() {
        let bmi = calculate_bmi(70.0, 175.0).unwrap();
        assert!((bmi - 22.86).abs() < 0.01);
        assert!(calculate_bmi(70.0, 0.0).is_none());
    }

    #[test]
    fn test_parse_enums() {
        assert_eq!("perder".parse::<GoalKind>().unwrap(), GoalKind::Lose);
        assert_eq!("mujer".parse::<BiologicalSex>().unwrap(), BiologicalSex::Female);
        assert_eq!(
            "very_active".parse::<ActivityLevel>().unwrap(),
            ActivityLevel::VeryActive
        );
        assert!("couch".parse::<ActivityLevel>().is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Macro calories never exceed the calorie target by more than rounding
        #[test]
        fn prop_macros_fit_calories(
            weight in 45.0f64..150.0,
            height in 145.0f64..210.0,
            age in 18i32..80,
        ) {
            let p = BodyProfile {
                height_cm: height,
                weight_kg: weight,
                age_years: age,
                sex: BiologicalSex::Male,
                activity_level: ActivityLevel::LightlyActive,
                goal: GoalKind::Maintain,
            };
            let t = MacroTargets::from_profile(&p);
            let from_macros = t.protein_g * 4.0 + t.carbs_g * 4.0 + t.fat_g * 9.0;
            prop_assert!(t.calories >= MIN_CALORIES);
            prop_assert!(t.carbs_g == 0.0 || (from_macros - t.calories).abs() < 20.0);
        }
    }
}
