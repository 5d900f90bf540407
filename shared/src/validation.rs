//! Input validation functions
//!
//! Plain checks used by the backend services. Request types additionally
//! derive `validator::Validate` for field-level limits.

use chrono::{Datelike, NaiveDate};
use regex_lite::Regex;
use std::sync::OnceLock;

/// Largest single portion accepted, in grams
pub const MAX_PORTION_GRAMS: f64 = 5000.0;

/// Longest date range a chart or export may span
pub const MAX_RANGE_DAYS: i64 = 366;

/// Earliest and latest years a diary date may fall in
pub const MIN_LOG_YEAR: i32 = 1900;
pub const MAX_LOG_YEAR: i32 = 2200;

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
    })
}

/// Validate email format
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email cannot be empty".to_string());
    }
    if email.len() > 255 {
        return Err("Email too long".to_string());
    }
    if !email_regex().is_match(email) {
        return Err("Invalid email format".to_string());
    }
    Ok(())
}

/// Validate password strength
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters".to_string());
    }
    if password.len() > 128 {
        return Err("Password too long".to_string());
    }
    Ok(())
}

/// Validate a food or recipe name
pub fn validate_name(name: &str) -> Result<(), String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("Name cannot be empty".to_string());
    }
    if trimmed.chars().count() > 200 {
        return Err("Name must be at most 200 characters".to_string());
    }
    Ok(())
}

/// Validate a portion weight
pub fn validate_grams(grams: f64) -> Result<(), String> {
    if grams.is_nan() || grams.is_infinite() {
        return Err("Grams must be a valid number".to_string());
    }
    if grams <= 0.0 {
        return Err("Grams must be positive".to_string());
    }
    if grams > MAX_PORTION_GRAMS {
        return Err(format!("Grams must be at most {}", MAX_PORTION_GRAMS));
    }
    Ok(())
}

/// Validate per-100g nutrition values
///
/// 100 g of anything holds at most 100 g of a macro and roughly 900 kcal
/// (pure fat).
pub fn validate_per_100g(
    calories: f64,
    protein_g: f64,
    carbs_g: f64,
    fat_g: f64,
) -> Result<(), String> {
    for (label, value, max) in [
        ("Calories", calories, 900.0),
        ("Protein", protein_g, 100.0),
        ("Carbohydrates", carbs_g, 100.0),
        ("Fat", fat_g, 100.0),
    ] {
        if value.is_nan() || value.is_infinite() {
            return Err(format!("{} must be a valid number", label));
        }
        if value < 0.0 {
            return Err(format!("{} cannot be negative", label));
        }
        if value > max {
            return Err(format!("{} per 100 g cannot exceed {}", label, max));
        }
    }
    if protein_g + carbs_g + fat_g > 100.0 {
        return Err("Macros per 100 g cannot exceed 100 g in total".to_string());
    }
    Ok(())
}

/// Validate a water entry
pub fn validate_water_ml(ml: f64) -> Result<(), String> {
    if ml.is_nan() || ml.is_infinite() {
        return Err("Amount must be a valid number".to_string());
    }
    if ml <= 0.0 {
        return Err("Amount must be greater than 0".to_string());
    }
    if ml > 5000.0 {
        return Err("Amount cannot exceed 5000 ml".to_string());
    }
    Ok(())
}

/// Validate weight value (in kg)
pub fn validate_weight(weight_kg: f64) -> Result<(), String> {
    if weight_kg.is_nan() || weight_kg.is_infinite() {
        return Err("Weight must be a valid number".to_string());
    }
    if weight_kg < 20.0 {
        return Err("Weight must be at least 20 kg".to_string());
    }
    if weight_kg > 500.0 {
        return Err("Weight must be at most 500 kg".to_string());
    }
    Ok(())
}

/// Validate height (in cm)
pub fn validate_height_cm(height_cm: f64) -> Result<(), String> {
    if height_cm.is_nan() || height_cm.is_infinite() {
        return Err("Height must be a valid number".to_string());
    }
    if !(50.0..=300.0).contains(&height_cm) {
        return Err("Height must be between 50 and 300 cm".to_string());
    }
    Ok(())
}

/// Validate a body circumference measurement (in cm)
pub fn validate_measurement_cm(value: f64) -> Result<(), String> {
    if value.is_nan() || value.is_infinite() || value <= 0.0 || value > 300.0 {
        return Err("Measurement must be between 0 and 300 cm".to_string());
    }
    Ok(())
}

/// Validate a date a diary, water or progress record is kept for
pub fn validate_log_date(date: NaiveDate) -> Result<(), String> {
    let year = date.year();
    if !(MIN_LOG_YEAR..=MAX_LOG_YEAR).contains(&year) {
        return Err(format!(
            "Date must be between {} and {}",
            MIN_LOG_YEAR, MAX_LOG_YEAR
        ));
    }
    Ok(())
}

/// Validate a query date range
pub fn validate_date_range(start: NaiveDate, end: NaiveDate) -> Result<(), String> {
    validate_log_date(start)?;
    validate_log_date(end)?;
    if end < start {
        return Err("End date must not be before start date".to_string());
    }
    if (end - start).num_days() >= MAX_RANGE_DAYS {
        return Err(format!("Date range cannot exceed {} days", MAX_RANGE_DAYS));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fake::faker::name::en::Name;
    use fake::Fake;
    use proptest::prelude::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("test@example.com").is_ok());
        assert!(validate_email("user.name@domain.co.uk").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("no@dot").is_err());
        assert!(validate_email("spaces in@email.com").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("password123").is_ok());
        assert!(validate_password("short").is_err());
        assert!(validate_password(&"a".repeat(129)).is_err());
    }

    #[test]
    fn test_validate_name() {
        let generated: String = Name().fake();
        assert!(validate_name(&generated).is_ok());
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"x".repeat(201)).is_err());
    }

    #[test]
    fn test_validate_grams() {
        assert!(validate_grams(150.0).is_ok());
        assert!(validate_grams(0.0).is_err());
        assert!(validate_grams(-5.0).is_err());
        assert!(validate_grams(5001.0).is_err());
        assert!(validate_grams(f64::NAN).is_err());
    }

    #[test]
    fn test_validate_per_100g() {
        assert!(validate_per_100g(165.0, 31.0, 0.0, 3.6).is_ok());
        assert!(validate_per_100g(884.0, 0.0, 0.0, 100.0).is_ok());
        assert!(validate_per_100g(-1.0, 0.0, 0.0, 0.0).is_err());
        assert!(validate_per_100g(100.0, 60.0, 50.0, 0.0).is_err());
        assert!(validate_per_100g(1000.0, 0.0, 0.0, 0.0).is_err());
    }

    #[test]
    fn test_validate_water() {
        assert!(validate_water_ml(250.0).is_ok());
        assert!(validate_water_ml(0.0).is_err());
        assert!(validate_water_ml(6000.0).is_err());
    }

    #[test]
    fn test_validate_body_values() {
        assert!(validate_weight(70.0).is_ok());
        assert!(validate_weight(10.0).is_err());
        assert!(validate_height_cm(175.0).is_ok());
        assert!(validate_height_cm(20.0).is_err());
        assert!(validate_measurement_cm(80.0).is_ok());
        assert!(validate_measurement_cm(0.0).is_err());
    }

    #[test]
    fn test_validate_date_range() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert!(validate_date_range(start, start).is_ok());
        assert!(validate_date_range(start, start + chrono::Duration::days(30)).is_ok());
        assert!(validate_date_range(start, start - chrono::Duration::days(1)).is_err());
        assert!(validate_date_range(start, start + chrono::Duration::days(400)).is_err());
        assert!(validate_date_range(NaiveDate::MAX, NaiveDate::MAX).is_err());
    }

    #[test]
    fn test_validate_log_date() {
        let day = |y| NaiveDate::from_ymd_opt(y, 6, 1).unwrap();
        assert!(validate_log_date(day(2024)).is_ok());
        assert!(validate_log_date(day(1900)).is_ok());
        assert!(validate_log_date(day(2200)).is_ok());
        assert!(validate_log_date(day(1899)).is_err());
        assert!(validate_log_date(day(2201)).is_err());
        assert!(validate_log_date(NaiveDate::MAX).is_err());
        assert!(validate_log_date(NaiveDate::MIN).is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_valid_grams_accepted(grams in 0.01f64..=5000.0) {
            prop_assert!(validate_grams(grams).is_ok());
        }

        #[test]
        fn prop_negative_grams_rejected(grams in -5000.0f64..=0.0) {
            prop_assert!(validate_grams(grams).is_err());
        }
    }
}
