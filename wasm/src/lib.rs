//! Nutrition Tracker WASM Module
//!
//! Browser bindings for the diary math, so the client can show totals for an
//! edit before the server has answered. Values cross the boundary as JSON
//! strings in the same shapes the API uses.

use nutrition_tracker_shared::{
    for_grams, resolve_grams, summarize_day, LogEntry, MacroTargets, NutrientProfile,
    PortionUnit, ServingSize,
};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

/// Input of [`compute_day_summary`]
#[derive(Debug, Deserialize)]
struct DayInput {
    date: chrono::NaiveDate,
    #[serde(default)]
    entries: Vec<LogEntry>,
    #[serde(default)]
    targets: MacroTargets,
    #[serde(default)]
    water_ml: f64,
}

fn day_summary_json(input: &str) -> Result<String, String> {
    let day: DayInput = serde_json::from_str(input).map_err(|e| e.to_string())?;
    let summary = summarize_day(day.date, &day.entries, &day.targets, day.water_ml);
    serde_json::to_string(&summary).map_err(|e| e.to_string())
}

fn grams_for(quantity: f64, unit: &str, servings_json: &str) -> Result<f64, String> {
    let servings: Vec<ServingSize> = if servings_json.trim().is_empty() {
        Vec::new()
    } else {
        serde_json::from_str(servings_json).map_err(|e| e.to_string())?
    };
    let unit: PortionUnit = if unit.trim().is_empty() {
        PortionUnit::Gram
    } else {
        unit.parse().map_err(|e: nutrition_tracker_shared::NutritionError| e.to_string())?
    };
    resolve_grams(quantity, &unit, &servings).map_err(|e| e.to_string())
}

fn macros_json(profile_json: &str, grams: f64) -> Result<String, String> {
    let profile: NutrientProfile = serde_json::from_str(profile_json).map_err(|e| e.to_string())?;
    serde_json::to_string(&for_grams(&profile, grams)).map_err(|e| e.to_string())
}

/// Summarize a diary day.
///
/// `input` is `{"date", "entries", "targets", "water_ml"}`; the result is a
/// `DaySummary` as JSON.
#[wasm_bindgen]
pub fn compute_day_summary(input: &str) -> Result<String, JsValue> {
    day_summary_json(input).map_err(|e| JsValue::from_str(&e))
}

/// Grams in `quantity` of `unit`, looking named units up in `servings_json`
#[wasm_bindgen]
pub fn portion_grams(quantity: f64, unit: &str, servings_json: &str) -> Result<f64, JsValue> {
    grams_for(quantity, unit, servings_json).map_err(|e| JsValue::from_str(&e))
}

/// Macros for `grams` of a food given per 100 g
#[wasm_bindgen]
pub fn macros_for_grams(profile_json: &str, grams: f64) -> Result<String, JsValue> {
    macros_json(profile_json, grams).map_err(|e| JsValue::from_str(&e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_day_summary_counts_consumed_only() {
        let input = json!({
            "date": "2024-03-01",
            "entries": [
                {
                    "id": "6f1c2f56-3c1e-4a57-9d3a-1c1f7f0a0001",
                    "slot": "lunch",
                    "grams": 200.0,
                    "consumed": true,
                    "source": { "kind": "food", "per_100g": { "calories": 165.0, "protein_g": 31.0, "carbs_g": 0.0, "fat_g": 3.6 } }
                },
                {
                    "id": "6f1c2f56-3c1e-4a57-9d3a-1c1f7f0a0002",
                    "slot": "dinner",
                    "grams": 100.0,
                    "consumed": false,
                    "source": { "kind": "food", "per_100g": { "calories": 130.0 } }
                }
            ],
            "water_ml": 500.0
        });

        let summary: Value =
            serde_json::from_str(&day_summary_json(&input.to_string()).unwrap()).unwrap();
        assert_eq!(summary["consumed"]["calories"], 330.0);
        assert_eq!(summary["planned"]["calories"], 460.0);
        assert_eq!(summary["water_ml"], 500.0);
    }

    #[test]
    fn test_day_summary_rejects_bad_json() {
        assert!(day_summary_json("{not json").is_err());
    }

    #[test]
    fn test_portion_grams_named_serving() {
        let servings = r#"[{"name": "slice", "grams": 30}]"#;
        assert_eq!(grams_for(2.0, "Slice", servings).unwrap(), 60.0);
        assert_eq!(grams_for(1.5, "kg", "").unwrap(), 1500.0);
        assert_eq!(grams_for(80.0, "", "").unwrap(), 80.0);
        assert!(grams_for(1.0, "scoop", servings).is_err());
        assert!(grams_for(0.0, "g", "").is_err());
    }

    #[test]
    fn test_macros_for_grams_treats_missing_as_zero() {
        let macros: Value =
            serde_json::from_str(&macros_json(r#"{"calories": 200, "protein_g": 10}"#, 50.0).unwrap())
                .unwrap();
        assert_eq!(macros["calories"], 100.0);
        assert_eq!(macros["protein_g"], 5.0);
        assert_eq!(macros["fat_g"], 0.0);
    }
}
