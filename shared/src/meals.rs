//! Meal slots of the food diary

use crate::errors::NutritionError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// `original_unit` value of a diary row that hides a meal slot for a day.
/// Such a row never carries food.
pub const HIDDEN_MEAL_MARKER: &str = "HIDDEN_MEAL";

/// Meal slot a diary entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MealSlot {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealSlot {
    /// All slots in diary display order
    pub const ALL: [MealSlot; 4] = [
        MealSlot::Breakfast,
        MealSlot::Lunch,
        MealSlot::Dinner,
        MealSlot::Snack,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MealSlot::Breakfast => "breakfast",
            MealSlot::Lunch => "lunch",
            MealSlot::Dinner => "dinner",
            MealSlot::Snack => "snack",
        }
    }

    /// Share of the daily calorie target a slot gets when planning meals
    pub fn calorie_share(&self) -> f64 {
        match self {
            MealSlot::Breakfast => 0.25,
            MealSlot::Lunch => 0.35,
            MealSlot::Dinner => 0.30,
            MealSlot::Snack => 0.10,
        }
    }
}

impl fmt::Display for MealSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MealSlot {
    type Err = NutritionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "breakfast" | "desayuno" => Ok(MealSlot::Breakfast),
            "lunch" | "almuerzo" | "comida" => Ok(MealSlot::Lunch),
            "dinner" | "cena" => Ok(MealSlot::Dinner),
            "snack" | "snacks" | "merienda" | "colacion" | "colación" => Ok(MealSlot::Snack),
            other => Err(NutritionError::UnknownMealSlot(other.to_string())),
        }
    }
}

/// Whether a stored unit string marks a hidden meal slot
pub fn is_hidden_marker(original_unit: Option<&str>) -> bool {
    original_unit == Some(HIDDEN_MEAL_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_english_and_spanish() {
        assert_eq!("Breakfast".parse::<MealSlot>().unwrap(), MealSlot::Breakfast);
        assert_eq!("desayuno".parse::<MealSlot>().unwrap(), MealSlot::Breakfast);
        assert_eq!("almuerzo".parse::<MealSlot>().unwrap(), MealSlot::Lunch);
        assert_eq!("cena".parse::<MealSlot>().unwrap(), MealSlot::Dinner);
        assert_eq!("snacks".parse::<MealSlot>().unwrap(), MealSlot::Snack);
        assert!("brunch".parse::<MealSlot>().is_err());
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        for slot in MealSlot::ALL {
            assert_eq!(slot.to_string().parse::<MealSlot>().unwrap(), slot);
        }
    }

    #[test]
    fn test_calorie_shares_sum_to_one() {
        let total: f64 = MealSlot::ALL.iter().map(|s| s.calorie_share()).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_hidden_marker() {
        assert!(is_hidden_marker(Some("HIDDEN_MEAL")));
        assert!(!is_hidden_marker(Some("g")));
        assert!(!is_hidden_marker(None));
    }
}
