//! Portion and unit conversion
//!
//! Every diary entry is stored in grams. Users enter a quantity together with
//! a unit, which is either a fixed household/metric unit or a named serving
//! defined on the food item ("unidad", "slice", "scoop", ...).
//!
//! # Conventions
//!
//! 1. **Grams are canonical**: conversion happens once, when an entry is written
//! 2. **Liquids use water density**: 1 ml is treated as 1 g
//! 3. **Named servings are per food**: the lookup is case-insensitive

use crate::errors::NutritionError;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const GRAMS_PER_OUNCE: f64 = 28.3495;
pub const GRAMS_PER_POUND: f64 = 453.592;
pub const GRAMS_PER_CUP: f64 = 240.0;
pub const GRAMS_PER_TABLESPOON: f64 = 15.0;
pub const GRAMS_PER_TEASPOON: f64 = 5.0;

/// Name of the generic serving every food may define
pub const DEFAULT_SERVING: &str = "serving";

// ============================================================================
// Units
// ============================================================================

/// Unit a quantity was entered in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PortionUnit {
    #[default]
    Gram,
    Kilogram,
    Milliliter,
    Liter,
    Ounce,
    Pound,
    Cup,
    Tablespoon,
    Teaspoon,
    /// A serving size defined on the food item
    Named(String),
}

impl PortionUnit {
    /// Grams in one unit, `None` for named servings
    pub fn fixed_grams(&self) -> Option<f64> {
        match self {
            PortionUnit::Gram | PortionUnit::Milliliter => Some(1.0),
            PortionUnit::Kilogram | PortionUnit::Liter => Some(1000.0),
            PortionUnit::Ounce => Some(GRAMS_PER_OUNCE),
            PortionUnit::Pound => Some(GRAMS_PER_POUND),
            PortionUnit::Cup => Some(GRAMS_PER_CUP),
            PortionUnit::Tablespoon => Some(GRAMS_PER_TABLESPOON),
            PortionUnit::Teaspoon => Some(GRAMS_PER_TEASPOON),
            PortionUnit::Named(_) => None,
        }
    }

    /// Get the unit abbreviation
    pub fn abbreviation(&self) -> &str {
        match self {
            PortionUnit::Gram => "g",
            PortionUnit::Kilogram => "kg",
            PortionUnit::Milliliter => "ml",
            PortionUnit::Liter => "l",
            PortionUnit::Ounce => "oz",
            PortionUnit::Pound => "lb",
            PortionUnit::Cup => "cup",
            PortionUnit::Tablespoon => "tbsp",
            PortionUnit::Teaspoon => "tsp",
            PortionUnit::Named(name) => name,
        }
    }
}

impl fmt::Display for PortionUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.abbreviation())
    }
}

impl std::str::FromStr for PortionUnit {
    type Err = NutritionError;

    /// Never fails on a non-empty string: unknown names become `Named`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(NutritionError::UnknownServing("empty unit".to_string()));
        }
        let unit = match trimmed.to_lowercase().as_str() {
            "g" | "gr" | "gram" | "grams" | "gramo" | "gramos" => PortionUnit::Gram,
            "kg" | "kilogram" | "kilograms" | "kilo" | "kilos" => PortionUnit::Kilogram,
            "ml" | "milliliter" | "milliliters" | "mililitro" | "mililitros" => {
                PortionUnit::Milliliter
            }
            "l" | "liter" | "liters" | "litro" | "litros" => PortionUnit::Liter,
            "oz" | "ounce" | "ounces" | "onza" | "onzas" => PortionUnit::Ounce,
            "lb" | "lbs" | "pound" | "pounds" | "libra" | "libras" => PortionUnit::Pound,
            "cup" | "cups" | "taza" | "tazas" => PortionUnit::Cup,
            "tbsp" | "tablespoon" | "tablespoons" | "cda" | "cucharada" | "cucharadas" => {
                PortionUnit::Tablespoon
            }
            "tsp" | "teaspoon" | "teaspoons" | "cdta" | "cucharadita" | "cucharaditas" => {
                PortionUnit::Teaspoon
            }
            _ => PortionUnit::Named(trimmed.to_string()),
        };
        Ok(unit)
    }
}

// ============================================================================
// Serving sizes
// ============================================================================

/// A named serving defined on a food item, e.g. "unidad" = 50 g
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServingSize {
    pub name: String,
    pub grams: f64,
}

impl ServingSize {
    pub fn new(name: impl Into<String>, grams: f64) -> Self {
        Self {
            name: name.into(),
            grams,
        }
    }
}

fn is_generic_serving(name: &str) -> bool {
    matches!(
        name.to_lowercase().as_str(),
        "serving" | "servings" | "porcion" | "porción" | "porciones" | "racion" | "ración"
    )
}

/// Find a named serving, case-insensitively
///
/// When the requested name is a generic word for "serving" and the food has
/// no serving with that exact name, the first generic serving is used.
pub fn find_serving<'a>(name: &str, servings: &'a [ServingSize]) -> Option<&'a ServingSize> {
    let wanted = name.trim().to_lowercase();
    servings
        .iter()
        .find(|s| s.name.trim().to_lowercase() == wanted)
        .or_else(|| {
            if is_generic_serving(&wanted) {
                servings.iter().find(|s| is_generic_serving(s.name.trim()))
            } else {
                None
            }
        })
}

/// Convert `quantity` of `unit` into grams
pub fn resolve_grams(
    quantity: f64,
    unit: &PortionUnit,
    servings: &[ServingSize],
) -> Result<f64, NutritionError> {
    if !quantity.is_finite() || quantity <= 0.0 {
        return Err(NutritionError::InvalidQuantity(format!(
            "quantity must be a positive number, got {}",
            quantity
        )));
    }

    if let Some(per_unit) = unit.fixed_grams() {
        return Ok(quantity * per_unit);
    }

    let name = unit.abbreviation();
    let serving = find_serving(name, servings)
        .ok_or_else(|| NutritionError::UnknownServing(name.to_string()))?;
    if !serving.grams.is_finite() || serving.grams <= 0.0 {
        return Err(NutritionError::InvalidQuantity(format!(
            "serving '{}' has no weight",
            serving.name
        )));
    }
    Ok(quantity * serving.grams)
}

/// A quantity as the user entered it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portion {
    pub quantity: f64,
    pub unit: PortionUnit,
}

impl Portion {
    pub fn grams(quantity: f64) -> Self {
        Self {
            quantity,
            unit: PortionUnit::Gram,
        }
    }

    pub fn to_grams(&self, servings: &[ServingSize]) -> Result<f64, NutritionError> {
        resolve_grams(self.quantity, &self.unit, servings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("g", PortionUnit::Gram)]
    #[case("Gramos", PortionUnit::Gram)]
    #[case("ml", PortionUnit::Milliliter)]
    #[case("litro", PortionUnit::Liter)]
    #[case("oz", PortionUnit::Ounce)]
    #[case("taza", PortionUnit::Cup)]
    #[case("cda", PortionUnit::Tablespoon)]
    #[case("cdta", PortionUnit::Teaspoon)]
    #[case("unidad", PortionUnit::Named("unidad".to_string()))]
    fn test_parse_unit(#[case] input: &str, #[case] expected: PortionUnit) {
        assert_eq!(input.parse::<PortionUnit>().unwrap(), expected);
    }

    #[test]
    fn test_parse_empty_unit_fails() {
        assert!("  ".parse::<PortionUnit>().is_err());
    }

    #[rstest]
    #[case(150.0, PortionUnit::Gram, 150.0)]
    #[case(0.5, PortionUnit::Kilogram, 500.0)]
    #[case(2.0, PortionUnit::Ounce, 56.699)]
    #[case(1.0, PortionUnit::Cup, 240.0)]
    #[case(3.0, PortionUnit::Teaspoon, 15.0)]
    fn test_fixed_units(#[case] qty: f64, #[case] unit: PortionUnit, #[case] grams: f64) {
        let got = resolve_grams(qty, &unit, &[]).unwrap();
        assert!((got - grams).abs() < 1e-6, "{} != {}", got, grams);
    }

    #[test]
    fn test_named_serving_case_insensitive() {
        let servings = vec![ServingSize::new("Unidad", 50.0)];
        let grams = resolve_grams(3.0, &PortionUnit::Named("unidad".into()), &servings).unwrap();
        assert!((grams - 150.0).abs() < 1e-9);
    }

    #[test]
    fn test_generic_serving_fallback() {
        let servings = vec![
            ServingSize::new("slice", 30.0),
            ServingSize::new("porción", 120.0),
        ];
        let grams = resolve_grams(1.0, &PortionUnit::Named("serving".into()), &servings).unwrap();
        assert!((grams - 120.0).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_serving() {
        let err = resolve_grams(1.0, &PortionUnit::Named("scoop".into()), &[]).unwrap_err();
        assert_eq!(err, NutritionError::UnknownServing("scoop".to_string()));
    }

    #[test]
    fn test_invalid_quantity() {
        assert!(resolve_grams(0.0, &PortionUnit::Gram, &[]).is_err());
        assert!(resolve_grams(-1.0, &PortionUnit::Gram, &[]).is_err());
        assert!(resolve_grams(f64::NAN, &PortionUnit::Gram, &[]).is_err());
    }

    #[test]
    fn test_weightless_serving_rejected() {
        let servings = vec![ServingSize::new("pinch", 0.0)];
        assert!(resolve_grams(1.0, &PortionUnit::Named("pinch".into()), &servings).is_err());
    }

    #[test]
    fn test_display_uses_abbreviation() {
        assert_eq!(PortionUnit::Tablespoon.to_string(), "tbsp");
        assert_eq!(PortionUnit::Named("unidad".into()).to_string(), "unidad");
    }
}
