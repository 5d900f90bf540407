//! Macronutrient arithmetic
//!
//! Food values are stored per 100 g. Everything the diary displays is derived
//! from the single formula `grams / 100 * value_per_100g`.

use serde::{Deserialize, Serialize};
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};

/// Calories and macronutrients for some amount of food
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Macros {
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

impl Macros {
    pub const ZERO: Macros = Macros {
        calories: 0.0,
        protein_g: 0.0,
        carbs_g: 0.0,
        fat_g: 0.0,
    };

    pub fn new(calories: f64, protein_g: f64, carbs_g: f64, fat_g: f64) -> Self {
        Self {
            calories,
            protein_g,
            carbs_g,
            fat_g,
        }
    }

    /// Multiply every value by `factor`
    pub fn scale(&self, factor: f64) -> Self {
        Self {
            calories: self.calories * factor,
            protein_g: self.protein_g * factor,
            carbs_g: self.carbs_g * factor,
            fat_g: self.fat_g * factor,
        }
    }

    /// Round every value to `decimals` places for display
    pub fn round(&self, decimals: u32) -> Self {
        let factor = 10f64.powi(decimals as i32);
        let r = |v: f64| (v * factor).round() / factor;
        Self {
            calories: r(self.calories),
            protein_g: r(self.protein_g),
            carbs_g: r(self.carbs_g),
            fat_g: r(self.fat_g),
        }
    }

    /// Calories implied by the macros (4/4/9 kcal per gram)
    pub fn calories_from_macros(&self) -> f64 {
        self.protein_g * 4.0 + self.carbs_g * 4.0 + self.fat_g * 9.0
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

impl Add for Macros {
    type Output = Macros;

    fn add(self, rhs: Macros) -> Macros {
        Macros {
            calories: self.calories + rhs.calories,
            protein_g: self.protein_g + rhs.protein_g,
            carbs_g: self.carbs_g + rhs.carbs_g,
            fat_g: self.fat_g + rhs.fat_g,
        }
    }
}

impl AddAssign for Macros {
    fn add_assign(&mut self, rhs: Macros) {
        *self = *self + rhs;
    }
}

impl Sub for Macros {
    type Output = Macros;

    fn sub(self, rhs: Macros) -> Macros {
        Macros {
            calories: self.calories - rhs.calories,
            protein_g: self.protein_g - rhs.protein_g,
            carbs_g: self.carbs_g - rhs.carbs_g,
            fat_g: self.fat_g - rhs.fat_g,
        }
    }
}

impl Sum for Macros {
    fn sum<I: Iterator<Item = Macros>>(iter: I) -> Macros {
        iter.fold(Macros::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Macros> for Macros {
    fn sum<I: Iterator<Item = &'a Macros>>(iter: I) -> Macros {
        iter.copied().sum()
    }
}

/// Per-100g nutrition as stored on a food item
///
/// Any field may be missing in the database; missing, NaN and negative
/// values count as zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NutrientProfile {
    pub calories: Option<f64>,
    pub protein_g: Option<f64>,
    pub carbs_g: Option<f64>,
    pub fat_g: Option<f64>,
}

impl NutrientProfile {
    pub fn new(calories: f64, protein_g: f64, carbs_g: f64, fat_g: f64) -> Self {
        Self {
            calories: Some(calories),
            protein_g: Some(protein_g),
            carbs_g: Some(carbs_g),
            fat_g: Some(fat_g),
        }
    }

    pub fn to_macros(&self) -> Macros {
        Macros {
            calories: or_zero(self.calories),
            protein_g: or_zero(self.protein_g),
            carbs_g: or_zero(self.carbs_g),
            fat_g: or_zero(self.fat_g),
        }
    }
}

impl From<Macros> for NutrientProfile {
    fn from(m: Macros) -> Self {
        Self::new(m.calories, m.protein_g, m.carbs_g, m.fat_g)
    }
}

fn or_zero(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => v,
        _ => 0.0,
    }
}

/// Macros for `grams` of a food described per 100 g
pub fn for_grams(per_100g: &NutrientProfile, grams: f64) -> Macros {
    if !grams.is_finite() || grams <= 0.0 {
        return Macros::ZERO;
    }
    per_100g.to_macros().scale(grams / 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_for_grams_scales_linearly() {
        let food = NutrientProfile::new(200.0, 10.0, 20.0, 5.0);
        let m = for_grams(&food, 150.0);
        assert!((m.calories - 300.0).abs() < 1e-9);
        assert!((m.protein_g - 15.0).abs() < 1e-9);
        assert!((m.carbs_g - 30.0).abs() < 1e-9);
        assert!((m.fat_g - 7.5).abs() < 1e-9);
    }

    #[test]
    fn test_missing_values_are_zero() {
        let food = NutrientProfile {
            calories: Some(100.0),
            protein_g: None,
            carbs_g: Some(f64::NAN),
            fat_g: Some(-3.0),
        };
        let m = for_grams(&food, 100.0);
        assert_eq!(m, Macros::new(100.0, 0.0, 0.0, 0.0));
    }

    #[test]
    fn test_non_positive_grams_yield_zero() {
        let food = NutrientProfile::new(100.0, 1.0, 1.0, 1.0);
        assert!(for_grams(&food, 0.0).is_zero());
        assert!(for_grams(&food, -10.0).is_zero());
        assert!(for_grams(&food, f64::INFINITY).is_zero());
    }

    #[test]
    fn test_round() {
        let m = Macros::new(123.456, 1.04, 2.05, 3.999).round(1);
        assert_eq!(m, Macros::new(123.5, 1.0, 2.1, 4.0));
    }

    #[test]
    fn test_calories_from_macros() {
        let m = Macros::new(0.0, 10.0, 20.0, 10.0);
        assert!((m.calories_from_macros() - 210.0).abs() < 1e-9);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Splitting a portion in two never changes the total
        #[test]
        fn prop_portion_additive(
            kcal in 0.0f64..900.0,
            a in 0.1f64..1000.0,
            b in 0.1f64..1000.0,
        ) {
            let food = NutrientProfile::new(kcal, 0.0, 0.0, 0.0);
            let whole = for_grams(&food, a + b);
            let parts = for_grams(&food, a) + for_grams(&food, b);
            prop_assert!((whole.calories - parts.calories).abs() < 1e-6);
        }

        #[test]
        fn prop_sum_matches_fold(values in proptest::collection::vec(0.0f64..500.0, 0..30)) {
            let items: Vec<Macros> = values.iter().map(|v| Macros::new(*v, *v, *v, *v)).collect();
            let total: Macros = items.iter().sum();
            let expected: f64 = values.iter().sum();
            prop_assert!((total.calories - expected).abs() < 1e-6);
        }
    }
}
