//! Database repositories
//!
//! Provides data access layer for database operations.

pub mod food_logs;
pub mod foods;
pub mod profiles;
pub mod progress;
pub mod recipes;
pub mod user;
pub mod water;

pub use food_logs::{FoodLogRepository, FoodLogRow, NewFoodLog, UpdateFoodLog};
pub use foods::{CreateFoodItem, FoodItemRecord, FoodItemRepository, UpdateFoodItem};
pub use profiles::{ProfileRecord, ProfileRepository, UpdateProfile};
pub use progress::{
    CreateMeasurement, CreatePhoto, MeasurementRecord, PhotoRecord, ProgressRepository,
};
pub use recipes::{
    CreateRecipe, IngredientRow, NewIngredient, RecipeRecord, RecipeRepository, UpdateRecipe,
};
pub use user::{UserRecord, UserRepository};
pub use water::{WaterLogRecord, WaterRepository};

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// NUMERIC column to f64
pub fn dec_to_f64(d: Decimal) -> f64 {
    d.to_f64().unwrap_or(0.0)
}

/// f64 to NUMERIC, two decimal places
pub fn f64_to_dec(f: f64) -> Decimal {
    Decimal::try_from(f).unwrap_or(Decimal::ZERO).round_dp(2)
}

/// Typed portion quantity to NUMERIC, four decimal places so small amounts
/// of large units (0.004 kg) survive
pub fn f64_to_quantity(f: f64) -> Decimal {
    Decimal::try_from(f).unwrap_or(Decimal::ZERO).round_dp(4)
}

pub fn opt_dec_to_f64(d: Option<Decimal>) -> Option<f64> {
    d.and_then(|v| v.to_f64())
}

pub fn opt_f64_to_dec(f: Option<f64>) -> Option<Decimal> {
    f.map(f64_to_dec)
}
