//! Nutrition Tracker Shared Library
//!
//! Domain types and pure nutrition math used by the backend and the WASM
//! module: portion conversion, recipe expansion, daily summaries, targets,
//! and the per-day cache.

pub mod daily;
pub mod day_cache;
pub mod errors;
pub mod meals;
pub mod nutrients;
pub mod portions;
pub mod targets;
pub mod types;
pub mod validation;

// Re-export commonly used items
pub use daily::{
    entry_macros, recipe_per_100g, recipe_portion, recipe_totals, recipe_weight,
    summarize_day, summarize_range, DaySummary, DayTotals, IngredientLine, LogEntry, LogSource,
    SlotSummary, TargetProgress,
};
pub use day_cache::{DayCache, DayKey, Snapshot};
pub use errors::*;
pub use meals::{is_hidden_marker, MealSlot, HIDDEN_MEAL_MARKER};
pub use nutrients::{for_grams, Macros, NutrientProfile};
pub use portions::{resolve_grams, Portion, PortionUnit, ServingSize};
pub use targets::{
    calculate_bmi, calculate_bmr, calculate_tdee, ActivityLevel, BiologicalSex, BodyProfile,
    GoalKind, MacroTargets,
};
pub use types::*;
