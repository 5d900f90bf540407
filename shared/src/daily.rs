//! Derived daily nutrition state
//!
//! A day is a list of diary rows. Each row is either a food (per-100g values)
//! or a recipe (a list of ingredients with their own per-100g values), logged
//! by weight. Totals are recomputed from the rows every time; nothing derived
//! is ever stored.
//!
//! Rows whose `original_unit` is [`HIDDEN_MEAL_MARKER`] only hide a meal slot
//! and never contribute nutrition.

use crate::meals::{is_hidden_marker, MealSlot};
use crate::nutrients::{for_grams, Macros, NutrientProfile};
use crate::targets::MacroTargets;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One ingredient of a recipe, by weight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientLine {
    pub grams: f64,
    pub per_100g: NutrientProfile,
}

/// Where a diary row's nutrition comes from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LogSource {
    Food { per_100g: NutrientProfile },
    Recipe { ingredients: Vec<IngredientLine> },
}

/// A diary row in computation form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: Uuid,
    pub slot: MealSlot,
    pub grams: f64,
    pub consumed: bool,
    #[serde(default)]
    pub original_unit: Option<String>,
    pub source: LogSource,
}

impl LogEntry {
    pub fn is_hidden_marker(&self) -> bool {
        is_hidden_marker(self.original_unit.as_deref())
    }
}

/// Total weight of a recipe's ingredients
pub fn recipe_weight(ingredients: &[IngredientLine]) -> f64 {
    ingredients
        .iter()
        .map(|i| i.grams)
        .filter(|g| g.is_finite() && *g > 0.0)
        .sum()
}

/// Nutrition of a whole recipe (all ingredients at their listed weight)
pub fn recipe_totals(ingredients: &[IngredientLine]) -> Macros {
    ingredients
        .iter()
        .map(|i| for_grams(&i.per_100g, i.grams))
        .sum()
}

/// Per-100g nutrition of a recipe, so it can be treated like a food.
/// A recipe without weight has no nutrition.
pub fn recipe_per_100g(ingredients: &[IngredientLine]) -> Macros {
    let weight = recipe_weight(ingredients);
    if weight <= 0.0 {
        return Macros::ZERO;
    }
    recipe_totals(ingredients).scale(100.0 / weight)
}

/// Nutrition of a recipe portion: every ingredient scaled by
/// `portion_grams / recipe_weight`
pub fn recipe_portion(ingredients: &[IngredientLine], portion_grams: f64) -> Macros {
    let weight = recipe_weight(ingredients);
    if weight <= 0.0 || !portion_grams.is_finite() || portion_grams <= 0.0 {
        return Macros::ZERO;
    }
    let fraction = portion_grams / weight;
    ingredients
        .iter()
        .map(|i| for_grams(&i.per_100g, i.grams * fraction))
        .sum()
}

/// Nutrition contributed by one diary row
pub fn entry_macros(entry: &LogEntry) -> Macros {
    if entry.is_hidden_marker() {
        return Macros::ZERO;
    }
    match &entry.source {
        LogSource::Food { per_100g } => for_grams(per_100g, entry.grams),
        LogSource::Recipe { ingredients } => recipe_portion(ingredients, entry.grams),
    }
}

/// Totals for one meal slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotSummary {
    pub slot: MealSlot,
    pub hidden: bool,
    pub entry_count: usize,
    pub planned: Macros,
    pub consumed: Macros,
}

/// Progress of one macro against its target
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetProgress {
    pub calories_pct: f64,
    pub protein_pct: f64,
    pub carbs_pct: f64,
    pub fat_pct: f64,
}

/// Everything the dashboard shows for a day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    /// All food rows, consumed or only planned
    pub planned: Macros,
    /// Rows marked as eaten
    pub consumed: Macros,
    /// Target minus consumed; negative once a target is exceeded
    pub remaining: Macros,
    pub progress: TargetProgress,
    pub targets: MacroTargets,
    pub slots: Vec<SlotSummary>,
    pub hidden_slots: Vec<MealSlot>,
    pub water_ml: f64,
    pub water_pct: f64,
}

fn percent(value: f64, target: f64) -> f64 {
    if target <= 0.0 {
        0.0
    } else {
        (value / target * 1000.0).round() / 10.0
    }
}

fn progress(consumed: &Macros, targets: &MacroTargets) -> TargetProgress {
    TargetProgress {
        calories_pct: percent(consumed.calories, targets.calories),
        protein_pct: percent(consumed.protein_g, targets.protein_g),
        carbs_pct: percent(consumed.carbs_g, targets.carbs_g),
        fat_pct: percent(consumed.fat_g, targets.fat_g),
    }
}

/// Compute the full summary of a day
pub fn summarize_day(
    date: NaiveDate,
    entries: &[LogEntry],
    targets: &MacroTargets,
    water_ml: f64,
) -> DaySummary {
    let mut slots: Vec<SlotSummary> = MealSlot::ALL
        .iter()
        .map(|slot| SlotSummary {
            slot: *slot,
            hidden: false,
            entry_count: 0,
            planned: Macros::ZERO,
            consumed: Macros::ZERO,
        })
        .collect();

    for entry in entries {
        let Some(summary) = slots.iter_mut().find(|s| s.slot == entry.slot) else {
            continue;
        };
        if entry.is_hidden_marker() {
            summary.hidden = true;
            continue;
        }
        let macros = entry_macros(entry);
        summary.entry_count += 1;
        summary.planned += macros;
        if entry.consumed {
            summary.consumed += macros;
        }
    }

    let planned: Macros = slots.iter().map(|s| s.planned).sum();
    let consumed: Macros = slots.iter().map(|s| s.consumed).sum();
    let hidden_slots = slots.iter().filter(|s| s.hidden).map(|s| s.slot).collect();
    let water_ml = water_ml.max(0.0);

    DaySummary {
        date,
        planned,
        consumed,
        remaining: targets.macros() - consumed,
        progress: progress(&consumed, targets),
        targets: *targets,
        slots,
        hidden_slots,
        water_ml,
        water_pct: percent(water_ml, targets.water_ml),
    }
}

/// Compact per-day totals for progress charts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayTotals {
    pub date: NaiveDate,
    pub consumed: Macros,
    pub planned: Macros,
    pub water_ml: f64,
}

/// Totals for every date in `[start, end]`; days without rows are zero
pub fn summarize_range<F>(start: NaiveDate, end: NaiveDate, mut day: F) -> Vec<DayTotals>
where
    F: FnMut(NaiveDate) -> (Vec<LogEntry>, f64),
{
    start
        .iter_days()
        .take_while(|d| *d <= end)
        .map(|date| {
            let (entries, water_ml) = day(date);
            let mut planned = Macros::ZERO;
            let mut consumed = Macros::ZERO;
            for entry in &entries {
                let m = entry_macros(entry);
                planned += m;
                if entry.consumed {
                    consumed += m;
                }
            }
            DayTotals {
                date,
                consumed,
                planned,
                water_ml,
            }
        })
        .collect()
}
