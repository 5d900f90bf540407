//! Food diary service
//!
//! Days are served from an in-process cache keyed by `userId:date`. Every
//! successful write drops the days it touched, and the next read reloads
//! them. Toggling "consumed" changes the cached day first and puts the old
//! value back if the database write fails.

use crate::error::ApiError;
use crate::repositories::{
    dec_to_f64, f64_to_dec, f64_to_quantity, opt_dec_to_f64, FoodLogRepository, FoodLogRow,
    NewFoodLog, RecipeRepository, UpdateFoodLog, WaterLogRecord, WaterRepository,
};
use crate::services::foods::{parse_id, FoodService};
use crate::services::profile::ProfileService;
use crate::services::recipes::{ingredient_line, parse_unit, RecipeService};
use crate::services::water;
use chrono::NaiveDate;
use metrics::counter;
use nutrition_tracker_shared::daily::{
    entry_macros, recipe_weight, summarize_day, summarize_range, DayTotals, IngredientLine,
    LogEntry, LogSource,
};
use nutrition_tracker_shared::day_cache::{window, DayCache, DayKey};
use nutrition_tracker_shared::portions::{resolve_grams, PortionUnit, ServingSize, DEFAULT_SERVING};
use nutrition_tracker_shared::types::{
    CopySlotRequest, DayResponse, FoodLogResponse, HideSlotRequest, LogFoodRequest,
    ToggleConsumedResponse, UpdateLogRequest,
};
use nutrition_tracker_shared::validation::{
    validate_date_range, validate_grams, validate_log_date,
};
use nutrition_tracker_shared::{is_hidden_marker, MacroTargets, MealSlot, NutrientProfile};
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::Validate;

/// Shared cache of loaded diary days
pub type DiaryCache = RwLock<DayCache<CachedDay>>;

pub fn new_cache(capacity: usize) -> DiaryCache {
    RwLock::new(DayCache::new(capacity))
}

/// A loaded day: computation rows plus the response built from them
#[derive(Debug, Clone)]
pub struct CachedDay {
    pub entries: Vec<LogEntry>,
    pub targets: MacroTargets,
    pub water_ml: f64,
    pub response: DayResponse,
}

impl CachedDay {
    pub fn build(
        date: NaiveDate,
        rows: &[FoodLogRow],
        recipes: &HashMap<Uuid, Vec<IngredientLine>>,
        water_logs: &[WaterLogRecord],
        targets: MacroTargets,
    ) -> Self {
        let mut entries = Vec::with_capacity(rows.len());
        let mut visible = Vec::with_capacity(rows.len());
        for row in rows {
            let Some(entry) = to_entry(row, recipes) else {
                continue;
            };
            if !entry.is_hidden_marker() {
                visible.push(to_response(row, &entry));
            }
            entries.push(entry);
        }

        let water_ml = water::total_ml(water_logs);
        let summary = summarize_day(date, &entries, &targets, water_ml);

        Self {
            entries,
            targets,
            water_ml,
            response: DayResponse {
                date,
                entries: visible,
                water: water_logs.iter().map(water::to_response).collect(),
                summary,
            },
        }
    }

    /// Set one entry's consumed flag and recompute the summary
    pub fn set_consumed(&mut self, id: Uuid, consumed: bool) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.id == id) {
            entry.consumed = consumed;
        }
        let id = id.to_string();
        if let Some(entry) = self.response.entries.iter_mut().find(|e| e.id == id) {
            entry.consumed = consumed;
        }
        self.response.summary = summarize_day(
            self.response.date,
            &self.entries,
            &self.targets,
            self.water_ml,
        );
    }
}

/// What a diary row refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Food(Uuid),
    Recipe(Uuid),
}

impl Source {
    fn ids(self) -> (Option<Uuid>, Option<Uuid>) {
        match self {
            Source::Food(id) => (Some(id), None),
            Source::Recipe(id) => (None, Some(id)),
        }
    }
}

fn request_source(food_item_id: Option<&str>, recipe_id: Option<&str>) -> Result<Source, ApiError> {
    fn non_empty(id: Option<&str>) -> Option<&str> {
        id.map(str::trim).filter(|s| !s.is_empty())
    }
    match (non_empty(food_item_id), non_empty(recipe_id)) {
        (Some(food), None) => Ok(Source::Food(parse_id(food, "food item id")?)),
        (None, Some(recipe)) => Ok(Source::Recipe(parse_id(recipe, "recipe id")?)),
        _ => Err(ApiError::Validation(
            "Exactly one of food_item_id or recipe_id is required".to_string(),
        )),
    }
}

/// Reject dates outside the years a diary can hold
pub(crate) fn check_date(date: NaiveDate, field: &str) -> Result<(), ApiError> {
    validate_log_date(date).map_err(|message| ApiError::InvalidField {
        field: field.to_string(),
        message,
    })
}

/// Grams and typed quantity as stored. A portion that rounds to nothing in
/// either column is refused rather than saved as zero.
fn stored_portion(grams: f64, quantity: f64) -> Result<(Decimal, Decimal), ApiError> {
    let stored = (f64_to_dec(grams), f64_to_quantity(quantity));
    if stored.0.is_zero() || stored.1.is_zero() {
        return Err(ApiError::InvalidField {
            field: "quantity".to_string(),
            message: "Portion is too small to record".to_string(),
        });
    }
    Ok(stored)
}

/// Apply an optimistic consumed flag to the cached day, run `write`, then
/// drop the day on success or restore it on failure
async fn apply_toggle<F>(
    cache: &DiaryCache,
    key: DayKey,
    id: Uuid,
    consumed: bool,
    write: F,
) -> Result<(), ApiError>
where
    F: Future<Output = anyhow::Result<bool>>,
{
    let snapshot = cache
        .write()
        .await
        .apply_optimistic(&key, |day| day.set_consumed(id, consumed));

    let failure = match write.await {
        Ok(true) => None,
        Ok(false) => Some(ApiError::NotFound("Diary entry not found".to_string())),
        Err(e) => Some(ApiError::Internal(e)),
    };

    if let Some(error) = failure {
        if let Some(snapshot) = snapshot {
            let restored = cache.write().await.rollback(snapshot);
            counter!("diary_optimistic_rollbacks_total").increment(1);
            warn!(key = %key, restored, "Reverted optimistic consumed toggle");
        }
        return Err(error);
    }

    cache.write().await.invalidate(&key);
    Ok(())
}

fn row_source(row: &FoodLogRow) -> Option<Source> {
    row.recipe_id
        .map(Source::Recipe)
        .or(row.food_item_id.map(Source::Food))
}

/// Computation form of a stored row. Rows with an unknown slot are skipped.
fn to_entry(row: &FoodLogRow, recipes: &HashMap<Uuid, Vec<IngredientLine>>) -> Option<LogEntry> {
    let slot = match row.meal_slot.parse::<MealSlot>() {
        Ok(slot) => slot,
        Err(_) => {
            warn!(log_id = %row.id, slot = %row.meal_slot, "Skipping diary row with unknown meal slot");
            return None;
        }
    };

    let source = match row.recipe_id {
        Some(recipe_id) => LogSource::Recipe {
            ingredients: recipes.get(&recipe_id).cloned().unwrap_or_default(),
        },
        None => LogSource::Food {
            per_100g: NutrientProfile {
                calories: opt_dec_to_f64(row.calories),
                protein_g: opt_dec_to_f64(row.protein_g),
                carbs_g: opt_dec_to_f64(row.carbs_g),
                fat_g: opt_dec_to_f64(row.fat_g),
            },
        },
    };

    Some(LogEntry {
        id: row.id,
        slot,
        grams: dec_to_f64(row.grams),
        consumed: row.consumed,
        original_unit: Some(row.original_unit.clone()),
        source,
    })
}

fn to_response(row: &FoodLogRow, entry: &LogEntry) -> FoodLogResponse {
    FoodLogResponse {
        id: row.id.to_string(),
        date: row.log_date,
        meal_slot: entry.slot,
        food_item_id: row.food_item_id.map(|id| id.to_string()),
        recipe_id: row.recipe_id.map(|id| id.to_string()),
        name: row.name.clone(),
        grams: entry.grams,
        quantity: dec_to_f64(row.quantity),
        unit: row.original_unit.clone(),
        consumed: row.consumed,
        sort_order: row.sort_order,
        macros: entry_macros(entry).round(1),
    }
}

/// Ingredient lines of every recipe referenced by `rows`
async fn recipe_lines(
    db: &PgPool,
    rows: &[FoodLogRow],
) -> Result<HashMap<Uuid, Vec<IngredientLine>>, ApiError> {
    let mut ids: Vec<Uuid> = rows.iter().filter_map(|r| r.recipe_id).collect();
    ids.sort();
    ids.dedup();

    let ingredients = RecipeRepository::ingredients_for(db, &ids)
        .await
        .map_err(ApiError::Internal)?;

    let mut lines: HashMap<Uuid, Vec<IngredientLine>> = HashMap::new();
    for row in &ingredients {
        lines.entry(row.recipe_id).or_default().push(ingredient_line(row));
    }
    Ok(lines)
}

/// Diary rows and water of a date range, grouped by day
struct RangeRows {
    rows: BTreeMap<NaiveDate, Vec<FoodLogRow>>,
    water: BTreeMap<NaiveDate, Vec<WaterLogRecord>>,
    recipes: HashMap<Uuid, Vec<IngredientLine>>,
}

async fn load_range(
    db: &PgPool,
    user_id: Uuid,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<RangeRows, ApiError> {
    let rows = FoodLogRepository::by_range(db, user_id, start, end)
        .await
        .map_err(ApiError::Internal)?;
    let water_logs = WaterRepository::by_range(db, user_id, start, end)
        .await
        .map_err(ApiError::Internal)?;
    let recipes = recipe_lines(db, &rows).await?;

    let mut by_day: BTreeMap<NaiveDate, Vec<FoodLogRow>> = BTreeMap::new();
    for row in rows {
        by_day.entry(row.log_date).or_default().push(row);
    }
    let mut water_by_day: BTreeMap<NaiveDate, Vec<WaterLogRecord>> = BTreeMap::new();
    for record in water_logs {
        water_by_day.entry(record.log_date).or_default().push(record);
    }

    Ok(RangeRows {
        rows: by_day,
        water: water_by_day,
        recipes,
    })
}

pub struct DiaryService;

impl DiaryService {
    /// Drop one cached day
    pub async fn invalidate(cache: &DiaryCache, user_id: Uuid, date: NaiveDate) {
        let key = DayKey::new(user_id, date);
        if cache.write().await.invalidate(&key) {
            debug!(key = %key, "Diary day invalidated");
        }
    }

    /// Drop every cached day of a user, e.g. after targets or a recipe changed
    pub async fn invalidate_user(cache: &DiaryCache, user_id: Uuid) {
        let dropped = cache.write().await.invalidate_user(user_id);
        if dropped > 0 {
            debug!(user_id = %user_id, dropped, "Diary days invalidated");
        }
    }

    /// Drop every cached day of every user
    pub async fn invalidate_all(cache: &DiaryCache) {
        let dropped = cache.write().await.clear();
        debug!(dropped, "Diary cache cleared");
    }

    /// A day with its entries, water and summary. A miss loads the days
    /// around `date` as well.
    pub async fn get_day(
        db: &PgPool,
        cache: &DiaryCache,
        user_id: Uuid,
        date: NaiveDate,
        prefetch_radius_days: u32,
    ) -> Result<DayResponse, ApiError> {
        check_date(date, "date")?;
        let key = DayKey::new(user_id, date);
        let (cached, seen) = {
            let guard = cache.read().await;
            (guard.get(&key).map(|day| day.response.clone()), guard.generation())
        };
        if let Some(response) = cached {
            counter!("diary_cache_hits_total").increment(1);
            return Ok(response);
        }
        counter!("diary_cache_misses_total").increment(1);

        let dates = window(date, prefetch_radius_days);
        let start = dates.first().copied().unwrap_or(date);
        let end = dates.last().copied().unwrap_or(date);

        let targets = ProfileService::targets(db, user_id).await?;
        let loaded = load_range(db, user_id, start, end).await?;

        // A write that committed during the load has invalidated since
        // `seen`; its days are served once but not cached.
        let mut requested = None;
        let mut stored = false;
        let mut guard = cache.write().await;
        for day_date in dates {
            let day = CachedDay::build(
                day_date,
                loaded.rows.get(&day_date).map(Vec::as_slice).unwrap_or_default(),
                &loaded.recipes,
                loaded.water.get(&day_date).map(Vec::as_slice).unwrap_or_default(),
                targets,
            );
            let day_key = DayKey::new(user_id, day_date);
            if day_date == date {
                requested = Some(day.response.clone());
                stored |= guard.insert_if_unchanged(day_key, day, seen);
            } else if !guard.contains(&day_key) {
                stored |= guard.insert_if_unchanged(day_key, day, seen);
            }
        }
        drop(guard);

        debug!(key = %key, start = %start, end = %end, stored, "Diary days loaded");
        requested.ok_or_else(|| ApiError::Internal(anyhow::anyhow!("{} missing from loaded window", key)))
    }

    /// Grams for `quantity` of `unit`. A recipe's named unit is one serving:
    /// its total weight divided by its servings.
    async fn portion_grams(
        db: &PgPool,
        user_id: Uuid,
        source: Source,
        quantity: f64,
        unit: &PortionUnit,
    ) -> Result<f64, ApiError> {
        let servings = match source {
            Source::Food(id) => FoodService::servings(db, user_id, id).await?,
            Source::Recipe(id) => {
                let recipe = RecipeService::find(db, user_id, id).await?;
                let lines: Vec<IngredientLine> = RecipeRepository::ingredients(db, id)
                    .await
                    .map_err(ApiError::Internal)?
                    .iter()
                    .map(ingredient_line)
                    .collect();
                let per_serving = recipe_weight(&lines) / dec_to_f64(recipe.servings).max(1.0);
                vec![ServingSize::new(DEFAULT_SERVING, per_serving)]
            }
        };

        let grams = resolve_grams(quantity, unit, &servings)?;
        validate_grams(grams).map_err(|message| ApiError::InvalidField {
            field: "quantity".to_string(),
            message,
        })?;
        Ok(grams)
    }

    async fn describe(db: &PgPool, row: &FoodLogRow) -> Result<FoodLogResponse, ApiError> {
        let recipes = recipe_lines(db, std::slice::from_ref(row)).await?;
        let entry = to_entry(row, &recipes).ok_or_else(|| {
            ApiError::Internal(anyhow::anyhow!("diary row {} has an unknown slot", row.id))
        })?;
        Ok(to_response(row, &entry))
    }

    /// A food row of the user; marker rows are not addressable
    async fn find_entry(db: &PgPool, user_id: Uuid, id: Uuid) -> Result<FoodLogRow, ApiError> {
        FoodLogRepository::find_by_id(db, user_id, id)
            .await
            .map_err(ApiError::Internal)?
            .filter(|row| !is_hidden_marker(Some(row.original_unit.as_str())))
            .ok_or_else(|| ApiError::NotFound("Diary entry not found".to_string()))
    }

    pub async fn log_food(
        db: &PgPool,
        cache: &DiaryCache,
        user_id: Uuid,
        req: LogFoodRequest,
    ) -> Result<FoodLogResponse, ApiError> {
        req.validate()?;
        check_date(req.date, "date")?;
        let slot: MealSlot = req.meal_slot.parse()?;
        let source = request_source(req.food_item_id.as_deref(), req.recipe_id.as_deref())?;
        let unit = parse_unit(req.unit.as_deref())?;
        let grams = Self::portion_grams(db, user_id, source, req.quantity, &unit).await?;
        let (stored_grams, stored_quantity) = stored_portion(grams, req.quantity)?;
        let (food_item_id, recipe_id) = source.ids();

        let row = FoodLogRepository::create(
            db,
            NewFoodLog {
                user_id,
                log_date: req.date,
                meal_slot: slot.as_str().to_string(),
                food_item_id,
                recipe_id,
                grams: stored_grams,
                quantity: stored_quantity,
                original_unit: unit.abbreviation().to_string(),
                consumed: req.consumed,
            },
        )
        .await
        .map_err(ApiError::Internal)?;

        counter!("food_logs_created_total").increment(1);
        Self::invalidate(cache, user_id, row.log_date).await;
        info!(log_id = %row.id, date = %row.log_date, slot = %slot, grams, "Food logged");

        Self::describe(db, &row).await
    }

    /// Change portion, slot, date or position of an entry
    pub async fn update_entry(
        db: &PgPool,
        cache: &DiaryCache,
        user_id: Uuid,
        id: Uuid,
        req: UpdateLogRequest,
    ) -> Result<FoodLogResponse, ApiError> {
        req.validate()?;
        if let Some(date) = req.date {
            check_date(date, "date")?;
        }
        let current = Self::find_entry(db, user_id, id).await?;
        let slot = req
            .meal_slot
            .as_deref()
            .map(str::parse::<MealSlot>)
            .transpose()?;

        let mut input = UpdateFoodLog {
            meal_slot: slot.map(|s| s.as_str().to_string()),
            log_date: req.date,
            sort_order: req.sort_order,
            ..Default::default()
        };

        if req.quantity.is_some() || req.unit.is_some() {
            let quantity = req.quantity.unwrap_or_else(|| dec_to_f64(current.quantity));
            let unit = parse_unit(req.unit.as_deref().or(Some(current.original_unit.as_str())))?;
            let source = row_source(&current).ok_or_else(|| {
                ApiError::Internal(anyhow::anyhow!("diary row {} has no source", current.id))
            })?;
            let grams = Self::portion_grams(db, user_id, source, quantity, &unit).await?;
            let (stored_grams, stored_quantity) = stored_portion(grams, quantity)?;
            input.grams = Some(stored_grams);
            input.quantity = Some(stored_quantity);
            input.original_unit = Some(unit.abbreviation().to_string());
        }

        let row = FoodLogRepository::update(db, user_id, id, input)
            .await
            .map_err(ApiError::Internal)?
            .ok_or_else(|| ApiError::NotFound("Diary entry not found".to_string()))?;

        Self::invalidate(cache, user_id, current.log_date).await;
        if row.log_date != current.log_date {
            Self::invalidate(cache, user_id, row.log_date).await;
        }

        Self::describe(db, &row).await
    }

    /// Flip the consumed flag. The cached day shows the new value at once;
    /// if the write fails it is restored and the error returned.
    pub async fn toggle_consumed(
        db: &PgPool,
        cache: &DiaryCache,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<ToggleConsumedResponse, ApiError> {
        let current = Self::find_entry(db, user_id, id).await?;
        let consumed = !current.consumed;
        let key = DayKey::new(user_id, current.log_date);

        apply_toggle(
            cache,
            key,
            id,
            consumed,
            FoodLogRepository::set_consumed(db, user_id, id, consumed),
        )
        .await?;

        Ok(ToggleConsumedResponse {
            id: id.to_string(),
            consumed,
        })
    }

    pub async fn delete_entry(
        db: &PgPool,
        cache: &DiaryCache,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<(), ApiError> {
        let date = FoodLogRepository::delete(db, user_id, id)
            .await
            .map_err(ApiError::Internal)?
            .ok_or_else(|| ApiError::NotFound("Diary entry not found".to_string()))?;

        Self::invalidate(cache, user_id, date).await;
        info!(log_id = %id, date = %date, "Diary entry deleted");
        Ok(())
    }

    /// Hide or show a meal slot for a day; returns the refreshed day
    pub async fn set_slot_hidden(
        db: &PgPool,
        cache: &DiaryCache,
        user_id: Uuid,
        req: HideSlotRequest,
        prefetch_radius_days: u32,
    ) -> Result<DayResponse, ApiError> {
        check_date(req.date, "date")?;
        let slot: MealSlot = req.meal_slot.parse()?;
        FoodLogRepository::set_hidden(db, user_id, req.date, slot.as_str(), req.hidden)
            .await
            .map_err(ApiError::Internal)?;

        Self::invalidate(cache, user_id, req.date).await;
        Self::get_day(db, cache, user_id, req.date, prefetch_radius_days).await
    }

    /// Copy a slot's entries to another day (and optionally another slot)
    pub async fn copy_slot(
        db: &PgPool,
        cache: &DiaryCache,
        user_id: Uuid,
        req: CopySlotRequest,
        prefetch_radius_days: u32,
    ) -> Result<DayResponse, ApiError> {
        check_date(req.from_date, "from_date")?;
        check_date(req.to_date, "to_date")?;
        let from_slot: MealSlot = req.from_slot.parse()?;
        let to_slot = match req.to_slot.as_deref() {
            Some(slot) => slot.parse()?,
            None => from_slot,
        };
        if req.from_date == req.to_date && from_slot == to_slot {
            return Err(ApiError::Validation(
                "Source and destination slot are the same".to_string(),
            ));
        }

        let copied = FoodLogRepository::copy_slot(
            db,
            user_id,
            req.from_date,
            from_slot.as_str(),
            req.to_date,
            to_slot.as_str(),
        )
        .await
        .map_err(ApiError::Internal)?;

        counter!("food_logs_created_total").increment(copied);
        Self::invalidate(cache, user_id, req.to_date).await;
        info!(
            from = %req.from_date,
            to = %req.to_date,
            slot = %to_slot,
            copied,
            "Meal slot copied"
        );

        Self::get_day(db, cache, user_id, req.to_date, prefetch_radius_days).await
    }

    /// Per-day totals over a range, read straight from the database
    pub async fn range_totals(
        db: &PgPool,
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DayTotals>, ApiError> {
        validate_date_range(start, end).map_err(ApiError::Validation)?;
        let mut loaded = load_range(db, user_id, start, end).await?;
        let recipes = &loaded.recipes;
        let rows = &mut loaded.rows;
        let water_logs = &mut loaded.water;

        Ok(summarize_range(start, end, |date| {
            let entries = rows
                .remove(&date)
                .unwrap_or_default()
                .iter()
                .filter_map(|row| to_entry(row, recipes))
                .collect();
            let water_ml = water_logs
                .remove(&date)
                .map(|w| water::total_ml(&w))
                .unwrap_or(0.0);
            (entries, water_ml)
        }))
    }

    /// Every visible entry over a range, oldest first
    pub async fn entries_in_range(
        db: &PgPool,
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<FoodLogResponse>, ApiError> {
        validate_date_range(start, end).map_err(ApiError::Validation)?;
        let loaded = load_range(db, user_id, start, end).await?;

        Ok(loaded
            .rows
            .values()
            .flatten()
            .filter_map(|row| {
                let entry = to_entry(row, &loaded.recipes)?;
                (!entry.is_hidden_marker()).then(|| to_response(row, &entry))
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nutrition_tracker_shared::HIDDEN_MEAL_MARKER;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
    }

    fn food_row(slot: &str, grams: i64, calories: i64, consumed: bool) -> FoodLogRow {
        FoodLogRow {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            log_date: date(),
            meal_slot: slot.to_string(),
            food_item_id: Some(Uuid::new_v4()),
            recipe_id: None,
            name: "Rice".to_string(),
            grams: Decimal::new(grams, 0),
            quantity: Decimal::new(grams, 0),
            original_unit: "g".to_string(),
            consumed,
            sort_order: 0,
            calories: Some(Decimal::new(calories, 0)),
            protein_g: Some(Decimal::new(10, 0)),
            carbs_g: None,
            fat_g: None,
        }
    }

    fn marker_row(slot: &str) -> FoodLogRow {
        FoodLogRow {
            food_item_id: None,
            grams: Decimal::ZERO,
            quantity: Decimal::ZERO,
            original_unit: HIDDEN_MEAL_MARKER.to_string(),
            calories: None,
            protein_g: None,
            name: String::new(),
            ..food_row(slot, 0, 0, false)
        }
    }

    fn recipe_row(recipe_id: Uuid, grams: i64) -> FoodLogRow {
        FoodLogRow {
            food_item_id: None,
            recipe_id: Some(recipe_id),
            calories: None,
            protein_g: None,
            name: "Stew".to_string(),
            ..food_row("dinner", grams, 0, true)
        }
    }

    fn build(rows: &[FoodLogRow], recipes: &HashMap<Uuid, Vec<IngredientLine>>) -> CachedDay {
        CachedDay::build(date(), rows, recipes, &[], MacroTargets::default())
    }

    #[test]
    fn test_food_entry_uses_per_100g_values() {
        let row = food_row("lunch", 150, 200, true);
        let entry = to_entry(&row, &HashMap::new()).unwrap();
        assert_eq!(entry.slot, MealSlot::Lunch);
        assert_eq!(entry_macros(&entry).calories, 300.0);
        assert_eq!(entry_macros(&entry).protein_g, 15.0);
    }

    #[test]
    fn test_recipe_entry_expands_ingredients() {
        let recipe_id = Uuid::new_v4();
        let mut recipes = HashMap::new();
        recipes.insert(
            recipe_id,
            vec![
                IngredientLine {
                    grams: 300.0,
                    per_100g: NutrientProfile::new(100.0, 0.0, 0.0, 0.0),
                },
                IngredientLine {
                    grams: 100.0,
                    per_100g: NutrientProfile::new(500.0, 0.0, 0.0, 0.0),
                },
            ],
        );
        // 800 kcal over 400 g, half of it eaten
        let response = to_response(
            &recipe_row(recipe_id, 200),
            &to_entry(&recipe_row(recipe_id, 200), &recipes).unwrap(),
        );
        assert_eq!(response.macros.calories, 400.0);
        assert_eq!(response.recipe_id, Some(recipe_id.to_string()));
    }

    #[test]
    fn test_unknown_slot_is_skipped() {
        assert!(to_entry(&food_row("brunch", 100, 100, true), &HashMap::new()).is_none());
    }

    #[test]
    fn test_marker_rows_hide_slot_but_not_listed() {
        let rows = vec![
            food_row("breakfast", 100, 300, true),
            marker_row("snack"),
        ];
        let day = build(&rows, &HashMap::new());
        assert_eq!(day.response.entries.len(), 1);
        assert_eq!(day.response.summary.hidden_slots, vec![MealSlot::Snack]);
        assert_eq!(day.response.summary.consumed.calories, 300.0);
    }

    #[test]
    fn test_set_consumed_recomputes_summary() {
        let row = food_row("lunch", 200, 100, false);
        let id = row.id;
        let mut day = build(&[row], &HashMap::new());
        assert_eq!(day.response.summary.consumed.calories, 0.0);
        assert_eq!(day.response.summary.planned.calories, 200.0);

        day.set_consumed(id, true);
        assert!(day.response.entries[0].consumed);
        assert_eq!(day.response.summary.consumed.calories, 200.0);
    }

    /// A cache holding one unconsumed 200 kcal entry
    fn cached_entry() -> (DiaryCache, DayKey, Uuid) {
        let cache = new_cache(8);
        let row = food_row("lunch", 200, 100, false);
        let id = row.id;
        let key = DayKey::new(Uuid::nil(), date());
        cache
            .try_write()
            .unwrap()
            .insert(key, build(&[row], &HashMap::new()));
        (cache, key, id)
    }

    fn rollbacks_rendered(recorder: &metrics_exporter_prometheus::PrometheusRecorder) -> bool {
        recorder
            .handle()
            .render()
            .contains("diary_optimistic_rollbacks_total 1")
    }

    #[tokio::test]
    async fn test_toggle_shows_change_before_write_and_drops_day_after() {
        let (cache, key, id) = cached_entry();

        let write = async {
            let guard = cache.read().await;
            let day = guard.get(&key).unwrap();
            assert!(day.response.entries[0].consumed);
            assert_eq!(day.response.summary.consumed.calories, 200.0);
            Ok::<_, anyhow::Error>(true)
        };
        apply_toggle(&cache, key, id, true, write).await.unwrap();

        assert!(!cache.read().await.contains(&key));
    }

    #[test]
    fn test_toggle_reverts_when_row_is_gone() {
        let (cache, key, id) = cached_entry();
        let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();

        let result = metrics::with_local_recorder(&recorder, || {
            tokio_test::block_on(apply_toggle(&cache, key, id, true, async {
                Ok::<_, anyhow::Error>(false)
            }))
        });

        assert!(matches!(result, Err(ApiError::NotFound(_))));
        let guard = tokio_test::block_on(cache.read());
        let day = guard.get(&key).unwrap();
        assert!(!day.response.entries[0].consumed);
        assert_eq!(day.response.summary.consumed.calories, 0.0);
        assert!(rollbacks_rendered(&recorder));
    }

    #[test]
    fn test_toggle_reverts_when_write_fails() {
        let (cache, key, id) = cached_entry();
        let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();

        let result = metrics::with_local_recorder(&recorder, || {
            tokio_test::block_on(apply_toggle(&cache, key, id, true, async {
                Err::<bool, _>(anyhow::anyhow!("connection reset"))
            }))
        });

        assert!(matches!(result, Err(ApiError::Internal(_))));
        let guard = tokio_test::block_on(cache.read());
        let day = guard.get(&key).unwrap();
        assert!(!day.entries[0].consumed);
        assert!(!day.response.entries[0].consumed);
        assert!(rollbacks_rendered(&recorder));
    }

    #[tokio::test]
    async fn test_toggle_on_uncached_day_only_writes() {
        let cache = new_cache(8);
        let key = DayKey::new(Uuid::nil(), date());

        let result =
            apply_toggle(&cache, key, Uuid::new_v4(), true, async { Ok::<_, anyhow::Error>(false) })
                .await;

        assert!(matches!(result, Err(ApiError::NotFound(_))));
        assert!(cache.read().await.is_empty());
    }

    #[test]
    fn test_dates_outside_diary_years_are_rejected() {
        assert!(check_date(date(), "date").is_ok());
        assert!(matches!(
            check_date(NaiveDate::MAX, "to_date"),
            Err(ApiError::InvalidField { field, .. }) if field == "to_date"
        ));
        assert!(check_date(NaiveDate::from_ymd_opt(1850, 1, 1).unwrap(), "date").is_err());
    }

    #[test]
    fn test_stored_portion_keeps_small_quantities() {
        let (grams, quantity) = stored_portion(4.0, 0.004).unwrap();
        assert_eq!(grams, Decimal::new(400, 2));
        assert_eq!(quantity, Decimal::new(4, 3));

        assert!(matches!(
            stored_portion(0.004, 0.004),
            Err(ApiError::InvalidField { field, .. }) if field == "quantity"
        ));
        assert!(stored_portion(10.0, 0.00001).is_err());
    }

    #[tokio::test]
    async fn test_invalidate_user_clears_all_days() {
        let cache = new_cache(8);
        let user = Uuid::new_v4();
        for offset in 0..3 {
            let day_date = date() + chrono::Duration::days(offset);
            cache.write().await.insert(
                DayKey::new(user, day_date),
                CachedDay::build(day_date, &[], &HashMap::new(), &[], MacroTargets::default()),
            );
        }
        DiaryService::invalidate(&cache, user, date()).await;
        assert_eq!(cache.read().await.len(), 2);
        DiaryService::invalidate_user(&cache, user).await;
        assert!(cache.read().await.is_empty());
    }

    #[test]
    fn test_invalidate_all_drops_every_user() {
        let cache = new_cache(8);
        tokio_test::block_on(async {
            for _ in 0..3 {
                cache.write().await.insert(
                    DayKey::new(Uuid::new_v4(), date()),
                    CachedDay::build(date(), &[], &HashMap::new(), &[], MacroTargets::default()),
                );
            }
            DiaryService::invalidate_all(&cache).await;
        });
        assert!(tokio_test::block_on(cache.read()).is_empty());
    }

    #[test]
    fn test_request_source_requires_exactly_one() {
        let id = Uuid::new_v4().to_string();
        assert!(matches!(
            request_source(Some(&id), None),
            Ok(Source::Food(_))
        ));
        assert!(matches!(
            request_source(Some(" "), Some(&id)),
            Ok(Source::Recipe(_))
        ));
        assert!(request_source(Some(&id), Some(&id)).is_err());
        assert!(request_source(None, None).is_err());
        assert!(request_source(Some("nope"), None).is_err());
    }

    #[test]
    fn test_row_source_prefers_recipe() {
        let recipe_id = Uuid::new_v4();
        assert_eq!(row_source(&recipe_row(recipe_id, 10)), Some(Source::Recipe(recipe_id)));
        assert_eq!(row_source(&marker_row("lunch")), None);
        assert_eq!(
            Source::Recipe(recipe_id).ids(),
            (None, Some(recipe_id))
        );
    }
}
