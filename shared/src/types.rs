//! API request and response types

use crate::daily::{DaySummary, DayTotals};
use crate::meals::MealSlot;
use crate::nutrients::Macros;
use crate::portions::ServingSize;
use crate::targets::MacroTargets;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

// ============================================================================
// Common
// ============================================================================

/// Single date query (`?date=YYYY-MM-DD`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateQuery {
    pub date: NaiveDate,
}

/// Inclusive date range query (`?start=...&end=...`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateRangeQuery {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

// ============================================================================
// Auth
// ============================================================================

/// Authentication tokens response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Registration request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 8, max = 128, message = "Password must be 8-128 characters"))]
    pub password: String,
}

/// Account information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Profile
// ============================================================================

/// Profile with the targets currently in effect
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub display_name: Option<String>,
    pub sex: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub activity_level: String,
    pub goal: String,
    pub custom_targets: bool,
    pub targets: MacroTargets,
    /// Profile fields still needed before targets can be computed
    pub missing_fields: Vec<String>,
}

/// Partial profile update
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(max = 100))]
    pub display_name: Option<String>,
    pub sex: Option<String>,
    pub birth_date: Option<NaiveDate>,
    #[validate(range(min = 50.0, max = 300.0))]
    pub height_cm: Option<f64>,
    #[validate(range(min = 20.0, max = 500.0))]
    pub weight_kg: Option<f64>,
    pub activity_level: Option<String>,
    pub goal: Option<String>,
    #[validate(range(min = 0.0, max = 10000.0))]
    pub target_calories: Option<f64>,
    #[validate(range(min = 0.0, max = 1000.0))]
    pub target_protein_g: Option<f64>,
    #[validate(range(min = 0.0, max = 1500.0))]
    pub target_carbs_g: Option<f64>,
    #[validate(range(min = 0.0, max = 1000.0))]
    pub target_fat_g: Option<f64>,
    /// Drop custom targets and go back to computed ones
    #[serde(default)]
    pub clear_custom_targets: bool,
}

// ============================================================================
// Food database
// ============================================================================

/// Food search query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodSearchQuery {
    pub q: String,
    pub limit: Option<i64>,
}

/// Food item response, nutrition per 100 g
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodItemResponse {
    pub id: String,
    pub name: String,
    pub brand: Option<String>,
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    pub serving_sizes: Vec<ServingSize>,
    pub image_url: Option<String>,
    pub is_public: bool,
    pub owned: bool,
}

/// Create a food item, nutrition per 100 g
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateFoodRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 100))]
    pub brand: Option<String>,
    pub calories: f64,
    #[serde(default)]
    pub protein_g: Option<f64>,
    #[serde(default)]
    pub carbs_g: Option<f64>,
    #[serde(default)]
    pub fat_g: Option<f64>,
    #[serde(default)]
    pub serving_sizes: Vec<ServingSize>,
    #[validate(url)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub is_public: bool,
}

/// Partial food update
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateFoodRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub brand: Option<String>,
    pub calories: Option<f64>,
    pub protein_g: Option<f64>,
    pub carbs_g: Option<f64>,
    pub fat_g: Option<f64>,
    pub serving_sizes: Option<Vec<ServingSize>>,
    #[validate(url)]
    pub image_url: Option<String>,
    pub is_public: Option<bool>,
}

// ============================================================================
// Recipes
// ============================================================================

/// Ingredient as entered: a quantity of some unit of a food
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngredientInput {
    pub food_item_id: String,
    pub quantity: f64,
    #[serde(default)]
    pub unit: Option<String>,
}

/// Create a recipe
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateRecipeRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub description: Option<String>,
    #[validate(range(min = 1.0, max = 100.0))]
    pub servings: f64,
    #[serde(default)]
    pub ingredients: Vec<IngredientInput>,
}

/// Partial recipe update
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateRecipeRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 1.0, max = 100.0))]
    pub servings: Option<f64>,
}

/// Recipe summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub servings: f64,
    pub total_grams: f64,
    pub totals: Macros,
    pub per_serving: Macros,
    pub per_100g: Macros,
    pub created_at: DateTime<Utc>,
}

/// Recipe ingredient with its contribution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeIngredientResponse {
    pub id: String,
    pub food_item_id: String,
    pub food_name: String,
    pub grams: f64,
    pub macros: Macros,
}

/// Recipe with ingredients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeDetailResponse {
    pub recipe: RecipeResponse,
    pub ingredients: Vec<RecipeIngredientResponse>,
}

// ============================================================================
// Diary
// ============================================================================

/// Log a food or recipe into a meal slot
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LogFoodRequest {
    pub date: NaiveDate,
    pub meal_slot: String,
    pub food_item_id: Option<String>,
    pub recipe_id: Option<String>,
    #[validate(range(min = 0.0, max = 5000.0))]
    pub quantity: f64,
    /// Defaults to grams
    pub unit: Option<String>,
    #[serde(default)]
    pub consumed: bool,
}

/// Change the portion, slot or date of a diary entry
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateLogRequest {
    #[validate(range(min = 0.0, max = 5000.0))]
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub meal_slot: Option<String>,
    pub date: Option<NaiveDate>,
    pub sort_order: Option<i32>,
}

/// Diary entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodLogResponse {
    pub id: String,
    pub date: NaiveDate,
    pub meal_slot: MealSlot,
    pub food_item_id: Option<String>,
    pub recipe_id: Option<String>,
    pub name: String,
    pub grams: f64,
    pub quantity: f64,
    pub unit: String,
    pub consumed: bool,
    pub sort_order: i32,
    pub macros: Macros,
}

/// Result of flipping the consumed flag
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleConsumedResponse {
    pub id: String,
    pub consumed: bool,
}

/// Hide or show a meal slot for one day
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HideSlotRequest {
    pub date: NaiveDate,
    pub meal_slot: String,
    pub hidden: bool,
}

/// Copy the entries of one slot to another day/slot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopySlotRequest {
    pub from_date: NaiveDate,
    pub from_slot: String,
    pub to_date: NaiveDate,
    pub to_slot: Option<String>,
}

/// Full diary day
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayResponse {
    pub date: NaiveDate,
    pub entries: Vec<FoodLogResponse>,
    pub water: Vec<WaterLogResponse>,
    pub summary: DaySummary,
}

// ============================================================================
// Water
// ============================================================================

/// Log water intake
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LogWaterRequest {
    pub date: NaiveDate,
    #[validate(range(min = 1.0, max = 5000.0))]
    pub amount_ml: f64,
}

/// Water entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaterLogResponse {
    pub id: String,
    pub date: NaiveDate,
    pub amount_ml: f64,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Progress
// ============================================================================

/// Record body measurements
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CreateMeasurementRequest {
    pub measured_on: Option<NaiveDate>,
    #[validate(range(min = 20.0, max = 500.0))]
    pub weight_kg: Option<f64>,
    pub waist_cm: Option<f64>,
    pub hip_cm: Option<f64>,
    pub chest_cm: Option<f64>,
    pub arm_cm: Option<f64>,
    pub thigh_cm: Option<f64>,
    #[validate(range(min = 2.0, max = 70.0))]
    pub body_fat_pct: Option<f64>,
    pub notes: Option<String>,
}

/// Body measurement entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeasurementResponse {
    pub id: String,
    pub measured_on: NaiveDate,
    pub weight_kg: Option<f64>,
    pub waist_cm: Option<f64>,
    pub hip_cm: Option<f64>,
    pub chest_cm: Option<f64>,
    pub arm_cm: Option<f64>,
    pub thigh_cm: Option<f64>,
    pub body_fat_pct: Option<f64>,
    pub bmi: Option<f64>,
    pub notes: Option<String>,
}

/// Register a progress photo that was uploaded elsewhere
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreatePhotoRequest {
    pub taken_on: Option<NaiveDate>,
    #[validate(url)]
    pub image_url: String,
    pub pose: Option<String>,
    pub notes: Option<String>,
}

/// Progress photo entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotoResponse {
    pub id: String,
    pub taken_on: NaiveDate,
    pub image_url: String,
    pub pose: Option<String>,
    pub notes: Option<String>,
}

/// One point of the weight trend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightPoint {
    pub date: NaiveDate,
    pub weight_kg: f64,
}

/// Data behind the progress charts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressChartResponse {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub targets: MacroTargets,
    pub days: Vec<DayTotals>,
    pub weight: Vec<WeightPoint>,
    /// Mean consumed calories over days with any consumed food
    pub average_calories: f64,
    /// Days whose consumed calories are within 10% of target
    pub days_on_target: usize,
}

// ============================================================================
// AI assistance
// ============================================================================

/// Free-text food lookup
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AiFoodSearchRequest {
    #[validate(length(min = 2, max = 200))]
    pub query: String,
}

/// A food proposed by the model, nutrition per 100 g
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiFoodSuggestion {
    pub name: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub protein_g: f64,
    #[serde(default)]
    pub carbs_g: f64,
    #[serde(default)]
    pub fat_g: f64,
    #[serde(default)]
    pub serving_sizes: Vec<ServingSize>,
}

/// Foods proposed for a search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiFoodSearchResponse {
    pub foods: Vec<AiFoodSuggestion>,
}

/// Photo of a nutrition label
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ScanLabelRequest {
    #[validate(length(min = 1))]
    pub image_base64: String,
    #[serde(default = "default_image_mime")]
    pub mime_type: String,
}

fn default_image_mime() -> String {
    "image/jpeg".to_string()
}

/// Ask how much a unit of a food weighs in a given state
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RefineUnitRequest {
    #[validate(length(min = 1, max = 200))]
    pub food_name: String,
    pub unit: String,
    #[serde(default = "default_quantity")]
    pub quantity: f64,
    /// e.g. "cooked", "raw", "drained"
    pub state: Option<String>,
}

fn default_quantity() -> f64 {
    1.0
}

/// Model's answer to a unit refinement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefineUnitResponse {
    pub grams: f64,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub explanation: Option<String>,
}

/// Ask for a meal plan that fits the user's targets
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DietPlanRequest {
    #[validate(range(min = 1, max = 7))]
    #[serde(default = "default_plan_days")]
    pub days: u32,
    #[validate(length(max = 500))]
    pub preferences: Option<String>,
    #[serde(default)]
    pub excluded_foods: Vec<String>,
}

fn default_plan_days() -> u32 {
    1
}

/// Ingredient of a planned meal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanIngredient {
    pub name: String,
    #[serde(default)]
    pub grams: f64,
}

/// A meal of a generated plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanMeal {
    pub meal_slot: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub protein_g: f64,
    #[serde(default)]
    pub carbs_g: f64,
    #[serde(default)]
    pub fat_g: f64,
    #[serde(default)]
    pub ingredients: Vec<PlanIngredient>,
}

/// One day of a generated plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanDay {
    pub day: u32,
    pub meals: Vec<PlanMeal>,
}

/// Generated plan together with the targets it was built for
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DietPlanResponse {
    pub targets: MacroTargets,
    pub days: Vec<PlanDay>,
}
