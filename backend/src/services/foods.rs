//! Food database service

use crate::error::ApiError;
use crate::repositories::{
    dec_to_f64, f64_to_dec, CreateFoodItem, FoodItemRecord, FoodItemRepository, UpdateFoodItem,
};
use nutrition_tracker_shared::portions::ServingSize;
use nutrition_tracker_shared::types::{CreateFoodRequest, FoodItemResponse, UpdateFoodRequest};
use nutrition_tracker_shared::validation::{validate_grams, validate_name, validate_per_100g};
use nutrition_tracker_shared::NutrientProfile;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

const DEFAULT_SEARCH_LIMIT: i64 = 25;
const MAX_SEARCH_LIMIT: i64 = 100;

pub struct FoodService;

pub fn to_response(item: FoodItemRecord, user_id: Uuid) -> FoodItemResponse {
    FoodItemResponse {
        id: item.id.to_string(),
        owned: item.created_by == Some(user_id),
        name: item.name,
        brand: item.brand,
        calories: dec_to_f64(item.calories),
        protein_g: dec_to_f64(item.protein_g),
        carbs_g: dec_to_f64(item.carbs_g),
        fat_g: dec_to_f64(item.fat_g),
        serving_sizes: item.serving_sizes.0,
        image_url: item.image_url,
        is_public: item.is_public,
    }
}

/// Per-100g values of a stored food
pub fn nutrient_profile(item: &FoodItemRecord) -> NutrientProfile {
    NutrientProfile::new(
        dec_to_f64(item.calories),
        dec_to_f64(item.protein_g),
        dec_to_f64(item.carbs_g),
        dec_to_f64(item.fat_g),
    )
}

/// Trim names, drop blank entries, reject non-positive weights and
/// case-insensitive duplicates
fn clean_servings(servings: Vec<ServingSize>) -> Result<Vec<ServingSize>, ApiError> {
    let mut cleaned: Vec<ServingSize> = Vec::with_capacity(servings.len());
    for serving in servings {
        let name = serving.name.trim();
        if name.is_empty() {
            continue;
        }
        validate_grams(serving.grams).map_err(|message| ApiError::InvalidField {
            field: "serving_sizes".to_string(),
            message: format!("{}: {}", name, message),
        })?;
        if cleaned.iter().any(|s| s.name.eq_ignore_ascii_case(name)) {
            return Err(ApiError::InvalidField {
                field: "serving_sizes".to_string(),
                message: format!("Duplicate serving size: {}", name),
            });
        }
        cleaned.push(ServingSize::new(name, serving.grams));
    }
    Ok(cleaned)
}

fn check_nutrition(calories: f64, protein: f64, carbs: f64, fat: f64) -> Result<(), ApiError> {
    validate_per_100g(calories, protein, carbs, fat).map_err(ApiError::Validation)
}

pub(crate) fn parse_id(raw: &str, what: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::Validation(format!("Invalid {}", what)))
}

impl FoodService {
    pub async fn search(
        db: &PgPool,
        user_id: Uuid,
        query: &str,
        limit: Option<i64>,
    ) -> Result<Vec<FoodItemResponse>, ApiError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ApiError::Validation("Search query cannot be empty".to_string()));
        }
        let limit = limit.unwrap_or(DEFAULT_SEARCH_LIMIT).clamp(1, MAX_SEARCH_LIMIT);

        let items = FoodItemRepository::search(db, user_id, query, limit)
            .await
            .map_err(ApiError::Internal)?;

        Ok(items.into_iter().map(|i| to_response(i, user_id)).collect())
    }

    pub async fn list_own(db: &PgPool, user_id: Uuid) -> Result<Vec<FoodItemResponse>, ApiError> {
        let items = FoodItemRepository::list_own(db, user_id, MAX_SEARCH_LIMIT)
            .await
            .map_err(ApiError::Internal)?;
        Ok(items.into_iter().map(|i| to_response(i, user_id)).collect())
    }

    /// A food the user can see, or NotFound
    pub async fn find(db: &PgPool, user_id: Uuid, id: Uuid) -> Result<FoodItemRecord, ApiError> {
        FoodItemRepository::find_visible(db, id, user_id)
            .await
            .map_err(ApiError::Internal)?
            .ok_or_else(|| ApiError::NotFound("Food not found".to_string()))
    }

    pub async fn get(db: &PgPool, user_id: Uuid, id: Uuid) -> Result<FoodItemResponse, ApiError> {
        Ok(to_response(Self::find(db, user_id, id).await?, user_id))
    }

    pub async fn servings(db: &PgPool, user_id: Uuid, id: Uuid) -> Result<Vec<ServingSize>, ApiError> {
        Ok(Self::find(db, user_id, id).await?.serving_sizes.0)
    }

    pub async fn create(
        db: &PgPool,
        user_id: Uuid,
        req: CreateFoodRequest,
    ) -> Result<FoodItemResponse, ApiError> {
        req.validate()?;
        validate_name(&req.name).map_err(ApiError::Validation)?;

        let protein = req.protein_g.unwrap_or(0.0);
        let carbs = req.carbs_g.unwrap_or(0.0);
        let fat = req.fat_g.unwrap_or(0.0);
        check_nutrition(req.calories, protein, carbs, fat)?;

        let input = CreateFoodItem {
            name: req.name.trim().to_string(),
            brand: req.brand.map(|b| b.trim().to_string()).filter(|b| !b.is_empty()),
            calories: f64_to_dec(req.calories),
            protein_g: f64_to_dec(protein),
            carbs_g: f64_to_dec(carbs),
            fat_g: f64_to_dec(fat),
            serving_sizes: clean_servings(req.serving_sizes)?,
            image_url: req.image_url,
            created_by: user_id,
            is_public: req.is_public,
        };

        let item = FoodItemRepository::create(db, input)
            .await
            .map_err(ApiError::Internal)?;

        info!(food_id = %item.id, "Food created");
        Ok(to_response(item, user_id))
    }

    /// Update a food the user created. Public foods of other users are
    /// visible but read-only.
    pub async fn update(
        db: &PgPool,
        user_id: Uuid,
        id: Uuid,
        req: UpdateFoodRequest,
    ) -> Result<FoodItemResponse, ApiError> {
        req.validate()?;
        let current = Self::find(db, user_id, id).await?;
        if current.created_by != Some(user_id) {
            return Err(ApiError::Forbidden("Only the creator can edit this food".to_string()));
        }
        if let Some(name) = &req.name {
            validate_name(name).map_err(ApiError::Validation)?;
        }

        check_nutrition(
            req.calories.unwrap_or_else(|| dec_to_f64(current.calories)),
            req.protein_g.unwrap_or_else(|| dec_to_f64(current.protein_g)),
            req.carbs_g.unwrap_or_else(|| dec_to_f64(current.carbs_g)),
            req.fat_g.unwrap_or_else(|| dec_to_f64(current.fat_g)),
        )?;

        let input = UpdateFoodItem {
            name: req.name.map(|n| n.trim().to_string()),
            brand: req.brand.map(|b| b.trim().to_string()),
            calories: req.calories.map(f64_to_dec),
            protein_g: req.protein_g.map(f64_to_dec),
            carbs_g: req.carbs_g.map(f64_to_dec),
            fat_g: req.fat_g.map(f64_to_dec),
            serving_sizes: req.serving_sizes.map(clean_servings).transpose()?,
            image_url: req.image_url,
            is_public: req.is_public,
        };

        let item = FoodItemRepository::update(db, id, user_id, input)
            .await
            .map_err(ApiError::Internal)?
            .ok_or_else(|| ApiError::NotFound("Food not found".to_string()))?;

        Ok(to_response(item, user_id))
    }

    /// Delete a food nobody has logged or put in a recipe
    pub async fn delete(db: &PgPool, user_id: Uuid, id: Uuid) -> Result<(), ApiError> {
        let current = Self::find(db, user_id, id).await?;
        if current.created_by != Some(user_id) {
            return Err(ApiError::Forbidden("Only the creator can delete this food".to_string()));
        }
        let uses = FoodItemRepository::usage_count(db, id)
            .await
            .map_err(ApiError::Internal)?;
        if uses > 0 {
            return Err(ApiError::Conflict(format!(
                "Food is used by {} diary entries or recipe ingredients",
                uses
            )));
        }

        FoodItemRepository::delete(db, id, user_id)
            .await
            .map_err(ApiError::Internal)?;
        Ok(())
    }
}
