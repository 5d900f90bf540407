//! Recipe service
//!
//! Ingredients are stored by weight. The quantity and unit the user typed
//! are kept alongside for display; nutrition always derives from grams.

use crate::error::ApiError;
use crate::repositories::{
    dec_to_f64, f64_to_dec, f64_to_quantity, CreateRecipe, IngredientRow, NewIngredient,
    RecipeRecord, RecipeRepository, UpdateRecipe,
};
use crate::services::foods::{parse_id, FoodService};
use nutrition_tracker_shared::daily::{
    recipe_per_100g, recipe_totals, recipe_weight, IngredientLine,
};
use nutrition_tracker_shared::portions::{resolve_grams, PortionUnit};
use nutrition_tracker_shared::types::{
    CreateRecipeRequest, IngredientInput, RecipeDetailResponse, RecipeIngredientResponse,
    RecipeResponse, UpdateRecipeRequest,
};
use nutrition_tracker_shared::validation::{validate_grams, validate_name};
use nutrition_tracker_shared::{for_grams, NutrientProfile, HIDDEN_MEAL_MARKER};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

pub struct RecipeService;

/// Computation form of a stored ingredient
pub fn ingredient_line(row: &IngredientRow) -> IngredientLine {
    IngredientLine {
        grams: dec_to_f64(row.grams),
        per_100g: NutrientProfile::new(
            dec_to_f64(row.calories),
            dec_to_f64(row.protein_g),
            dec_to_f64(row.carbs_g),
            dec_to_f64(row.fat_g),
        ),
    }
}

/// Recipe totals, per serving and per 100 g, from its ingredient rows
pub fn recipe_response(recipe: &RecipeRecord, ingredients: &[IngredientRow]) -> RecipeResponse {
    let lines: Vec<IngredientLine> = ingredients.iter().map(ingredient_line).collect();
    let servings = dec_to_f64(recipe.servings).max(1.0);
    let totals = recipe_totals(&lines);

    RecipeResponse {
        id: recipe.id.to_string(),
        name: recipe.name.clone(),
        description: recipe.description.clone(),
        servings,
        total_grams: recipe_weight(&lines),
        totals: totals.round(1),
        per_serving: totals.scale(1.0 / servings).round(1),
        per_100g: recipe_per_100g(&lines).round(1),
        created_at: recipe.created_at,
    }
}

fn detail(recipe: &RecipeRecord, ingredients: &[IngredientRow]) -> RecipeDetailResponse {
    RecipeDetailResponse {
        recipe: recipe_response(recipe, ingredients),
        ingredients: ingredients
            .iter()
            .map(|row| {
                let line = ingredient_line(row);
                RecipeIngredientResponse {
                    id: row.id.to_string(),
                    food_item_id: row.food_item_id.to_string(),
                    food_name: row.food_name.clone(),
                    grams: line.grams,
                    macros: for_grams(&line.per_100g, line.grams).round(1),
                }
            })
            .collect(),
    }
}

/// Entered unit, grams when absent. The hidden-slot marker is not a unit.
pub(crate) fn parse_unit(unit: Option<&str>) -> Result<PortionUnit, ApiError> {
    match unit.map(str::trim) {
        None | Some("") => Ok(PortionUnit::Gram),
        Some(u) if u.eq_ignore_ascii_case(HIDDEN_MEAL_MARKER) => Err(ApiError::InvalidField {
            field: "unit".to_string(),
            message: format!("'{}' is reserved", u),
        }),
        Some(u) => Ok(u.parse::<PortionUnit>()?),
    }
}

impl RecipeService {
    /// Resolve an entered ingredient to grams using the food's servings
    async fn resolve_ingredient(
        db: &PgPool,
        user_id: Uuid,
        input: &IngredientInput,
    ) -> Result<NewIngredient, ApiError> {
        let food_id = parse_id(&input.food_item_id, "food item id")?;
        let food = FoodService::find(db, user_id, food_id).await?;
        let unit = parse_unit(input.unit.as_deref())?;
        let grams = resolve_grams(input.quantity, &unit, &food.serving_sizes.0)?;
        validate_grams(grams).map_err(|message| ApiError::InvalidField {
            field: "quantity".to_string(),
            message,
        })?;

        Ok(NewIngredient {
            food_item_id: food_id,
            grams: f64_to_dec(grams),
            quantity: f64_to_quantity(input.quantity),
            unit: unit.abbreviation().to_string(),
        })
    }

    pub async fn find(db: &PgPool, user_id: Uuid, id: Uuid) -> Result<RecipeRecord, ApiError> {
        RecipeRepository::find_by_id_and_user(db, id, user_id)
            .await
            .map_err(ApiError::Internal)?
            .ok_or_else(|| ApiError::NotFound("Recipe not found".to_string()))
    }

    pub async fn create(
        db: &PgPool,
        user_id: Uuid,
        req: CreateRecipeRequest,
    ) -> Result<RecipeDetailResponse, ApiError> {
        req.validate()?;
        validate_name(&req.name).map_err(ApiError::Validation)?;

        let mut ingredients = Vec::with_capacity(req.ingredients.len());
        for input in &req.ingredients {
            ingredients.push(Self::resolve_ingredient(db, user_id, input).await?);
        }

        let recipe = RecipeRepository::create(
            db,
            CreateRecipe {
                user_id,
                name: req.name.trim().to_string(),
                description: req.description,
                servings: f64_to_dec(req.servings),
            },
            ingredients,
        )
        .await
        .map_err(ApiError::Internal)?;

        info!(recipe_id = %recipe.id, "Recipe created");
        Self::get(db, user_id, recipe.id).await
    }

    pub async fn list(db: &PgPool, user_id: Uuid) -> Result<Vec<RecipeResponse>, ApiError> {
        let recipes = RecipeRepository::list_by_user(db, user_id)
            .await
            .map_err(ApiError::Internal)?;
        let ids: Vec<Uuid> = recipes.iter().map(|r| r.id).collect();
        let rows = RecipeRepository::ingredients_for(db, &ids)
            .await
            .map_err(ApiError::Internal)?;

        Ok(recipes
            .iter()
            .map(|recipe| {
                let own: Vec<IngredientRow> = rows
                    .iter()
                    .filter(|row| row.recipe_id == recipe.id)
                    .cloned()
                    .collect();
                recipe_response(recipe, &own)
            })
            .collect())
    }

    pub async fn get(
        db: &PgPool,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<RecipeDetailResponse, ApiError> {
        let recipe = Self::find(db, user_id, id).await?;
        let ingredients = RecipeRepository::ingredients(db, id)
            .await
            .map_err(ApiError::Internal)?;
        Ok(detail(&recipe, &ingredients))
    }

    pub async fn update(
        db: &PgPool,
        user_id: Uuid,
        id: Uuid,
        req: UpdateRecipeRequest,
    ) -> Result<RecipeDetailResponse, ApiError> {
        req.validate()?;
        if let Some(name) = &req.name {
            validate_name(name).map_err(ApiError::Validation)?;
        }

        RecipeRepository::update(
            db,
            id,
            user_id,
            UpdateRecipe {
                name: req.name.map(|n| n.trim().to_string()),
                description: req.description,
                servings: req.servings.map(f64_to_dec),
            },
        )
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::NotFound("Recipe not found".to_string()))?;

        Self::get(db, user_id, id).await
    }

    pub async fn add_ingredient(
        db: &PgPool,
        user_id: Uuid,
        id: Uuid,
        input: IngredientInput,
    ) -> Result<RecipeDetailResponse, ApiError> {
        Self::find(db, user_id, id).await?;
        let ingredient = Self::resolve_ingredient(db, user_id, &input).await?;
        RecipeRepository::add_ingredient(db, id, ingredient)
            .await
            .map_err(ApiError::Internal)?;
        Self::get(db, user_id, id).await
    }

    pub async fn remove_ingredient(
        db: &PgPool,
        user_id: Uuid,
        id: Uuid,
        ingredient_id: Uuid,
    ) -> Result<RecipeDetailResponse, ApiError> {
        Self::find(db, user_id, id).await?;
        let removed = RecipeRepository::remove_ingredient(db, id, ingredient_id)
            .await
            .map_err(ApiError::Internal)?;
        if !removed {
            return Err(ApiError::NotFound("Ingredient not found".to_string()));
        }
        Self::get(db, user_id, id).await
    }

    /// Delete a recipe along with any diary rows that logged it
    /// Delete a recipe nobody has logged yet
    pub async fn delete(db: &PgPool, user_id: Uuid, id: Uuid) -> Result<(), ApiError> {
        Self::find(db, user_id, id).await?;
        let uses = RecipeRepository::usage_count(db, id)
            .await
            .map_err(ApiError::Internal)?;
        if uses > 0 {
            return Err(ApiError::Conflict(format!(
                "Recipe is used by {} diary entries",
                uses
            )));
        }

        let deleted = RecipeRepository::delete(db, id, user_id)
            .await
            .map_err(ApiError::Internal)?;
        if !deleted {
            return Err(ApiError::NotFound("Recipe not found".to_string()));
        }
        info!(recipe_id = %id, "Recipe deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn row(grams: i64, calories: i64, protein: i64) -> IngredientRow {
        IngredientRow {
            id: Uuid::new_v4(),
            recipe_id: Uuid::nil(),
            food_item_id: Uuid::new_v4(),
            food_name: "ingredient".to_string(),
            grams: Decimal::new(grams, 0),
            quantity: Decimal::new(grams, 0),
            unit: "g".to_string(),
            sort_order: 0,
            calories: Decimal::new(calories, 0),
            protein_g: Decimal::new(protein, 0),
            carbs_g: Decimal::ZERO,
            fat_g: Decimal::ZERO,
        }
    }

    fn recipe(servings: i64) -> RecipeRecord {
        RecipeRecord {
            id: Uuid::nil(),
            user_id: Uuid::new_v4(),
            name: "Omelette".to_string(),
            description: None,
            servings: Decimal::new(servings, 0),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_recipe_response_totals() {
        // 200 g at 100 kcal/100g + 100 g at 400 kcal/100g = 600 kcal over 300 g
        let rows = vec![row(200, 100, 10), row(100, 400, 0)];
        let response = recipe_response(&recipe(2), &rows);
        assert_eq!(response.total_grams, 300.0);
        assert_eq!(response.totals.calories, 600.0);
        assert_eq!(response.per_serving.calories, 300.0);
        assert_eq!(response.per_100g.calories, 200.0);
        assert_eq!(response.totals.protein_g, 20.0);
    }

    #[test]
    fn test_empty_recipe_has_no_nutrition() {
        let response = recipe_response(&recipe(4), &[]);
        assert_eq!(response.total_grams, 0.0);
        assert!(response.per_100g.is_zero());
        assert!(response.per_serving.is_zero());
    }

    #[test]
    fn test_detail_lists_ingredient_contribution() {
        let detail = detail(&recipe(1), &[row(50, 200, 20)]);
        assert_eq!(detail.ingredients.len(), 1);
        assert_eq!(detail.ingredients[0].macros.calories, 100.0);
        assert_eq!(detail.ingredients[0].macros.protein_g, 10.0);
    }

    #[test]
    fn test_parse_unit_defaults_to_grams() {
        assert_eq!(parse_unit(None).unwrap(), PortionUnit::Gram);
        assert_eq!(parse_unit(Some("  ")).unwrap(), PortionUnit::Gram);
        assert_eq!(parse_unit(Some("taza")).unwrap(), PortionUnit::Cup);
        assert_eq!(
            parse_unit(Some("slice")).unwrap(),
            PortionUnit::Named("slice".to_string())
        );
        assert!(parse_unit(Some("HIDDEN_MEAL")).is_err());
    }
}
