//! Prompt templates
//!
//! Every prompt ends by fixing the exact JSON shape expected back, inside a
//! ```json fence.

use nutrition_tracker_shared::{DietPlanRequest, MacroTargets, MealSlot, RefineUnitRequest};

const FOOD_SHAPE: &str = r#"{"name": string, "brand": string|null, "calories": number, "protein_g": number, "carbs_g": number, "fat_g": number, "serving_sizes": [{"name": string, "grams": number}]}"#;

fn reply_with(shape: &str) -> String {
    format!(
        "Reply with a single ```json code block and nothing else. The JSON must have this shape:\n{}\nAll nutrition values are per 100 g.",
        shape
    )
}

pub fn food_search(query: &str) -> String {
    format!(
        "You are a nutrition database. List up to 5 foods matching the search \"{}\". \
         Prefer generic foods, then common branded products. Include typical household \
         servings (unit, slice, cup, tablespoon) with their weight in grams.\n{}",
        query.trim(),
        reply_with(&format!(r#"{{"foods": [{}]}}"#, FOOD_SHAPE))
    )
}

pub fn scan_label() -> String {
    format!(
        "The image is a nutrition facts label. Read it and convert every value to per 100 g \
         (or per 100 ml for drinks). If the label states a serving size, add it to \
         serving_sizes with its weight in grams. Use the product name from the package if \
         visible, otherwise a short description.\n{}",
        reply_with(FOOD_SHAPE)
    )
}

pub fn refine_unit(request: &RefineUnitRequest) -> String {
    let state = request
        .state
        .as_deref()
        .map(|s| format!(" ({})", s.trim()))
        .unwrap_or_default();
    format!(
        "How many grams is {} {} of {}{}? Use typical household measures and account for the \
         food's state (raw, cooked, drained) when given.\nReply with a single ```json code block \
         and nothing else, shaped as {{\"grams\": number, \"state\": string|null, \
         \"explanation\": string}}. grams is the total for the whole quantity.",
        request.quantity, request.unit, request.food_name, state
    )
}

pub fn diet_plan(request: &DietPlanRequest, targets: &MacroTargets) -> String {
    let slots: Vec<String> = MealSlot::ALL
        .iter()
        .map(|slot| {
            format!(
                "{} (~{:.0} kcal)",
                slot.as_str(),
                targets.calories * slot.calorie_share()
            )
        })
        .collect();
    let preferences = request
        .preferences
        .as_deref()
        .filter(|p| !p.trim().is_empty())
        .map(|p| format!("\nPreferences: {}", p.trim()))
        .unwrap_or_default();
    let excluded = if request.excluded_foods.is_empty() {
        String::new()
    } else {
        format!("\nNever use: {}", request.excluded_foods.join(", "))
    };

    format!(
        "Create a {}-day meal plan. Daily targets: {:.0} kcal, {:.0} g protein, {:.0} g \
         carbohydrates, {:.0} g fat. Each day has these meals: {}.{}{}\n\
         Reply with a single ```json code block and nothing else, shaped as \
         {{\"days\": [{{\"day\": number, \"meals\": [{{\"meal_slot\": \"breakfast\"|\"lunch\"|\"dinner\"|\"snack\", \
         \"name\": string, \"description\": string, \"calories\": number, \"protein_g\": number, \
         \"carbs_g\": number, \"fat_g\": number, \"ingredients\": [{{\"name\": string, \"grams\": number}}]}}]}}]}}. \
         Values are for the whole meal.",
        request.days,
        targets.calories,
        targets.protein_g,
        targets.carbs_g,
        targets.fat_g,
        slots.join(", "),
        preferences,
        excluded
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_food_search_mentions_query_and_shape() {
        let prompt = food_search("  greek yogurt ");
        assert!(prompt.contains("\"greek yogurt\""));
        assert!(prompt.contains("```json"));
        assert!(prompt.contains("\"foods\""));
    }

    #[test]
    fn test_refine_unit_includes_state() {
        let prompt = refine_unit(&RefineUnitRequest {
            food_name: "rice".to_string(),
            unit: "cup".to_string(),
            quantity: 2.0,
            state: Some("cooked".to_string()),
        });
        assert!(prompt.contains("2 cup of rice (cooked)"));
    }

    #[test]
    fn test_diet_plan_splits_calories_by_slot() {
        let request = DietPlanRequest {
            days: 3,
            preferences: Some("vegetarian".to_string()),
            excluded_foods: vec!["peanuts".to_string()],
        };
        let targets = MacroTargets::custom(2000.0, 120.0, 220.0, 70.0);
        let prompt = diet_plan(&request, &targets);
        assert!(prompt.contains("3-day"));
        assert!(prompt.contains("breakfast (~500 kcal)"));
        assert!(prompt.contains("lunch (~700 kcal)"));
        assert!(prompt.contains("Preferences: vegetarian"));
        assert!(prompt.contains("Never use: peanuts"));
    }
}
