//! AI-assisted food lookup, label scanning, unit refinement and meal plans
//!
//! Every call sends one prompt, extracts the JSON answer and sanity-checks
//! it. Answers that cannot be used come back as `AiParse` with the raw text.

use crate::ai::{parse_model_json, prompts, CompletionClient, CompletionRequest, InlineImage};
use crate::error::ApiError;
use metrics::counter;
use nutrition_tracker_shared::portions::ServingSize;
use nutrition_tracker_shared::types::{
    AiFoodSearchRequest, AiFoodSearchResponse, AiFoodSuggestion, DietPlanRequest,
    DietPlanResponse, PlanDay, RefineUnitRequest, RefineUnitResponse, ScanLabelRequest,
};
use nutrition_tracker_shared::{MacroTargets, MealSlot};
use serde::Deserialize;
use tracing::{debug, info};
use validator::Validate;

/// Largest accepted label photo, base64 encoded
pub const MAX_IMAGE_BASE64_LEN: usize = 8 * 1024 * 1024;

#[derive(Debug, Deserialize)]
struct PlanEnvelope {
    days: Vec<PlanDay>,
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        (value * 10.0).round() / 10.0
    } else {
        0.0
    }
}

/// Drop nameless foods, zero out nonsense values and unusable servings
fn clean_suggestion(mut food: AiFoodSuggestion) -> Option<AiFoodSuggestion> {
    food.name = food.name.trim().to_string();
    if food.name.is_empty() {
        return None;
    }
    food.brand = food
        .brand
        .map(|b| b.trim().to_string())
        .filter(|b| !b.is_empty());
    food.calories = non_negative(food.calories);
    food.protein_g = non_negative(food.protein_g);
    food.carbs_g = non_negative(food.carbs_g);
    food.fat_g = non_negative(food.fat_g);
    food.serving_sizes = food
        .serving_sizes
        .into_iter()
        .filter(|s| !s.name.trim().is_empty() && s.grams.is_finite() && s.grams > 0.0)
        .map(|s| ServingSize::new(s.name.trim(), s.grams))
        .collect();
    Some(food)
}

fn unusable(message: &str, raw: &str) -> ApiError {
    counter!("ai_parse_failures_total").increment(1);
    ApiError::AiParse {
        message: message.to_string(),
        raw: raw.to_string(),
    }
}

pub struct AiService;

impl AiService {
    async fn ask(
        client: &dyn CompletionClient,
        endpoint: &'static str,
        request: CompletionRequest,
    ) -> Result<String, ApiError> {
        counter!("ai_requests_total", "endpoint" => endpoint).increment(1);
        let raw = client.complete(request).await?;
        debug!(endpoint, model = client.model(), chars = raw.len(), "Model answered");
        Ok(raw)
    }

    pub async fn food_search(
        client: &dyn CompletionClient,
        req: AiFoodSearchRequest,
    ) -> Result<AiFoodSearchResponse, ApiError> {
        req.validate()?;
        let raw = Self::ask(
            client,
            "food_search",
            CompletionRequest::text(prompts::food_search(&req.query)),
        )
        .await?;

        let parsed: AiFoodSearchResponse = parse_model_json(&raw)?;
        let foods: Vec<AiFoodSuggestion> =
            parsed.foods.into_iter().filter_map(clean_suggestion).collect();
        info!(query = %req.query.trim(), results = foods.len(), "AI food search");
        Ok(AiFoodSearchResponse { foods })
    }

    pub async fn scan_label(
        client: &dyn CompletionClient,
        req: ScanLabelRequest,
    ) -> Result<AiFoodSuggestion, ApiError> {
        req.validate()?;
        if !req.mime_type.starts_with("image/") {
            return Err(ApiError::InvalidField {
                field: "mime_type".to_string(),
                message: "Only images can be scanned".to_string(),
            });
        }
        if req.image_base64.len() > MAX_IMAGE_BASE64_LEN {
            return Err(ApiError::InvalidField {
                field: "image_base64".to_string(),
                message: "Image is too large".to_string(),
            });
        }

        let request = CompletionRequest::text(prompts::scan_label()).with_image(InlineImage {
            mime_type: req.mime_type,
            data_base64: req.image_base64,
        });
        let raw = Self::ask(client, "scan_label", request).await?;

        let parsed: AiFoodSuggestion = parse_model_json(&raw)?;
        clean_suggestion(parsed).ok_or_else(|| unusable("label has no product name", &raw))
    }

    pub async fn refine_unit(
        client: &dyn CompletionClient,
        req: RefineUnitRequest,
    ) -> Result<RefineUnitResponse, ApiError> {
        req.validate()?;
        if req.unit.trim().is_empty() {
            return Err(ApiError::InvalidField {
                field: "unit".to_string(),
                message: "Unit is required".to_string(),
            });
        }
        if !req.quantity.is_finite() || req.quantity <= 0.0 {
            return Err(ApiError::InvalidField {
                field: "quantity".to_string(),
                message: "Quantity must be greater than 0".to_string(),
            });
        }

        let raw = Self::ask(
            client,
            "refine_unit",
            CompletionRequest::text(prompts::refine_unit(&req)),
        )
        .await?;

        let mut parsed: RefineUnitResponse = parse_model_json(&raw)?;
        if !parsed.grams.is_finite() || parsed.grams <= 0.0 {
            return Err(unusable("grams must be a positive number", &raw));
        }
        parsed.grams = (parsed.grams * 10.0).round() / 10.0;
        Ok(parsed)
    }

    /// Meal plan sized to `targets`. Slot names are normalised when the
    /// model uses a known alias.
    pub async fn diet_plan(
        client: &dyn CompletionClient,
        req: DietPlanRequest,
        targets: MacroTargets,
    ) -> Result<DietPlanResponse, ApiError> {
        req.validate()?;
        let raw = Self::ask(
            client,
            "diet_plan",
            CompletionRequest::text(prompts::diet_plan(&req, &targets)),
        )
        .await?;

        let mut plan: PlanEnvelope = parse_model_json(&raw)?;
        if plan.days.is_empty() || plan.days.iter().all(|d| d.meals.is_empty()) {
            return Err(unusable("plan has no meals", &raw));
        }
        for meal in plan.days.iter_mut().flat_map(|d| d.meals.iter_mut()) {
            if let Ok(slot) = meal.meal_slot.parse::<MealSlot>() {
                meal.meal_slot = slot.as_str().to_string();
            }
        }

        Ok(DietPlanResponse {
            targets,
            days: plan.days,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::CompletionError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Replies with canned text and remembers the prompts it saw
    struct Canned {
        reply: Result<String, u16>,
        seen: Mutex<Vec<CompletionRequest>>,
    }

    impl Canned {
        fn ok(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn failing(status: u16) -> Self {
            Self {
                reply: Err(status),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CompletionClient for Canned {
        async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
            self.seen.lock().unwrap().push(request);
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(status) => Err(CompletionError::Status {
                    status: *status,
                    body: "boom".to_string(),
                }),
            }
        }

        fn model(&self) -> &str {
            "canned"
        }
    }

    #[tokio::test]
    async fn test_food_search_parses_and_cleans() {
        let client = Canned::ok(
            "Here you go:\n```json\n{\"foods\": [\
             {\"name\": \" Greek yogurt \", \"calories\": 97, \"protein_g\": 9, \"carbs_g\": 3.98, \"fat_g\": 5,\
              \"serving_sizes\": [{\"name\": \"cup\", \"grams\": 245}, {\"name\": \"\", \"grams\": 10}]},\
             {\"name\": \"\", \"calories\": 10}\
             ]}\n```",
        );
        let response = AiService::food_search(
            &client,
            AiFoodSearchRequest {
                query: "yogurt".to_string(),
            },
        )
        .await
        .unwrap();

        assert_eq!(response.foods.len(), 1);
        let food = &response.foods[0];
        assert_eq!(food.name, "Greek yogurt");
        assert_eq!(food.carbs_g, 4.0);
        assert_eq!(food.serving_sizes, vec![ServingSize::new("cup", 245.0)]);
    }

    #[tokio::test]
    async fn test_unparseable_answer_keeps_raw_text() {
        let client = Canned::ok("I could not find that food.");
        let err = AiService::food_search(
            &client,
            AiFoodSearchRequest {
                query: "zzz".to_string(),
            },
        )
        .await
        .unwrap_err();

        match err {
            ApiError::AiParse { raw, .. } => assert_eq!(raw, "I could not find that food."),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_upstream_failure_maps_to_upstream() {
        let client = Canned::failing(503);
        let err = AiService::refine_unit(
            &client,
            RefineUnitRequest {
                food_name: "rice".to_string(),
                unit: "cup".to_string(),
                quantity: 1.0,
                state: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Upstream(_)));
    }

    #[tokio::test]
    async fn test_refine_unit_rejects_zero_grams() {
        let client = Canned::ok("```json\n{\"grams\": 0, \"explanation\": \"unknown\"}\n```");
        let err = AiService::refine_unit(
            &client,
            RefineUnitRequest {
                food_name: "rice".to_string(),
                unit: "cup".to_string(),
                quantity: 1.0,
                state: Some("cooked".to_string()),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::AiParse { .. }));
    }

    #[tokio::test]
    async fn test_refine_unit_returns_grams() {
        let client = Canned::ok("{\"grams\": 158.04, \"state\": \"cooked\", \"explanation\": \"1 cup cooked rice\"}");
        let answer = AiService::refine_unit(
            &client,
            RefineUnitRequest {
                food_name: "rice".to_string(),
                unit: "cup".to_string(),
                quantity: 1.0,
                state: Some("cooked".to_string()),
            },
        )
        .await
        .unwrap();
        assert_eq!(answer.grams, 158.0);
        assert_eq!(answer.state.as_deref(), Some("cooked"));
    }

    #[tokio::test]
    async fn test_scan_label_sends_image() {
        let client = Canned::ok(
            "```json\n{\"name\": \"Granola\", \"calories\": 450, \"protein_g\": 10, \"carbs_g\": 60, \"fat_g\": 18}\n```",
        );
        let food = AiService::scan_label(
            &client,
            ScanLabelRequest {
                image_base64: "aGVsbG8=".to_string(),
                mime_type: "image/png".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(food.name, "Granola");

        let seen = client.seen.lock().unwrap();
        let image = seen[0].image.as_ref().unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.data_base64, "aGVsbG8=");
    }

    #[tokio::test]
    async fn test_scan_label_rejects_non_images() {
        let client = Canned::ok("{}");
        let err = AiService::scan_label(
            &client,
            ScanLabelRequest {
                image_base64: "aGVsbG8=".to_string(),
                mime_type: "application/pdf".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::InvalidField { .. }));
        assert!(client.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_diet_plan_normalises_slots() {
        let client = Canned::ok(
            "```json\n{\"days\": [{\"day\": 1, \"meals\": [\
             {\"meal_slot\": \"Desayuno\", \"name\": \"Oats\", \"calories\": 450},\
             {\"meal_slot\": \"cena\", \"name\": \"Salmon\", \"calories\": 600}]}]}\n```",
        );
        let targets = MacroTargets::default();
        let plan = AiService::diet_plan(
            &client,
            DietPlanRequest {
                days: 1,
                preferences: None,
                excluded_foods: Vec::new(),
            },
            targets,
        )
        .await
        .unwrap();

        assert_eq!(plan.targets, targets);
        assert_eq!(plan.days[0].meals[0].meal_slot, "breakfast");
        assert_eq!(plan.days[0].meals[1].meal_slot, "dinner");
    }

    #[tokio::test]
    async fn test_diet_plan_without_meals_is_unusable() {
        let client = Canned::ok("```json\n{\"days\": []}\n```");
        let err = AiService::diet_plan(
            &client,
            DietPlanRequest {
                days: 2,
                preferences: None,
                excluded_foods: Vec::new(),
            },
            MacroTargets::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::AiParse { .. }));
    }
}
