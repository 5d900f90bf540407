//! Application error handling
//!
//! This module provides unified error handling for the API,
//! converting internal errors to appropriate HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use nutrition_tracker_shared::NutritionError;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

/// API error type that can be converted to HTTP responses
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid {field}: {message}")]
    InvalidField { field: String, message: String },

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("Database error")]
    Database(#[from] sqlx::Error),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The completion API could not be reached or answered with an error
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// The model answered but its text held no usable JSON
    #[error("Could not parse model response: {message}")]
    AiParse { message: String, raw: String },
}

/// Error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

/// Error detail
#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Unparsed model output, only present on AI parse failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut field = None;
        let mut raw = None;
        let (status, code, message) = match self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg),
            ApiError::InvalidField {
                field: name,
                message,
            } => {
                field = Some(name);
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message)
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Internal(err) => {
                error!("Internal error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
            ApiError::Database(err) => {
                error!("Database error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            ApiError::Upstream(msg) => {
                warn!("Completion API error: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    "UPSTREAM_ERROR",
                    "The AI service is unavailable".to_string(),
                )
            }
            ApiError::AiParse { message, raw: text } => {
                warn!(error = %message, "Model response was not valid JSON");
                raw = Some(text);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "AI_PARSE_ERROR",
                    format!("Could not parse model response: {}", message),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                field,
                raw,
            },
        });

        (status, body).into_response()
    }
}

impl From<NutritionError> for ApiError {
    fn from(err: NutritionError) -> Self {
        let message = err.to_string();
        let field = match err {
            NutritionError::UnknownMealSlot(_) => "meal_slot",
            NutritionError::UnknownServing(_) => "unit",
            NutritionError::InvalidQuantity(_) => "quantity",
            NutritionError::Validation(msg) => return ApiError::Validation(msg),
        };
        ApiError::InvalidField {
            field: field.to_string(),
            message,
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let first = errors
            .field_errors()
            .into_iter()
            .next()
            .map(|(field, errs)| {
                let message = errs
                    .first()
                    .and_then(|e| e.message.as_ref().map(|m| m.to_string()))
                    .unwrap_or_else(|| format!("{} is invalid", field));
                (field.to_string(), message)
            });
        match first {
            Some((field, message)) => ApiError::InvalidField { field, message },
            None => ApiError::Validation(errors.to_string()),
        }
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_validation_error_status() {
        let error = ApiError::Validation("Invalid input".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_not_found_error_status() {
        let error = ApiError::NotFound("Food not found".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_upstream_error_status() {
        let response = ApiError::Upstream("timeout".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_ai_parse_error_carries_raw_text() {
        let error = ApiError::AiParse {
            message: "expected value".to_string(),
            raw: "Sorry, I cannot help".to_string(),
        };
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "AI_PARSE_ERROR");
        assert_eq!(body["error"]["raw"], "Sorry, I cannot help");
    }

    #[tokio::test]
    async fn test_unknown_slot_reports_field() {
        let error: ApiError = NutritionError::UnknownMealSlot("brunch".to_string()).into();
        let body = body_json(error.into_response()).await;
        assert_eq!(body["error"]["field"], "meal_slot");
    }

    #[test]
    fn test_validator_errors_map_to_field() {
        let request = nutrition_tracker_shared::LogWaterRequest {
            date: chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            amount_ml: 99999.0,
        };
        let error: ApiError = request.validate().unwrap_err().into();
        match error {
            ApiError::InvalidField { field, .. } => assert_eq!(field, "amount_ml"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
