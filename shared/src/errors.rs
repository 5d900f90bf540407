//! Error types for the nutrition domain

use thiserror::Error;

/// Failures of pure nutrition computations and input checks
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NutritionError {
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("Unknown serving size: {0}")]
    UnknownServing(String),

    #[error("Unknown meal slot: {0}")]
    UnknownMealSlot(String),

    #[error("Validation error: {0}")]
    Validation(String),
}
