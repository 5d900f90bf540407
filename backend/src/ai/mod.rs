//! Generative-AI assistance
//!
//! The model is only ever asked for JSON. Answers are pulled out of the
//! first fenced code block (or the first bare object/array) and parsed into
//! the response types; when that fails the raw text goes back to the caller
//! with a 500.

mod client;
mod extract;
pub mod prompts;

pub use client::{
    CompletionClient, CompletionError, CompletionRequest, HttpCompletionClient, InlineImage,
};
pub use extract::{extract_json_block, parse_model_json};
