//! Business logic services
//!
//! Services validate input, call repositories and shape responses. Handlers
//! stay thin and only deal with extraction and status codes.

pub mod ai;
pub mod diary;
pub mod export;
pub mod foods;
pub mod profile;
pub mod progress;
pub mod recipes;
pub mod user;
pub mod water;

pub use ai::AiService;
pub use diary::{CachedDay, DiaryCache, DiaryService};
pub use export::ExportService;
pub use foods::FoodService;
pub use profile::ProfileService;
pub use progress::ProgressService;
pub use recipes::RecipeService;
pub use user::UserService;
pub use water::WaterService;
