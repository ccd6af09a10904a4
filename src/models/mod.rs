//! Request and Response models for the HTTP API

pub mod requests;
pub mod responses;

pub use requests::{IdsQuery, RecipeLookup, RecipeQuery};
pub use responses::{ErrorResponse, HealthResponse, StatsResponse};
