//! API Module
//!
//! JSON HTTP front end over the data service.
//!
//! # Endpoints
//! - `GET /v2/:kind` - ID list, or ordered records with `?ids=`
//! - `GET /v2/:kind/:id` - A single record
//! - `GET /search/:kind` - Filter a loaded snapshot
//! - `GET /recipes/search` - Recipes by `output` or `input` item
//! - `GET /stats` - Cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
