//! HTTP API module for inspections, health and metrics endpoints.

pub mod handlers;
pub mod routes;

pub use handlers::{ApiError, AppState};
pub use routes::{cors_layer, create_router};
