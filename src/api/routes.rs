//! HTTP API route definitions.

use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request},
    middleware::{self, Next},
    response::Response,
    routing::get,
    routing::put,
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::handlers::{
    create_inspection, health, list_inspections, metrics, update_status, AppState,
};
use crate::metrics::{record_http_request, UNMATCHED_ROUTE};

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health & metrics
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        // Inspections
        .route(
            "/api/inspections",
            get(list_inspections).post(create_inspection),
        )
        .route("/api/inspections/:id/status", put(update_status))
        .layer(middleware::from_fn(track_requests))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS layer allowing any origin, for a separately hosted client.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::permissive()
}

/// Count every request by route template, method and status.
///
/// Requests that match no route share one label so arbitrary paths cannot
/// create new series.
async fn track_requests(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map_or(UNMATCHED_ROUTE, MatchedPath::as_str)
        .to_owned();
    let method = req.method().to_string();

    let response = next.run(req).await;

    record_http_request(&route, &method, response.status().as_u16(), start);
    response
}
