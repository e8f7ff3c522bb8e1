//! HTTP API handlers.

use axum::{
    extract::{rejection::JsonRejection, rejection::PathRejection, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error};

use crate::error::InspectionError;
use crate::inspection::{
    validation, CreateInspectionRequest, Inspection, InspectionService, StatusUpdateRequest,
};
use crate::metrics::MetricsHandle;

/// Application state shared with handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Inspection operations.
    pub service: InspectionService,
    /// Metrics exposition handle.
    pub metrics: MetricsHandle,
}

impl AppState {
    /// Create new app state.
    pub fn new(service: InspectionService, metrics: MetricsHandle) -> Self {
        Self { service, metrics }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always true.
    pub ok: bool,
}

/// Error body returned to API callers.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error.
    pub error: String,
}

impl ErrorResponse {
    fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

/// Handler-level failure.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Service outcome.
    #[error(transparent)]
    Inspection(#[from] InspectionError),

    /// Path id is not an integer, so no record can match it.
    #[error("invalid inspection id {0:?}")]
    InvalidId(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Inspection(InspectionError::Validation(e)) => {
                (StatusCode::BAD_REQUEST, e.to_string())
            }
            ApiError::Inspection(InspectionError::NotFound { .. }) | ApiError::InvalidId(_) => {
                (StatusCode::NOT_FOUND, "Not found".to_string())
            }
            ApiError::Inspection(InspectionError::Store(e)) => {
                error!(error = %e, "Store failure while handling request");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

/// Health check handler - always returns 200.
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { ok: true })
}

/// Metrics handler - Prometheus text exposition.
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        state.metrics.render(),
    )
}

/// List all inspections, newest first.
pub async fn list_inspections(
    State(state): State<AppState>,
) -> Result<Json<Vec<Inspection>>, ApiError> {
    Ok(Json(state.service.list().await?))
}

/// Create an inspection.
///
/// An unreadable body is treated like an empty one.
pub async fn create_inspection(
    State(state): State<AppState>,
    payload: Result<Json<CreateInspectionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Inspection>), ApiError> {
    let request = payload.map(|Json(body)| body).unwrap_or_else(|rejection| {
        debug!(error = %rejection, "unreadable create body");
        CreateInspectionRequest::default()
    });

    let inspection = state.service.create(&request).await?;
    Ok((StatusCode::CREATED, Json(inspection)))
}

/// Change an inspection's status.
///
/// The status is validated before the id is looked up.
pub async fn update_status(
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
    payload: Result<Json<StatusUpdateRequest>, JsonRejection>,
) -> Result<Json<Inspection>, ApiError> {
    let status = match payload {
        Ok(Json(body)) => body.status,
        Err(rejection) => {
            debug!(error = %rejection, "unreadable status body");
            None
        }
    };

    let id = match id {
        Ok(Path(id)) => id,
        Err(rejection) => {
            validation::parse_status(status.as_deref()).map_err(InspectionError::from)?;
            return Err(ApiError::InvalidId(rejection.body_text()));
        }
    };

    let inspection = state.service.transition_status(id, status.as_deref()).await?;
    Ok(Json(inspection))
}
