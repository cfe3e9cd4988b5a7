//! API Handlers
//!
//! HTTP request handlers for each registry endpoint. Handlers only
//! translate between HTTP and `RecordService`.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};

use crate::error::{Result, ServiceError};
use crate::models::{HealthResponse, Record, RegisterRequest, RemoveResponse, StatsResponse};
use crate::service::RecordService;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<RecordService>,
}

impl AppState {
    pub fn new(service: RecordService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

/// Handler for POST /register
///
/// Creates a record and answers 201 with it, including its new id.
/// A body that is not a JSON object of string fields answers 400.
pub async fn register_handler(
    State(state): State<AppState>,
    body: std::result::Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Record>)> {
    let Json(req) = body.map_err(|rejection| ServiceError::Validation(rejection.body_text()))?;
    let (name, value) = req.into_parts();
    let record = state.service.register(name, value).await?;

    Ok((StatusCode::CREATED, Json(record)))
}

/// Handler for GET /data
pub async fn list_handler(State(state): State<AppState>) -> Result<Json<Vec<Record>>> {
    Ok(Json(state.service.list().await?))
}

/// Handler for GET /data/:id
pub async fn get_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Record>> {
    Ok(Json(state.service.get(&id).await?))
}

/// Handler for DELETE /data/:id
pub async fn remove_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RemoveResponse>> {
    let id = state.service.remove(&id).await?;

    Ok(Json(RemoveResponse::new(id)))
}

/// Handler for GET /stats
///
/// Returns current cache statistics.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(state.service.cache_stats().await.into())
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
