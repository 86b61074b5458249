//! # HTTP Handlers
//!
//! Thin handler functions over the repository layer; request/response
//! envelope types live in [`types`].

use axum::{Json, extract::State, response::IntoResponse};

use crate::db;
use crate::error::ApiError;
use crate::models::ServiceInfo;
use crate::server::AppState;

pub mod admin;
pub mod approvals;
pub mod leaves;
pub mod notifications;
pub mod types;

/// Service info for the root path.
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Service name and version", body = ServiceInfo)),
    tag = "system"
)]
pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo::default())
}

/// Liveness/readiness probe; verifies database connectivity.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service healthy"),
        (status = 503, description = "Database unreachable"),
    ),
    tag = "system"
)]
pub async fn health(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    db::health_check(&state.db).await?;
    Ok(Json(serde_json::json!({ "status": "ok" })))
}
