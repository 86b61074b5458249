//! Role administration endpoints.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::AuthSession;
use crate::error::ApiError;
use crate::handlers::types::ApiResponse;
use crate::rbac::Action;
use crate::repositories::RoleRepository;
use crate::server::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateRoleBody {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PermissionPair {
    pub module: String,
    pub action: Action,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RolePermissionsBody {
    pub permissions: Vec<PermissionPair>,
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/roles",
    responses((status = 200, description = "All roles, ordered by name")),
    tag = "admin"
)]
pub async fn list_roles(
    State(state): State<AppState>,
    _session: AuthSession,
) -> Result<impl IntoResponse, ApiError> {
    let roles = RoleRepository::new(state.db.clone()).list().await?;
    Ok(ApiResponse::new(roles))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/roles",
    request_body = CreateRoleBody,
    responses(
        (status = 201, description = "Role created"),
        (status = 409, description = "Duplicate role name"),
    ),
    tag = "admin"
)]
pub async fn create_role(
    State(state): State<AppState>,
    _session: AuthSession,
    Json(body): Json<CreateRoleBody>,
) -> Result<impl IntoResponse, ApiError> {
    let role = RoleRepository::new(state.db.clone())
        .create(body.name, body.description)
        .await?;
    Ok((StatusCode::CREATED, ApiResponse::new(role)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/roles/{id}",
    params(("id" = Uuid, Path, description = "Role id")),
    responses(
        (status = 200, description = "Role deleted"),
        (status = 404, description = "Unknown role"),
        (status = 409, description = "System roles cannot be deleted"),
    ),
    tag = "admin"
)]
pub async fn delete_role(
    State(state): State<AppState>,
    _session: AuthSession,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    RoleRepository::new(state.db.clone()).delete(id).await?;
    Ok(ApiResponse::new(json!({ "id": id })))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/roles/{id}/permissions",
    params(("id" = Uuid, Path, description = "Role id")),
    request_body = RolePermissionsBody,
    responses(
        (status = 200, description = "Permission set replaced"),
        (status = 400, description = "Unknown (module, action) pair"),
        (status = 404, description = "Unknown role"),
    ),
    tag = "admin"
)]
pub async fn set_role_permissions(
    State(state): State<AppState>,
    _session: AuthSession,
    Path(id): Path<Uuid>,
    Json(body): Json<RolePermissionsBody>,
) -> Result<impl IntoResponse, ApiError> {
    let pairs: Vec<(String, Action)> = body
        .permissions
        .into_iter()
        .map(|p| (p.module, p.action))
        .collect();

    let count = RoleRepository::new(state.db.clone())
        .set_permissions(id, &pairs)
        .await?;

    Ok(ApiResponse::new(json!({ "id": id, "count": count })))
}
