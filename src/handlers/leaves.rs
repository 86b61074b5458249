//! Leave management endpoints.

use axum::{Extension, Json, extract::State, response::IntoResponse};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::audit::RequestActor;
use crate::auth::AuthSession;
use crate::error::{self, ApiError};
use crate::handlers::types::ApiResponse;
use crate::rbac::{self, Action};
use crate::repositories::{LeaveAction, LeaveRepository};
use crate::server::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct LeaveBatchBody {
    pub ids: Vec<Uuid>,
    pub action: LeaveAction,
}

#[utoipa::path(
    post,
    path = "/api/v1/hr/leaves/batch",
    request_body = LeaveBatchBody,
    responses(
        (status = 200, description = "Aggregate success/failure counts"),
        (status = 400, description = "Empty id list"),
        (status = 403, description = "Missing hr approve permission"),
    ),
    tag = "hr"
)]
pub async fn batch_process_leaves(
    State(state): State<AppState>,
    session: AuthSession,
    Extension(actor): Extension<RequestActor>,
    Json(body): Json<LeaveBatchBody>,
) -> Result<impl IntoResponse, ApiError> {
    // The route gate maps POST to the create verb; deciding leaves is an
    // approval action and demands the stronger permission explicitly.
    if !rbac::has_permission(&session.grants, &session.roles, "hr", Action::Approve) {
        return Err(error::forbidden(Some(
            "Deciding leave requests requires the hr approve permission",
        )));
    }

    let outcome = LeaveRepository::new(state.db.clone())
        .batch_process(&actor, &state.audit, &body.ids, body.action)
        .await?;

    Ok(ApiResponse::new(outcome))
}
