//! Notification endpoints, scoped to the authenticated user.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use uuid::Uuid;

use crate::auth::AuthSession;
use crate::error::ApiError;
use crate::handlers::types::{ApiResponse, PageQuery, PaginationParams, build_meta};
use crate::repositories::NotificationRepository;
use crate::server::AppState;

#[utoipa::path(
    get,
    path = "/api/v1/notifications",
    params(PageQuery),
    responses((status = 200, description = "Caller's notifications, newest first")),
    tag = "notifications"
)]
pub async fn list_notifications(
    State(state): State<AppState>,
    session: AuthSession,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let params = PaginationParams::from(&query);

    let repo = NotificationRepository::new(state.db.clone());
    let (items, total) = repo
        .list_for_user(session.user_id, params.page, params.page_size)
        .await?;

    Ok(ApiResponse::with_meta(
        items,
        build_meta(params.page, params.page_size, total),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/notifications/{id}/read",
    params(("id" = Uuid, Path, description = "Notification id")),
    responses(
        (status = 200, description = "Notification marked read"),
        (status = 404, description = "Not the caller's notification"),
    ),
    tag = "notifications"
)]
pub async fn mark_notification_read(
    State(state): State<AppState>,
    session: AuthSession,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let updated = NotificationRepository::new(state.db.clone())
        .mark_read(id, session.user_id)
        .await?;
    Ok(ApiResponse::new(updated))
}
