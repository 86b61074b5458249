//! Approval document endpoints.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{NaiveDate, Utc};
use sea_orm::EntityTrait;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::audit::NewNotification;
use crate::auth::AuthSession;
use crate::error::ApiError;
use crate::handlers::types::{ApiResponse, PageQuery, PaginationParams, build_meta};
use crate::models::{DocumentStatus, Urgency, approval_document, approval_step, employee};
use crate::repositories::{ApprovalRepository, CreateDocumentRequest, Decision, StepSpec};
use crate::server::AppState;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateDocumentBody {
    pub title: String,
    pub content: String,
    /// Business date for document numbering; defaults to today
    pub draft_date: Option<NaiveDate>,
    pub urgency: Option<Urgency>,
    pub related_module: Option<String>,
    pub related_id: Option<Uuid>,
    pub steps: Vec<StepSpec>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DecisionBody {
    pub decision: Decision,
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ListDocumentsQuery {
    pub page: Option<String>,
    pub page_size: Option<String>,
    pub status: Option<DocumentStatus>,
}

/// Document together with its full step chain.
#[derive(Debug, Serialize, ToSchema)]
pub struct DocumentWithSteps {
    #[serde(flatten)]
    pub document: approval_document::Model,
    pub steps: Vec<approval_step::Model>,
}

/// Notify the employee's linked user account, if it has one. Best-effort.
async fn notify_employee(state: &AppState, employee_id: Uuid, title: String, message: String) {
    match employee::Entity::find_by_id(employee_id).one(&state.db).await {
        Ok(Some(emp)) => {
            if let Some(user_id) = emp.user_id {
                state.audit.notify(NewNotification {
                    user_id,
                    notification_type: "APPROVAL".to_string(),
                    title,
                    message,
                    related_url: None,
                });
            }
        }
        Ok(None) => {}
        Err(err) => tracing::warn!(error = %err, "failed to look up employee for notification"),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/approval/documents",
    request_body = CreateDocumentBody,
    responses(
        (status = 201, description = "Document created with its step chain"),
        (status = 400, description = "Empty step chain or missing title"),
        (status = 404, description = "No employee record linked to the account"),
    ),
    tag = "approval"
)]
pub async fn create_document(
    State(state): State<AppState>,
    session: AuthSession,
    Json(body): Json<CreateDocumentBody>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = ApprovalRepository::new(state.db.clone());
    let (document, steps) = repo
        .create_document(
            session.user_id,
            CreateDocumentRequest {
                title: body.title,
                content: body.content,
                draft_date: body.draft_date.unwrap_or_else(|| Utc::now().date_naive()),
                urgency: body.urgency.unwrap_or(Urgency::Normal),
                related_module: body.related_module,
                related_id: body.related_id,
                steps: body.steps,
            },
        )
        .await?;

    if let Some(first) = steps.first() {
        notify_employee(
            &state,
            first.approver_id,
            "Approval requested".to_string(),
            format!("Document {} awaits your decision", document.document_no),
        )
        .await;
    }

    Ok((
        StatusCode::CREATED,
        ApiResponse::new(DocumentWithSteps { document, steps }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/approval/documents",
    params(ListDocumentsQuery),
    responses((status = 200, description = "Paginated document list")),
    tag = "approval"
)]
pub async fn list_documents(
    State(state): State<AppState>,
    _session: AuthSession,
    Query(query): Query<ListDocumentsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let params = PaginationParams::from(&PageQuery {
        page: query.page,
        page_size: query.page_size,
    });

    let repo = ApprovalRepository::new(state.db.clone());
    let (documents, total) = repo
        .list_documents(params.page, params.page_size, query.status)
        .await?;

    Ok(ApiResponse::with_meta(
        documents,
        build_meta(params.page, params.page_size, total),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/approval/documents/{id}",
    params(("id" = Uuid, Path, description = "Document id")),
    responses(
        (status = 200, description = "Document with steps"),
        (status = 404, description = "Unknown document"),
    ),
    tag = "approval"
)]
pub async fn get_document(
    State(state): State<AppState>,
    _session: AuthSession,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = ApprovalRepository::new(state.db.clone());
    let (document, steps) = repo.get_document(id).await?;
    Ok(ApiResponse::new(DocumentWithSteps { document, steps }))
}

#[utoipa::path(
    post,
    path = "/api/v1/approval/documents/{id}/decision",
    params(("id" = Uuid, Path, description = "Document id")),
    request_body = DecisionBody,
    responses(
        (status = 200, description = "Decision applied"),
        (status = 403, description = "Caller is not the current approver"),
        (status = 409, description = "Document already finalized"),
    ),
    tag = "approval"
)]
pub async fn decide_document(
    State(state): State<AppState>,
    session: AuthSession,
    Path(id): Path<Uuid>,
    Json(body): Json<DecisionBody>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = ApprovalRepository::new(state.db.clone());
    let outcome = repo
        .decide(id, session.user_id, body.decision, body.comment)
        .await?;

    if let Some(next_approver) = outcome.next_approver_id {
        notify_employee(
            &state,
            next_approver,
            "Approval requested".to_string(),
            format!(
                "Document {} awaits your decision",
                outcome.document.document_no
            ),
        )
        .await;
    } else if outcome.document.status.is_terminal() {
        let verdict = match outcome.document.status {
            DocumentStatus::Approved => "approved",
            DocumentStatus::Rejected => "rejected",
            _ => "closed",
        };
        notify_employee(
            &state,
            outcome.document.drafter_id,
            format!("Document {}", verdict),
            format!(
                "Your document {} has been {}",
                outcome.document.document_no, verdict
            ),
        )
        .await;
    }

    Ok(ApiResponse::new(DocumentWithSteps {
        document: outcome.document,
        steps: vec![outcome.step],
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/approval/documents/{id}/cancel",
    params(("id" = Uuid, Path, description = "Document id")),
    responses(
        (status = 200, description = "Document cancelled"),
        (status = 403, description = "Caller is not the drafter"),
        (status = 409, description = "Document already finalized"),
    ),
    tag = "approval"
)]
pub async fn cancel_document(
    State(state): State<AppState>,
    session: AuthSession,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = ApprovalRepository::new(state.db.clone());
    let document = repo.cancel(id, session.user_id).await?;
    Ok(ApiResponse::new(document))
}
