//! # Approval Repository
//!
//! Persistence for approval documents and their step chains. Document
//! creation allocates a document number and writes the chain in one
//! transaction; decisions re-derive and persist the document status in the
//! same transaction as the step mutation so readers never observe the two
//! out of sync.

use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{self, ApiError};
use crate::models::{
    ApprovalType, DocumentStatus, StepStatus, Urgency, approval_document, approval_step, employee,
};
use crate::repositories::DocSequenceRepository;
use crate::workflow::{self, StepError};

/// Prefix for approval document numbers.
const DOCUMENT_PREFIX: &str = "APR";

/// One step of a submitted approval chain, in submission order.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StepSpec {
    pub approver_id: Uuid,
    pub approval_type: ApprovalType,
}

/// Input for creating an approval document.
#[derive(Debug, Clone)]
pub struct CreateDocumentRequest {
    pub title: String,
    pub content: String,
    /// Business date used for number bucketing
    pub draft_date: NaiveDate,
    pub urgency: Urgency,
    pub related_module: Option<String>,
    pub related_id: Option<Uuid>,
    pub steps: Vec<StepSpec>,
}

/// A step decision verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Approve,
    Reject,
}

/// Result of a step decision, including who acts next (if anyone).
#[derive(Debug, Clone)]
pub struct DecisionOutcome {
    pub document: approval_document::Model,
    pub step: approval_step::Model,
    /// Approver of the new current step, when the document is still open
    pub next_approver_id: Option<Uuid>,
}

pub struct ApprovalRepository {
    db: DatabaseConnection,
}

impl ApprovalRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn employee_for_user<C: ConnectionTrait>(
        conn: &C,
        user_id: Uuid,
    ) -> Result<employee::Model, ApiError> {
        employee::Entity::find()
            .filter(employee::Column::UserId.eq(user_id))
            .one(conn)
            .await?
            .ok_or_else(|| error::not_found("No employee record is linked to this account"))
    }

    fn step_error(err: StepError) -> ApiError {
        match err {
            StepError::DocumentTerminal(_) | StepError::NoPendingStep => {
                error::conflict("Document is already finalized")
            }
            StepError::NotAssignedApprover => {
                error::forbidden(Some("You are not the current approver for this document"))
            }
        }
    }

    /// Create a document with its full step chain.
    ///
    /// The chain is immutable afterwards; approvers repeated in the chain
    /// are kept as submitted.
    pub async fn create_document(
        &self,
        drafter_user_id: Uuid,
        request: CreateDocumentRequest,
    ) -> Result<(approval_document::Model, Vec<approval_step::Model>), ApiError> {
        let types: Vec<ApprovalType> = request.steps.iter().map(|s| s.approval_type).collect();
        workflow::validate_step_chain(&types)
            .map_err(|msg| error::validation_error(msg, json!({ "steps": msg })))?;

        if request.title.trim().is_empty() {
            return Err(error::validation_error(
                "Title is required",
                json!({ "title": "must not be empty" }),
            ));
        }

        let txn = self.db.begin().await?;

        let drafter = Self::employee_for_user(&txn, drafter_user_id).await?;
        let document_no = DocSequenceRepository::new(&txn)
            .allocate(DOCUMENT_PREFIX, request.draft_date)
            .await?;

        let now = Utc::now();
        let document = approval_document::ActiveModel {
            id: Set(Uuid::new_v4()),
            document_no: Set(document_no),
            title: Set(request.title),
            content: Set(request.content),
            drafter_id: Set(drafter.id),
            draft_date: Set(request.draft_date),
            status: Set(DocumentStatus::Draft),
            total_steps: Set(request.steps.len() as i32),
            urgency: Set(request.urgency),
            related_module: Set(request.related_module),
            related_id: Set(request.related_id),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&txn)
        .await?;

        let mut steps = Vec::with_capacity(request.steps.len());
        for (index, spec) in request.steps.into_iter().enumerate() {
            let step = approval_step::ActiveModel {
                id: Set(Uuid::new_v4()),
                document_id: Set(document.id),
                step_order: Set(index as i32 + 1),
                approver_id: Set(spec.approver_id),
                approval_type: Set(spec.approval_type),
                status: Set(StepStatus::Pending),
                comment: Set(None),
                acted_at: Set(None),
            }
            .insert(&txn)
            .await?;
            steps.push(step);
        }

        txn.commit().await?;

        Ok((document, steps))
    }

    /// Load a document with its step chain in chain order.
    pub async fn get_document(
        &self,
        document_id: Uuid,
    ) -> Result<(approval_document::Model, Vec<approval_step::Model>), ApiError> {
        let document = approval_document::Entity::find_by_id(document_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| error::not_found("Approval document not found"))?;

        let steps = approval_step::Entity::find()
            .filter(approval_step::Column::DocumentId.eq(document_id))
            .order_by_asc(approval_step::Column::StepOrder)
            .all(&self.db)
            .await?;

        Ok((document, steps))
    }

    /// List documents newest-first, optionally filtered by status.
    pub async fn list_documents(
        &self,
        page: u64,
        page_size: u64,
        status: Option<DocumentStatus>,
    ) -> Result<(Vec<approval_document::Model>, u64), ApiError> {
        let mut query =
            approval_document::Entity::find().order_by_desc(approval_document::Column::CreatedAt);

        if let Some(status) = status {
            query = query.filter(approval_document::Column::Status.eq(status));
        }

        let paginator = query.paginate(&self.db, page_size);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((items, total))
    }

    /// Apply a decision to the document's current step.
    ///
    /// The actor must be the approver of the lowest-ordered pending step.
    /// The step mutation and the re-derived document status are committed
    /// together.
    pub async fn decide(
        &self,
        document_id: Uuid,
        actor_user_id: Uuid,
        decision: Decision,
        comment: Option<String>,
    ) -> Result<DecisionOutcome, ApiError> {
        let txn = self.db.begin().await?;

        let actor = Self::employee_for_user(&txn, actor_user_id).await?;

        let document = approval_document::Entity::find_by_id(document_id)
            .one(&txn)
            .await?
            .ok_or_else(|| error::not_found("Approval document not found"))?;

        let steps = approval_step::Entity::find()
            .filter(approval_step::Column::DocumentId.eq(document_id))
            .order_by_asc(approval_step::Column::StepOrder)
            .all(&txn)
            .await?;

        let current = workflow::actionable_step(document.status, &steps, actor.id)
            .map_err(Self::step_error)?
            .clone();

        let new_step_status = match decision {
            Decision::Approve => StepStatus::Approved,
            Decision::Reject => StepStatus::Rejected,
        };

        let now = Utc::now();
        let mut step_update: approval_step::ActiveModel = current.into();
        step_update.status = Set(new_step_status);
        step_update.comment = Set(comment);
        step_update.acted_at = Set(Some(now.into()));
        let step = step_update.update(&txn).await?;

        let refreshed: Vec<approval_step::Model> = steps
            .into_iter()
            .map(|s| if s.id == step.id { step.clone() } else { s })
            .collect();

        let new_status = workflow::derive_document_status(&refreshed, false);
        let mut document_update: approval_document::ActiveModel = document.into();
        document_update.status = Set(new_status);
        document_update.updated_at = Set(now.into());
        let document = document_update.update(&txn).await?;

        txn.commit().await?;

        let next_approver_id = if document.status.is_terminal() {
            None
        } else {
            refreshed
                .iter()
                .filter(|s| s.status == StepStatus::Pending)
                .min_by_key(|s| s.step_order)
                .map(|s| s.approver_id)
        };

        Ok(DecisionOutcome {
            document,
            step,
            next_approver_id,
        })
    }

    /// Withdraw a non-terminal document. Only the drafter may cancel.
    pub async fn cancel(
        &self,
        document_id: Uuid,
        actor_user_id: Uuid,
    ) -> Result<approval_document::Model, ApiError> {
        let txn = self.db.begin().await?;

        let actor = Self::employee_for_user(&txn, actor_user_id).await?;

        let document = approval_document::Entity::find_by_id(document_id)
            .one(&txn)
            .await?
            .ok_or_else(|| error::not_found("Approval document not found"))?;

        if document.drafter_id != actor.id {
            return Err(error::forbidden(Some(
                "Only the drafter may cancel a document",
            )));
        }
        if document.status.is_terminal() {
            return Err(error::conflict("Document is already finalized"));
        }

        let mut update: approval_document::ActiveModel = document.into();
        update.status = Set(DocumentStatus::Cancelled);
        update.updated_at = Set(Utc::now().into());
        let document = update.update(&txn).await?;

        txn.commit().await?;

        Ok(document)
    }
}
