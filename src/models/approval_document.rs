//! Approval document entity model
//!
//! A document owns an ordered chain of approval steps. Its status is always
//! the value produced by `workflow::derive_document_status` over the step
//! states, persisted alongside the steps in the same transaction.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Document-level workflow status, derived from step states
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentStatus {
    #[sea_orm(string_value = "DRAFT")]
    Draft,
    #[sea_orm(string_value = "IN_PROGRESS")]
    InProgress,
    #[sea_orm(string_value = "APPROVED")]
    Approved,
    #[sea_orm(string_value = "REJECTED")]
    Rejected,
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
}

impl DocumentStatus {
    /// Terminal statuses are final; no transition leaves them.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Approved | Self::Rejected | Self::Cancelled)
    }
}

/// Urgency marker carried on the document, display-only
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Urgency {
    #[sea_orm(string_value = "NORMAL")]
    Normal,
    #[sea_orm(string_value = "URGENT")]
    Urgent,
    #[sea_orm(string_value = "EMERGENCY")]
    Emergency,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, ToSchema)]
#[schema(as = ApprovalDocument)]
#[sea_orm(table_name = "approval_documents")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Allocated with prefix "APR", bucketed by the draft date
    pub document_no: String,

    pub title: String,

    pub content: String,

    /// Drafting employee
    pub drafter_id: Uuid,

    /// Business date used for number bucketing, not the wall-clock date
    pub draft_date: Date,

    pub status: DocumentStatus,

    /// Number of steps created with the document; immutable afterwards
    pub total_steps: i32,

    pub urgency: Urgency,

    /// Optional link to the business module this document concerns
    pub related_module: Option<String>,

    pub related_id: Option<Uuid>,

    #[schema(value_type = chrono::DateTime<chrono::FixedOffset>)]
    pub created_at: DateTimeWithTimeZone,

    #[schema(value_type = chrono::DateTime<chrono::FixedOffset>)]
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
