//! Approval step entity model
//!
//! Steps have unique, contiguous `step_order` values starting at 1, are
//! exclusively owned by their document, and are never reassigned.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Per-step status; APPROVED and REJECTED are terminal
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepStatus {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "APPROVED")]
    Approved,
    #[sea_orm(string_value = "REJECTED")]
    Rejected,
}

/// What kind of participation the step represents
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalType {
    #[sea_orm(string_value = "APPROVE")]
    Approve,
    #[sea_orm(string_value = "REVIEW")]
    Review,
    #[sea_orm(string_value = "NOTIFY")]
    Notify,
}

impl ApprovalType {
    /// Blocking step types gate the document's terminal status; NOTIFY
    /// steps are informational only.
    pub fn is_blocking(self) -> bool {
        matches!(self, Self::Approve | Self::Review)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, ToSchema)]
#[schema(as = ApprovalStep)]
#[sea_orm(table_name = "approval_steps")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub document_id: Uuid,

    /// 1-based position in the approval chain, submission order
    pub step_order: i32,

    /// Employee expected to act on this step
    pub approver_id: Uuid,

    pub approval_type: ApprovalType,

    pub status: StepStatus,

    pub comment: Option<String>,

    #[schema(value_type = Option<chrono::DateTime<chrono::FixedOffset>>)]
    pub acted_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
