//! Leave request entity model
//!
//! Status transitions REQUESTED -> APPROVED | REJECTED; the approval
//! transition is transactional with the leave balance update.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeaveStatus {
    #[sea_orm(string_value = "REQUESTED")]
    Requested,
    #[sea_orm(string_value = "APPROVED")]
    Approved,
    #[sea_orm(string_value = "REJECTED")]
    Rejected,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, ToSchema)]
#[schema(as = Leave)]
#[sea_orm(table_name = "leaves")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub employee_id: Uuid,

    pub leave_type: String,

    pub start_date: Date,

    pub end_date: Date,

    /// Requested day count; half days are allowed
    pub days: f64,

    pub reason: Option<String>,

    pub status: LeaveStatus,

    #[schema(value_type = chrono::DateTime<chrono::FixedOffset>)]
    pub created_at: DateTimeWithTimeZone,

    #[schema(value_type = chrono::DateTime<chrono::FixedOffset>)]
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
