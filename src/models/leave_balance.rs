//! Leave balance entity model
//!
//! One row per (employee, year). `remaining_days` must never go negative;
//! the leave repository enforces this with a guarded atomic update.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "leave_balances")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub employee_id: Uuid,

    /// Calendar year the balance applies to
    pub year: i32,

    pub total_days: f64,

    pub used_days: f64,

    pub remaining_days: f64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
