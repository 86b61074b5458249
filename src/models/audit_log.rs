//! Audit log entity model
//!
//! Written only by the best-effort side-effect layer; failures to persist a
//! row are logged and never surfaced to business callers.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "audit_logs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Acting user resolved from the request session, if any
    pub user_id: Option<Uuid>,

    /// CREATE/UPDATE/DELETE or a domain-specific verb
    pub action: String,

    pub table_name: String,

    pub record_id: Option<String>,

    pub old_value: Option<Json>,

    pub new_value: Option<Json>,

    pub ip_address: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
