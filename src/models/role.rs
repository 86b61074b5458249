//! Role entity model
//!
//! Roles carry a unique name which may be one of the recognized marker
//! literals (super admin, department head). System roles are protected from
//! deletion.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, ToSchema)]
#[schema(as = Role)]
#[sea_orm(table_name = "roles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Unique role name; marker roles are matched by literal value
    pub name: String,

    pub description: Option<String>,

    /// System roles cannot be deleted through the admin API
    pub is_system: bool,

    #[schema(value_type = chrono::DateTime<chrono::FixedOffset>)]
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
