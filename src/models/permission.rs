//! Permission entity model
//!
//! A permission is the atomic grantable (module, action) pair; no
//! finer-grained record-level permission exists in this model.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "permissions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Business domain tag, e.g. "hr" or "accounting"
    pub module: String,

    /// Permission verb: read/create/update/delete/export/import/approve
    pub action: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
