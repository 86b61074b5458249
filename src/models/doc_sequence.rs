//! Document sequence counter entity model
//!
//! One row per (prefix, year_month) bucket. `last_seq` only increases and is
//! mutated exclusively by the allocator's atomic upsert-increment; rows are
//! never deleted.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "doc_sequences")]
pub struct Model {
    /// Document family code, e.g. "SO" or "APR"
    #[sea_orm(primary_key, auto_increment = false)]
    pub prefix: String,

    /// Six-digit period bucket, `YYYYMM`
    #[sea_orm(primary_key, auto_increment = false)]
    pub year_month: String,

    /// Last issued sequence number within the bucket
    pub last_seq: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
