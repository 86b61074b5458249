//! User entity model
//!
//! This module contains the SeaORM entity model for the users table,
//! the authentication principals of the service.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

/// User entity representing an authentication principal
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Unique identifier for the user (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Unique login name
    pub username: String,

    /// Name shown in notifications and audit records
    pub display_name: String,

    /// Contact email (optional)
    pub email: Option<String>,

    /// Whether the account may authenticate
    pub active: bool,

    /// Timestamp when the user was created
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
