//! Session entity model
//!
//! Sessions store a SHA-256 hash of the opaque bearer token handed to the
//! client; the plaintext token is never persisted.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

/// Authenticated session backed by a hashed opaque token
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "sessions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Hex-encoded SHA-256 of the session token
    pub token_hash: String,

    pub user_id: Uuid,

    /// Sessions past this instant are treated as absent
    pub expires_at: DateTimeWithTimeZone,

    /// Client address captured at login (optional)
    pub ip_address: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
