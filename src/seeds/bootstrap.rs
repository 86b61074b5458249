//! Bootstrap administrator seeding
//!
//! The service has no interactive login; sessions are minted server-side.
//! On first boot this seed creates the administrator account and one
//! session for it, logging the plaintext token exactly once so an operator
//! can take it from the startup log.

use anyhow::{Context, Result};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::models::{role, session, user, user_role};
use crate::repositories::SessionRepository;

const ADMIN_USERNAME: &str = "admin";

/// Ensure the administrator account exists and holds SYSTEM_ADMIN.
///
/// The bootstrap session's lifetime comes from the configured session TTL.
/// Any existing session for the account, expired or not, means bootstrap
/// already happened and no new token is issued.
pub async fn seed_admin(db: &DatabaseConnection, config: &AppConfig) -> Result<()> {
    let admin = match user::Entity::find()
        .filter(user::Column::Username.eq(ADMIN_USERNAME))
        .one(db)
        .await?
    {
        Some(row) => row,
        None => {
            log::info!("Creating administrator account '{}'", ADMIN_USERNAME);
            user::ActiveModel {
                id: Set(Uuid::new_v4()),
                username: Set(ADMIN_USERNAME.to_string()),
                display_name: Set("Administrator".to_string()),
                email: Set(None),
                active: Set(true),
                created_at: Set(Utc::now().into()),
            }
            .insert(db)
            .await?
        }
    };

    let admin_role = role::Entity::find()
        .filter(role::Column::Name.eq("SYSTEM_ADMIN"))
        .one(db)
        .await?
        .context("SYSTEM_ADMIN role must be seeded before the administrator account")?;

    let linked = user_role::Entity::find()
        .filter(user_role::Column::UserId.eq(admin.id))
        .filter(user_role::Column::RoleId.eq(admin_role.id))
        .one(db)
        .await?;
    if linked.is_none() {
        user_role::ActiveModel {
            user_id: Set(admin.id),
            role_id: Set(admin_role.id),
        }
        .insert(db)
        .await?;
    }

    let sessions = session::Entity::find()
        .filter(session::Column::UserId.eq(admin.id))
        .count(db)
        .await?;
    if sessions == 0 {
        let (row, token) = SessionRepository::new(db.clone())
            .create_session(admin.id, config.session_ttl_seconds, None)
            .await?;
        log::info!(
            "Issued bootstrap session for '{}': token {} (expires {})",
            ADMIN_USERNAME,
            token,
            row.expires_at
        );
    }

    Ok(())
}
