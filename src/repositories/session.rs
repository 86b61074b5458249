//! # Session Repository
//!
//! Issues and resolves opaque session tokens. Only a SHA-256 hash of the
//! token is stored; resolution loads the full authorization context (roles
//! plus the union of role-derived and direct permission grants) in one
//! place so request middleware stays thin.

use std::collections::BTreeSet;

use chrono::{Duration, Utc};
use rand::RngCore;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::models::{
    employee, permission, role, role_permission, session, user, user_permission, user_role,
};
use crate::rbac::{Action, PermissionGrant};

/// Resolved identity and authorization context for one session.
#[derive(Debug, Clone)]
pub struct SessionIdentity {
    pub user_id: Uuid,
    /// Linked employee record, if the account has one
    pub employee_id: Option<Uuid>,
    pub display_name: String,
    pub roles: Vec<String>,
    pub grants: Vec<PermissionGrant>,
}

pub struct SessionRepository {
    db: DatabaseConnection,
}

impl SessionRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Hex-encoded SHA-256 of a token, the only form ever persisted.
    pub fn hash_token(token: &str) -> String {
        hex::encode(Sha256::digest(token.as_bytes()))
    }

    fn generate_token() -> String {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        hex::encode(bytes)
    }

    /// Create a session for `user_id` and return the plaintext token once.
    pub async fn create_session(
        &self,
        user_id: Uuid,
        ttl_seconds: u64,
        ip_address: Option<String>,
    ) -> Result<(session::Model, String), DbErr> {
        let token = Self::generate_token();
        let now = Utc::now();

        let row = session::ActiveModel {
            id: Set(Uuid::new_v4()),
            token_hash: Set(Self::hash_token(&token)),
            user_id: Set(user_id),
            expires_at: Set((now + Duration::seconds(ttl_seconds as i64)).into()),
            ip_address: Set(ip_address),
            created_at: Set(now.into()),
        }
        .insert(&self.db)
        .await?;

        Ok((row, token))
    }

    /// Resolve a bearer token into a full session identity.
    ///
    /// Returns `None` for unknown tokens, expired sessions, and inactive
    /// accounts alike; callers cannot distinguish the cases.
    pub async fn resolve(&self, token: &str) -> Result<Option<SessionIdentity>, DbErr> {
        let now = Utc::now();

        let Some(session_row) = session::Entity::find()
            .filter(session::Column::TokenHash.eq(Self::hash_token(token)))
            .filter(session::Column::ExpiresAt.gt(now))
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };

        let Some(user_row) = user::Entity::find_by_id(session_row.user_id)
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };
        if !user_row.active {
            return Ok(None);
        }

        let employee_id = employee::Entity::find()
            .filter(employee::Column::UserId.eq(user_row.id))
            .one(&self.db)
            .await?
            .map(|e| e.id);

        let role_ids: Vec<Uuid> = user_role::Entity::find()
            .filter(user_role::Column::UserId.eq(user_row.id))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|link| link.role_id)
            .collect();

        let roles: Vec<String> = if role_ids.is_empty() {
            Vec::new()
        } else {
            role::Entity::find()
                .filter(role::Column::Id.is_in(role_ids.clone()))
                .all(&self.db)
                .await?
                .into_iter()
                .map(|r| r.name)
                .collect()
        };

        let mut permission_ids: BTreeSet<Uuid> = BTreeSet::new();

        if !role_ids.is_empty() {
            for link in role_permission::Entity::find()
                .filter(role_permission::Column::RoleId.is_in(role_ids))
                .all(&self.db)
                .await?
            {
                permission_ids.insert(link.permission_id);
            }
        }

        for link in user_permission::Entity::find()
            .filter(user_permission::Column::UserId.eq(user_row.id))
            .all(&self.db)
            .await?
        {
            permission_ids.insert(link.permission_id);
        }

        let grants: Vec<PermissionGrant> = if permission_ids.is_empty() {
            Vec::new()
        } else {
            permission::Entity::find()
                .filter(permission::Column::Id.is_in(permission_ids))
                .all(&self.db)
                .await?
                .into_iter()
                .filter_map(|p| {
                    // Rows with unknown verbs grant nothing.
                    Action::parse(&p.action).map(|action| PermissionGrant {
                        module: p.module,
                        action,
                    })
                })
                .collect()
        };

        Ok(Some(SessionIdentity {
            user_id: user_row.id,
            employee_id,
            display_name: user_row.display_name,
            roles,
            grants,
        }))
    }

    /// Revoke a session by its plaintext token. Revoking an unknown token
    /// is not an error.
    pub async fn revoke(&self, token: &str) -> Result<(), DbErr> {
        session::Entity::delete_many()
            .filter(session::Column::TokenHash.eq(Self::hash_token(token)))
            .exec(&self.db)
            .await?;
        Ok(())
    }
}
