//! # Role Repository
//!
//! Admin-facing role management: CRUD over roles and wholesale replacement
//! of a role's permission set. System roles are protected from deletion.

use std::collections::{BTreeSet, HashMap};

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde_json::json;
use uuid::Uuid;

use crate::error::{self, ApiError};
use crate::models::{permission, role, role_permission};
use crate::rbac::Action;

pub struct RoleRepository {
    db: DatabaseConnection,
}

impl RoleRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> Result<Vec<role::Model>, ApiError> {
        Ok(role::Entity::find()
            .order_by_asc(role::Column::Name)
            .all(&self.db)
            .await?)
    }

    /// Create a non-system role. Duplicate names surface as CONFLICT via
    /// the unique index.
    pub async fn create(
        &self,
        name: String,
        description: Option<String>,
    ) -> Result<role::Model, ApiError> {
        if name.trim().is_empty() {
            return Err(error::validation_error(
                "Role name is required",
                json!({ "name": "must not be empty" }),
            ));
        }

        Ok(role::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            description: Set(description),
            is_system: Set(false),
            created_at: Set(Utc::now().into()),
        }
        .insert(&self.db)
        .await?)
    }

    pub async fn delete(&self, role_id: Uuid) -> Result<(), ApiError> {
        let role = role::Entity::find_by_id(role_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| error::not_found("Role not found"))?;

        if role.is_system {
            return Err(error::conflict("System roles cannot be deleted"));
        }

        role::Entity::delete_by_id(role_id).exec(&self.db).await?;
        Ok(())
    }

    /// Replace a role's permission set with the given (module, action)
    /// pairs. Unknown pairs fail the whole request; the previous set stays
    /// in place.
    pub async fn set_permissions(
        &self,
        role_id: Uuid,
        pairs: &[(String, Action)],
    ) -> Result<usize, ApiError> {
        let txn = self.db.begin().await?;

        role::Entity::find_by_id(role_id)
            .one(&txn)
            .await?
            .ok_or_else(|| error::not_found("Role not found"))?;

        let known: HashMap<(String, String), Uuid> = permission::Entity::find()
            .all(&txn)
            .await?
            .into_iter()
            .map(|p| ((p.module, p.action), p.id))
            .collect();

        let mut permission_ids = BTreeSet::new();
        for (module, action) in pairs {
            let key = (module.clone(), action.as_str().to_string());
            let id = known.get(&key).ok_or_else(|| {
                error::validation_error(
                    "Unknown permission",
                    json!({ "module": module, "action": action.as_str() }),
                )
            })?;
            permission_ids.insert(*id);
        }

        role_permission::Entity::delete_many()
            .filter(role_permission::Column::RoleId.eq(role_id))
            .exec(&txn)
            .await?;

        let count = permission_ids.len();
        if !permission_ids.is_empty() {
            role_permission::Entity::insert_many(permission_ids.into_iter().map(|permission_id| {
                role_permission::ActiveModel {
                    role_id: Set(role_id),
                    permission_id: Set(permission_id),
                }
            }))
            .exec(&txn)
            .await?;
        }

        txn.commit().await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use migration::MigratorTrait;
    use sea_orm::Database;

    async fn setup_test_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        migration::Migrator::up(&db, None).await.unwrap();
        db
    }

    async fn insert_permission(db: &DatabaseConnection, module: &str, action: &str) {
        permission::ActiveModel {
            id: Set(Uuid::new_v4()),
            module: Set(module.to_string()),
            action: Set(action.to_string()),
        }
        .insert(db)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn create_list_delete_roundtrip() {
        let db = setup_test_db().await;
        let repo = RoleRepository::new(db);

        let created = repo
            .create("HR_STAFF".to_string(), Some("HR team".to_string()))
            .await
            .unwrap();
        assert!(!created.is_system);

        let roles = repo.list().await.unwrap();
        assert_eq!(roles.len(), 1);

        repo.delete(created.id).await.unwrap();
        assert!(repo.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_role_name_conflicts() {
        let db = setup_test_db().await;
        let repo = RoleRepository::new(db);

        repo.create("HR_STAFF".to_string(), None).await.unwrap();
        let err = repo.create("HR_STAFF".to_string(), None).await.unwrap_err();
        assert_eq!(err.code, Box::from("DUPLICATE"));
    }

    #[tokio::test]
    async fn system_roles_cannot_be_deleted() {
        let db = setup_test_db().await;

        let system_role = role::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set("SYSTEM_ADMIN".to_string()),
            description: Set(None),
            is_system: Set(true),
            created_at: Set(Utc::now().into()),
        }
        .insert(&db)
        .await
        .unwrap();

        let repo = RoleRepository::new(db);
        let err = repo.delete(system_role.id).await.unwrap_err();
        assert_eq!(err.code, Box::from("CONFLICT"));
    }

    #[tokio::test]
    async fn set_permissions_replaces_previous_set() {
        let db = setup_test_db().await;
        insert_permission(&db, "hr", "read").await;
        insert_permission(&db, "hr", "approve").await;
        insert_permission(&db, "accounting", "read").await;

        let repo = RoleRepository::new(db.clone());
        let role = repo.create("HR_STAFF".to_string(), None).await.unwrap();

        let count = repo
            .set_permissions(
                role.id,
                &[
                    ("hr".to_string(), Action::Read),
                    ("hr".to_string(), Action::Approve),
                ],
            )
            .await
            .unwrap();
        assert_eq!(count, 2);

        let count = repo
            .set_permissions(role.id, &[("accounting".to_string(), Action::Read)])
            .await
            .unwrap();
        assert_eq!(count, 1);

        let links = role_permission::Entity::find()
            .filter(role_permission::Column::RoleId.eq(role.id))
            .all(&db)
            .await
            .unwrap();
        assert_eq!(links.len(), 1);
    }

    #[tokio::test]
    async fn unknown_permission_pair_is_refused() {
        let db = setup_test_db().await;
        let repo = RoleRepository::new(db);
        let role = repo.create("HR_STAFF".to_string(), None).await.unwrap();

        let err = repo
            .set_permissions(role.id, &[("hr".to_string(), Action::Read)])
            .await
            .unwrap_err();
        assert_eq!(err.code, Box::from("VALIDATION_ERROR"));
    }
}
