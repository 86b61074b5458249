//! RBAC seeding functionality
//!
//! Seeds the full (module, action) permission matrix and the built-in
//! system roles. Safe to run on every boot: existing rows are left alone.

use anyhow::Result;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::models::{permission, role};
use crate::rbac::{Action, DEPT_HEAD_ROLE, known_modules};

/// Built-in roles created at boot. Both are markers evaluated by name, so
/// they carry no explicit permission rows.
const SYSTEM_ROLES: [(&str, &str); 2] = [
    ("SYSTEM_ADMIN", "Unrestricted access to every module"),
    (DEPT_HEAD_ROLE, "Read and approve across all modules"),
];

/// Seeds the permission matrix and built-in roles.
pub async fn seed_rbac(db: &DatabaseConnection) -> Result<()> {
    for module in known_modules() {
        for action in Action::ALL {
            let exists = permission::Entity::find()
                .filter(permission::Column::Module.eq(module))
                .filter(permission::Column::Action.eq(action.as_str()))
                .one(db)
                .await?;

            if exists.is_some() {
                continue;
            }

            log::info!("Creating permission: {}/{}", module, action.as_str());
            permission::ActiveModel {
                id: Set(Uuid::new_v4()),
                module: Set(module.to_string()),
                action: Set(action.as_str().to_string()),
            }
            .insert(db)
            .await?;
        }
    }

    for (name, description) in SYSTEM_ROLES {
        let exists = role::Entity::find()
            .filter(role::Column::Name.eq(name))
            .one(db)
            .await?;

        if exists.is_some() {
            log::info!("Role '{}' already exists, skipping", name);
            continue;
        }

        log::info!("Creating system role: {}", name);
        role::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            description: Set(Some(description.to_string())),
            is_system: Set(true),
            created_at: Set(Utc::now().into()),
        }
        .insert(db)
        .await?;
    }

    Ok(())
}
