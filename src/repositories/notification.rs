//! # Notification Repository
//!
//! Read-side access to a user's notifications; writes go through the
//! best-effort sink in `audit`.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use crate::error::{self, ApiError};
use crate::models::notification;

pub struct NotificationRepository {
    db: DatabaseConnection,
}

impl NotificationRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// List a user's notifications newest-first.
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<notification::Model>, u64), ApiError> {
        let paginator = notification::Entity::find()
            .filter(notification::Column::UserId.eq(user_id))
            .order_by_desc(notification::Column::CreatedAt)
            .paginate(&self.db, page_size);

        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((items, total))
    }

    pub async fn unread_count(&self, user_id: Uuid) -> Result<u64, ApiError> {
        Ok(notification::Entity::find()
            .filter(notification::Column::UserId.eq(user_id))
            .filter(notification::Column::IsRead.eq(false))
            .count(&self.db)
            .await?)
    }

    /// Mark one of the user's notifications read. Marking an already-read
    /// notification is a no-op, not an error.
    pub async fn mark_read(
        &self,
        notification_id: Uuid,
        user_id: Uuid,
    ) -> Result<notification::Model, ApiError> {
        let row = notification::Entity::find_by_id(notification_id)
            .filter(notification::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .ok_or_else(|| error::not_found("Notification not found"))?;

        if row.is_read {
            return Ok(row);
        }

        let mut update: notification::ActiveModel = row.into();
        update.is_read = Set(true);
        Ok(update.update(&self.db).await?)
    }
}
