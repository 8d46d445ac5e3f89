use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder,
};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    entities::notification::{self, Entity as NotificationEntity},
    errors::ServiceError,
};

/// Persists user notifications. Actual delivery (push, email) is an external
/// consumer of these rows; the core's contract ends at durable persistence.
#[derive(Clone)]
pub struct NotificationService {
    db: Arc<DatabaseConnection>,
}

impl NotificationService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Stores one notification for a user.
    #[instrument(skip(self, message))]
    pub async fn notify(
        &self,
        user_id: Uuid,
        message: String,
        category: &str,
        related_entity_id: Option<Uuid>,
        related_entity_type: Option<&str>,
    ) -> Result<notification::Model, ServiceError> {
        let row = notification::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            message: Set(message),
            category: Set(category.to_string()),
            related_entity_id: Set(related_entity_id),
            related_entity_type: Set(related_entity_type.map(|t| t.to_string())),
            read: Set(false),
            created_at: Set(Utc::now()),
        };

        row.insert(&*self.db).await.map_err(ServiceError::db_error)
    }

    /// Paginated notifications for one user, newest first.
    #[instrument(skip(self))]
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        unread_only: bool,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<notification::Model>, u64), ServiceError> {
        let mut query = NotificationEntity::find().filter(notification::Column::UserId.eq(user_id));
        if unread_only {
            query = query.filter(notification::Column::Read.eq(false));
        }

        let paginator = query
            .order_by_desc(notification::Column::CreatedAt)
            .paginate(&*self.db, limit.max(1));
        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let items = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::db_error)?;

        Ok((items, total))
    }

    /// Marks one of the user's notifications as read.
    #[instrument(skip(self))]
    pub async fn mark_read(
        &self,
        user_id: Uuid,
        notification_id: Uuid,
    ) -> Result<notification::Model, ServiceError> {
        let row = NotificationEntity::find_by_id(notification_id)
            .filter(notification::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Notification {} not found", notification_id))
            })?;

        let mut active: notification::ActiveModel = row.into();
        active.read = Set(true);
        active.update(&*self.db).await.map_err(ServiceError::db_error)
    }
}
