//! Notification repository.

use std::sync::Arc;

use crate::entities::{Notification, notification};
use mozsolidaria_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, sea_query::Expr,
};

/// Notification repository for database operations.
#[derive(Clone)]
pub struct NotificationRepository {
    db: Arc<DatabaseConnection>,
}

impl NotificationRepository {
    /// Create a new notification repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a notification by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<notification::Model>> {
        Notification::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new notification.
    pub async fn create(&self, model: notification::ActiveModel) -> AppResult<notification::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Notifications of a recipient, newest first (paginated).
    pub async fn find_by_recipient(
        &self,
        recipient_id: &str,
        limit: u64,
        until_id: Option<&str>,
        unread_only: bool,
    ) -> AppResult<Vec<notification::Model>> {
        let mut query = Notification::find()
            .filter(notification::Column::RecipientId.eq(recipient_id))
            .order_by_desc(notification::Column::Id);

        if let Some(id) = until_id {
            query = query.filter(notification::Column::Id.lt(id));
        }

        if unread_only {
            query = query.filter(notification::Column::IsRead.eq(false));
        }

        query
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Mark one notification as read.
    pub async fn mark_as_read(
        &self,
        model: notification::Model,
    ) -> AppResult<notification::Model> {
        let mut active: notification::ActiveModel = model.into();
        active.is_read = Set(true);
        active.read_at = Set(Some(chrono::Utc::now().into()));

        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Mark every unread notification of a recipient as read.
    pub async fn mark_all_as_read(&self, recipient_id: &str) -> AppResult<u64> {
        let now: sea_orm::prelude::DateTimeWithTimeZone = chrono::Utc::now().into();

        let result = Notification::update_many()
            .filter(notification::Column::RecipientId.eq(recipient_id))
            .filter(notification::Column::IsRead.eq(false))
            .col_expr(notification::Column::IsRead, Expr::value(true))
            .col_expr(notification::Column::ReadAt, Expr::value(now))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Count unread notifications of a recipient.
    pub async fn count_unread(&self, recipient_id: &str) -> AppResult<u64> {
        Notification::find()
            .filter(notification::Column::RecipientId.eq(recipient_id))
            .filter(notification::Column::IsRead.eq(false))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_utils;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    #[tokio::test]
    async fn test_find_by_recipient() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    test_utils::notification("n2", "u1"),
                    test_utils::notification("n1", "u1"),
                ]])
                .into_connection(),
        );

        let repo = NotificationRepository::new(db);
        let list = repo.find_by_recipient("u1", 20, None, true).await.unwrap();

        assert_eq!(list.len(), 2);
        assert_eq!(list[0].id, "n2");
    }

    #[tokio::test]
    async fn test_mark_as_read_sets_timestamp() {
        let unread = test_utils::notification("n1", "u1");
        let read = notification::Model {
            is_read: true,
            read_at: Some(test_utils::fixed_time()),
            ..unread.clone()
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[read]])
                .into_connection(),
        );

        let repo = NotificationRepository::new(db);
        let updated = repo.mark_as_read(unread).await.unwrap();

        assert!(updated.is_read);
        assert!(updated.read_at.is_some());
    }

    #[tokio::test]
    async fn test_mark_all_as_read() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 3,
                }])
                .into_connection(),
        );

        let repo = NotificationRepository::new(db);

        assert_eq!(repo.mark_all_as_read("u1").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_count_unread() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(7)),
                }]])
                .into_connection(),
        );

        let repo = NotificationRepository::new(db);

        assert_eq!(repo.count_unread("u1").await.unwrap(), 7);
    }
}
