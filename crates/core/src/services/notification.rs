//! Notification dispatcher.
//!
//! Persists notifications only. Delivery (push, e-mail) happens elsewhere.

use mozsolidaria_common::{AppError, AppResult, IdGenerator, get_telemetry};
use mozsolidaria_db::{
    entities::notification::{self, NotificationPriority, NotificationType},
    repositories::{NotificationRepository, UserRepository},
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::Validate;

/// Content of a notification, independent of its recipient.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NotificationDraft {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 5000))]
    pub message: String,
    pub notification_type: NotificationType,
    #[serde(default)]
    pub priority: NotificationPriority,
    #[validate(length(max = 500))]
    pub action_url: Option<String>,
    #[validate(length(max = 100))]
    pub action_text: Option<String>,
}

impl NotificationDraft {
    /// Draft with medium priority and no action.
    #[must_use]
    pub fn new(
        notification_type: NotificationType,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            notification_type,
            priority: NotificationPriority::default(),
            action_url: None,
            action_text: None,
        }
    }

    #[must_use]
    pub const fn priority(mut self, priority: NotificationPriority) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub fn action(mut self, url: impl Into<String>, text: impl Into<String>) -> Self {
        self.action_url = Some(url.into());
        self.action_text = Some(text.into());
        self
    }
}

/// Input for `POST /notifications`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateNotificationInput {
    pub recipient_id: String,
    #[serde(flatten)]
    #[validate(nested)]
    pub draft: NotificationDraft,
}

/// Notification as returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    pub id: String,
    pub title: String,
    pub message: String,
    pub notification_type: NotificationType,
    pub priority: NotificationPriority,
    pub is_read: bool,
    pub action_url: Option<String>,
    pub action_text: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub read_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<notification::Model> for NotificationResponse {
    fn from(model: notification::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            message: model.message,
            notification_type: model.notification_type,
            priority: model.priority,
            is_read: model.is_read,
            action_url: model.action_url,
            action_text: model.action_text,
            created_at: model.created_at.into(),
            read_at: model.read_at.map(Into::into),
        }
    }
}

/// Notification service for business logic.
#[derive(Clone)]
pub struct NotificationService {
    notification_repo: NotificationRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl NotificationService {
    /// Create a new notification service.
    #[must_use]
    pub const fn new(notification_repo: NotificationRepository, user_repo: UserRepository) -> Self {
        Self {
            notification_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Persist one unread notification for an existing recipient.
    pub async fn create(
        &self,
        recipient_id: &str,
        draft: NotificationDraft,
    ) -> AppResult<notification::Model> {
        draft.validate()?;

        if self.user_repo.find_by_id(recipient_id).await?.is_none() {
            return Err(AppError::RecipientNotFound(recipient_id.to_string()));
        }

        self.insert(recipient_id, draft).await
    }

    async fn insert(
        &self,
        recipient_id: &str,
        draft: NotificationDraft,
    ) -> AppResult<notification::Model> {
        let model = notification::ActiveModel {
            id: Set(self.id_gen.generate()),
            recipient_id: Set(recipient_id.to_string()),
            title: Set(draft.title),
            message: Set(draft.message),
            notification_type: Set(draft.notification_type),
            priority: Set(draft.priority),
            is_read: Set(false),
            action_url: Set(draft.action_url),
            action_text: Set(draft.action_text),
            created_at: Set(chrono::Utc::now().into()),
            read_at: Set(None),
        };

        let created = self.notification_repo.create(model).await?;
        get_telemetry().record_notification();

        Ok(created)
    }

    /// Send the same notification to every active staff member.
    ///
    /// A failure for one recipient is logged and does not stop the others.
    pub async fn notify_staff(&self, draft: NotificationDraft) -> AppResult<Vec<notification::Model>> {
        draft.validate()?;

        let staff = self.user_repo.find_staff().await?;
        let mut created = Vec::with_capacity(staff.len());

        for user in staff {
            match self.insert(&user.id, draft.clone()).await {
                Ok(n) => created.push(n),
                Err(e) => warn!(recipient_id = %user.id, error = %e, "Failed to notify staff member"),
            }
        }

        info!(
            kind = ?draft.notification_type,
            recipients = created.len(),
            "Staff notified"
        );

        Ok(created)
    }

    /// Notify staff as a side effect of another write.
    ///
    /// Errors are logged; the caller's record is already stored.
    pub async fn alert_staff(&self, draft: NotificationDraft) {
        if let Err(e) = self.notify_staff(draft).await {
            warn!(error = %e, "Failed to notify staff");
        }
    }

    /// Notifications of a recipient, newest first.
    pub async fn list(
        &self,
        recipient_id: &str,
        limit: u64,
        until_id: Option<&str>,
        unread_only: bool,
    ) -> AppResult<Vec<notification::Model>> {
        self.notification_repo
            .find_by_recipient(recipient_id, limit.clamp(1, 100), until_id, unread_only)
            .await
    }

    /// Number of unread notifications.
    pub async fn unread_count(&self, recipient_id: &str) -> AppResult<u64> {
        self.notification_repo.count_unread(recipient_id).await
    }

    /// Mark a notification read. Only its recipient may do so.
    pub async fn mark_read(
        &self,
        recipient_id: &str,
        notification_id: &str,
    ) -> AppResult<notification::Model> {
        let found = self
            .notification_repo
            .find_by_id(notification_id)
            .await?
            .filter(|n| n.recipient_id == recipient_id)
            .ok_or_else(|| AppError::NotFound(format!("notification {notification_id}")))?;

        if found.is_read {
            return Ok(found);
        }

        self.notification_repo.mark_as_read(found).await
    }

    /// Mark every notification of the recipient read.
    pub async fn mark_all_read(&self, recipient_id: &str) -> AppResult<u64> {
        self.notification_repo.mark_all_as_read(recipient_id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use mozsolidaria_db::{entities::user, test_utils};
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn service(db: MockDatabase) -> NotificationService {
        let conn = Arc::new(db.into_connection());
        NotificationService::new(
            NotificationRepository::new(conn.clone()),
            UserRepository::new(conn),
        )
    }

    fn draft() -> NotificationDraft {
        NotificationDraft::new(NotificationType::Donation, "Nova doação", "500 MZN recebidos")
            .priority(NotificationPriority::High)
            .action("/admin/donations/d1", "Ver doação")
    }

    #[tokio::test]
    async fn test_create_for_missing_recipient() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()]),
        );

        let result = svc.create("ghost", draft()).await;

        assert!(matches!(result, Err(AppError::RecipientNotFound(id)) if id == "ghost"));
    }

    #[tokio::test]
    async fn test_create_persists_unread() {
        let stored = test_utils::notification("n1", "u1");
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_utils::user("u1", "joana")]])
                .append_query_results([[stored]]),
        );

        let created = svc.create("u1", draft()).await.unwrap();

        assert_eq!(created.recipient_id, "u1");
        assert!(!created.is_read);
    }

    #[tokio::test]
    async fn test_create_rejects_empty_title() {
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres));
        let mut bad = draft();
        bad.title = String::new();

        assert!(matches!(
            svc.create("u1", bad).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_notify_staff_fans_out() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    test_utils::staff("u1", "admin"),
                    test_utils::staff("u2", "gestor"),
                ]])
                .append_query_results([[test_utils::notification("n1", "u1")]])
                .append_query_results([[test_utils::notification("n2", "u2")]]),
        );

        let created = svc.notify_staff(draft()).await.unwrap();

        assert_eq!(created.len(), 2);
        assert_eq!(created[1].recipient_id, "u2");
    }

    #[tokio::test]
    async fn test_mark_read_other_recipient_is_not_found() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_utils::notification("n1", "u1")]]),
        );

        let result = svc.mark_read("u2", "n1").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_mark_read_already_read_skips_write() {
        let mut read = test_utils::notification("n1", "u1");
        read.is_read = true;
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[read]]));

        let result = svc.mark_read("u1", "n1").await.unwrap();

        assert!(result.is_read);
    }
}
