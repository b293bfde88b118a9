//! Partner communications and project assignments.

use chrono::Utc;
use mozsolidaria_common::{AppError, AppResult, IdGenerator};
use mozsolidaria_db::{
    entities::{
        notification::NotificationType,
        partner,
        partner_message,
        partner_project_assignment::{self, AssignmentStatus},
    },
    repositories::{PartnerRepository, ProjectRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use super::notification::{NotificationDraft, NotificationService};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SendMessageInput {
    pub partner_id: String,
    #[validate(length(min = 1, max = 200))]
    pub subject: String,
    #[validate(length(min = 1, max = 10000))]
    pub content: String,
    /// Project the message is about, if any.
    pub project_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateAssignmentInput {
    pub partner_id: String,
    pub project_id: String,
    #[validate(length(min = 1, max = 100))]
    pub role: String,
    pub status: Option<AssignmentStatus>,
}

/// Partner service for business logic.
#[derive(Clone)]
pub struct PartnerService {
    partner_repo: PartnerRepository,
    project_repo: ProjectRepository,
    notifications: NotificationService,
    id_gen: IdGenerator,
}

impl PartnerService {
    /// Create a new partner service.
    #[must_use]
    pub const fn new(
        partner_repo: PartnerRepository,
        project_repo: ProjectRepository,
        notifications: NotificationService,
    ) -> Self {
        Self {
            partner_repo,
            project_repo,
            notifications,
            id_gen: IdGenerator::new(),
        }
    }

    async fn get_partner(&self, partner_id: &str) -> AppResult<partner::Model> {
        self.partner_repo
            .find_by_id(partner_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("partner {partner_id}")))
    }

    async fn ensure_project(&self, project_id: &str) -> AppResult<()> {
        match self.project_repo.find_by_id(project_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound(format!("project {project_id}"))),
        }
    }

    /// Store a message to or from a partner and notify staff.
    pub async fn send_message(
        &self,
        sender_id: &str,
        input: SendMessageInput,
    ) -> AppResult<partner_message::Model> {
        input.validate()?;
        let partner = self.get_partner(&input.partner_id).await?;
        if let Some(project_id) = input.project_id.as_deref() {
            self.ensure_project(project_id).await?;
        }

        let model = partner_message::ActiveModel {
            id: Set(self.id_gen.generate()),
            partner_id: Set(partner.id.clone()),
            sender_id: Set(sender_id.to_string()),
            subject: Set(input.subject),
            content: Set(input.content),
            project_id: Set(input.project_id),
            is_read: Set(false),
            created_at: Set(Utc::now().into()),
        };
        let created = self.partner_repo.create_message(model).await?;

        info!(partner_id = %partner.id, message_id = %created.id, "Partner message stored");
        let draft = NotificationDraft::new(
            NotificationType::Partner,
            format!("Mensagem de {}", partner.name),
            created.subject.clone(),
        )
        .action(format!("/admin/partners/{}/messages", partner.id), "Abrir mensagem");
        self.notifications.alert_staff(draft).await;

        Ok(created)
    }

    pub async fn list_messages(&self, partner_id: &str) -> AppResult<Vec<partner_message::Model>> {
        self.get_partner(partner_id).await?;
        self.partner_repo.find_messages(partner_id).await
    }

    /// Link a partner to a project. Both must exist.
    pub async fn create_assignment(
        &self,
        assigned_by: &str,
        input: CreateAssignmentInput,
    ) -> AppResult<partner_project_assignment::Model> {
        input.validate()?;
        let partner = self.get_partner(&input.partner_id).await?;
        self.ensure_project(&input.project_id).await?;

        let model = partner_project_assignment::ActiveModel {
            id: Set(self.id_gen.generate()),
            partner_id: Set(partner.id),
            project_id: Set(input.project_id),
            role: Set(input.role),
            status: Set(input.status.unwrap_or(AssignmentStatus::Proposed)),
            assigned_by: Set(Some(assigned_by.to_string())),
            assigned_at: Set(Utc::now().into()),
        };
        let created = self.partner_repo.create_assignment(model).await?;

        info!(
            partner_id = %created.partner_id,
            project_id = %created.project_id,
            "Partner assigned to project"
        );
        Ok(created)
    }

    pub async fn list_assignments(
        &self,
        partner_id: &str,
    ) -> AppResult<Vec<partner_project_assignment::Model>> {
        self.get_partner(partner_id).await?;
        self.partner_repo.find_assignments(partner_id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use mozsolidaria_db::{
        entities::project,
        repositories::{NotificationRepository, UserRepository},
        test_utils,
    };
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn service(db: MockDatabase) -> PartnerService {
        let conn = Arc::new(db.into_connection());
        PartnerService::new(
            PartnerRepository::new(conn.clone()),
            ProjectRepository::new(conn.clone()),
            NotificationService::new(
                NotificationRepository::new(conn.clone()),
                UserRepository::new(conn),
            ),
        )
    }

    fn assignment_input() -> CreateAssignmentInput {
        CreateAssignmentInput {
            partner_id: "pa1".to_string(),
            project_id: "p1".to_string(),
            role: "implementing".to_string(),
            status: None,
        }
    }

    #[tokio::test]
    async fn test_assignment_requires_partner() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<partner::Model>::new()]),
        );

        let result = svc.create_assignment("u1", assignment_input()).await;

        assert!(matches!(result, Err(AppError::NotFound(msg)) if msg.starts_with("partner")));
    }

    #[tokio::test]
    async fn test_assignment_requires_project() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_utils::partner("pa1", "Cruz Vermelha")]])
                .append_query_results([Vec::<project::Model>::new()]),
        );

        let result = svc.create_assignment("u1", assignment_input()).await;

        assert!(matches!(result, Err(AppError::NotFound(msg)) if msg.starts_with("project")));
    }

    #[tokio::test]
    async fn test_assignment_created() {
        let stored = partner_project_assignment::Model {
            id: "a1".to_string(),
            partner_id: "pa1".to_string(),
            project_id: "p1".to_string(),
            role: "implementing".to_string(),
            status: AssignmentStatus::Proposed,
            assigned_by: Some("u1".to_string()),
            assigned_at: test_utils::fixed_time(),
        };
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_utils::partner("pa1", "Cruz Vermelha")]])
                .append_query_results([[test_utils::project("p1", "agua")]])
                .append_query_results([[stored.clone()]]),
        );

        let created = svc.create_assignment("u1", assignment_input()).await.unwrap();

        assert_eq!(created, stored);
    }

    #[tokio::test]
    async fn test_send_message_notifies_staff() {
        let stored = partner_message::Model {
            id: "msg1".to_string(),
            partner_id: "pa1".to_string(),
            sender_id: "u2".to_string(),
            subject: "Relatório trimestral".to_string(),
            content: "Em anexo".to_string(),
            project_id: None,
            is_read: false,
            created_at: test_utils::fixed_time(),
        };
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_utils::partner("pa1", "Cruz Vermelha")]])
                .append_query_results([[stored.clone()]])
                .append_query_results([[test_utils::staff("u1", "admin")]])
                .append_query_results([[test_utils::notification("n1", "u1")]]),
        );
        let input = SendMessageInput {
            partner_id: "pa1".to_string(),
            subject: "Relatório trimestral".to_string(),
            content: "Em anexo".to_string(),
            project_id: None,
        };

        let created = svc.send_message("u2", input).await.unwrap();

        assert_eq!(created, stored);
    }

    #[tokio::test]
    async fn test_list_messages_unknown_partner() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<partner::Model>::new()]),
        );

        assert!(matches!(
            svc.list_messages("ghost").await,
            Err(AppError::NotFound(_))
        ));
    }
}
