//! Donation service.

use chrono::Utc;
use mozsolidaria_common::{AppError, AppResult, IdGenerator};
use mozsolidaria_db::{
    entities::{
        donation::{self, DonationStatus},
        donation_method,
        notification::{NotificationPriority, NotificationType},
    },
    repositories::{DonationFilter, DonationRepository, ProjectRepository},
};
use rust_decimal::Decimal;
use sea_orm::Set;
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use super::metrics::MetricsService;
use super::notification::{NotificationDraft, NotificationService};

/// Input for recording a donation.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateDonationInput {
    #[validate(length(min = 1, max = 200))]
    pub donor_name: String,
    #[validate(email)]
    pub donor_email: Option<String>,
    #[serde(default)]
    pub is_anonymous: bool,
    pub amount: Decimal,
    #[validate(length(equal = 3))]
    pub currency: Option<String>,
    pub donation_method_id: String,
    /// `None` for the general fund.
    pub project_id: Option<String>,
    #[validate(length(max = 500))]
    pub purpose: Option<String>,
}

/// Staff review of a recorded donation.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateDonationStatusInput {
    pub status: DonationStatus,
}

/// Donation service for business logic.
#[derive(Clone)]
pub struct DonationService {
    donation_repo: DonationRepository,
    project_repo: ProjectRepository,
    notifications: NotificationService,
    metrics: MetricsService,
    default_currency: String,
    id_gen: IdGenerator,
}

impl DonationService {
    /// Create a new donation service.
    #[must_use]
    pub const fn new(
        donation_repo: DonationRepository,
        project_repo: ProjectRepository,
        notifications: NotificationService,
        metrics: MetricsService,
        default_currency: String,
    ) -> Self {
        Self {
            donation_repo,
            project_repo,
            notifications,
            metrics,
            default_currency,
            id_gen: IdGenerator::new(),
        }
    }

    /// Methods shown on donation forms.
    pub async fn list_methods(&self) -> AppResult<Vec<donation_method::Model>> {
        self.donation_repo.find_active_methods().await
    }

    /// Donations matching `filter`, newest first.
    pub async fn list(&self, filter: &DonationFilter) -> AppResult<Vec<donation::Model>> {
        self.donation_repo.find_filtered(filter).await
    }

    /// Record a pending donation.
    ///
    /// Staff are notified, and the linked project's metrics are refreshed.
    pub async fn create(
        &self,
        donor_id: Option<&str>,
        input: CreateDonationInput,
    ) -> AppResult<donation::Model> {
        input.validate()?;
        if input.amount <= Decimal::ZERO {
            return Err(AppError::Validation("amount must be positive".to_string()));
        }

        let method = self
            .donation_repo
            .find_method_by_id(&input.donation_method_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("donation method {}", input.donation_method_id))
            })?;
        if !method.is_active {
            return Err(AppError::BadRequest(format!(
                "donation method '{}' is not accepting donations",
                method.name
            )));
        }

        if let Some(project_id) = input.project_id.as_deref() {
            if self.project_repo.find_by_id(project_id).await?.is_none() {
                return Err(AppError::NotFound(format!("project {project_id}")));
            }
        }

        let currency = input
            .currency
            .map_or_else(|| self.default_currency.clone(), |c| c.to_ascii_uppercase());
        let model = donation::ActiveModel {
            id: Set(self.id_gen.generate()),
            donor_id: Set(donor_id.map(str::to_string)),
            donor_name: Set(input.donor_name),
            donor_email: Set(input.donor_email),
            is_anonymous: Set(input.is_anonymous),
            amount: Set(input.amount),
            currency: Set(currency),
            donation_method_id: Set(Some(method.id)),
            project_id: Set(input.project_id),
            status: Set(DonationStatus::Pending),
            purpose: Set(input.purpose),
            created_at: Set(Utc::now().into()),
        };

        let created = self.donation_repo.create(model).await?;
        info!(donation_id = %created.id, amount = %created.amount, "Donation recorded");

        let donor = if created.is_anonymous {
            super::export::ANONYMOUS_DONOR
        } else {
            created.donor_name.as_str()
        };
        let draft = NotificationDraft::new(
            NotificationType::Donation,
            "Nova doação recebida",
            format!("{donor} doou {} {}", created.amount, created.currency),
        )
        .priority(NotificationPriority::High)
        .action(format!("/admin/donations/{}", created.id), "Ver doação");
        self.notifications.alert_staff(draft).await;

        if let Some(project_id) = created.project_id.as_deref() {
            self.metrics.refresh_after_change(project_id).await;
        }

        Ok(created)
    }

    /// Move a donation to a new state and refresh the linked project's metrics.
    ///
    /// Only completed donations count towards financial figures.
    pub async fn update_status(
        &self,
        id: &str,
        input: UpdateDonationStatusInput,
    ) -> AppResult<donation::Model> {
        let donation = self
            .donation_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("donation {id}")))?;

        if donation.status == input.status {
            return Ok(donation);
        }

        let previous = donation.status;
        let mut active: donation::ActiveModel = donation.into();
        active.status = Set(input.status);
        let updated = self.donation_repo.update(active).await?;
        info!(
            donation_id = %updated.id,
            from = ?previous,
            to = ?updated.status,
            "Donation status changed"
        );

        if let Some(project_id) = updated.project_id.as_deref() {
            self.metrics.refresh_after_change(project_id).await;
        }

        Ok(updated)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use mozsolidaria_db::{
        entities::project,
        repositories::{
            BeneficiaryRepository, NotificationRepository, PartnerRepository, UserRepository,
            VolunteerRepository,
        },
        test_utils,
    };
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase};
    use std::sync::Arc;

    fn service(db: MockDatabase) -> DonationService {
        let conn = Arc::new(db.into_connection());
        let metrics = MetricsService::new(
            ProjectRepository::new(conn.clone()),
            DonationRepository::new(conn.clone()),
            VolunteerRepository::new(conn.clone()),
            BeneficiaryRepository::new(conn.clone()),
            PartnerRepository::new(conn.clone()),
        );
        let notifications = NotificationService::new(
            NotificationRepository::new(conn.clone()),
            UserRepository::new(conn.clone()),
        );
        DonationService::new(
            DonationRepository::new(conn.clone()),
            ProjectRepository::new(conn),
            notifications,
            metrics,
            "MZN".to_string(),
        )
    }

    fn input(method: &str, project: Option<&str>) -> CreateDonationInput {
        CreateDonationInput {
            donor_name: "Ana Machava".to_string(),
            donor_email: Some("ana@example.org".to_string()),
            is_anonymous: false,
            amount: Decimal::from(500),
            currency: None,
            donation_method_id: method.to_string(),
            project_id: project.map(str::to_string),
            purpose: None,
        }
    }

    #[tokio::test]
    async fn test_inactive_method_rejected() {
        let mut method = test_utils::donation_method("m1", "Transferência");
        method.is_active = false;
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[method]]));

        let result = svc.create(None, input("m1", None)).await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_unknown_project_rejected() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_utils::donation_method("m1", "M-Pesa")]])
                .append_query_results([Vec::<project::Model>::new()]),
        );

        let result = svc.create(None, input("m1", Some("ghost"))).await;

        assert!(matches!(result, Err(AppError::NotFound(msg)) if msg.contains("ghost")));
    }

    #[tokio::test]
    async fn test_non_positive_amount_rejected() {
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres));
        let mut zero = input("m1", None);
        zero.amount = Decimal::ZERO;

        assert!(matches!(
            svc.create(None, zero).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_create_notifies_staff() {
        let stored = test_utils::donation("d1", 500);
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_utils::donation_method("m1", "M-Pesa")]])
                .append_query_results([[stored.clone()]])
                .append_query_results([[test_utils::staff("u1", "admin")]])
                .append_query_results([[test_utils::notification("n1", "u1")]]),
        );

        let created = svc.create(None, input("m1", None)).await.unwrap();

        assert_eq!(created, stored);
    }

    #[tokio::test]
    async fn test_create_survives_failed_staff_lookup() {
        let stored = test_utils::donation("d1", 500);
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_utils::donation_method("m1", "M-Pesa")]])
                .append_query_results([[stored.clone()]])
                .append_query_errors([DbErr::Custom("staff lookup down".into())]),
        );

        let created = svc.create(None, input("m1", None)).await.unwrap();

        assert_eq!(created, stored);
    }

    #[tokio::test]
    async fn test_update_status_completes_donation() {
        let mut pending = test_utils::donation("d1", 500);
        pending.status = DonationStatus::Pending;
        pending.project_id = Some("p1".to_string());
        let mut completed = pending.clone();
        completed.status = DonationStatus::Completed;
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[pending]])
                .append_query_results([[completed.clone()]]),
        );

        let updated = svc
            .update_status(
                "d1",
                UpdateDonationStatusInput {
                    status: DonationStatus::Completed,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated, completed);
    }

    #[tokio::test]
    async fn test_update_status_same_state_is_noop() {
        let stored = test_utils::donation("d1", 500);
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[stored.clone()]]),
        );

        let updated = svc
            .update_status(
                "d1",
                UpdateDonationStatusInput {
                    status: DonationStatus::Completed,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated, stored);
    }

    #[tokio::test]
    async fn test_update_status_unknown_donation() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<donation::Model>::new()]),
        );

        let result = svc
            .update_status(
                "ghost",
                UpdateDonationStatusInput {
                    status: DonationStatus::Rejected,
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_methods() {
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[
            test_utils::donation_method("m1", "M-Pesa"),
            test_utils::donation_method("m2", "e-Mola"),
        ]]));

        let methods = svc.list_methods().await.unwrap();

        assert_eq!(methods.len(), 2);
        assert_eq!(methods[1].name, "e-Mola");
    }
}
