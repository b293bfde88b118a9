//! Volunteer and beneficiary registration.

use chrono::{NaiveDate, Utc};
use mozsolidaria_common::{AppError, AppResult, IdGenerator};
use mozsolidaria_db::{
    entities::{
        beneficiary_need,
        beneficiary_profile::{self, BeneficiaryStatus, VulnerabilityLevel},
        notification::NotificationType,
        volunteer_profile::{self, VolunteerStatus},
        volunteer_skill,
    },
    repositories::{BeneficiaryRepository, TimeWindow, VolunteerRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use super::notification::{NotificationDraft, NotificationService};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterVolunteerInput {
    #[validate(length(min = 1, max = 200))]
    pub full_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    #[validate(length(max = 200))]
    pub location: Option<String>,
    #[validate(length(max = 200))]
    pub availability: Option<String>,
    #[serde(default)]
    pub skill_ids: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterBeneficiaryInput {
    #[validate(length(min = 1, max = 200))]
    pub full_name: String,
    #[validate(length(max = 16))]
    pub gender: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    #[validate(length(min = 1, max = 100))]
    pub province: String,
    #[validate(length(min = 1, max = 100))]
    pub district: String,
    #[validate(length(max = 100))]
    pub community: Option<String>,
    #[validate(range(min = 1, max = 100))]
    pub family_size: Option<i32>,
    pub vulnerability_level: Option<VulnerabilityLevel>,
    #[serde(default)]
    pub need_ids: Vec<String>,
}

/// Every id in `wanted` must be among `found`.
fn ensure_all_known(kind: &str, wanted: &[String], found: &[String]) -> AppResult<()> {
    let missing: Vec<&str> = wanted
        .iter()
        .filter(|id| !found.contains(id))
        .map(String::as_str)
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "unknown {kind}: {}",
            missing.join(", ")
        )))
    }
}

fn dedup(ids: &[String]) -> Vec<String> {
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Community service for business logic.
#[derive(Clone)]
pub struct CommunityService {
    volunteer_repo: VolunteerRepository,
    beneficiary_repo: BeneficiaryRepository,
    notifications: NotificationService,
    id_gen: IdGenerator,
}

impl CommunityService {
    /// Create a new community service.
    #[must_use]
    pub const fn new(
        volunteer_repo: VolunteerRepository,
        beneficiary_repo: BeneficiaryRepository,
        notifications: NotificationService,
    ) -> Self {
        Self {
            volunteer_repo,
            beneficiary_repo,
            notifications,
            id_gen: IdGenerator::new(),
        }
    }

    pub async fn list_volunteers(
        &self,
        status: Option<VolunteerStatus>,
    ) -> AppResult<Vec<volunteer_profile::Model>> {
        self.volunteer_repo.find_filtered(status, TimeWindow::ALL).await
    }

    /// Register a volunteer, pending review. A user may hold one profile.
    pub async fn register_volunteer(
        &self,
        user_id: Option<&str>,
        input: RegisterVolunteerInput,
    ) -> AppResult<volunteer_profile::Model> {
        input.validate()?;

        if let Some(user_id) = user_id {
            if self.volunteer_repo.find_by_user_id(user_id).await?.is_some() {
                return Err(AppError::Conflict(
                    "this account already has a volunteer profile".to_string(),
                ));
            }
        }

        let skill_ids = dedup(&input.skill_ids);
        if !skill_ids.is_empty() {
            let found: Vec<String> = self
                .volunteer_repo
                .find_skills_by_ids(&skill_ids)
                .await?
                .into_iter()
                .map(|s| s.id)
                .collect();
            ensure_all_known("skills", &skill_ids, &found)?;
        }

        let model = volunteer_profile::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.map(str::to_string)),
            full_name: Set(input.full_name),
            email: Set(input.email),
            phone: Set(input.phone),
            location: Set(input.location),
            status: Set(VolunteerStatus::Pending),
            availability: Set(input.availability),
            total_hours: Set(0),
            created_at: Set(Utc::now().into()),
        };
        let created = self.volunteer_repo.create(model).await?;

        let links = skill_ids
            .into_iter()
            .map(|skill_id| volunteer_skill::ActiveModel {
                id: Set(self.id_gen.generate()),
                volunteer_id: Set(created.id.clone()),
                skill_id: Set(skill_id),
            })
            .collect();
        self.volunteer_repo.add_skills(links).await?;

        info!(volunteer_id = %created.id, "Volunteer registered");
        let draft = NotificationDraft::new(
            NotificationType::Volunteer,
            "Novo voluntário",
            format!("{} registou-se como voluntário", created.full_name),
        )
        .action(format!("/admin/volunteers/{}", created.id), "Rever perfil");
        self.notifications.alert_staff(draft).await;

        Ok(created)
    }

    pub async fn list_beneficiaries(
        &self,
        status: Option<BeneficiaryStatus>,
    ) -> AppResult<Vec<beneficiary_profile::Model>> {
        self.beneficiary_repo
            .find_filtered(status, TimeWindow::ALL)
            .await
    }

    /// Register a beneficiary, pending review.
    pub async fn register_beneficiary(
        &self,
        input: RegisterBeneficiaryInput,
    ) -> AppResult<beneficiary_profile::Model> {
        input.validate()?;
        if let Some(born) = input.date_of_birth {
            if born > Utc::now().date_naive() {
                return Err(AppError::Validation(
                    "date_of_birth is in the future".to_string(),
                ));
            }
        }

        let need_ids = dedup(&input.need_ids);
        if !need_ids.is_empty() {
            let found: Vec<String> = self
                .beneficiary_repo
                .find_needs_by_ids(&need_ids)
                .await?
                .into_iter()
                .map(|n| n.id)
                .collect();
            ensure_all_known("needs", &need_ids, &found)?;
        }

        let model = beneficiary_profile::ActiveModel {
            id: Set(self.id_gen.generate()),
            full_name: Set(input.full_name),
            gender: Set(input.gender),
            date_of_birth: Set(input.date_of_birth),
            province: Set(input.province),
            district: Set(input.district),
            community: Set(input.community),
            family_size: Set(input.family_size.unwrap_or(1)),
            vulnerability_level: Set(input
                .vulnerability_level
                .unwrap_or(VulnerabilityLevel::Medium)),
            status: Set(BeneficiaryStatus::Pending),
            created_at: Set(Utc::now().into()),
        };
        let created = self.beneficiary_repo.create(model).await?;

        let links = need_ids
            .into_iter()
            .map(|need_id| beneficiary_need::ActiveModel {
                id: Set(self.id_gen.generate()),
                beneficiary_id: Set(created.id.clone()),
                need_id: Set(need_id),
            })
            .collect();
        self.beneficiary_repo.add_needs(links).await?;

        info!(beneficiary_id = %created.id, province = %created.province, "Beneficiary registered");
        let draft = NotificationDraft::new(
            NotificationType::Beneficiary,
            "Novo beneficiário",
            format!("{} ({}) aguarda revisão", created.full_name, created.district),
        )
        .action(format!("/admin/beneficiaries/{}", created.id), "Rever registo");
        self.notifications.alert_staff(draft).await;

        Ok(created)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use mozsolidaria_db::{
        entities::{skill, user},
        repositories::{NotificationRepository, UserRepository},
        test_utils,
    };
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn service(db: MockDatabase) -> CommunityService {
        let conn = Arc::new(db.into_connection());
        CommunityService::new(
            VolunteerRepository::new(conn.clone()),
            BeneficiaryRepository::new(conn.clone()),
            NotificationService::new(
                NotificationRepository::new(conn.clone()),
                UserRepository::new(conn),
            ),
        )
    }

    fn volunteer_input(skills: &[&str]) -> RegisterVolunteerInput {
        RegisterVolunteerInput {
            full_name: "Ana Machava".to_string(),
            email: "ana@example.org".to_string(),
            phone: None,
            location: Some("Maputo".to_string()),
            availability: None,
            skill_ids: skills.iter().map(ToString::to_string).collect(),
        }
    }

    fn skill(id: &str) -> skill::Model {
        skill::Model {
            id: id.to_string(),
            name: format!("Skill {id}"),
            category: None,
        }
    }

    #[test]
    fn test_ensure_all_known() {
        let wanted = vec!["a".to_string(), "b".to_string()];
        assert!(ensure_all_known("skills", &wanted, &wanted).is_ok());
        assert!(matches!(
            ensure_all_known("skills", &wanted, &["a".to_string()]),
            Err(AppError::Validation(msg)) if msg.ends_with(": b")
        ));
    }

    #[tokio::test]
    async fn test_register_volunteer_twice_conflicts() {
        let mut existing = test_utils::volunteer("v1", "Ana Machava");
        existing.user_id = Some("u1".to_string());
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[existing]]));

        let result = svc.register_volunteer(Some("u1"), volunteer_input(&[])).await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_register_volunteer_unknown_skill() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[skill("s1")]]),
        );

        let result = svc.register_volunteer(None, volunteer_input(&["s1", "s2"])).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_register_volunteer_links_skills_and_notifies() {
        let stored = test_utils::volunteer("v1", "Ana Machava");
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[skill("s1")]])
                .append_query_results([[stored.clone()]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .append_query_results([Vec::<user::Model>::new()]),
        );

        let created = svc
            .register_volunteer(None, volunteer_input(&["s1", "s1"]))
            .await
            .unwrap();

        assert_eq!(created, stored);
    }

    #[tokio::test]
    async fn test_register_beneficiary_without_needs() {
        let stored = test_utils::beneficiary("b1", "Rosa Cossa");
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[stored.clone()]])
                .append_query_results([Vec::<user::Model>::new()]),
        );
        let input: RegisterBeneficiaryInput = serde_json::from_value(serde_json::json!({
            "full_name": "Rosa Cossa",
            "province": "Cabo Delgado",
            "district": "Pemba"
        }))
        .unwrap();

        let created = svc.register_beneficiary(input).await.unwrap();

        assert_eq!(created.full_name, "Rosa Cossa");
    }

    #[tokio::test]
    async fn test_register_beneficiary_rejects_zero_family() {
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres));
        let input: RegisterBeneficiaryInput = serde_json::from_value(serde_json::json!({
            "full_name": "Rosa Cossa",
            "province": "Cabo Delgado",
            "district": "Pemba",
            "family_size": 0
        }))
        .unwrap();

        assert!(matches!(
            svc.register_beneficiary(input).await,
            Err(AppError::Validation(_))
        ));
    }
}
