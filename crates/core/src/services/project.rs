//! Project service: projects, their updates and milestones.
//!
//! Every change to an update or milestone refreshes the project's metrics
//! snapshot.

use chrono::{NaiveDate, Utc};
use mozsolidaria_common::{AppError, AppResult, IdGenerator, slugify};
use mozsolidaria_db::{
    entities::{
        project::{self, ProjectPriority, ProjectStatus},
        project_metrics,
        project_milestone::{self, MilestoneStatus},
        project_update::{self, UpdateStatus, UpdateType},
    },
    repositories::{ProjectRepository, TimeWindow},
};
use rust_decimal::Decimal;
use sea_orm::Set;
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use super::double_option;
use super::metrics::MetricsService;

/// Clamp a percentage to `[0, 100]`.
#[must_use]
pub fn clamp_percentage(value: i32) -> i32 {
    value.clamp(0, 100)
}

fn ensure_non_negative(field: &str, value: Decimal) -> AppResult<()> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(AppError::Validation(format!("{field} must not be negative")));
    }
    Ok(())
}

fn ensure_date_order(start: Option<NaiveDate>, end: Option<NaiveDate>) -> AppResult<()> {
    match (start, end) {
        (Some(start), Some(end)) if end < start => Err(AppError::Validation(format!(
            "end_date {end} is before start_date {start}"
        ))),
        _ => Ok(()),
    }
}

/// Input for creating or replacing a project.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateProjectInput {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    /// Derived from `name` when omitted.
    #[validate(length(min = 1, max = 200))]
    pub slug: Option<String>,
    #[validate(length(max = 300))]
    pub short_description: Option<String>,
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
    pub priority: Option<ProjectPriority>,
    pub program_id: Option<String>,
    pub category_id: Option<String>,
    #[validate(length(max = 200))]
    pub location: Option<String>,
    pub budget: Option<Decimal>,
    #[validate(range(min = 0))]
    pub target_beneficiaries: Option<i32>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub is_featured: Option<bool>,
    pub is_public: Option<bool>,
}

/// Partial project update. Absent fields are left unchanged; `null` clears.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProjectInput {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub short_description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub status: Option<ProjectStatus>,
    pub priority: Option<ProjectPriority>,
    #[serde(default, deserialize_with = "double_option")]
    pub program_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub category_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub location: Option<Option<String>>,
    pub budget: Option<Decimal>,
    #[validate(range(min = 0))]
    pub target_beneficiaries: Option<i32>,
    #[serde(default, deserialize_with = "double_option")]
    pub start_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    pub end_date: Option<Option<NaiveDate>>,
    pub is_featured: Option<bool>,
    pub is_public: Option<bool>,
}

/// Input for a progress report.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateUpdateInput {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub update_type: Option<UpdateType>,
    /// Defaults to published.
    pub status: Option<UpdateStatus>,
    #[validate(range(min = 0))]
    pub people_impacted: Option<i32>,
    pub budget_spent: Option<Decimal>,
    /// Clamped to `[0, 100]`.
    pub progress_percentage: Option<i32>,
}

/// Partial change to a progress report.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateUpdateInput {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub update_type: Option<UpdateType>,
    pub status: Option<UpdateStatus>,
    #[serde(default, deserialize_with = "double_option")]
    pub people_impacted: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub budget_spent: Option<Option<Decimal>>,
    /// Clamped to `[0, 100]`.
    #[serde(default, deserialize_with = "double_option")]
    pub progress_percentage: Option<Option<i32>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateMilestoneInput {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub description: Option<String>,
    pub target_date: NaiveDate,
    pub status: Option<MilestoneStatus>,
    pub progress: Option<i32>,
    pub completed_date: Option<NaiveDate>,
    pub display_order: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateMilestoneInput {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub target_date: Option<NaiveDate>,
    pub status: Option<MilestoneStatus>,
    pub progress: Option<i32>,
    pub completed_date: Option<NaiveDate>,
    pub display_order: Option<i32>,
}

/// Completion date stored for a milestone in `status`.
///
/// Only completed milestones carry one; it defaults to `today`.
#[must_use]
pub fn milestone_completed_date(
    status: MilestoneStatus,
    requested: Option<NaiveDate>,
    previous: Option<NaiveDate>,
    today: NaiveDate,
) -> Option<NaiveDate> {
    (status == MilestoneStatus::Completed).then(|| requested.or(previous).unwrap_or(today))
}

/// Project service for business logic.
#[derive(Clone)]
pub struct ProjectService {
    project_repo: ProjectRepository,
    metrics: MetricsService,
    id_gen: IdGenerator,
}

impl ProjectService {
    /// Create a new project service.
    #[must_use]
    pub const fn new(project_repo: ProjectRepository, metrics: MetricsService) -> Self {
        Self {
            project_repo,
            metrics,
            id_gen: IdGenerator::new(),
        }
    }

    /// Projects, newest first. Private projects are only listed for staff.
    pub async fn list(
        &self,
        status: Option<ProjectStatus>,
        include_private: bool,
    ) -> AppResult<Vec<project::Model>> {
        let projects = self
            .project_repo
            .find_filtered(status, TimeWindow::ALL)
            .await?;
        Ok(projects
            .into_iter()
            .filter(|p| include_private || p.is_public)
            .collect())
    }

    /// Get a project by slug.
    pub async fn get(&self, slug: &str) -> AppResult<project::Model> {
        self.project_repo.get_by_slug(slug).await
    }

    async fn ensure_slug_free(&self, slug: &str, own_id: Option<&str>) -> AppResult<()> {
        match self.project_repo.find_by_slug(slug).await? {
            Some(existing) if Some(existing.id.as_str()) != own_id => Err(AppError::Conflict(
                format!("a project with slug '{slug}' already exists"),
            )),
            _ => Ok(()),
        }
    }

    fn resolve_slug(name: &str, requested: Option<&str>) -> AppResult<String> {
        let slug = slugify(requested.unwrap_or(name));
        if slug.is_empty() {
            return Err(AppError::Validation(
                "slug must contain at least one letter or digit".to_string(),
            ));
        }
        Ok(slug)
    }

    /// Program and category references must point at existing rows.
    async fn ensure_classification(
        &self,
        program_id: Option<&str>,
        category_id: Option<&str>,
    ) -> AppResult<()> {
        if let Some(id) = program_id {
            if self.project_repo.find_program_by_id(id).await?.is_none() {
                return Err(AppError::NotFound(format!("program {id}")));
            }
        }
        if let Some(id) = category_id {
            if self.project_repo.find_category_by_id(id).await?.is_none() {
                return Err(AppError::NotFound(format!("category {id}")));
            }
        }
        Ok(())
    }

    fn check_create(input: &CreateProjectInput) -> AppResult<()> {
        input.validate()?;
        ensure_non_negative("budget", input.budget.unwrap_or_default())?;
        ensure_date_order(input.start_date, input.end_date)
    }

    /// Create a project.
    pub async fn create(&self, input: CreateProjectInput) -> AppResult<project::Model> {
        Self::check_create(&input)?;
        let slug = Self::resolve_slug(&input.name, input.slug.as_deref())?;
        self.ensure_slug_free(&slug, None).await?;
        self.ensure_classification(input.program_id.as_deref(), input.category_id.as_deref())
            .await?;

        let model = project::ActiveModel {
            id: Set(self.id_gen.generate()),
            name: Set(input.name),
            slug: Set(slug),
            short_description: Set(input.short_description),
            description: Set(input.description),
            status: Set(input.status.unwrap_or(ProjectStatus::Draft)),
            priority: Set(input.priority.unwrap_or(ProjectPriority::Medium)),
            program_id: Set(input.program_id),
            category_id: Set(input.category_id),
            location: Set(input.location),
            budget: Set(input.budget.unwrap_or_default()),
            target_beneficiaries: Set(input.target_beneficiaries.unwrap_or(0)),
            start_date: Set(input.start_date),
            end_date: Set(input.end_date),
            is_featured: Set(input.is_featured.unwrap_or(false)),
            is_public: Set(input.is_public.unwrap_or(true)),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        let created = self.project_repo.create(model).await?;
        info!(project_id = %created.id, slug = %created.slug, "Project created");
        Ok(created)
    }

    /// Replace every editable field of a project (`PUT`).
    pub async fn replace(&self, slug: &str, input: CreateProjectInput) -> AppResult<project::Model> {
        Self::check_create(&input)?;
        let project = self.project_repo.get_by_slug(slug).await?;
        let new_slug = Self::resolve_slug(&input.name, input.slug.as_deref())?;
        if new_slug != project.slug {
            self.ensure_slug_free(&new_slug, Some(&project.id)).await?;
        }
        self.ensure_classification(input.program_id.as_deref(), input.category_id.as_deref())
            .await?;

        let mut active: project::ActiveModel = project.into();
        active.name = Set(input.name);
        active.slug = Set(new_slug);
        active.short_description = Set(input.short_description);
        active.description = Set(input.description);
        active.status = Set(input.status.unwrap_or(ProjectStatus::Draft));
        active.priority = Set(input.priority.unwrap_or(ProjectPriority::Medium));
        active.program_id = Set(input.program_id);
        active.category_id = Set(input.category_id);
        active.location = Set(input.location);
        active.budget = Set(input.budget.unwrap_or_default());
        active.target_beneficiaries = Set(input.target_beneficiaries.unwrap_or(0));
        active.start_date = Set(input.start_date);
        active.end_date = Set(input.end_date);
        active.is_featured = Set(input.is_featured.unwrap_or(false));
        active.is_public = Set(input.is_public.unwrap_or(true));
        active.updated_at = Set(Some(Utc::now().into()));

        self.project_repo.update(active).await
    }

    /// Apply a partial update (`PATCH`).
    pub async fn patch(&self, slug: &str, input: UpdateProjectInput) -> AppResult<project::Model> {
        input.validate()?;
        if let Some(budget) = input.budget {
            ensure_non_negative("budget", budget)?;
        }

        let project = self.project_repo.get_by_slug(slug).await?;
        ensure_date_order(
            input.start_date.unwrap_or(project.start_date),
            input.end_date.unwrap_or(project.end_date),
        )?;

        let new_slug = match input.slug.as_deref() {
            Some(requested) => {
                let resolved = Self::resolve_slug(requested, None)?;
                if resolved != project.slug {
                    self.ensure_slug_free(&resolved, Some(&project.id)).await?;
                }
                Some(resolved)
            }
            None => None,
        };
        self.ensure_classification(
            input.program_id.as_ref().and_then(Option::as_deref),
            input.category_id.as_ref().and_then(Option::as_deref),
        )
        .await?;

        let mut active: project::ActiveModel = project.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(slug) = new_slug {
            active.slug = Set(slug);
        }
        if let Some(v) = input.short_description {
            active.short_description = Set(v);
        }
        if let Some(v) = input.description {
            active.description = Set(v);
        }
        if let Some(v) = input.status {
            active.status = Set(v);
        }
        if let Some(v) = input.priority {
            active.priority = Set(v);
        }
        if let Some(v) = input.program_id {
            active.program_id = Set(v);
        }
        if let Some(v) = input.category_id {
            active.category_id = Set(v);
        }
        if let Some(v) = input.location {
            active.location = Set(v);
        }
        if let Some(v) = input.budget {
            active.budget = Set(v);
        }
        if let Some(v) = input.target_beneficiaries {
            active.target_beneficiaries = Set(v);
        }
        if let Some(v) = input.start_date {
            active.start_date = Set(v);
        }
        if let Some(v) = input.end_date {
            active.end_date = Set(v);
        }
        if let Some(v) = input.is_featured {
            active.is_featured = Set(v);
        }
        if let Some(v) = input.is_public {
            active.is_public = Set(v);
        }
        active.updated_at = Set(Some(Utc::now().into()));

        self.project_repo.update(active).await
    }

    /// Delete a project with its updates, milestones and metrics.
    pub async fn delete(&self, slug: &str) -> AppResult<()> {
        let project = self.project_repo.get_by_slug(slug).await?;
        self.project_repo.delete(&project.id).await?;
        info!(project_id = %project.id, slug = %slug, "Project deleted");
        Ok(())
    }

    // === Updates ===

    pub async fn list_updates(
        &self,
        slug: &str,
        published_only: bool,
    ) -> AppResult<Vec<project_update::Model>> {
        let project = self.project_repo.get_by_slug(slug).await?;
        self.project_repo.find_updates(&project.id, published_only).await
    }

    /// Record a progress report and refresh the project's metrics.
    pub async fn create_update(
        &self,
        slug: &str,
        author_id: Option<&str>,
        input: CreateUpdateInput,
    ) -> AppResult<project_update::Model> {
        input.validate()?;
        if let Some(spent) = input.budget_spent {
            ensure_non_negative("budget_spent", spent)?;
        }

        let project = self.project_repo.get_by_slug(slug).await?;

        let model = project_update::ActiveModel {
            id: Set(self.id_gen.generate()),
            project_id: Set(project.id.clone()),
            author_id: Set(author_id.map(str::to_string)),
            title: Set(input.title),
            description: Set(input.description),
            update_type: Set(input.update_type.unwrap_or(UpdateType::Progress)),
            status: Set(input.status.unwrap_or(UpdateStatus::Published)),
            people_impacted: Set(input.people_impacted),
            budget_spent: Set(input.budget_spent),
            progress_percentage: Set(input.progress_percentage.map(clamp_percentage)),
            created_at: Set(Utc::now().into()),
        };

        let created = self.project_repo.create_update(model).await?;
        self.metrics.refresh_after_change(&project.id).await;

        Ok(created)
    }

    /// Change a progress report of the project and refresh the project's metrics.
    pub async fn update_update(
        &self,
        slug: &str,
        update_id: &str,
        input: UpdateUpdateInput,
    ) -> AppResult<project_update::Model> {
        input.validate()?;
        if let Some(Some(spent)) = input.budget_spent {
            ensure_non_negative("budget_spent", spent)?;
        }
        if matches!(input.people_impacted, Some(Some(people)) if people < 0) {
            return Err(AppError::Validation(
                "people_impacted must not be negative".to_string(),
            ));
        }

        let project = self.project_repo.get_by_slug(slug).await?;
        let update = self
            .project_repo
            .find_update_by_id(update_id)
            .await?
            .filter(|u| u.project_id == project.id)
            .ok_or_else(|| AppError::NotFound(format!("update {update_id}")))?;

        let mut active: project_update::ActiveModel = update.into();
        if let Some(title) = input.title {
            active.title = Set(title);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(update_type) = input.update_type {
            active.update_type = Set(update_type);
        }
        if let Some(status) = input.status {
            active.status = Set(status);
        }
        if let Some(people) = input.people_impacted {
            active.people_impacted = Set(people);
        }
        if let Some(spent) = input.budget_spent {
            active.budget_spent = Set(spent);
        }
        if let Some(progress) = input.progress_percentage {
            active.progress_percentage = Set(progress.map(clamp_percentage));
        }

        let updated = self.project_repo.update_update(active).await?;
        info!(update_id = %updated.id, project_id = %project.id, "Project update changed");
        self.metrics.refresh_after_change(&project.id).await;

        Ok(updated)
    }

    // === Milestones ===

    pub async fn list_milestones(&self, slug: &str) -> AppResult<Vec<project_milestone::Model>> {
        let project = self.project_repo.get_by_slug(slug).await?;
        self.project_repo.find_milestones(&project.id).await
    }

    /// Add a milestone and refresh the project's metrics.
    pub async fn create_milestone(
        &self,
        slug: &str,
        input: CreateMilestoneInput,
    ) -> AppResult<project_milestone::Model> {
        input.validate()?;
        let project = self.project_repo.get_by_slug(slug).await?;

        let status = input.status.unwrap_or(MilestoneStatus::Pending);
        let today = Utc::now().date_naive();
        let model = project_milestone::ActiveModel {
            id: Set(self.id_gen.generate()),
            project_id: Set(project.id.clone()),
            title: Set(input.title),
            description: Set(input.description),
            target_date: Set(input.target_date),
            completed_date: Set(milestone_completed_date(
                status,
                input.completed_date,
                None,
                today,
            )),
            status: Set(status),
            progress: Set(if status == MilestoneStatus::Completed {
                100
            } else {
                clamp_percentage(input.progress.unwrap_or(0))
            }),
            display_order: Set(input.display_order.unwrap_or(0)),
        };

        let created = self.project_repo.create_milestone(model).await?;
        self.metrics.refresh_after_change(&project.id).await;

        Ok(created)
    }

    /// Change a milestone of the project and refresh the project's metrics.
    pub async fn update_milestone(
        &self,
        slug: &str,
        milestone_id: &str,
        input: UpdateMilestoneInput,
    ) -> AppResult<project_milestone::Model> {
        input.validate()?;
        let project = self.project_repo.get_by_slug(slug).await?;
        let milestone = self
            .project_repo
            .find_milestone_by_id(milestone_id)
            .await?
            .filter(|m| m.project_id == project.id)
            .ok_or_else(|| AppError::NotFound(format!("milestone {milestone_id}")))?;

        let status = input.status.unwrap_or(milestone.status);
        let completed_date = milestone_completed_date(
            status,
            input.completed_date,
            milestone.completed_date,
            Utc::now().date_naive(),
        );
        let progress = if status == MilestoneStatus::Completed {
            100
        } else {
            clamp_percentage(input.progress.unwrap_or(milestone.progress))
        };

        let mut active: project_milestone::ActiveModel = milestone.into();
        if let Some(title) = input.title {
            active.title = Set(title);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(target_date) = input.target_date {
            active.target_date = Set(target_date);
        }
        if let Some(order) = input.display_order {
            active.display_order = Set(order);
        }
        active.status = Set(status);
        active.completed_date = Set(completed_date);
        active.progress = Set(progress);

        let updated = self.project_repo.update_milestone(active).await?;
        self.metrics.refresh_after_change(&project.id).await;

        Ok(updated)
    }

    // === Metrics ===

    /// Stored metrics of a project, computing them on first access.
    pub async fn metrics(&self, slug: &str) -> AppResult<project_metrics::Model> {
        let project = self.project_repo.get_by_slug(slug).await?;
        match self.metrics.project_metrics(&project.id).await? {
            Some(stored) => Ok(stored),
            None => self.metrics.recompute_project_metrics(&project.id).await,
        }
    }

    /// Force a recomputation of a project's metrics.
    pub async fn recompute_metrics(&self, slug: &str) -> AppResult<project_metrics::Model> {
        let project = self.project_repo.get_by_slug(slug).await?;
        self.metrics.recompute_project_metrics(&project.id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use mozsolidaria_db::{
        entities::{program, project_category},
        repositories::{
            BeneficiaryRepository, DonationRepository, PartnerRepository, VolunteerRepository,
        },
        test_utils,
    };
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn service(db: MockDatabase) -> ProjectService {
        let conn = Arc::new(db.into_connection());
        let metrics = MetricsService::new(
            ProjectRepository::new(conn.clone()),
            DonationRepository::new(conn.clone()),
            VolunteerRepository::new(conn.clone()),
            BeneficiaryRepository::new(conn.clone()),
            PartnerRepository::new(conn.clone()),
        );
        ProjectService::new(ProjectRepository::new(conn), metrics)
    }

    fn create_input(name: &str) -> CreateProjectInput {
        serde_json::from_value(serde_json::json!({ "name": name })).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_clamp_percentage() {
        assert_eq!(clamp_percentage(-5), 0);
        assert_eq!(clamp_percentage(55), 55);
        assert_eq!(clamp_percentage(250), 100);
    }

    #[test]
    fn test_completed_date_only_when_completed() {
        let today = date(2025, 6, 1);

        assert_eq!(
            milestone_completed_date(MilestoneStatus::Completed, None, None, today),
            Some(today)
        );
        assert_eq!(
            milestone_completed_date(
                MilestoneStatus::Completed,
                None,
                Some(date(2025, 5, 2)),
                today
            ),
            Some(date(2025, 5, 2))
        );
        assert_eq!(
            milestone_completed_date(
                MilestoneStatus::InProgress,
                Some(date(2025, 5, 2)),
                Some(date(2025, 5, 2)),
                today
            ),
            None
        );
    }

    #[test]
    fn test_patch_input_distinguishes_null_from_absent() {
        let input: UpdateProjectInput =
            serde_json::from_value(serde_json::json!({ "location": null })).unwrap();

        assert_eq!(input.location, Some(None));
        assert_eq!(input.description, None);
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_slug() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_utils::project("p1", "agua-potavel")]]),
        );

        let result = svc.create(create_input("Água Potável")).await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_create_derives_slug() {
        let stored = test_utils::project("p9", "agua-potavel");
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<project::Model>::new()])
                .append_query_results([[stored.clone()]]),
        );

        let created = svc.create(create_input("Água Potável")).await.unwrap();

        assert_eq!(created.slug, "agua-potavel");
    }

    #[tokio::test]
    async fn test_create_rejects_negative_budget_and_bad_dates() {
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres));

        let mut negative = create_input("Escola");
        negative.budget = Some(Decimal::from(-1));
        assert!(matches!(svc.create(negative).await, Err(AppError::Validation(_))));

        let mut inverted = create_input("Escola");
        inverted.start_date = Some(date(2025, 6, 1));
        inverted.end_date = Some(date(2025, 1, 1));
        assert!(matches!(svc.create(inverted).await, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_update_for_unknown_project() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<project::Model>::new()]),
        );
        let input: CreateUpdateInput =
            serde_json::from_value(serde_json::json!({ "title": "Poço concluído" })).unwrap();

        let result = svc.create_update("nope", None, input).await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_create_update_survives_failed_refresh() {
        let stored = test_utils::project_update("u1", "p1", Some(100));
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_utils::project("p1", "agua")]])
                .append_query_results([[stored.clone()]]),
        );
        let input: CreateUpdateInput = serde_json::from_value(serde_json::json!({
            "title": "Poço concluído",
            "progress_percentage": 140
        }))
        .unwrap();

        let created = svc.create_update("agua", Some("u9"), input).await.unwrap();

        assert_eq!(created, stored);
    }

    #[tokio::test]
    async fn test_create_with_unknown_program() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<project::Model>::new()])
                .append_query_results([Vec::<program::Model>::new()]),
        );
        let mut input = create_input("Escola Primária");
        input.program_id = Some("ghost".to_string());

        let result = svc.create(input).await;

        assert!(matches!(result, Err(AppError::NotFound(msg)) if msg == "program ghost"));
    }

    #[tokio::test]
    async fn test_patch_with_unknown_category() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_utils::project("p1", "agua")]])
                .append_query_results([Vec::<project_category::Model>::new()]),
        );
        let input: UpdateProjectInput =
            serde_json::from_value(serde_json::json!({ "category_id": "ghost" })).unwrap();

        let result = svc.patch("agua", input).await;

        assert!(matches!(result, Err(AppError::NotFound(msg)) if msg == "category ghost"));
    }

    #[tokio::test]
    async fn test_update_update_clamps_progress() {
        let stored = test_utils::project_update("u1", "p1", Some(100));
        let conn = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_utils::project("p1", "agua")]])
                .append_query_results([[test_utils::project_update("u1", "p1", Some(40))]])
                .append_query_results([[stored.clone()]])
                .into_connection(),
        );
        let metrics = MetricsService::new(
            ProjectRepository::new(conn.clone()),
            DonationRepository::new(conn.clone()),
            VolunteerRepository::new(conn.clone()),
            BeneficiaryRepository::new(conn.clone()),
            PartnerRepository::new(conn.clone()),
        );
        let svc = ProjectService::new(ProjectRepository::new(conn.clone()), metrics);
        let input: UpdateUpdateInput =
            serde_json::from_value(serde_json::json!({ "progress_percentage": 250 })).unwrap();

        let updated = svc.update_update("agua", "u1", input).await.unwrap();

        assert_eq!(updated, stored);
        drop(svc);
        let log = format!("{:?}", Arc::try_unwrap(conn).ok().unwrap().into_transaction_log());
        assert!(log.contains("Int(Some(100))"));
        assert!(!log.contains("Int(Some(250))"));
    }

    #[tokio::test]
    async fn test_update_update_of_other_project() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_utils::project("p1", "agua")]])
                .append_query_results([[test_utils::project_update("u1", "p2", None)]]),
        );

        let result = svc
            .update_update("agua", "u1", UpdateUpdateInput::default())
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_update_rejects_negative_people() {
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres));
        let input: UpdateUpdateInput =
            serde_json::from_value(serde_json::json!({ "people_impacted": -3 })).unwrap();

        let result = svc.update_update("agua", "u1", input).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_update_milestone_of_other_project() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_utils::project("p1", "agua")]])
                .append_query_results([[test_utils::milestone(
                    "m1",
                    "p2",
                    MilestoneStatus::Pending,
                )]]),
        );

        let result = svc
            .update_milestone("agua", "m1", UpdateMilestoneInput::default())
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_hides_private_projects() {
        let mut private = test_utils::project("p2", "interno");
        private.is_public = false;
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![test_utils::project("p1", "agua"), private]]),
        );

        let listed = svc.list(None, false).await.unwrap();

        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].slug, "agua");
    }
}
