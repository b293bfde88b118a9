//! Project repository.
//!
//! Covers projects and the records hanging off them: updates, milestones,
//! the cached metrics row, programs and categories.

use std::sync::Arc;

use super::TimeWindow;
use crate::entities::{
    Program, Project, ProjectCategory, ProjectMetrics, ProjectMilestone, ProjectUpdate, program,
    project, project_category, project_metrics, project_milestone,
    project_milestone::MilestoneStatus, project_update, project_update::UpdateStatus,
};
use mozsolidaria_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder,
};

/// Project repository for database operations.
#[derive(Clone)]
pub struct ProjectRepository {
    db: Arc<DatabaseConnection>,
}

impl ProjectRepository {
    /// Create a new project repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    // === Projects ===

    /// Find a project by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<project::Model>> {
        Project::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a project by slug.
    pub async fn find_by_slug(&self, slug: &str) -> AppResult<Option<project::Model>> {
        Project::find()
            .filter(project::Column::Slug.eq(slug))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a project by slug, returning an error if not found.
    pub async fn get_by_slug(&self, slug: &str) -> AppResult<project::Model> {
        self.find_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("project {slug}")))
    }

    /// Find projects by IDs.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<project::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        Project::find()
            .filter(project::Column::Id.is_in(ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Projects, newest first, optionally filtered by status and creation time.
    pub async fn find_filtered(
        &self,
        status: Option<project::ProjectStatus>,
        window: TimeWindow,
    ) -> AppResult<Vec<project::Model>> {
        let mut query = Project::find().order_by_desc(project::Column::CreatedAt);

        if let Some(status) = status {
            query = query.filter(project::Column::Status.eq(status));
        }

        window
            .apply(query, project::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Every project, for platform-wide statistics.
    pub async fn find_all(&self) -> AppResult<Vec<project::Model>> {
        self.find_filtered(None, TimeWindow::ALL).await
    }

    /// Create a new project.
    pub async fn create(&self, model: project::ActiveModel) -> AppResult<project::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a project.
    pub async fn update(&self, model: project::ActiveModel) -> AppResult<project::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a project. Updates, milestones and metrics cascade.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        Project::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // === Classification ===

    /// Find a program by ID.
    pub async fn find_program_by_id(&self, id: &str) -> AppResult<Option<program::Model>> {
        Program::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a category by ID.
    pub async fn find_category_by_id(
        &self,
        id: &str,
    ) -> AppResult<Option<project_category::Model>> {
        ProjectCategory::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Programs by IDs.
    pub async fn find_programs_by_ids(&self, ids: &[String]) -> AppResult<Vec<program::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        Program::find()
            .filter(program::Column::Id.is_in(ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Categories by IDs.
    pub async fn find_categories_by_ids(
        &self,
        ids: &[String],
    ) -> AppResult<Vec<project_category::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        ProjectCategory::find()
            .filter(project_category::Column::Id.is_in(ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // === Updates ===

    /// Updates of a project in creation order.
    pub async fn find_updates(
        &self,
        project_id: &str,
        published_only: bool,
    ) -> AppResult<Vec<project_update::Model>> {
        let mut query = ProjectUpdate::find()
            .filter(project_update::Column::ProjectId.eq(project_id))
            .order_by_asc(project_update::Column::CreatedAt);

        if published_only {
            query = query.filter(project_update::Column::Status.eq(UpdateStatus::Published));
        }

        query
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a project update by ID.
    pub async fn find_update_by_id(&self, id: &str) -> AppResult<Option<project_update::Model>> {
        ProjectUpdate::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a project update.
    pub async fn create_update(
        &self,
        model: project_update::ActiveModel,
    ) -> AppResult<project_update::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a project update.
    pub async fn update_update(
        &self,
        model: project_update::ActiveModel,
    ) -> AppResult<project_update::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // === Milestones ===

    /// Milestones of a project in display order.
    pub async fn find_milestones(
        &self,
        project_id: &str,
    ) -> AppResult<Vec<project_milestone::Model>> {
        ProjectMilestone::find()
            .filter(project_milestone::Column::ProjectId.eq(project_id))
            .order_by_asc(project_milestone::Column::DisplayOrder)
            .order_by_asc(project_milestone::Column::TargetDate)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a milestone by ID.
    pub async fn find_milestone_by_id(
        &self,
        id: &str,
    ) -> AppResult<Option<project_milestone::Model>> {
        ProjectMilestone::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a milestone.
    pub async fn create_milestone(
        &self,
        model: project_milestone::ActiveModel,
    ) -> AppResult<project_milestone::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a milestone.
    pub async fn update_milestone(
        &self,
        model: project_milestone::ActiveModel,
    ) -> AppResult<project_milestone::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Number of milestones across all projects.
    pub async fn count_milestones(&self) -> AppResult<u64> {
        ProjectMilestone::find()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Number of completed milestones across all projects.
    pub async fn count_completed_milestones(&self) -> AppResult<u64> {
        ProjectMilestone::find()
            .filter(project_milestone::Column::Status.eq(MilestoneStatus::Completed))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // === Metrics ===

    /// The cached metrics row of a project.
    pub async fn find_metrics(
        &self,
        project_id: &str,
    ) -> AppResult<Option<project_metrics::Model>> {
        ProjectMetrics::find()
            .filter(project_metrics::Column::ProjectId.eq(project_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Cached metrics of the given projects.
    pub async fn find_metrics_by_project_ids(
        &self,
        project_ids: &[String],
    ) -> AppResult<Vec<project_metrics::Model>> {
        if project_ids.is_empty() {
            return Ok(vec![]);
        }

        ProjectMetrics::find()
            .filter(project_metrics::Column::ProjectId.is_in(project_ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Every cached metrics row.
    pub async fn find_all_metrics(&self) -> AppResult<Vec<project_metrics::Model>> {
        ProjectMetrics::find()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert the metrics row of a project.
    pub async fn create_metrics(
        &self,
        model: project_metrics::ActiveModel,
    ) -> AppResult<project_metrics::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Overwrite the metrics row of a project.
    pub async fn update_metrics(
        &self,
        model: project_metrics::ActiveModel,
    ) -> AppResult<project_metrics::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
