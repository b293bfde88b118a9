//! Volunteer repository.

use std::sync::Arc;

use super::TimeWindow;
use crate::entities::{
    Skill, VolunteerProfile, VolunteerSkill, skill, volunteer_profile,
    volunteer_profile::VolunteerStatus, volunteer_skill,
};
use mozsolidaria_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder,
};

/// Volunteer repository for database operations.
#[derive(Clone)]
pub struct VolunteerRepository {
    db: Arc<DatabaseConnection>,
}

impl VolunteerRepository {
    /// Create a new volunteer repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a volunteer by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<volunteer_profile::Model>> {
        VolunteerProfile::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the volunteer profile of a user.
    pub async fn find_by_user_id(
        &self,
        user_id: &str,
    ) -> AppResult<Option<volunteer_profile::Model>> {
        VolunteerProfile::find()
            .filter(volunteer_profile::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Volunteers, newest first.
    pub async fn find_filtered(
        &self,
        status: Option<VolunteerStatus>,
        window: TimeWindow,
    ) -> AppResult<Vec<volunteer_profile::Model>> {
        let mut query = VolunteerProfile::find().order_by_desc(volunteer_profile::Column::CreatedAt);

        if let Some(status) = status {
            query = query.filter(volunteer_profile::Column::Status.eq(status));
        }

        window
            .apply(query, volunteer_profile::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count volunteers, optionally in one state.
    pub async fn count(&self, status: Option<VolunteerStatus>) -> AppResult<u64> {
        let mut query = VolunteerProfile::find();
        if let Some(status) = status {
            query = query.filter(volunteer_profile::Column::Status.eq(status));
        }

        query
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count volunteers registered in the window.
    pub async fn count_registered(&self, window: TimeWindow) -> AppResult<u64> {
        window
            .apply(VolunteerProfile::find(), volunteer_profile::Column::CreatedAt)
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a volunteer profile.
    pub async fn create(
        &self,
        model: volunteer_profile::ActiveModel,
    ) -> AppResult<volunteer_profile::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Skill links of the given volunteers.
    pub async fn find_skill_links(
        &self,
        volunteer_ids: &[String],
    ) -> AppResult<Vec<volunteer_skill::Model>> {
        if volunteer_ids.is_empty() {
            return Ok(vec![]);
        }

        VolunteerSkill::find()
            .filter(volunteer_skill::Column::VolunteerId.is_in(volunteer_ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Skills by IDs.
    pub async fn find_skills_by_ids(&self, ids: &[String]) -> AppResult<Vec<skill::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        Skill::find()
            .filter(skill::Column::Id.is_in(ids.to_vec()))
            .order_by_asc(skill::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Link skills to a volunteer.
    pub async fn add_skills(
        &self,
        links: Vec<volunteer_skill::ActiveModel>,
    ) -> AppResult<()> {
        if links.is_empty() {
            return Ok(());
        }

        VolunteerSkill::insert_many(links)
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_utils;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_count_active() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_utils::count_row(12)]])
                .into_connection(),
        );

        let repo = VolunteerRepository::new(db);

        assert_eq!(repo.count(Some(VolunteerStatus::Active)).await.unwrap(), 12);
    }

    #[tokio::test]
    async fn test_find_filtered() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_utils::volunteer("v1", "Carlos Nhantumbo")]])
                .into_connection(),
        );

        let repo = VolunteerRepository::new(db);
        let volunteers = repo.find_filtered(None, TimeWindow::ALL).await.unwrap();

        assert_eq!(volunteers[0].full_name, "Carlos Nhantumbo");
    }

    #[tokio::test]
    async fn test_skill_links_empty_ids() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = VolunteerRepository::new(db);

        assert!(repo.find_skill_links(&[]).await.unwrap().is_empty());
    }
}
