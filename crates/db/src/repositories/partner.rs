//! Partner repository.

use std::sync::Arc;

use crate::entities::{
    Partner, PartnerMessage, PartnerProjectAssignment, partner, partner::PartnerStatus,
    partner_message, partner_project_assignment,
};
use mozsolidaria_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder,
};

/// Partner repository for database operations.
#[derive(Clone)]
pub struct PartnerRepository {
    db: Arc<DatabaseConnection>,
}

impl PartnerRepository {
    /// Create a new partner repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a partner by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<partner::Model>> {
        Partner::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the partner organisation a user signs in for.
    pub async fn find_by_user_id(&self, user_id: &str) -> AppResult<Option<partner::Model>> {
        Partner::find()
            .filter(partner::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count partners, optionally in one state.
    pub async fn count(&self, status: Option<PartnerStatus>) -> AppResult<u64> {
        let mut query = Partner::find();
        if let Some(status) = status {
            query = query.filter(partner::Column::Status.eq(status));
        }

        query
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Store a message.
    pub async fn create_message(
        &self,
        model: partner_message::ActiveModel,
    ) -> AppResult<partner_message::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Messages exchanged with a partner, newest first.
    pub async fn find_messages(&self, partner_id: &str) -> AppResult<Vec<partner_message::Model>> {
        PartnerMessage::find()
            .filter(partner_message::Column::PartnerId.eq(partner_id))
            .order_by_desc(partner_message::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Store a project assignment.
    pub async fn create_assignment(
        &self,
        model: partner_project_assignment::ActiveModel,
    ) -> AppResult<partner_project_assignment::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Assignments of a partner.
    pub async fn find_assignments(
        &self,
        partner_id: &str,
    ) -> AppResult<Vec<partner_project_assignment::Model>> {
        PartnerProjectAssignment::find()
            .filter(partner_project_assignment::Column::PartnerId.eq(partner_id))
            .order_by_desc(partner_project_assignment::Column::AssignedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_utils;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_find_by_id_missing() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<partner::Model>::new()])
                .into_connection(),
        );

        let repo = PartnerRepository::new(db);

        assert!(repo.find_by_id("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_count_all() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_utils::count_row(5)]])
                .into_connection(),
        );

        let repo = PartnerRepository::new(db);

        assert_eq!(repo.count(None).await.unwrap(), 5);
    }
}
