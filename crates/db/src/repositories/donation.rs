//! Donation repository.

use std::sync::Arc;

use super::TimeWindow;
use crate::entities::{
    Donation, DonationMethod, donation, donation::DonationStatus, donation_method,
};
use mozsolidaria_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};

/// Filter for donation listings and exports.
#[derive(Debug, Clone, Default)]
pub struct DonationFilter {
    /// Only donations in this state.
    pub status: Option<DonationStatus>,
    /// Only donations made in this window.
    pub window: TimeWindow,
    /// Only donations linked to this project.
    pub project_id: Option<String>,
}

/// Donation repository for database operations.
#[derive(Clone)]
pub struct DonationRepository {
    db: Arc<DatabaseConnection>,
}

impl DonationRepository {
    /// Create a new donation repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    // === Methods ===

    /// Methods offered on donation forms.
    pub async fn find_active_methods(&self) -> AppResult<Vec<donation_method::Model>> {
        DonationMethod::find()
            .filter(donation_method::Column::IsActive.eq(true))
            .order_by_asc(donation_method::Column::DisplayOrder)
            .order_by_asc(donation_method::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a donation method by ID.
    pub async fn find_method_by_id(&self, id: &str) -> AppResult<Option<donation_method::Model>> {
        DonationMethod::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Donation methods by IDs.
    pub async fn find_methods_by_ids(
        &self,
        ids: &[String],
    ) -> AppResult<Vec<donation_method::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        DonationMethod::find()
            .filter(donation_method::Column::Id.is_in(ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // === Donations ===

    /// Find a donation by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<donation::Model>> {
        Donation::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Donations matching the filter, newest first.
    pub async fn find_filtered(&self, filter: &DonationFilter) -> AppResult<Vec<donation::Model>> {
        let mut query = Donation::find().order_by_desc(donation::Column::CreatedAt);

        if let Some(status) = filter.status {
            query = query.filter(donation::Column::Status.eq(status));
        }
        if let Some(project_id) = &filter.project_id {
            query = query.filter(donation::Column::ProjectId.eq(project_id.as_str()));
        }

        filter
            .window
            .apply(query, donation::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Completed donations made in the window.
    pub async fn find_completed(&self, window: TimeWindow) -> AppResult<Vec<donation::Model>> {
        self.find_filtered(&DonationFilter {
            status: Some(DonationStatus::Completed),
            window,
            project_id: None,
        })
        .await
    }

    /// Create a new donation.
    pub async fn create(&self, model: donation::ActiveModel) -> AppResult<donation::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a donation.
    pub async fn update(&self, model: donation::ActiveModel) -> AppResult<donation::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_utils;
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase};

    #[tokio::test]
    async fn test_find_active_methods() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    test_utils::donation_method("m1", "M-Pesa"),
                    test_utils::donation_method("m2", "Transferência bancária"),
                ]])
                .into_connection(),
        );

        let repo = DonationRepository::new(db);
        let methods = repo.find_active_methods().await.unwrap();

        assert_eq!(methods.len(), 2);
        assert_eq!(methods[0].name, "M-Pesa");
    }

    #[tokio::test]
    async fn test_find_completed_maps_db_error() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_errors([DbErr::Custom("connection reset".into())])
                .into_connection(),
        );

        let repo = DonationRepository::new(db);
        let result = repo.find_completed(TimeWindow::ALL).await;

        assert!(matches!(result, Err(AppError::Database(_))));
    }
}
