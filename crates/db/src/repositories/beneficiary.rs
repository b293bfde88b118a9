//! Beneficiary repository.

use std::sync::Arc;

use super::TimeWindow;
use crate::entities::{
    BeneficiaryNeed, BeneficiaryProfile, BeneficiaryProject, Need, beneficiary_need,
    beneficiary_profile, beneficiary_profile::BeneficiaryStatus, beneficiary_project, need,
};
use mozsolidaria_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder,
};

/// Beneficiary repository for database operations.
#[derive(Clone)]
pub struct BeneficiaryRepository {
    db: Arc<DatabaseConnection>,
}

impl BeneficiaryRepository {
    /// Create a new beneficiary repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a beneficiary by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<beneficiary_profile::Model>> {
        BeneficiaryProfile::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Beneficiaries, newest first.
    pub async fn find_filtered(
        &self,
        status: Option<BeneficiaryStatus>,
        window: TimeWindow,
    ) -> AppResult<Vec<beneficiary_profile::Model>> {
        let mut query =
            BeneficiaryProfile::find().order_by_desc(beneficiary_profile::Column::CreatedAt);

        if let Some(status) = status {
            query = query.filter(beneficiary_profile::Column::Status.eq(status));
        }

        window
            .apply(query, beneficiary_profile::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count beneficiaries, optionally in one state.
    pub async fn count(&self, status: Option<BeneficiaryStatus>) -> AppResult<u64> {
        let mut query = BeneficiaryProfile::find();
        if let Some(status) = status {
            query = query.filter(beneficiary_profile::Column::Status.eq(status));
        }

        query
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count beneficiaries registered in the window.
    pub async fn count_registered(&self, window: TimeWindow) -> AppResult<u64> {
        window
            .apply(
                BeneficiaryProfile::find(),
                beneficiary_profile::Column::CreatedAt,
            )
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a beneficiary profile.
    pub async fn create(
        &self,
        model: beneficiary_profile::ActiveModel,
    ) -> AppResult<beneficiary_profile::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Need links of the given beneficiaries.
    pub async fn find_need_links(
        &self,
        beneficiary_ids: &[String],
    ) -> AppResult<Vec<beneficiary_need::Model>> {
        if beneficiary_ids.is_empty() {
            return Ok(vec![]);
        }

        BeneficiaryNeed::find()
            .filter(beneficiary_need::Column::BeneficiaryId.is_in(beneficiary_ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Needs by IDs.
    pub async fn find_needs_by_ids(&self, ids: &[String]) -> AppResult<Vec<need::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        Need::find()
            .filter(need::Column::Id.is_in(ids.to_vec()))
            .order_by_asc(need::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Project enrolments of the given beneficiaries.
    pub async fn find_project_links(
        &self,
        beneficiary_ids: &[String],
    ) -> AppResult<Vec<beneficiary_project::Model>> {
        if beneficiary_ids.is_empty() {
            return Ok(vec![]);
        }

        BeneficiaryProject::find()
            .filter(beneficiary_project::Column::BeneficiaryId.is_in(beneficiary_ids.to_vec()))
            .order_by_asc(beneficiary_project::Column::EnrolledAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Link needs to a beneficiary.
    pub async fn add_needs(&self, links: Vec<beneficiary_need::ActiveModel>) -> AppResult<()> {
        if links.is_empty() {
            return Ok(());
        }

        BeneficiaryNeed::insert_many(links)
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
