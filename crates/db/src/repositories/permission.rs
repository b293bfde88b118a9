//! Permission group repository.

use std::sync::Arc;

use crate::entities::{
    GroupPermission, PermissionGroup, UserGroup, group_permission, permission_group, user_group,
};
use mozsolidaria_common::{AppError, AppResult, IdGenerator};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};

/// Repository for permission groups, their codes and user memberships.
#[derive(Clone)]
pub struct PermissionRepository {
    db: Arc<DatabaseConnection>,
    id_gen: IdGenerator,
}

impl PermissionRepository {
    /// Create a new permission repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            db,
            id_gen: IdGenerator::new(),
        }
    }

    /// Find a group by its unique name.
    pub async fn find_group_by_name(
        &self,
        name: &str,
    ) -> AppResult<Option<permission_group::Model>> {
        PermissionGroup::find()
            .filter(permission_group::Column::Name.eq(name))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All groups stored in the database, by name.
    pub async fn find_all_groups(&self) -> AppResult<Vec<permission_group::Model>> {
        PermissionGroup::find()
            .order_by_asc(permission_group::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a group row.
    pub async fn create_group(&self, name: &str) -> AppResult<permission_group::Model> {
        let model = permission_group::ActiveModel {
            id: Set(self.id_gen.generate()),
            name: Set(name.to_string()),
            created_at: Set(chrono::Utc::now().into()),
        };

        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a group. Codes and memberships cascade.
    pub async fn delete_group(&self, group_id: &str) -> AppResult<()> {
        PermissionGroup::delete_by_id(group_id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Permission codes currently granted to a group.
    pub async fn find_codenames(&self, group_id: &str) -> AppResult<Vec<String>> {
        let rows = GroupPermission::find()
            .filter(group_permission::Column::GroupId.eq(group_id))
            .order_by_asc(group_permission::Column::Codename)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(|p| p.codename).collect())
    }

    /// Grant codes to a group.
    pub async fn add_codenames(&self, group_id: &str, codenames: &[String]) -> AppResult<()> {
        if codenames.is_empty() {
            return Ok(());
        }

        let models = codenames.iter().map(|code| group_permission::ActiveModel {
            id: Set(self.id_gen.generate()),
            group_id: Set(group_id.to_string()),
            codename: Set(code.clone()),
        });

        GroupPermission::insert_many(models)
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Revoke codes from a group.
    pub async fn remove_codenames(&self, group_id: &str, codenames: &[String]) -> AppResult<u64> {
        if codenames.is_empty() {
            return Ok(0);
        }

        let result = GroupPermission::delete_many()
            .filter(group_permission::Column::GroupId.eq(group_id))
            .filter(group_permission::Column::Codename.is_in(codenames.to_vec()))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Whether the user already belongs to the group.
    pub async fn is_member(&self, user_id: &str, group_id: &str) -> AppResult<bool> {
        let count = UserGroup::find()
            .filter(user_group::Column::UserId.eq(user_id))
            .filter(user_group::Column::GroupId.eq(group_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(count > 0)
    }

    /// Add a membership row.
    pub async fn add_member(&self, user_id: &str, group_id: &str) -> AppResult<user_group::Model> {
        let model = user_group::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            group_id: Set(group_id.to_string()),
            created_at: Set(chrono::Utc::now().into()),
        };

        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Whether any of the user's groups grants `codename`.
    pub async fn user_has_codename(&self, user_id: &str, codename: &str) -> AppResult<bool> {
        let group_ids: Vec<String> = UserGroup::find()
            .filter(user_group::Column::UserId.eq(user_id))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .into_iter()
            .map(|m| m.group_id)
            .collect();

        if group_ids.is_empty() {
            return Ok(false);
        }

        let count = GroupPermission::find()
            .filter(group_permission::Column::GroupId.is_in(group_ids))
            .filter(group_permission::Column::Codename.eq(codename))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(count > 0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_utils;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    #[tokio::test]
    async fn test_find_codenames() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    test_utils::group_permission("p1", "g1", "add_project"),
                    test_utils::group_permission("p2", "g1", "view_project"),
                ]])
                .into_connection(),
        );

        let repo = PermissionRepository::new(db);
        let codes = repo.find_codenames("g1").await.unwrap();

        assert_eq!(codes, vec!["add_project", "view_project"]);
    }

    #[tokio::test]
    async fn test_remove_codenames_empty_is_noop() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = PermissionRepository::new(db);

        assert_eq!(repo.remove_codenames("g1", &[]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_remove_codenames_reports_rows() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 2,
                }])
                .into_connection(),
        );

        let repo = PermissionRepository::new(db);
        let removed = repo
            .remove_codenames("g1", &["delete_project".into(), "delete_donation".into()])
            .await
            .unwrap();

        assert_eq!(removed, 2);
    }

    #[tokio::test]
    async fn test_user_without_groups_has_no_codename() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user_group::Model>::new()])
                .into_connection(),
        );

        let repo = PermissionRepository::new(db);

        assert!(!repo.user_has_codename("u1", "view_reports").await.unwrap());
    }

    #[tokio::test]
    async fn test_user_has_codename_through_group() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_utils::membership("m1", "u1", "g1")]])
                .append_query_results([[test_utils::count_row(1)]])
                .into_connection(),
        );

        let repo = PermissionRepository::new(db);

        assert!(repo.user_has_codename("u1", "view_reports").await.unwrap());
    }
}
