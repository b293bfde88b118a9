//! Permission group provisioning.
//!
//! The group to permission mapping is a compiled-in, versioned table. Syncing
//! converges the database onto it: missing groups are created, missing codes
//! granted and stale codes revoked, so repeated runs are idempotent.

use std::collections::BTreeSet;

use mozsolidaria_common::{AppError, AppResult};
use mozsolidaria_db::{
    entities::user,
    repositories::{PermissionRepository, UserRepository},
};
use serde::Serialize;
use tracing::{info, warn};

/// Bumped whenever [`PERMISSION_TABLE`] changes.
pub const PERMISSION_TABLE_VERSION: u32 = 1;

/// Permission code required to read platform statistics.
pub const VIEW_REPORTS: &str = "view_reports";

/// Permission code required to generate exports.
pub const EXPORT_REPORTS: &str = "export_reports";

/// A configured group and the exact codes it must hold.
#[derive(Debug, Clone, Copy)]
pub struct GroupSpec {
    pub name: &'static str,
    pub permissions: &'static [&'static str],
}

/// The configured group table.
pub static PERMISSION_TABLE: &[GroupSpec] = &[
    GroupSpec {
        name: "Administrators",
        permissions: &[
            "add_project",
            "change_project",
            "delete_project",
            "view_project",
            "add_projectupdate",
            "change_projectupdate",
            "delete_projectupdate",
            "view_projectupdate",
            "add_projectmilestone",
            "change_projectmilestone",
            "delete_projectmilestone",
            "view_projectmilestone",
            "view_projectmetrics",
            "add_donation",
            "change_donation",
            "delete_donation",
            "view_donation",
            "add_donationmethod",
            "change_donationmethod",
            "delete_donationmethod",
            "view_donationmethod",
            "add_volunteerprofile",
            "change_volunteerprofile",
            "delete_volunteerprofile",
            "view_volunteerprofile",
            "add_beneficiaryprofile",
            "change_beneficiaryprofile",
            "delete_beneficiaryprofile",
            "view_beneficiaryprofile",
            "add_partner",
            "change_partner",
            "delete_partner",
            "view_partner",
            "add_partnermessage",
            "view_partnermessage",
            "add_partnerprojectassignment",
            "change_partnerprojectassignment",
            "view_partnerprojectassignment",
            "add_notification",
            "view_notification",
            "add_blogpost",
            "change_blogpost",
            "delete_blogpost",
            "view_blogpost",
            "change_comment",
            "delete_comment",
            "view_comment",
            VIEW_REPORTS,
            EXPORT_REPORTS,
        ],
    },
    GroupSpec {
        name: "Project Managers",
        permissions: &[
            "add_project",
            "change_project",
            "view_project",
            "add_projectupdate",
            "change_projectupdate",
            "view_projectupdate",
            "add_projectmilestone",
            "change_projectmilestone",
            "view_projectmilestone",
            "view_projectmetrics",
            "add_partnerprojectassignment",
            "view_partnerprojectassignment",
            VIEW_REPORTS,
            EXPORT_REPORTS,
        ],
    },
    GroupSpec {
        name: "Content Editors",
        permissions: &[
            "add_blogpost",
            "change_blogpost",
            "delete_blogpost",
            "view_blogpost",
            "change_comment",
            "delete_comment",
            "view_comment",
        ],
    },
    GroupSpec {
        name: "Community Managers",
        permissions: &[
            "add_volunteerprofile",
            "change_volunteerprofile",
            "view_volunteerprofile",
            "add_beneficiaryprofile",
            "change_beneficiaryprofile",
            "view_beneficiaryprofile",
            "view_partner",
            "add_partnermessage",
            "view_partnermessage",
            "add_notification",
            VIEW_REPORTS,
        ],
    },
    GroupSpec {
        name: "Financial Managers",
        permissions: &[
            "add_donation",
            "change_donation",
            "view_donation",
            "add_donationmethod",
            "change_donationmethod",
            "view_donationmethod",
            VIEW_REPORTS,
            EXPORT_REPORTS,
        ],
    },
    GroupSpec {
        name: "Viewers",
        permissions: &[
            "view_project",
            "view_projectmetrics",
            "view_donation",
            "view_volunteerprofile",
            "view_beneficiaryprofile",
            "view_blogpost",
            VIEW_REPORTS,
        ],
    },
];

/// Codes to grant and revoke to bring a group onto its configured set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionDiff {
    pub to_add: Vec<String>,
    pub to_remove: Vec<String>,
}

impl PermissionDiff {
    /// Compare the stored codes with the configured ones.
    #[must_use]
    pub fn between(current: &[String], desired: &[&str]) -> Self {
        let current: BTreeSet<&str> = current.iter().map(String::as_str).collect();
        let desired: BTreeSet<&str> = desired.iter().copied().collect();

        Self {
            to_add: desired
                .difference(&current)
                .map(ToString::to_string)
                .collect(),
            to_remove: current
                .difference(&desired)
                .map(ToString::to_string)
                .collect(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// What a sync changed for one group.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSyncReport {
    pub name: String,
    pub created: bool,
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub permission_count: usize,
}

/// Outcome of a full provisioning run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub table_version: u32,
    pub groups: Vec<GroupSyncReport>,
    /// Groups removed because `reset` was requested and they are not configured.
    pub deleted_groups: Vec<String>,
}

/// A configured group as listed by `--list-groups`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSummary {
    pub name: String,
    pub permission_count: usize,
}

/// Result of adding a user to a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    Added,
    AlreadyMember,
}

fn summarize(table: &[GroupSpec]) -> Vec<GroupSummary> {
    table
        .iter()
        .map(|spec| GroupSummary {
            name: spec.name.to_string(),
            permission_count: spec.permissions.len(),
        })
        .collect()
}

/// Service that provisions permission groups and memberships.
#[derive(Clone)]
pub struct PermissionService {
    permission_repo: PermissionRepository,
    user_repo: UserRepository,
    table: &'static [GroupSpec],
}

impl PermissionService {
    /// Create a provisioner over [`PERMISSION_TABLE`].
    #[must_use]
    pub const fn new(permission_repo: PermissionRepository, user_repo: UserRepository) -> Self {
        Self::with_table(permission_repo, user_repo, PERMISSION_TABLE)
    }

    /// Create a provisioner over a custom table.
    #[must_use]
    pub const fn with_table(
        permission_repo: PermissionRepository,
        user_repo: UserRepository,
        table: &'static [GroupSpec],
    ) -> Self {
        Self {
            permission_repo,
            user_repo,
            table,
        }
    }

    /// Look up a configured group.
    #[must_use]
    pub fn group_spec(&self, name: &str) -> Option<&'static GroupSpec> {
        self.table.iter().find(|spec| spec.name == name)
    }

    /// Configured groups with their permission counts.
    #[must_use]
    pub fn list_groups(&self) -> Vec<GroupSummary> {
        summarize(self.table)
    }

    /// Groups of [`PERMISSION_TABLE`], without a database connection.
    #[must_use]
    pub fn configured_groups() -> Vec<GroupSummary> {
        summarize(PERMISSION_TABLE)
    }

    /// Converge every configured group onto its permission set.
    ///
    /// With `reset`, groups stored in the database but missing from the table
    /// are deleted afterwards.
    pub async fn create_groups_and_assign_permissions(&self, reset: bool) -> AppResult<SyncReport> {
        let mut groups = Vec::with_capacity(self.table.len());

        for spec in self.table {
            groups.push(self.sync_group(spec).await?);
        }

        let mut deleted_groups = Vec::new();
        if reset {
            for stored in self.permission_repo.find_all_groups().await? {
                if self.group_spec(&stored.name).is_none() {
                    self.permission_repo.delete_group(&stored.id).await?;
                    warn!(group = %stored.name, "Deleted unconfigured group");
                    deleted_groups.push(stored.name);
                }
            }
        }

        info!(
            version = PERMISSION_TABLE_VERSION,
            groups = groups.len(),
            deleted = deleted_groups.len(),
            "Permission groups synchronised"
        );

        Ok(SyncReport {
            table_version: PERMISSION_TABLE_VERSION,
            groups,
            deleted_groups,
        })
    }

    async fn sync_group(&self, spec: &GroupSpec) -> AppResult<GroupSyncReport> {
        let (group, created) = match self.permission_repo.find_group_by_name(spec.name).await? {
            Some(group) => (group, false),
            None => (self.permission_repo.create_group(spec.name).await?, true),
        };

        let current = self.permission_repo.find_codenames(&group.id).await?;
        let diff = PermissionDiff::between(&current, spec.permissions);

        if !diff.is_empty() {
            self.permission_repo
                .add_codenames(&group.id, &diff.to_add)
                .await?;
            self.permission_repo
                .remove_codenames(&group.id, &diff.to_remove)
                .await?;
        }

        info!(
            group = %spec.name,
            created,
            added = diff.to_add.len(),
            removed = diff.to_remove.len(),
            "Group synchronised"
        );

        Ok(GroupSyncReport {
            name: spec.name.to_string(),
            created,
            added: diff.to_add,
            removed: diff.to_remove,
            permission_count: spec.permissions.len(),
        })
    }

    /// Add a user to a configured group. Existing membership is a no-op.
    pub async fn assign_user_to_group(
        &self,
        username: &str,
        group_name: &str,
    ) -> AppResult<Membership> {
        let spec = self
            .group_spec(group_name)
            .ok_or_else(|| AppError::GroupNotFound(group_name.to_string()))?;

        let user = self
            .user_repo
            .find_by_username(username)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {username}")))?;

        let group = self
            .permission_repo
            .find_group_by_name(spec.name)
            .await?
            .ok_or_else(|| {
                AppError::GroupNotFound(format!("{} (run setup-permissions first)", spec.name))
            })?;

        if self.permission_repo.is_member(&user.id, &group.id).await? {
            return Ok(Membership::AlreadyMember);
        }

        self.permission_repo.add_member(&user.id, &group.id).await?;
        info!(user = %username, group = %spec.name, "User added to group");

        Ok(Membership::Added)
    }

    /// Whether the user holds a permission code.
    pub async fn user_has_permission(&self, user: &user::Model, codename: &str) -> AppResult<bool> {
        if !user.is_active {
            return Ok(false);
        }
        if user.is_superuser {
            return Ok(true);
        }

        self.permission_repo
            .user_has_codename(&user.id, codename)
            .await
    }

    /// Fail with `Forbidden` unless the user holds the code.
    pub async fn require_permission(&self, user: &user::Model, codename: &str) -> AppResult<()> {
        if self.user_has_permission(user, codename).await? {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!("missing permission {codename}")))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use mozsolidaria_db::test_utils;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    static FIXTURE_TABLE: &[GroupSpec] = &[GroupSpec {
        name: "Editors",
        permissions: &["add_blogpost", "change_blogpost", "view_blogpost"],
    }];

    fn service(db: MockDatabase) -> PermissionService {
        let conn = Arc::new(db.into_connection());
        PermissionService::with_table(
            PermissionRepository::new(conn.clone()),
            UserRepository::new(conn),
            FIXTURE_TABLE,
        )
    }

    fn codes(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_table_has_unique_names_and_codes() {
        let names: BTreeSet<_> = PERMISSION_TABLE.iter().map(|g| g.name).collect();
        assert_eq!(names.len(), PERMISSION_TABLE.len());

        for spec in PERMISSION_TABLE {
            let unique: BTreeSet<_> = spec.permissions.iter().collect();
            assert_eq!(unique.len(), spec.permissions.len(), "{}", spec.name);
        }
    }

    #[test]
    fn test_report_codes_are_granted() {
        let admin = PERMISSION_TABLE
            .iter()
            .find(|g| g.name == "Administrators")
            .unwrap();
        assert!(admin.permissions.contains(&VIEW_REPORTS));
        assert!(admin.permissions.contains(&EXPORT_REPORTS));
    }

    #[test]
    fn test_diff_adds_and_removes() {
        let current = codes(&["view_blogpost", "delete_project"]);
        let diff = PermissionDiff::between(&current, &["add_blogpost", "view_blogpost"]);

        assert_eq!(diff.to_add, vec!["add_blogpost"]);
        assert_eq!(diff.to_remove, vec!["delete_project"]);
    }

    #[test]
    fn test_diff_converges() {
        // Manually altered state: one stale code, one missing code.
        let desired = ["add_blogpost", "change_blogpost", "view_blogpost"];
        let altered = codes(&["add_blogpost", "view_blogpost", "delete_donation"]);

        let diff = PermissionDiff::between(&altered, &desired);
        let mut applied: BTreeSet<String> = altered.into_iter().collect();
        for code in &diff.to_remove {
            applied.remove(code);
        }
        applied.extend(diff.to_add.iter().cloned());

        let expected: BTreeSet<String> = desired.iter().map(ToString::to_string).collect();
        assert_eq!(applied, expected);

        let converged: Vec<String> = applied.into_iter().collect();
        assert!(PermissionDiff::between(&converged, &desired).is_empty());
    }

    #[test]
    fn test_list_groups() {
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres));

        assert_eq!(
            svc.list_groups(),
            vec![GroupSummary {
                name: "Editors".into(),
                permission_count: 3
            }]
        );
    }

    #[tokio::test]
    async fn test_sync_creates_group_and_grants_codes() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<mozsolidaria_db::entities::permission_group::Model>::new()])
                .append_query_results([[test_utils::group("g1", "Editors")]])
                .append_query_results([Vec::<mozsolidaria_db::entities::group_permission::Model>::new()])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 3,
                }]),
        );

        let report = svc.create_groups_and_assign_permissions(false).await.unwrap();

        assert_eq!(report.table_version, PERMISSION_TABLE_VERSION);
        assert!(report.groups[0].created);
        assert_eq!(report.groups[0].added.len(), 3);
        assert!(report.groups[0].removed.is_empty());
    }

    #[tokio::test]
    async fn test_sync_removes_stale_codes() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_utils::group("g1", "Editors")]])
                .append_query_results([[
                    test_utils::group_permission("p1", "g1", "add_blogpost"),
                    test_utils::group_permission("p2", "g1", "change_blogpost"),
                    test_utils::group_permission("p3", "g1", "view_blogpost"),
                    test_utils::group_permission("p4", "g1", "delete_donation"),
                ]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }]),
        );

        let report = svc.create_groups_and_assign_permissions(false).await.unwrap();

        assert!(!report.groups[0].created);
        assert!(report.groups[0].added.is_empty());
        assert_eq!(report.groups[0].removed, vec!["delete_donation"]);
    }

    #[tokio::test]
    async fn test_sync_already_converged_writes_nothing() {
        // No exec results queued: any write would fail the run.
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_utils::group("g1", "Editors")]])
                .append_query_results([[
                    test_utils::group_permission("p1", "g1", "add_blogpost"),
                    test_utils::group_permission("p2", "g1", "change_blogpost"),
                    test_utils::group_permission("p3", "g1", "view_blogpost"),
                ]]),
        );

        let report = svc.create_groups_and_assign_permissions(false).await.unwrap();

        assert!(report.groups[0].added.is_empty());
        assert!(report.groups[0].removed.is_empty());
    }

    #[tokio::test]
    async fn test_sync_reset_deletes_unconfigured_groups() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_utils::group("g1", "Editors")]])
                .append_query_results([[
                    test_utils::group_permission("p1", "g1", "add_blogpost"),
                    test_utils::group_permission("p2", "g1", "change_blogpost"),
                    test_utils::group_permission("p3", "g1", "view_blogpost"),
                ]])
                .append_query_results([[
                    test_utils::group("g1", "Editors"),
                    test_utils::group("g9", "Legacy"),
                ]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }]),
        );

        let report = svc.create_groups_and_assign_permissions(true).await.unwrap();

        assert_eq!(report.deleted_groups, vec!["Legacy"]);
    }

    #[tokio::test]
    async fn test_assign_unknown_group_fails_without_queries() {
        // Empty mock: touching the database would surface a Database error.
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres));

        let result = svc.assign_user_to_group("joana", "NonexistentGroup").await;

        assert!(matches!(result, Err(AppError::GroupNotFound(_))));
    }

    #[tokio::test]
    async fn test_assign_existing_member_is_noop() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_utils::user("u1", "joana")]])
                .append_query_results([[test_utils::group("g1", "Editors")]])
                .append_query_results([[test_utils::count_row(1)]]),
        );

        let outcome = svc.assign_user_to_group("joana", "Editors").await.unwrap();

        assert_eq!(outcome, Membership::AlreadyMember);
    }

    #[tokio::test]
    async fn test_assign_adds_membership() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_utils::user("u1", "joana")]])
                .append_query_results([[test_utils::group("g1", "Editors")]])
                .append_query_results([[test_utils::count_row(0)]])
                .append_query_results([[test_utils::membership("m1", "u1", "g1")]]),
        );

        let outcome = svc.assign_user_to_group("joana", "Editors").await.unwrap();

        assert_eq!(outcome, Membership::Added);
    }

    #[tokio::test]
    async fn test_assign_unknown_user() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()]),
        );

        let result = svc.assign_user_to_group("ghost", "Editors").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_superuser_has_every_permission() {
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres));
        let mut admin = test_utils::user("u1", "root");
        admin.is_superuser = true;

        assert!(svc.user_has_permission(&admin, EXPORT_REPORTS).await.unwrap());
    }

    #[tokio::test]
    async fn test_require_permission_forbidden() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<mozsolidaria_db::entities::user_group::Model>::new()]),
        );
        let user = test_utils::user("u1", "joana");

        let result = svc.require_permission(&user, VIEW_REPORTS).await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }
}
