//! Human-readable output of the management commands.

use std::fmt::Write;

use mozsolidaria_common::{AppError, AppResult};
use mozsolidaria_core::{GroupSummary, Membership, SyncReport};

pub fn format_sync_report(report: &SyncReport) -> String {
    let mut out = format!("Permission table v{}\n", report.table_version);

    for group in &report.groups {
        let state = if group.created { "created" } else { "exists" };
        let _ = writeln!(
            out,
            "  {:<24} {state:<8} {} permissions (+{} -{})",
            group.name,
            group.permission_count,
            group.added.len(),
            group.removed.len()
        );
    }

    for name in &report.deleted_groups {
        let _ = writeln!(out, "  {name:<24} deleted");
    }

    out.push_str("Permission setup complete.\n");
    out
}

pub fn format_group_list(groups: &[GroupSummary]) -> String {
    let mut out = String::from("Available groups:\n");
    for group in groups {
        let _ = writeln!(
            out,
            "  - {} ({} permissions)",
            group.name, group.permission_count
        );
    }
    out
}

/// Message printed for an assignment. Failures are reported, not raised.
pub fn format_assignment(
    outcome: &AppResult<Membership>,
    username: &str,
    group: &str,
    groups: &[GroupSummary],
) -> String {
    match outcome {
        Ok(Membership::Added) => format!("✓ User '{username}' added to group '{group}'.\n"),
        Ok(Membership::AlreadyMember) => {
            format!("User '{username}' is already in group '{group}'.\n")
        }
        Err(AppError::GroupNotFound(_)) => format!(
            "✗ Group '{group}' not found.\n{}",
            format_group_list(groups)
        ),
        Err(AppError::NotFound(_)) => format!("✗ User '{username}' not found.\n"),
        Err(e) => format!("✗ Could not assign '{username}' to '{group}': {e}\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mozsolidaria_core::permission::GroupSyncReport;

    fn groups() -> Vec<GroupSummary> {
        vec![
            GroupSummary {
                name: "Administrators".to_string(),
                permission_count: 20,
            },
            GroupSummary {
                name: "Volunteers".to_string(),
                permission_count: 3,
            },
        ]
    }

    #[test]
    fn test_sync_report_lists_every_group() {
        let report = SyncReport {
            table_version: 1,
            groups: vec![GroupSyncReport {
                name: "Volunteers".to_string(),
                created: true,
                added: vec!["view_project".to_string()],
                removed: Vec::new(),
                permission_count: 1,
            }],
            deleted_groups: vec!["Legacy".to_string()],
        };

        let out = format_sync_report(&report);

        assert!(out.starts_with("Permission table v1\n"));
        assert!(out.contains("Volunteers"));
        assert!(out.contains("created"));
        assert!(out.contains("(+1 -0)"));
        assert!(out.contains("Legacy"));
        assert!(out.ends_with("Permission setup complete.\n"));
    }

    #[test]
    fn test_group_list() {
        let out = format_group_list(&groups());

        assert_eq!(
            out,
            "Available groups:\n  - Administrators (20 permissions)\n  - Volunteers (3 permissions)\n"
        );
    }

    #[test]
    fn test_unknown_group_shows_available_groups() {
        let outcome = Err(AppError::GroupNotFound("Ghosts".to_string()));

        let out = format_assignment(&outcome, "maria", "Ghosts", &groups());

        assert!(out.starts_with("✗ Group 'Ghosts' not found."));
        assert!(out.contains("Administrators"));
    }

    #[test]
    fn test_assignment_messages() {
        assert_eq!(
            format_assignment(&Ok(Membership::Added), "maria", "Volunteers", &groups()),
            "✓ User 'maria' added to group 'Volunteers'.\n"
        );
        assert!(
            format_assignment(&Ok(Membership::AlreadyMember), "maria", "Volunteers", &groups())
                .contains("already")
        );
        assert_eq!(
            format_assignment(
                &Err(AppError::NotFound("user ghost".to_string())),
                "ghost",
                "Volunteers",
                &groups()
            ),
            "✗ User 'ghost' not found.\n"
        );
    }
}
