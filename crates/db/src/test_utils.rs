//! Model fixtures for tests.
//!
//! Builders return fully populated models with neutral defaults so tests only
//! spell out the fields they care about. Pair them with `sea_orm::MockDatabase`
//! (enable the `test-utils` feature outside this crate).

#![allow(missing_docs)]

use std::collections::BTreeMap;

use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use sea_orm::Value;
use sea_orm::prelude::DateTimeWithTimeZone;

use crate::entities::{
    beneficiary_profile::{self, BeneficiaryStatus, VulnerabilityLevel},
    blog_post::{self, PostStatus},
    comment,
    donation::{self, DonationStatus},
    donation_method, group_permission,
    notification::{self, NotificationPriority, NotificationType},
    partner::{self, PartnerStatus},
    permission_group,
    project::{self, ProjectPriority, ProjectStatus},
    project_metrics,
    project_milestone::{self, MilestoneStatus},
    project_update::{self, UpdateStatus, UpdateType},
    user, user_group,
    volunteer_profile::{self, VolunteerStatus},
};

/// Fixed reference instant (2025-06-01T12:00:00Z) so fixtures compare equal.
#[must_use]
pub fn fixed_time() -> DateTimeWithTimeZone {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0)
        .single()
        .unwrap_or_default()
        .fixed_offset()
}

/// Row shape returned by `PaginatorTrait::count` queries.
#[must_use]
pub fn count_row(n: i64) -> BTreeMap<&'static str, Value> {
    BTreeMap::from([("num_items", Value::BigInt(Some(n)))])
}

#[must_use]
pub fn user(id: &str, username: &str) -> user::Model {
    user::Model {
        id: id.to_string(),
        username: username.to_string(),
        email: format!("{username}@mozsolidaria.org"),
        first_name: None,
        last_name: None,
        password_hash: None,
        token: None,
        is_staff: false,
        is_superuser: false,
        is_active: true,
        created_at: fixed_time(),
        last_login: None,
    }
}

#[must_use]
pub fn staff(id: &str, username: &str) -> user::Model {
    user::Model {
        is_staff: true,
        ..user(id, username)
    }
}

#[must_use]
pub fn group(id: &str, name: &str) -> permission_group::Model {
    permission_group::Model {
        id: id.to_string(),
        name: name.to_string(),
        created_at: fixed_time(),
    }
}

#[must_use]
pub fn group_permission(id: &str, group_id: &str, codename: &str) -> group_permission::Model {
    group_permission::Model {
        id: id.to_string(),
        group_id: group_id.to_string(),
        codename: codename.to_string(),
    }
}

#[must_use]
pub fn membership(id: &str, user_id: &str, group_id: &str) -> user_group::Model {
    user_group::Model {
        id: id.to_string(),
        user_id: user_id.to_string(),
        group_id: group_id.to_string(),
        created_at: fixed_time(),
    }
}

#[must_use]
pub fn project(id: &str, slug: &str) -> project::Model {
    project::Model {
        id: id.to_string(),
        name: slug.replace('-', " "),
        slug: slug.to_string(),
        short_description: None,
        description: None,
        status: ProjectStatus::Active,
        priority: ProjectPriority::Medium,
        program_id: None,
        category_id: None,
        location: None,
        budget: Decimal::ZERO,
        target_beneficiaries: 0,
        start_date: None,
        end_date: None,
        is_featured: false,
        is_public: true,
        created_at: fixed_time(),
        updated_at: None,
    }
}

#[must_use]
pub fn project_update(id: &str, project_id: &str, progress: Option<i32>) -> project_update::Model {
    project_update::Model {
        id: id.to_string(),
        project_id: project_id.to_string(),
        author_id: None,
        title: format!("Update {id}"),
        description: String::new(),
        update_type: UpdateType::Progress,
        status: UpdateStatus::Published,
        people_impacted: None,
        budget_spent: None,
        progress_percentage: progress,
        created_at: fixed_time(),
    }
}

#[must_use]
pub fn milestone(id: &str, project_id: &str, status: MilestoneStatus) -> project_milestone::Model {
    project_milestone::Model {
        id: id.to_string(),
        project_id: project_id.to_string(),
        title: format!("Milestone {id}"),
        description: None,
        target_date: NaiveDate::from_ymd_opt(2025, 12, 31).unwrap_or_default(),
        completed_date: None,
        status,
        progress: 0,
        display_order: 0,
    }
}

#[must_use]
pub fn metrics(id: &str, project_id: &str) -> project_metrics::Model {
    project_metrics::Model {
        id: id.to_string(),
        project_id: project_id.to_string(),
        people_impacted: 0,
        budget_used: Decimal::ZERO,
        progress_percentage: 0,
        total_milestones: 0,
        completed_milestones: 0,
        last_updated: fixed_time(),
    }
}

#[must_use]
pub fn donation_method(id: &str, name: &str) -> donation_method::Model {
    donation_method::Model {
        id: id.to_string(),
        name: name.to_string(),
        description: None,
        account_details: serde_json::json!({}),
        is_active: true,
        display_order: 0,
        created_at: fixed_time(),
    }
}

#[must_use]
pub fn donation(id: &str, amount: i64) -> donation::Model {
    donation::Model {
        id: id.to_string(),
        donor_id: None,
        donor_name: "Ana Machava".to_string(),
        donor_email: Some("ana@example.org".to_string()),
        is_anonymous: false,
        amount: Decimal::from(amount),
        currency: "MZN".to_string(),
        donation_method_id: None,
        project_id: None,
        status: DonationStatus::Completed,
        purpose: None,
        created_at: fixed_time(),
    }
}

#[must_use]
pub fn volunteer(id: &str, full_name: &str) -> volunteer_profile::Model {
    volunteer_profile::Model {
        id: id.to_string(),
        user_id: None,
        full_name: full_name.to_string(),
        email: "volunteer@example.org".to_string(),
        phone: None,
        location: None,
        status: VolunteerStatus::Active,
        availability: None,
        total_hours: 0,
        created_at: fixed_time(),
    }
}

#[must_use]
pub fn beneficiary(id: &str, full_name: &str) -> beneficiary_profile::Model {
    beneficiary_profile::Model {
        id: id.to_string(),
        full_name: full_name.to_string(),
        gender: None,
        date_of_birth: None,
        province: "Cabo Delgado".to_string(),
        district: "Pemba".to_string(),
        community: None,
        family_size: 1,
        vulnerability_level: VulnerabilityLevel::Medium,
        status: BeneficiaryStatus::Active,
        created_at: fixed_time(),
    }
}

#[must_use]
pub fn partner(id: &str, name: &str) -> partner::Model {
    partner::Model {
        id: id.to_string(),
        user_id: None,
        name: name.to_string(),
        organization_type: None,
        contact_email: "partner@example.org".to_string(),
        status: PartnerStatus::Active,
        created_at: fixed_time(),
    }
}

#[must_use]
pub fn notification(id: &str, recipient_id: &str) -> notification::Model {
    notification::Model {
        id: id.to_string(),
        recipient_id: recipient_id.to_string(),
        title: "Nova doação".to_string(),
        message: "Recebemos uma nova doação".to_string(),
        notification_type: NotificationType::Donation,
        priority: NotificationPriority::Medium,
        is_read: false,
        action_url: None,
        action_text: None,
        created_at: fixed_time(),
        read_at: None,
    }
}

#[must_use]
pub fn blog_post(id: &str, slug: &str) -> blog_post::Model {
    blog_post::Model {
        id: id.to_string(),
        title: slug.replace('-', " "),
        slug: slug.to_string(),
        excerpt: None,
        content: String::new(),
        status: PostStatus::Published,
        author_id: None,
        meta_title: None,
        meta_description: None,
        published_at: Some(fixed_time()),
        views_count: 0,
        created_at: fixed_time(),
        updated_at: None,
    }
}

#[must_use]
pub fn comment(id: &str, post_id: &str, is_approved: bool) -> comment::Model {
    comment::Model {
        id: id.to_string(),
        post_id: post_id.to_string(),
        author_name: "Leitor".to_string(),
        author_email: "leitor@example.org".to_string(),
        content: "Muito bom".to_string(),
        is_approved,
        created_at: fixed_time(),
    }
}
