//! Flat export rows, one type per area.
//!
//! Every field holds either a real value or a typed default. `null` always has
//! a documented meaning on the field; no row carries placeholder strings.

use chrono::{DateTime, NaiveDate, Utc};
use mozsolidaria_db::entities::{
    beneficiary_profile::{self, BeneficiaryStatus, VulnerabilityLevel},
    blog_post::{self, PostStatus},
    donation::{self, DonationStatus},
    project::{self, ProjectPriority, ProjectStatus},
    project_metrics,
    volunteer_profile::{self, VolunteerStatus},
};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

/// Donor name shown for anonymous donations.
pub const ANONYMOUS_DONOR: &str = "Anonymous";

/// A row of an export table.
pub trait ExportRecord: Serialize {
    /// Column names in output order. Each matches a serialized field name.
    const COLUMNS: &'static [&'static str];

    /// Cell values in [`Self::COLUMNS`] order.
    fn cells(&self) -> Vec<Value> {
        let mut fields = match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        };
        Self::COLUMNS
            .iter()
            .map(|column| fields.remove(*column).unwrap_or(Value::Null))
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectExportRow {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub status: ProjectStatus,
    pub priority: ProjectPriority,
    /// `null`: not part of a program.
    pub program: Option<String>,
    /// `null`: uncategorised.
    pub category: Option<String>,
    /// `null`: location not recorded.
    pub location: Option<String>,
    pub budget: Decimal,
    pub target_beneficiaries: i32,
    /// `null`: not scheduled.
    pub start_date: Option<NaiveDate>,
    /// `null`: open-ended.
    pub end_date: Option<NaiveDate>,
    pub people_impacted: i32,
    pub budget_used: Decimal,
    pub progress_percentage: i32,
    pub total_milestones: i32,
    pub completed_milestones: i32,
    pub created_at: DateTime<Utc>,
}

impl ExportRecord for ProjectExportRow {
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "slug",
        "status",
        "priority",
        "program",
        "category",
        "location",
        "budget",
        "target_beneficiaries",
        "start_date",
        "end_date",
        "people_impacted",
        "budget_used",
        "progress_percentage",
        "total_milestones",
        "completed_milestones",
        "created_at",
    ];
}

impl ProjectExportRow {
    /// Build a row. A project whose metrics were never computed reports zeros.
    #[must_use]
    pub fn new(
        project: project::Model,
        program: Option<String>,
        category: Option<String>,
        metrics: Option<&project_metrics::Model>,
    ) -> Self {
        Self {
            id: project.id,
            name: project.name,
            slug: project.slug,
            status: project.status,
            priority: project.priority,
            program,
            category,
            location: project.location,
            budget: project.budget,
            target_beneficiaries: project.target_beneficiaries,
            start_date: project.start_date,
            end_date: project.end_date,
            people_impacted: metrics.map_or(0, |m| m.people_impacted),
            budget_used: metrics.map_or(Decimal::ZERO, |m| m.budget_used),
            progress_percentage: metrics.map_or(0, |m| m.progress_percentage),
            total_milestones: metrics.map_or(0, |m| m.total_milestones),
            completed_milestones: metrics.map_or(0, |m| m.completed_milestones),
            created_at: project.created_at.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DonationExportRow {
    pub id: String,
    pub donor: String,
    /// `null`: anonymous, or no e-mail given.
    pub donor_email: Option<String>,
    pub amount: Decimal,
    pub currency: String,
    /// `null`: payment method not recorded.
    pub method: Option<String>,
    /// `null`: general fund, not tied to a project.
    pub project: Option<String>,
    pub status: DonationStatus,
    /// `null`: no purpose stated.
    pub purpose: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ExportRecord for DonationExportRow {
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "donor",
        "donor_email",
        "amount",
        "currency",
        "method",
        "project",
        "status",
        "purpose",
        "created_at",
    ];
}

impl DonationExportRow {
    /// Build a row. Anonymous donations hide the donor's identity.
    #[must_use]
    pub fn new(donation: donation::Model, method: Option<String>, project: Option<String>) -> Self {
        let (donor, donor_email) = if donation.is_anonymous {
            (ANONYMOUS_DONOR.to_string(), None)
        } else {
            (donation.donor_name, donation.donor_email)
        };

        Self {
            id: donation.id,
            donor,
            donor_email,
            amount: donation.amount,
            currency: donation.currency,
            method,
            project,
            status: donation.status,
            purpose: donation.purpose,
            created_at: donation.created_at.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VolunteerExportRow {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub status: VolunteerStatus,
    /// `null`: availability not declared.
    pub availability: Option<String>,
    pub total_hours: i32,
    pub skills: Vec<String>,
    pub registered_at: DateTime<Utc>,
}

impl ExportRecord for VolunteerExportRow {
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "full_name",
        "email",
        "phone",
        "location",
        "status",
        "availability",
        "total_hours",
        "skills",
        "registered_at",
    ];
}

impl VolunteerExportRow {
    #[must_use]
    pub fn new(volunteer: volunteer_profile::Model, skills: Vec<String>) -> Self {
        Self {
            id: volunteer.id,
            full_name: volunteer.full_name,
            email: volunteer.email,
            phone: volunteer.phone,
            location: volunteer.location,
            status: volunteer.status,
            availability: volunteer.availability,
            total_hours: volunteer.total_hours,
            skills,
            registered_at: volunteer.created_at.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BeneficiaryExportRow {
    pub id: String,
    pub full_name: String,
    /// `null`: not declared.
    pub gender: Option<String>,
    /// `null`: not declared.
    pub date_of_birth: Option<NaiveDate>,
    pub province: String,
    pub district: String,
    /// `null`: not recorded below district level.
    pub community: Option<String>,
    pub family_size: i32,
    pub vulnerability_level: VulnerabilityLevel,
    pub status: BeneficiaryStatus,
    pub needs: Vec<String>,
    /// Names of the projects the beneficiary is enrolled in.
    pub projects: Vec<String>,
    pub registered_at: DateTime<Utc>,
}

impl ExportRecord for BeneficiaryExportRow {
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "full_name",
        "gender",
        "date_of_birth",
        "province",
        "district",
        "community",
        "family_size",
        "vulnerability_level",
        "status",
        "needs",
        "projects",
        "registered_at",
    ];
}

impl BeneficiaryExportRow {
    #[must_use]
    pub fn new(
        beneficiary: beneficiary_profile::Model,
        needs: Vec<String>,
        projects: Vec<String>,
    ) -> Self {
        Self {
            id: beneficiary.id,
            full_name: beneficiary.full_name,
            gender: beneficiary.gender,
            date_of_birth: beneficiary.date_of_birth,
            province: beneficiary.province,
            district: beneficiary.district,
            community: beneficiary.community,
            family_size: beneficiary.family_size,
            vulnerability_level: beneficiary.vulnerability_level,
            status: beneficiary.status,
            needs,
            projects,
            registered_at: beneficiary.created_at.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BlogExportRow {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub status: PostStatus,
    /// `null`: author account removed or never set.
    pub author: Option<String>,
    /// `null`: never published.
    pub published_at: Option<DateTime<Utc>>,
    pub views_count: i32,
    pub comments: u64,
    pub approved_comments: u64,
    pub created_at: DateTime<Utc>,
}

impl ExportRecord for BlogExportRow {
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "title",
        "slug",
        "status",
        "author",
        "published_at",
        "views_count",
        "comments",
        "approved_comments",
        "created_at",
    ];
}

impl BlogExportRow {
    #[must_use]
    pub fn new(
        post: blog_post::Model,
        author: Option<String>,
        comments: u64,
        approved_comments: u64,
    ) -> Self {
        Self {
            id: post.id,
            title: post.title,
            slug: post.slug,
            status: post.status,
            author,
            published_at: post.published_at.map(Into::into),
            views_count: post.views_count,
            comments,
            approved_comments,
            created_at: post.created_at.into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use mozsolidaria_db::test_utils;

    fn keys<T: Serialize>(row: &T) -> Vec<String> {
        match serde_json::to_value(row).unwrap() {
            Value::Object(map) => map.keys().cloned().collect(),
            _ => vec![],
        }
    }

    fn assert_columns_match<T: ExportRecord>(row: &T) {
        let mut expected: Vec<String> = T::COLUMNS.iter().map(ToString::to_string).collect();
        let mut actual = keys(row);
        expected.sort();
        actual.sort();
        assert_eq!(expected, actual);
    }

    #[test]
    fn test_columns_cover_every_field() {
        assert_columns_match(&ProjectExportRow::new(
            test_utils::project("p1", "agua"),
            None,
            None,
            None,
        ));
        assert_columns_match(&DonationExportRow::new(test_utils::donation("d1", 10), None, None));
        assert_columns_match(&VolunteerExportRow::new(test_utils::volunteer("v1", "Ana"), vec![]));
        assert_columns_match(&BeneficiaryExportRow::new(
            test_utils::beneficiary("b1", "Rosa"),
            vec![],
            vec![],
        ));
        assert_columns_match(&BlogExportRow::new(test_utils::blog_post("b1", "ola"), None, 0, 0));
    }

    #[test]
    fn test_project_without_metrics_reports_zeros() {
        let row = ProjectExportRow::new(test_utils::project("p1", "agua"), None, None, None);
        let cells = row.cells();

        assert_eq!(cells[0], Value::String("p1".into()));
        assert_eq!(row.progress_percentage, 0);
        assert_eq!(row.budget_used, Decimal::ZERO);
        assert!(cells.iter().all(|c| c != &Value::String("N/A".into())));
    }

    #[test]
    fn test_project_row_uses_metrics() {
        let mut metrics = test_utils::metrics("pm1", "p1");
        metrics.progress_percentage = 85;
        metrics.completed_milestones = 2;

        let row = ProjectExportRow::new(
            test_utils::project("p1", "agua"),
            Some("Água e Saneamento".into()),
            None,
            Some(&metrics),
        );

        assert_eq!(row.progress_percentage, 85);
        assert_eq!(row.completed_milestones, 2);
        assert_eq!(row.program.as_deref(), Some("Água e Saneamento"));
    }

    #[test]
    fn test_anonymous_donor_hidden() {
        let mut donation = test_utils::donation("d1", 500);
        donation.is_anonymous = true;

        let row = DonationExportRow::new(donation, Some("M-Pesa".into()), None);

        assert_eq!(row.donor, ANONYMOUS_DONOR);
        assert_eq!(row.donor_email, None);
        assert_eq!(row.method.as_deref(), Some("M-Pesa"));
    }

    #[test]
    fn test_beneficiary_lists_serialize_as_arrays() {
        let row = BeneficiaryExportRow::new(
            test_utils::beneficiary("b1", "Rosa"),
            vec!["Água".into()],
            vec!["Poços Comunitários".into()],
        );
        let cells = row.cells();
        let projects_at = BeneficiaryExportRow::COLUMNS
            .iter()
            .position(|c| *c == "projects")
            .unwrap();

        assert_eq!(cells[projects_at], serde_json::json!(["Poços Comunitários"]));
    }
}
