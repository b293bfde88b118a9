//! Metrics aggregator.
//!
//! Two scopes: the cached per-project snapshot, recomputed whenever an update,
//! milestone or donation of the project changes, and the platform-wide
//! statistics behind the admin dashboard, computed on demand and never stored.
//!
//! The platform statistics are split into four groups, each loaded by its own
//! queries. A group that fails is zeroed and listed in `degraded_groups`; the
//! other groups are still returned.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use mozsolidaria_common::{AppError, AppResult, IdGenerator, get_telemetry};
use mozsolidaria_db::{
    entities::{
        beneficiary_profile::BeneficiaryStatus,
        donation,
        partner::PartnerStatus,
        project::{self, ProjectStatus},
        project_metrics,
        project_milestone::{self, MilestoneStatus},
        project_update::{self, UpdateStatus},
        volunteer_profile::VolunteerStatus,
    },
    repositories::{
        BeneficiaryRepository, DonationRepository, PartnerRepository, ProjectRepository,
        TimeWindow, VolunteerRepository,
    },
};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use sea_orm::Set;
use serde::{Serialize, Serializer};
use tracing::{debug, info, warn};

// ==================== Period ====================

/// Reporting period for platform statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatsPeriod {
    SevenDays,
    OneMonth,
    ThreeMonths,
    #[default]
    SixMonths,
    OneYear,
    All,
}

impl StatsPeriod {
    pub const ALL: [Self; 6] = [
        Self::SevenDays,
        Self::OneMonth,
        Self::ThreeMonths,
        Self::SixMonths,
        Self::OneYear,
        Self::All,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SevenDays => "7days",
            Self::OneMonth => "1month",
            Self::ThreeMonths => "3months",
            Self::SixMonths => "6months",
            Self::OneYear => "1year",
            Self::All => "all",
        }
    }

    /// Length of the period, `None` for `all`.
    #[must_use]
    pub const fn length(self) -> Option<Duration> {
        let days = match self {
            Self::SevenDays => 7,
            Self::OneMonth => 30,
            Self::ThreeMonths => 90,
            Self::SixMonths => 180,
            Self::OneYear => 365,
            Self::All => return None,
        };
        Some(Duration::days(days))
    }

    /// The current window ending at `now` and the equally long window before it.
    #[must_use]
    pub fn windows(self, now: DateTime<Utc>) -> (TimeWindow, Option<TimeWindow>) {
        match self.length() {
            None => (TimeWindow::ALL, None),
            Some(length) => {
                let start = now - length;
                (
                    TimeWindow {
                        from: Some(start),
                        to: None,
                    },
                    Some(TimeWindow::between(start - length, start)),
                )
            }
        }
    }
}

impl FromStr for StatsPeriod {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let compact: String = s
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();

        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == compact)
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "unknown period '{s}', expected one of 7days, 1month, 3months, 6months, 1year, all"
                ))
            })
    }
}

impl fmt::Display for StatsPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for StatsPeriod {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

// ==================== Arithmetic ====================

/// `(current - previous) / previous * 100`, rounded to 2 dp; 0 when there is
/// no previous total.
#[must_use]
pub fn growth_percentage(current: Decimal, previous: Decimal) -> f64 {
    if previous.is_zero() {
        return 0.0;
    }
    percent((current - previous).checked_mul(Decimal::ONE_HUNDRED), previous)
}

/// `numerator / denominator * 100`, rounded to 2 dp; 0 when the denominator is 0.
#[must_use]
pub fn rate(numerator: Decimal, denominator: Decimal) -> f64 {
    if denominator.is_zero() {
        return 0.0;
    }
    percent(numerator.checked_mul(Decimal::ONE_HUNDRED), denominator)
}

fn percent(scaled: Option<Decimal>, denominator: Decimal) -> f64 {
    scaled
        .and_then(|n| n.checked_div(denominator))
        .map(|v| v.round_dp(2))
        .and_then(|v| v.to_f64())
        .unwrap_or(0.0)
}

/// Donors with more than one donation among `donations`.
///
/// Donors are keyed by account, falling back to e-mail; donations with
/// neither are not attributable and are skipped.
#[must_use]
pub fn recurring_donors(donations: &[donation::Model]) -> u64 {
    let mut per_donor: HashMap<&str, u32> = HashMap::new();
    for d in donations {
        if let Some(key) = d.donor_key() {
            *per_donor.entry(key).or_default() += 1;
        }
    }
    per_donor.values().filter(|&&n| n > 1).count() as u64
}

// ==================== Project snapshot ====================

/// Aggregates derived from a project's updates and milestones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMetricsSnapshot {
    pub people_impacted: i32,
    pub budget_used: Decimal,
    pub progress_percentage: i32,
    pub total_milestones: i32,
    pub completed_milestones: i32,
}

impl ProjectMetricsSnapshot {
    /// Aggregate published updates and all milestones.
    ///
    /// Progress is the highest progress any update reported, not the latest:
    /// updates are often entered out of order.
    #[must_use]
    pub fn from_records(
        updates: &[project_update::Model],
        milestones: &[project_milestone::Model],
    ) -> Self {
        let published = updates
            .iter()
            .filter(|u| u.status == UpdateStatus::Published);

        let mut snapshot = Self::default();
        for update in published {
            snapshot.people_impacted = snapshot
                .people_impacted
                .saturating_add(update.people_impacted.unwrap_or(0).max(0));
            snapshot.budget_used += update.budget_spent.unwrap_or_default().max(Decimal::ZERO);
            snapshot.progress_percentage = snapshot
                .progress_percentage
                .max(update.progress_percentage.unwrap_or(0).clamp(0, 100));
        }

        snapshot.total_milestones = milestones.len() as i32;
        snapshot.completed_milestones = milestones
            .iter()
            .filter(|m| m.status == MilestoneStatus::Completed)
            .count() as i32;

        snapshot
    }
}

impl From<&project_metrics::Model> for ProjectMetricsSnapshot {
    fn from(model: &project_metrics::Model) -> Self {
        Self {
            people_impacted: model.people_impacted,
            budget_used: model.budget_used,
            progress_percentage: model.progress_percentage,
            total_milestones: model.total_milestones,
            completed_milestones: model.completed_milestones,
        }
    }
}

// ==================== Platform statistics ====================

/// Volunteer, beneficiary and partner counts.
///
/// Totals and active counts are all-time; `new_*` are registrations in the period.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityStats {
    pub total_volunteers: u64,
    pub active_volunteers: u64,
    pub new_volunteers: u64,
    pub total_beneficiaries: u64,
    pub active_beneficiaries: u64,
    pub new_beneficiaries: u64,
    pub total_partners: u64,
    pub active_partners: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStats {
    pub total_projects: u64,
    pub draft_projects: u64,
    pub active_projects: u64,
    pub completed_projects: u64,
    pub cancelled_projects: u64,
    pub total_budget: Decimal,
    pub budget_spent: Decimal,
    /// Mean snapshot progress; projects never recomputed count as 0.
    pub average_completion: f64,
    pub people_impacted: i64,
}

/// Completed donations in the period.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialStats {
    pub total_donations: Decimal,
    pub donation_count: u64,
    pub average_donation: Decimal,
    pub previous_period_total: Decimal,
    pub growth_percentage: f64,
    pub recurring_donors: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceStats {
    pub project_completion_rate: f64,
    pub milestone_completion_rate: f64,
    pub beneficiary_reach_rate: f64,
    pub budget_utilization_rate: f64,
}

/// Dashboard statistics.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvancedStats {
    pub period: StatsPeriod,
    pub generated_at: DateTime<Utc>,
    pub community: CommunityStats,
    pub projects: ProjectStats,
    pub financial: FinancialStats,
    pub performance: PerformanceStats,
    /// Groups that failed and were zeroed.
    pub degraded_groups: Vec<&'static str>,
}

impl ProjectStats {
    fn from_records(projects: &[project::Model], metrics: &[project_metrics::Model]) -> Self {
        let mut stats = Self {
            total_projects: projects.len() as u64,
            ..Self::default()
        };

        for p in projects {
            match p.status {
                ProjectStatus::Draft => stats.draft_projects += 1,
                ProjectStatus::Active => stats.active_projects += 1,
                ProjectStatus::Completed => stats.completed_projects += 1,
                ProjectStatus::Cancelled => stats.cancelled_projects += 1,
            }
            stats.total_budget += p.budget;
        }

        let mut progress_sum = 0i64;
        for m in metrics {
            stats.budget_spent += m.budget_used;
            stats.people_impacted += i64::from(m.people_impacted);
            progress_sum += i64::from(m.progress_percentage);
        }

        if !projects.is_empty() {
            let avg = Decimal::from(progress_sum) / Decimal::from(projects.len() as u64);
            stats.average_completion = avg.round_dp(2).to_f64().unwrap_or(0.0);
        }

        stats
    }
}

impl FinancialStats {
    fn from_records(current: &[donation::Model], previous: &[donation::Model]) -> Self {
        let total: Decimal = current.iter().map(|d| d.amount).sum();
        let previous_total: Decimal = previous.iter().map(|d| d.amount).sum();
        let count = current.len() as u64;

        let average = if count == 0 {
            Decimal::ZERO
        } else {
            (total / Decimal::from(count)).round_dp(2)
        };

        Self {
            total_donations: total,
            donation_count: count,
            average_donation: average,
            previous_period_total: previous_total,
            growth_percentage: growth_percentage(total, previous_total),
            recurring_donors: recurring_donors(current),
        }
    }
}

// ==================== Service ====================

/// Metrics service.
#[derive(Clone)]
pub struct MetricsService {
    project_repo: ProjectRepository,
    donation_repo: DonationRepository,
    volunteer_repo: VolunteerRepository,
    beneficiary_repo: BeneficiaryRepository,
    partner_repo: PartnerRepository,
    id_gen: IdGenerator,
}

impl MetricsService {
    /// Create a new metrics service.
    #[must_use]
    pub const fn new(
        project_repo: ProjectRepository,
        donation_repo: DonationRepository,
        volunteer_repo: VolunteerRepository,
        beneficiary_repo: BeneficiaryRepository,
        partner_repo: PartnerRepository,
    ) -> Self {
        Self {
            project_repo,
            donation_repo,
            volunteer_repo,
            beneficiary_repo,
            partner_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Recompute and store the metrics snapshot of a project.
    ///
    /// Concurrent recomputations of the same project are last-writer-wins.
    pub async fn recompute_project_metrics(
        &self,
        project_id: &str,
    ) -> AppResult<project_metrics::Model> {
        let project = self
            .project_repo
            .find_by_id(project_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("project {project_id}")))?;

        let updates = self.project_repo.find_updates(&project.id, true).await?;
        let milestones = self.project_repo.find_milestones(&project.id).await?;
        let snapshot = ProjectMetricsSnapshot::from_records(&updates, &milestones);

        let now = Utc::now().fixed_offset();
        let stored = match self.project_repo.find_metrics(&project.id).await? {
            Some(existing) => {
                let last_updated = now.max(existing.last_updated);
                let mut active: project_metrics::ActiveModel = existing.into();
                active.people_impacted = Set(snapshot.people_impacted);
                active.budget_used = Set(snapshot.budget_used);
                active.progress_percentage = Set(snapshot.progress_percentage);
                active.total_milestones = Set(snapshot.total_milestones);
                active.completed_milestones = Set(snapshot.completed_milestones);
                active.last_updated = Set(last_updated);
                self.project_repo.update_metrics(active).await?
            }
            None => {
                let model = project_metrics::ActiveModel {
                    id: Set(self.id_gen.generate()),
                    project_id: Set(project.id.clone()),
                    people_impacted: Set(snapshot.people_impacted),
                    budget_used: Set(snapshot.budget_used),
                    progress_percentage: Set(snapshot.progress_percentage),
                    total_milestones: Set(snapshot.total_milestones),
                    completed_milestones: Set(snapshot.completed_milestones),
                    last_updated: Set(now),
                };
                self.project_repo.create_metrics(model).await?
            }
        };

        get_telemetry().record_recompute();
        info!(
            project_id = %project.id,
            progress = snapshot.progress_percentage,
            milestones = snapshot.total_milestones,
            "Project metrics recomputed"
        );

        Ok(stored)
    }

    /// Recompute the snapshot after a related record changed.
    ///
    /// The triggering write has already succeeded, so a failure here is only
    /// logged.
    pub async fn refresh_after_change(&self, project_id: &str) {
        if let Err(e) = self.recompute_project_metrics(project_id).await {
            warn!(project_id = %project_id, error = %e, "Failed to refresh project metrics");
        }
    }

    /// Stored snapshot of a project, if it was ever computed.
    pub async fn project_metrics(
        &self,
        project_id: &str,
    ) -> AppResult<Option<project_metrics::Model>> {
        self.project_repo.find_metrics(project_id).await
    }

    /// Community counts. Totals are all-time, registrations are within `window`.
    pub async fn community_stats(&self, window: TimeWindow) -> AppResult<CommunityStats> {
        Ok(CommunityStats {
            total_volunteers: self.volunteer_repo.count(None).await?,
            active_volunteers: self
                .volunteer_repo
                .count(Some(VolunteerStatus::Active))
                .await?,
            new_volunteers: self.volunteer_repo.count_registered(window).await?,
            total_beneficiaries: self.beneficiary_repo.count(None).await?,
            active_beneficiaries: self
                .beneficiary_repo
                .count(Some(BeneficiaryStatus::Active))
                .await?,
            new_beneficiaries: self.beneficiary_repo.count_registered(window).await?,
            total_partners: self.partner_repo.count(None).await?,
            active_partners: self.partner_repo.count(Some(PartnerStatus::Active)).await?,
        })
    }

    /// Project counts by status, budgets and mean completion.
    pub async fn project_stats(&self) -> AppResult<ProjectStats> {
        let projects = self.project_repo.find_all().await?;
        let metrics = self.project_repo.find_all_metrics().await?;
        Ok(ProjectStats::from_records(&projects, &metrics))
    }

    /// Donation figures for the period ending at `now`.
    pub async fn financial_stats(
        &self,
        period: StatsPeriod,
        now: DateTime<Utc>,
    ) -> AppResult<FinancialStats> {
        let (current_window, previous_window) = period.windows(now);

        let current = self.donation_repo.find_completed(current_window).await?;
        let previous = match previous_window {
            Some(window) => self.donation_repo.find_completed(window).await?,
            None => Vec::new(),
        };

        Ok(FinancialStats::from_records(&current, &previous))
    }

    /// Completion and utilisation ratios across all projects.
    pub async fn performance_stats(&self) -> AppResult<PerformanceStats> {
        let projects = self.project_repo.find_all().await?;
        let metrics = self.project_repo.find_all_metrics().await?;
        let total_milestones = self.project_repo.count_milestones().await?;
        let completed_milestones = self.project_repo.count_completed_milestones().await?;

        let completed_projects = projects
            .iter()
            .filter(|p| p.status == ProjectStatus::Completed)
            .count();
        let target: i64 = projects
            .iter()
            .map(|p| i64::from(p.target_beneficiaries.max(0)))
            .sum();
        let budget: Decimal = projects.iter().map(|p| p.budget).sum();
        let reached: i64 = metrics.iter().map(|m| i64::from(m.people_impacted)).sum();
        let used: Decimal = metrics.iter().map(|m| m.budget_used).sum();

        Ok(PerformanceStats {
            project_completion_rate: rate(
                Decimal::from(completed_projects as u64),
                Decimal::from(projects.len() as u64),
            ),
            milestone_completion_rate: rate(
                Decimal::from(completed_milestones),
                Decimal::from(total_milestones),
            ),
            beneficiary_reach_rate: rate(Decimal::from(reached), Decimal::from(target)),
            budget_utilization_rate: rate(used, budget),
        })
    }

    /// All four statistic groups for `period`.
    pub async fn advanced_stats(&self, period: StatsPeriod) -> AdvancedStats {
        self.advanced_stats_at(period, Utc::now()).await
    }

    /// All four statistic groups for the period ending at `now`.
    ///
    /// Never fails: a group whose computation fails is zeroed and named in
    /// `degraded_groups`.
    pub async fn advanced_stats_at(&self, period: StatsPeriod, now: DateTime<Utc>) -> AdvancedStats {
        let (window, _) = period.windows(now);
        let mut degraded_groups = Vec::new();

        let community = settle("community", self.community_stats(window).await, &mut degraded_groups);
        let projects = settle("projects", self.project_stats().await, &mut degraded_groups);
        let financial = settle(
            "financial",
            self.financial_stats(period, now).await,
            &mut degraded_groups,
        );
        let performance = settle(
            "performance",
            self.performance_stats().await,
            &mut degraded_groups,
        );

        debug!(period = %period, degraded = degraded_groups.len(), "Advanced stats computed");

        AdvancedStats {
            period,
            generated_at: now,
            community,
            projects,
            financial,
            performance,
            degraded_groups,
        }
    }
}

fn settle<T: Default>(
    group: &'static str,
    result: AppResult<T>,
    degraded: &mut Vec<&'static str>,
) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            warn!(group = group, error = %e, "Stat group failed, returning zeroed values");
            get_telemetry().record_degraded_group();
            degraded.push(group);
            T::default()
        }
    }
}
