//! Repositories wrapping sea-orm queries per aggregate.

mod beneficiary;
mod blog;
mod donation;
mod notification;
mod partner;
mod permission;
mod project;
mod user;
mod volunteer;

pub use beneficiary::BeneficiaryRepository;
pub use blog::BlogRepository;
pub use donation::{DonationFilter, DonationRepository};
pub use notification::NotificationRepository;
pub use partner::PartnerRepository;
pub use permission::PermissionRepository;
pub use project::ProjectRepository;
pub use user::UserRepository;
pub use volunteer::VolunteerRepository;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use mozsolidaria_common::{AppError, AppResult};
use sea_orm::{ColumnTrait, QueryFilter};

/// Half-open time window `[from, to)` over a timestamp column.
///
/// A missing bound leaves that side open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeWindow {
    /// Inclusive lower bound.
    pub from: Option<DateTime<Utc>>,
    /// Exclusive upper bound.
    pub to: Option<DateTime<Utc>>,
}

impl TimeWindow {
    /// Window with no bounds.
    pub const ALL: Self = Self {
        from: None,
        to: None,
    };

    /// Window `[from, to)`.
    #[must_use]
    pub const fn between(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
        }
    }

    /// Window covering the whole days `[from, to]`.
    ///
    /// Rejects an inverted range and a `to` day with no successor.
    pub fn from_dates(from: Option<NaiveDate>, to: Option<NaiveDate>) -> AppResult<Self> {
        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                return Err(AppError::Validation(format!(
                    "date_from {from} is after date_to {to}"
                )));
            }
        }

        let to = match to {
            Some(day) => Some(
                day.succ_opt()
                    .ok_or_else(|| AppError::Validation(format!("date_to {day} is out of range")))?,
            ),
            None => None,
        };

        Ok(Self {
            from: from.map(|d| d.and_time(NaiveTime::MIN).and_utc()),
            to: to.map(|d| d.and_time(NaiveTime::MIN).and_utc()),
        })
    }

    /// Whether both bounds are open.
    #[must_use]
    pub const fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    /// Add the window's bounds to a query as filters on `column`.
    pub fn apply<Q, C>(self, mut query: Q, column: C) -> Q
    where
        Q: QueryFilter,
        C: ColumnTrait,
    {
        if let Some(from) = self.from {
            query = query.filter(column.gte(from));
        }
        if let Some(to) = self.to {
            query = query.filter(column.lt(to));
        }
        query
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_from_dates_covers_whole_days() {
        let window = TimeWindow::from_dates(Some(day(2025, 1, 1)), Some(day(2025, 1, 31))).unwrap();

        assert_eq!(
            window,
            TimeWindow::between(
                day(2025, 1, 1).and_time(NaiveTime::MIN).and_utc(),
                day(2025, 2, 1).and_time(NaiveTime::MIN).and_utc(),
            )
        );
    }

    #[test]
    fn test_from_dates_open_bounds() {
        assert!(TimeWindow::from_dates(None, None).unwrap().is_unbounded());
    }

    #[test]
    fn test_from_dates_rejects_inverted_range() {
        let result = TimeWindow::from_dates(Some(day(2025, 2, 1)), Some(day(2025, 1, 1)));

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_from_dates_rejects_last_representable_day() {
        let result = TimeWindow::from_dates(None, Some(NaiveDate::MAX));

        assert!(matches!(result, Err(AppError::Validation(msg)) if msg.contains("out of range")));
    }
}
