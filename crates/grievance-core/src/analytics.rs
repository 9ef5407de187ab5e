//! Analytics window and summary types.
//!
//! Resolution time is measured in whole elapsed days per grievance (the
//! interval is truncated before averaging), then the mean is rounded to two
//! decimals. Callers must not read sub-day precision into the result.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::types::GrievanceStatus;

pub const DEFAULT_WINDOW_DAYS: i64 = 30;
pub const MAX_WINDOW_DAYS: i64 = 3650;

/// Age after which an unsettled grievance counts as an SLA breach.
pub const SLA_BREACH_HOURS: i64 = 72;

/// Look-back window in days, clamped to `[1, 3650]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AnalyticsWindow {
    days: i64,
}

impl AnalyticsWindow {
    pub fn clamped(days: Option<i64>) -> Self {
        Self {
            days: days.unwrap_or(DEFAULT_WINDOW_DAYS).clamp(1, MAX_WINDOW_DAYS),
        }
    }

    pub fn days(&self) -> i64 {
        self.days
    }

    /// Lower bound (inclusive) on `created_at` for windowed sub-queries.
    pub fn since(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(self.days)
    }
}

/// Upper bound (exclusive) on `created_at` for the SLA-breach count.
pub fn sla_cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::hours(SLA_BREACH_HOURS)
}

/// Whole days elapsed between creation and resolution, truncated toward zero.
pub fn whole_days_between(created_at: DateTime<Utc>, resolved_at: DateTime<Utc>) -> i64 {
    (resolved_at - created_at).num_days()
}

/// Mean of whole-day durations, `None` when there are none.
pub fn average_whole_days<I>(days: I) -> Option<f64>
where
    I: IntoIterator<Item = i64>,
{
    let (sum, n) = days
        .into_iter()
        .fold((0i64, 0i64), |(sum, n), d| (sum + d, n + 1));
    (n > 0).then(|| sum as f64 / n as f64)
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCount {
    pub status: GrievanceStatus,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    /// `None` when the grievance's category has no reference row.
    pub category_name: Option<String>,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    pub total_by_status: Vec<StatusCount>,
    pub total_by_category: Vec<CategoryCount>,
    pub avg_resolution_days: f64,
    pub pending_over_72h: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsReport {
    pub summary: AnalyticsSummary,
    pub period_days: i64,
}
