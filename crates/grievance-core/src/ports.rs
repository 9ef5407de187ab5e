//! Port traits for grievance persistence, reference data, and the audit sink.
//!
//! The service operates exclusively through these traits, so the same
//! lifecycle logic runs against Postgres or the in-memory store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::analytics::{CategoryCount, StatusCount};
use crate::policy::TransitionPolicy;
use crate::query::{DashboardFilter, DashboardRow, PageRequest};
pub use crate::error::Result;
use crate::types::*;

/// Department/officer routing, already validated by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignCommand {
    pub grievance_id: i64,
    pub department_id: i64,
    /// `None` keeps the currently assigned officer.
    pub officer_id: Option<i64>,
    pub now: DateTime<Utc>,
}

/// Status change plus its remark, already validated by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionCommand {
    pub grievance_id: i64,
    pub to: GrievanceStatus,
    pub remark: String,
    pub author_id: i64,
    pub policy: TransitionPolicy,
    pub now: DateTime<Utc>,
}

#[async_trait]
pub trait GrievanceStore: Send + Sync {
    // ── Grievances ──

    /// Insert a `submitted` grievance together with its first timeline entry.
    async fn create_grievance(&self, new: &NewGrievance, now: DateTime<Utc>) -> Result<Grievance>;
    async fn load_grievance(&self, id: i64) -> Result<Option<Grievance>>;

    /// Set department (and officer, if given). `NotFound` for an unknown
    /// grievance, department, or officer. `updated_at` moves only on change.
    async fn assign(&self, cmd: &AssignCommand) -> Result<Grievance>;

    /// Status update, remark, and timeline entry as one unit, serialized per
    /// grievance. The policy is checked against the locked current status.
    async fn apply_transition(&self, cmd: &TransitionCommand) -> Result<TransitionRecord>;

    // ── Dashboard ──

    async fn list_dashboard(
        &self,
        filter: &DashboardFilter,
        page: PageRequest,
    ) -> Result<Vec<DashboardRow>>;
    async fn count_dashboard(&self, filter: &DashboardFilter) -> Result<i64>;

    // ── Timeline ──

    /// Timeline entries paired with their remarks, newest first.
    async fn timeline(&self, grievance_id: i64) -> Result<Vec<TimelineItem>>;

    // ── Analytics ──

    async fn count_by_status(&self, since: DateTime<Utc>) -> Result<Vec<StatusCount>>;
    async fn count_by_category(&self, since: DateTime<Utc>) -> Result<Vec<CategoryCount>>;
    /// Mean whole-day resolution time of resolved grievances created since `since`.
    async fn avg_resolution_days(&self, since: DateTime<Utc>) -> Result<Option<f64>>;
    /// Unsettled grievances created strictly before `cutoff`.
    async fn count_pending_before(&self, cutoff: DateTime<Utc>) -> Result<i64>;

    // ── Images ──

    async fn attach_image(
        &self,
        grievance_id: i64,
        image_ref: &str,
        uploaded_by: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<GrievanceImage>;
}

/// Static lookup tables, read-only from the core's perspective.
#[async_trait]
pub trait ReferenceData: Send + Sync {
    async fn categories(&self) -> Result<Vec<ReferenceItem>>;
    async fn priorities(&self) -> Result<Vec<ReferenceItem>>;
    async fn departments(&self) -> Result<Vec<ReferenceItem>>;
}

/// Audit sink. Failures here never fail the operation that emitted the entry.
#[async_trait]
pub trait ActivityLog: Send + Sync {
    async fn record(&self, entry: &NewActivity, now: DateTime<Utc>) -> Result<()>;
    async fn recent(&self, limit: i64) -> Result<Vec<ActivityLogEntry>>;
}

/// Source of "now" for every time-dependent operation.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
