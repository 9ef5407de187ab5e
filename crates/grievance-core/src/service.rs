//! GrievanceService - the lifecycle and assignment workflow.
//!
//! Takes port traits via `Arc<dyn PortTrait>` so the same logic runs against
//! Postgres or `MemoryStore`. Every gated operation takes the `Actor`
//! explicitly and checks it through `Actor::require_manager` before touching
//! the store; all request validation also happens before any mutation.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::{
    actor::Actor,
    analytics::{round2, sla_cutoff, AnalyticsReport, AnalyticsSummary, AnalyticsWindow},
    error::{GrievanceError, Result},
    policy::TransitionPolicy,
    ports::{
        ActivityLog, AssignCommand, Clock, GrievanceStore, ReferenceData, SystemClock,
        TransitionCommand,
    },
    proto::*,
    query::{DashboardFilter, DashboardQuery, DashboardRow, Page, PageMeta, PageRequest},
    types::*,
};

pub const DEFAULT_ACTIVITY_LIMIT: i64 = 100;
pub const MAX_ACTIVITY_LIMIT: i64 = 500;

// ── GrievanceService trait ────────────────────────────────────

#[async_trait]
pub trait GrievanceService: Send + Sync {
    /// File a new grievance on behalf of the actor (any role).
    async fn submit(&self, actor: &Actor, req: SubmitRequest) -> Result<Audited<Grievance>>;

    /// Route a grievance to a department and optionally an officer.
    /// Idempotent: repeating the same assignment leaves the record unchanged.
    async fn assign(&self, actor: &Actor, req: AssignRequest) -> Result<Audited<Grievance>>;

    /// Change status with a mandatory remark. Not idempotent: every call
    /// appends a remark and a timeline entry.
    async fn transition(
        &self,
        actor: &Actor,
        req: TransitionRequest,
    ) -> Result<Audited<TransitionResponse>>;

    /// Paginated dashboard listing.
    async fn list(&self, actor: &Actor, query: DashboardQuery) -> Result<Page<DashboardRow>>;

    /// Status history of one grievance, newest first.
    async fn timeline(&self, grievance_id: i64) -> Result<Vec<TimelineItem>>;

    /// Windowed rollups plus the SLA-breach count.
    async fn analytics(&self, actor: &Actor, query: AnalyticsQuery) -> Result<AnalyticsReport>;

    async fn attach_image(
        &self,
        actor: &Actor,
        req: AttachImageRequest,
    ) -> Result<Audited<GrievanceImage>>;

    async fn recent_activity(
        &self,
        actor: &Actor,
        query: ActivityQuery,
    ) -> Result<Vec<ActivityLogEntry>>;

    async fn categories(&self) -> Result<Vec<ReferenceItem>>;
    async fn priorities(&self) -> Result<Vec<ReferenceItem>>;
    async fn departments(&self) -> Result<Vec<ReferenceItem>>;
}

// ── GrievanceServiceImpl ──────────────────────────────────────

pub struct GrievanceServiceImpl {
    pub store: Arc<dyn GrievanceStore>,
    pub reference: Arc<dyn ReferenceData>,
    pub activity: Arc<dyn ActivityLog>,
    pub clock: Arc<dyn Clock>,
    pub policy: TransitionPolicy,
}

impl GrievanceServiceImpl {
    pub fn new(
        store: Arc<dyn GrievanceStore>,
        reference: Arc<dyn ReferenceData>,
        activity: Arc<dyn ActivityLog>,
    ) -> Self {
        Self {
            store,
            reference,
            activity,
            clock: Arc::new(SystemClock),
            policy: TransitionPolicy::default(),
        }
    }

    /// Set the transition policy (builder pattern).
    pub fn with_policy(mut self, policy: TransitionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replace the system clock (builder pattern).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Record an audit entry. A sink failure is logged and handed back as a
    /// warning; the caller's business result stands.
    async fn audit(
        &self,
        actor: &Actor,
        kind: ActivityKind,
        details: String,
        now: DateTime<Utc>,
    ) -> Option<String> {
        let entry = NewActivity {
            actor_id: actor.id,
            kind,
            details,
        };
        match self.activity.record(&entry, now).await {
            Ok(()) => None,
            Err(e) => {
                warn!(kind = %kind, actor_id = actor.id, "activity log write failed: {e}");
                Some(format!("activity log write failed: {e}"))
            }
        }
    }
}

#[async_trait]
impl GrievanceService for GrievanceServiceImpl {
    async fn submit(&self, actor: &Actor, req: SubmitRequest) -> Result<Audited<Grievance>> {
        let category_id = required_id(req.category_id, "category_id")?;
        let priority_id = required_id(req.priority_id, "priority_id")?;
        let description = required_text(req.description.as_deref(), "description")?;

        let new = NewGrievance {
            reporter_id: actor.id,
            category_id,
            priority_id,
            description,
        };
        let now = self.clock.now();
        let grievance = self.store.create_grievance(&new, now).await?;
        info!(grievance_id = grievance.id, reporter_id = actor.id, "grievance submitted");

        let audit_warning = self
            .audit(
                actor,
                ActivityKind::GrievanceSubmitted,
                format!("Grievance {} submitted", grievance.id),
                now,
            )
            .await;
        Ok(Audited {
            value: grievance,
            audit_warning,
        })
    }

    async fn assign(&self, actor: &Actor, req: AssignRequest) -> Result<Audited<Grievance>> {
        actor.require_manager("assign grievances")?;
        let grievance_id = required_id(req.grievance_id, "grievance_id")?;
        let department_id = required_id(req.department_id, "department_id")?;
        let officer_id = req
            .assigned_to_user_id
            .map(|id| required_id(Some(id), "assigned_to_user_id"))
            .transpose()?;

        let now = self.clock.now();
        let cmd = AssignCommand {
            grievance_id,
            department_id,
            officer_id,
            now,
        };
        let grievance = self.store.assign(&cmd).await?;
        info!(grievance_id, department_id, ?officer_id, "grievance assigned");

        let details = match officer_id {
            Some(officer) => format!(
                "Grievance {grievance_id} assigned to department {department_id}, officer {officer}"
            ),
            None => format!("Grievance {grievance_id} assigned to department {department_id}"),
        };
        let audit_warning = self
            .audit(actor, ActivityKind::GrievanceAssigned, details, now)
            .await;
        Ok(Audited {
            value: grievance,
            audit_warning,
        })
    }

    async fn transition(
        &self,
        actor: &Actor,
        req: TransitionRequest,
    ) -> Result<Audited<TransitionResponse>> {
        actor.require_manager("update grievance status")?;
        let grievance_id = required_id(req.grievance_id, "grievance_id")?;
        let status_text = required_text(req.status.as_deref(), "status")?;
        let remark = required_text(req.remarks.as_deref(), "remarks")?;
        let to: GrievanceStatus = status_text.parse()?;

        let now = self.clock.now();
        let cmd = TransitionCommand {
            grievance_id,
            to,
            remark,
            author_id: actor.id,
            policy: self.policy,
            now,
        };
        let record = self.store.apply_transition(&cmd).await?;
        info!(
            grievance_id,
            from = %record.previous_status,
            to = %to,
            remark_id = record.remark.id,
            "grievance status updated"
        );

        let audit_warning = self
            .audit(
                actor,
                ActivityKind::GrievanceStatusUpdated,
                format!(
                    "Grievance {grievance_id} status changed from {} to {to}",
                    record.previous_status
                ),
                now,
            )
            .await;
        Ok(Audited {
            value: TransitionResponse {
                success: true,
                grievance: record.grievance,
            },
            audit_warning,
        })
    }

    async fn list(&self, actor: &Actor, query: DashboardQuery) -> Result<Page<DashboardRow>> {
        let status = query
            .status
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse::<GrievanceStatus>)
            .transpose()?;

        // Department queues are only browsable by managers; others silently
        // get the unfiltered listing.
        let department_id = query.department_id.filter(|_| actor.can_manage_grievances());
        let reporter_id = query.mine.unwrap_or(false).then_some(actor.id);

        let filter = DashboardFilter {
            status,
            department_id,
            reporter_id,
        };
        let page = PageRequest::clamped(query.page, query.limit);

        let data = self.store.list_dashboard(&filter, page).await?;
        let total = self.store.count_dashboard(&filter).await?;
        debug!(?filter, page = page.page, limit = page.limit, total, "dashboard listed");

        Ok(Page {
            data,
            meta: PageMeta::new(page, total),
        })
    }

    async fn timeline(&self, grievance_id: i64) -> Result<Vec<TimelineItem>> {
        let grievance_id = required_id(Some(grievance_id), "grievance_id")?;
        if self.store.load_grievance(grievance_id).await?.is_none() {
            return Err(GrievanceError::grievance_not_found(grievance_id));
        }
        self.store.timeline(grievance_id).await
    }

    async fn analytics(&self, actor: &Actor, query: AnalyticsQuery) -> Result<AnalyticsReport> {
        actor.require_manager("view grievance analytics")?;
        let window = AnalyticsWindow::clamped(query.days);
        let now = self.clock.now();
        let since = window.since(now);

        let total_by_status = self.store.count_by_status(since).await?;
        let total_by_category = self.store.count_by_category(since).await?;
        let avg = self.store.avg_resolution_days(since).await?;
        let pending_over_72h = self.store.count_pending_before(sla_cutoff(now)).await?;

        debug!(period_days = window.days(), pending_over_72h, "analytics computed");
        Ok(AnalyticsReport {
            summary: AnalyticsSummary {
                total_by_status,
                total_by_category,
                avg_resolution_days: round2(avg.unwrap_or(0.0)),
                pending_over_72h,
            },
            period_days: window.days(),
        })
    }

    async fn attach_image(
        &self,
        actor: &Actor,
        req: AttachImageRequest,
    ) -> Result<Audited<GrievanceImage>> {
        let grievance_id = required_id(req.grievance_id, "grievance_id")?;
        let image_ref = required_text(req.image_ref.as_deref(), "image_ref")?;

        let now = self.clock.now();
        let image = self
            .store
            .attach_image(grievance_id, &image_ref, Some(actor.id), now)
            .await?;
        info!(grievance_id, image_id = image.id, "grievance image attached");

        let audit_warning = self
            .audit(
                actor,
                ActivityKind::GrievanceImageAttached,
                format!("Image {} attached to grievance {grievance_id}", image.id),
                now,
            )
            .await;
        Ok(Audited {
            value: image,
            audit_warning,
        })
    }

    async fn recent_activity(
        &self,
        actor: &Actor,
        query: ActivityQuery,
    ) -> Result<Vec<ActivityLogEntry>> {
        actor.require_manager("view activity logs")?;
        let limit = query
            .limit
            .unwrap_or(DEFAULT_ACTIVITY_LIMIT)
            .clamp(1, MAX_ACTIVITY_LIMIT);
        self.activity.recent(limit).await
    }

    async fn categories(&self) -> Result<Vec<ReferenceItem>> {
        self.reference.categories().await
    }

    async fn priorities(&self) -> Result<Vec<ReferenceItem>> {
        self.reference.priorities().await
    }

    async fn departments(&self) -> Result<Vec<ReferenceItem>> {
        self.reference.departments().await
    }
}
