//! sqlx row types and their conversion into core domain types.

use chrono::{DateTime, Utc};

use grievance_core::query::DashboardRow;
use grievance_core::types::{ActivityKind, ActivityLogEntry, Grievance, GrievanceStatus, TimelineItem};

fn parse_status(raw: &str) -> Result<GrievanceStatus, String> {
    raw.parse::<GrievanceStatus>().map_err(|e| e.to_string())
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct PgGrievanceRow {
    pub grievance_id: i64,
    pub user_id: i64,
    pub category_id: i64,
    pub priority_id: i64,
    pub description: String,
    pub status: String,
    pub assigned_department: Option<i64>,
    pub assigned_to_user_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl TryFrom<PgGrievanceRow> for Grievance {
    type Error = String;

    fn try_from(r: PgGrievanceRow) -> Result<Self, Self::Error> {
        Ok(Grievance {
            id: r.grievance_id,
            reporter_id: r.user_id,
            category_id: r.category_id,
            priority_id: r.priority_id,
            description: r.description,
            status: parse_status(&r.status)?,
            assigned_department: r.assigned_department,
            assigned_officer: r.assigned_to_user_id,
            created_at: r.created_at,
            updated_at: r.updated_at,
            resolved_at: r.resolved_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct PgDashboardRow {
    #[sqlx(flatten)]
    pub grievance: PgGrievanceRow,
    pub category_name: Option<String>,
    pub priority_name: Option<String>,
    pub reporter_name: Option<String>,
    pub reporter_email: Option<String>,
    pub assigned_dept_name: Option<String>,
}

impl TryFrom<PgDashboardRow> for DashboardRow {
    type Error = String;

    fn try_from(r: PgDashboardRow) -> Result<Self, Self::Error> {
        Ok(DashboardRow {
            grievance: r.grievance.try_into()?,
            category_name: r.category_name,
            priority_name: r.priority_name,
            reporter_name: r.reporter_name,
            reporter_email: r.reporter_email,
            assigned_dept_name: r.assigned_dept_name,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct PgTimelineRow {
    pub status: String,
    pub recorded_at: DateTime<Utc>,
    pub remark_text: Option<String>,
    pub author_name: Option<String>,
}

impl TryFrom<PgTimelineRow> for TimelineItem {
    type Error = String;

    fn try_from(r: PgTimelineRow) -> Result<Self, Self::Error> {
        Ok(TimelineItem {
            status: parse_status(&r.status)?,
            recorded_at: r.recorded_at,
            remark_text: r.remark_text,
            author_name: r.author_name,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct PgActivityRow {
    pub log_id: i64,
    pub user_id: i64,
    pub action: String,
    pub details: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<PgActivityRow> for ActivityLogEntry {
    type Error = String;

    fn try_from(r: PgActivityRow) -> Result<Self, Self::Error> {
        Ok(ActivityLogEntry {
            id: r.log_id,
            actor_id: r.user_id,
            kind: r.action.parse::<ActivityKind>()?,
            details: r.details,
            created_at: r.created_at,
        })
    }
}
