//! Grievance Domain Types
//!
//! Records owned by the grievance store plus the read models the dashboard,
//! timeline and activity views hand back to callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::GrievanceError;

// ─── Status ───────────────────────────────────────────────────

/// Lifecycle status of a grievance, in workflow order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrievanceStatus {
    Submitted,
    UnderReview,
    InProgress,
    Resolved,
    Closed,
}

impl GrievanceStatus {
    pub const ALL: [GrievanceStatus; 5] = [
        Self::Submitted,
        Self::UnderReview,
        Self::InProgress,
        Self::Resolved,
        Self::Closed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submitted => "submitted",
            Self::UnderReview => "under_review",
            Self::InProgress => "in_progress",
            Self::Resolved => "resolved",
            Self::Closed => "closed",
        }
    }

    /// Position in the workflow order, starting at 0 for `submitted`.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Submitted => 0,
            Self::UnderReview => 1,
            Self::InProgress => 2,
            Self::Resolved => 3,
            Self::Closed => 4,
        }
    }

    /// Resolved and closed grievances no longer count as pending.
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Resolved | Self::Closed)
    }
}

impl std::fmt::Display for GrievanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for GrievanceStatus {
    type Err = GrievanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "submitted" => Ok(Self::Submitted),
            "under_review" => Ok(Self::UnderReview),
            "in_progress" => Ok(Self::InProgress),
            "resolved" => Ok(Self::Resolved),
            "closed" => Ok(Self::Closed),
            _ => Err(GrievanceError::InvalidArgument(format!(
                "invalid status '{s}'. Must be one of: {}",
                Self::ALL
                    .iter()
                    .map(|s| s.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))),
        }
    }
}

// ─── Grievance ────────────────────────────────────────────────

/// A reported issue tracked through its lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grievance {
    pub id: i64,
    pub reporter_id: i64,
    pub category_id: i64,
    pub priority_id: i64,
    pub description: String,
    pub status: GrievanceStatus,
    pub assigned_department: Option<i64>,
    pub assigned_officer: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Grievance {
    /// `resolved_at` is set exactly when the status is `resolved`.
    pub fn resolution_consistent(&self) -> bool {
        self.resolved_at.is_some() == (self.status == GrievanceStatus::Resolved)
    }

    /// Apply a status change in place, keeping `resolved_at` consistent.
    pub fn apply_status(&mut self, status: GrievanceStatus, now: DateTime<Utc>) {
        self.status = status;
        self.updated_at = now;
        self.resolved_at = (status == GrievanceStatus::Resolved).then_some(now);
    }
}

/// Input for a new grievance; the reporter is the submitting actor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGrievance {
    pub reporter_id: i64,
    pub category_id: i64,
    pub priority_id: i64,
    pub description: String,
}

// ─── Reference data ───────────────────────────────────────────

/// `{id, name}` row of a static lookup table (category, priority, department).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceItem {
    pub id: i64,
    pub name: String,
}

// ─── History ──────────────────────────────────────────────────

/// Immutable record of a status reached at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub id: i64,
    pub grievance_id: i64,
    pub status: GrievanceStatus,
    pub recorded_at: DateTime<Utc>,
    /// Remark written in the same transition. `None` for the submission entry.
    pub remark_id: Option<i64>,
}

/// Reviewer justification attached to a status change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Remark {
    pub id: i64,
    pub grievance_id: i64,
    pub author_id: i64,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// One row of the derived timeline view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineItem {
    pub status: GrievanceStatus,
    pub recorded_at: DateTime<Utc>,
    pub remark_text: Option<String>,
    pub author_name: Option<String>,
}

/// What the store reports back after applying a transition atomically.
#[derive(Debug, Clone)]
pub struct TransitionRecord {
    pub grievance: Grievance,
    pub previous_status: GrievanceStatus,
    pub remark: Remark,
    pub timeline: TimelineEntry,
}

// ─── Attachments ──────────────────────────────────────────────

/// Stable reference to an uploaded image; bytes live with the upload collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrievanceImage {
    pub id: i64,
    pub grievance_id: i64,
    pub image_ref: String,
    pub uploaded_by: Option<i64>,
    pub uploaded_at: DateTime<Utc>,
}

// ─── Activity log ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityKind {
    GrievanceSubmitted,
    GrievanceAssigned,
    GrievanceStatusUpdated,
    GrievanceImageAttached,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GrievanceSubmitted => "GRIEVANCE_SUBMITTED",
            Self::GrievanceAssigned => "GRIEVANCE_ASSIGNED",
            Self::GrievanceStatusUpdated => "GRIEVANCE_STATUS_UPDATED",
            Self::GrievanceImageAttached => "GRIEVANCE_IMAGE_ATTACHED",
        }
    }
}

impl std::fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ActivityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GRIEVANCE_SUBMITTED" => Ok(Self::GrievanceSubmitted),
            "GRIEVANCE_ASSIGNED" => Ok(Self::GrievanceAssigned),
            "GRIEVANCE_STATUS_UPDATED" => Ok(Self::GrievanceStatusUpdated),
            "GRIEVANCE_IMAGE_ATTACHED" => Ok(Self::GrievanceImageAttached),
            _ => Err(format!("Unknown activity kind: {}", s)),
        }
    }
}

/// Audit entry as emitted by the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewActivity {
    pub actor_id: i64,
    pub kind: ActivityKind,
    pub details: String,
}

/// Audit entry as read back from the sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityLogEntry {
    pub id: i64,
    pub actor_id: i64,
    pub kind: ActivityKind,
    pub details: String,
    pub created_at: DateTime<Utc>,
}
