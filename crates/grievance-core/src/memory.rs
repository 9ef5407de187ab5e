//! In-memory implementation of all grievance ports.
//!
//! One `RwLock` guards the whole state, so every mutating call is a single
//! critical section: a transition builds its updated grievance, remark and
//! timeline entry on copies and commits all three only when nothing failed.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::analytics::{average_whole_days, whole_days_between, CategoryCount, StatusCount};
use crate::error::GrievanceError;
use crate::ports::{
    ActivityLog, AssignCommand, GrievanceStore, ReferenceData, Result, TransitionCommand,
};
use crate::query::{dashboard_order, DashboardFilter, DashboardRow, PageRequest};
use crate::types::*;

#[derive(Debug, Clone)]
struct UserInfo {
    name: String,
    email: String,
}

#[derive(Debug, Default)]
struct MemoryState {
    grievances: BTreeMap<i64, Grievance>,
    categories: BTreeMap<i64, String>,
    priorities: BTreeMap<i64, String>,
    departments: BTreeMap<i64, String>,
    users: BTreeMap<i64, UserInfo>,
    remarks: Vec<Remark>,
    timeline: Vec<TimelineEntry>,
    images: Vec<GrievanceImage>,
    activity: Vec<ActivityLogEntry>,
    next_grievance_id: i64,
    next_row_id: i64,
}

impl MemoryState {
    fn next_row_id(&mut self) -> i64 {
        self.next_row_id += 1;
        self.next_row_id
    }

    fn next_grievance_id(&mut self) -> i64 {
        let used = self.grievances.keys().next_back().copied().unwrap_or(0);
        self.next_grievance_id = self.next_grievance_id.max(used) + 1;
        self.next_grievance_id
    }

    fn push_timeline(
        &mut self,
        grievance_id: i64,
        status: GrievanceStatus,
        recorded_at: DateTime<Utc>,
        remark_id: Option<i64>,
    ) -> TimelineEntry {
        let entry = TimelineEntry {
            id: self.next_row_id(),
            grievance_id,
            status,
            recorded_at,
            remark_id,
        };
        self.timeline.push(entry.clone());
        entry
    }

    fn dashboard_row(&self, g: &Grievance) -> DashboardRow {
        let reporter = self.users.get(&g.reporter_id);
        DashboardRow {
            grievance: g.clone(),
            category_name: self.categories.get(&g.category_id).cloned(),
            priority_name: self.priorities.get(&g.priority_id).cloned(),
            reporter_name: reporter.map(|u| u.name.clone()),
            reporter_email: reporter.map(|u| u.email.clone()),
            assigned_dept_name: g
                .assigned_department
                .and_then(|d| self.departments.get(&d).cloned()),
        }
    }
}

/// Ports backed by process memory. Used by tests and the `memory` server mode.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
    fail_activity: AtomicBool,
    fail_history_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the campus reference tables used by the demo server and tests.
    pub fn with_campus_reference(mut self) -> Self {
        let state = self.state.get_mut();
        for (id, name) in [
            (1, "Infrastructure"),
            (2, "Academics"),
            (3, "Hostel"),
            (4, "Other"),
        ] {
            state.categories.insert(id, name.to_string());
        }
        for (id, name) in [(1, "Low"), (2, "Medium"), (3, "High"), (4, "Critical")] {
            state.priorities.insert(id, name.to_string());
        }
        for (id, name) in [
            (1, "Maintenance"),
            (2, "Academic Affairs"),
            (3, "Student Welfare"),
        ] {
            state.departments.insert(id, name.to_string());
        }
        self
    }

    pub async fn add_user(&self, id: i64, name: &str, email: &str) {
        self.state.write().await.users.insert(
            id,
            UserInfo {
                name: name.to_string(),
                email: email.to_string(),
            },
        );
    }

    pub async fn add_category(&self, id: i64, name: &str) {
        self.state.write().await.categories.insert(id, name.to_string());
    }

    pub async fn add_department(&self, id: i64, name: &str) {
        self.state.write().await.departments.insert(id, name.to_string());
    }

    /// Insert a grievance verbatim (fixed id and timestamps) with a single
    /// timeline entry for its current status at `created_at`.
    pub async fn insert_grievance(&self, grievance: Grievance) {
        let mut state = self.state.write().await;
        state.push_timeline(grievance.id, grievance.status, grievance.created_at, None);
        state.grievances.insert(grievance.id, grievance);
    }

    /// Make every activity-log write fail until reset.
    pub fn fail_activity_writes(&self, fail: bool) {
        self.fail_activity.store(fail, Ordering::SeqCst);
    }

    /// Make transitions fail after the status update, remark and timeline
    /// entry were staged but before any of them was committed.
    pub fn fail_history_writes(&self, fail: bool) {
        self.fail_history_writes.store(fail, Ordering::SeqCst);
    }

    pub async fn remarks_for(&self, grievance_id: i64) -> Vec<Remark> {
        let state = self.state.read().await;
        state
            .remarks
            .iter()
            .filter(|r| r.grievance_id == grievance_id)
            .cloned()
            .collect()
    }

    pub async fn timeline_entries_for(&self, grievance_id: i64) -> Vec<TimelineEntry> {
        let state = self.state.read().await;
        state
            .timeline
            .iter()
            .filter(|t| t.grievance_id == grievance_id)
            .cloned()
            .collect()
    }

    pub async fn activity_entries(&self) -> Vec<ActivityLogEntry> {
        self.state.read().await.activity.clone()
    }

    pub async fn all_grievances(&self) -> Vec<Grievance> {
        self.state.read().await.grievances.values().cloned().collect()
    }
}

#[async_trait]
impl GrievanceStore for MemoryStore {
    async fn create_grievance(&self, new: &NewGrievance, now: DateTime<Utc>) -> Result<Grievance> {
        let mut state = self.state.write().await;
        if !state.categories.contains_key(&new.category_id) {
            return Err(GrievanceError::NotFound(format!(
                "category {} not found",
                new.category_id
            )));
        }
        if !state.priorities.contains_key(&new.priority_id) {
            return Err(GrievanceError::NotFound(format!(
                "priority {} not found",
                new.priority_id
            )));
        }

        let grievance = Grievance {
            id: state.next_grievance_id(),
            reporter_id: new.reporter_id,
            category_id: new.category_id,
            priority_id: new.priority_id,
            description: new.description.clone(),
            status: GrievanceStatus::Submitted,
            assigned_department: None,
            assigned_officer: None,
            created_at: now,
            updated_at: now,
            resolved_at: None,
        };
        state.push_timeline(grievance.id, GrievanceStatus::Submitted, now, None);
        state.grievances.insert(grievance.id, grievance.clone());
        Ok(grievance)
    }

    async fn load_grievance(&self, id: i64) -> Result<Option<Grievance>> {
        Ok(self.state.read().await.grievances.get(&id).cloned())
    }

    async fn assign(&self, cmd: &AssignCommand) -> Result<Grievance> {
        let mut state = self.state.write().await;
        if !state.grievances.contains_key(&cmd.grievance_id) {
            return Err(GrievanceError::grievance_not_found(cmd.grievance_id));
        }
        if !state.departments.contains_key(&cmd.department_id) {
            return Err(GrievanceError::NotFound(format!(
                "department {} not found",
                cmd.department_id
            )));
        }
        if let Some(officer) = cmd.officer_id {
            if !state.users.contains_key(&officer) {
                return Err(GrievanceError::NotFound(format!(
                    "officer {officer} not found"
                )));
            }
        }

        let grievance = state
            .grievances
            .get_mut(&cmd.grievance_id)
            .ok_or_else(|| GrievanceError::grievance_not_found(cmd.grievance_id))?;
        let officer = cmd.officer_id.or(grievance.assigned_officer);
        let changed = grievance.assigned_department != Some(cmd.department_id)
            || grievance.assigned_officer != officer;
        grievance.assigned_department = Some(cmd.department_id);
        grievance.assigned_officer = officer;
        if changed {
            grievance.updated_at = cmd.now;
        }
        Ok(grievance.clone())
    }

    async fn apply_transition(&self, cmd: &TransitionCommand) -> Result<TransitionRecord> {
        let mut state = self.state.write().await;
        let current = state
            .grievances
            .get(&cmd.grievance_id)
            .cloned()
            .ok_or_else(|| GrievanceError::grievance_not_found(cmd.grievance_id))?;
        cmd.policy.check(current.status, cmd.to)?;

        // Stage on copies; `state` is only written at commit.
        let mut updated = current.clone();
        updated.apply_status(cmd.to, cmd.now);
        let mut row_id = state.next_row_id;
        row_id += 1;
        let remark = Remark {
            id: row_id,
            grievance_id: cmd.grievance_id,
            author_id: cmd.author_id,
            text: cmd.remark.clone(),
            created_at: cmd.now,
        };
        row_id += 1;
        let timeline = TimelineEntry {
            id: row_id,
            grievance_id: cmd.grievance_id,
            status: cmd.to,
            recorded_at: cmd.now,
            remark_id: Some(remark.id),
        };

        if self.fail_history_writes.load(Ordering::SeqCst) {
            return Err(GrievanceError::Unexpected(anyhow!(
                "history write failed for grievance {}",
                cmd.grievance_id
            )));
        }

        state.next_row_id = row_id;
        state.remarks.push(remark.clone());
        state.timeline.push(timeline.clone());
        state.grievances.insert(updated.id, updated.clone());

        Ok(TransitionRecord {
            grievance: updated,
            previous_status: current.status,
            remark,
            timeline,
        })
    }

    async fn list_dashboard(
        &self,
        filter: &DashboardFilter,
        page: PageRequest,
    ) -> Result<Vec<DashboardRow>> {
        let state = self.state.read().await;
        let mut matching: Vec<&Grievance> = state
            .grievances
            .values()
            .filter(|g| filter.matches(g))
            .collect();
        matching.sort_by(|a, b| dashboard_order(a, b));
        Ok(matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit as usize)
            .map(|g| state.dashboard_row(g))
            .collect())
    }

    async fn count_dashboard(&self, filter: &DashboardFilter) -> Result<i64> {
        let state = self.state.read().await;
        Ok(state.grievances.values().filter(|g| filter.matches(g)).count() as i64)
    }

    async fn timeline(&self, grievance_id: i64) -> Result<Vec<TimelineItem>> {
        let state = self.state.read().await;
        let mut entries: Vec<&TimelineEntry> = state
            .timeline
            .iter()
            .filter(|t| t.grievance_id == grievance_id)
            .collect();
        entries.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at).then(b.id.cmp(&a.id)));

        Ok(entries
            .into_iter()
            .map(|entry| {
                let remark = entry
                    .remark_id
                    .and_then(|id| state.remarks.iter().find(|r| r.id == id));
                TimelineItem {
                    status: entry.status,
                    recorded_at: entry.recorded_at,
                    remark_text: remark.map(|r| r.text.clone()),
                    author_name: remark
                        .and_then(|r| state.users.get(&r.author_id))
                        .map(|u| u.name.clone()),
                }
            })
            .collect())
    }

    async fn count_by_status(&self, since: DateTime<Utc>) -> Result<Vec<StatusCount>> {
        let state = self.state.read().await;
        let mut counts: BTreeMap<GrievanceStatus, i64> = BTreeMap::new();
        for g in state.grievances.values().filter(|g| g.created_at >= since) {
            *counts.entry(g.status).or_default() += 1;
        }
        Ok(counts
            .into_iter()
            .map(|(status, count)| StatusCount { status, count })
            .collect())
    }

    async fn count_by_category(&self, since: DateTime<Utc>) -> Result<Vec<CategoryCount>> {
        let state = self.state.read().await;
        let mut counts: BTreeMap<Option<String>, i64> = BTreeMap::new();
        for g in state.grievances.values().filter(|g| g.created_at >= since) {
            *counts
                .entry(state.categories.get(&g.category_id).cloned())
                .or_default() += 1;
        }
        let mut rows: Vec<CategoryCount> = counts
            .into_iter()
            .map(|(category_name, count)| CategoryCount {
                category_name,
                count,
            })
            .collect();
        rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.category_name.cmp(&b.category_name)));
        Ok(rows)
    }

    async fn avg_resolution_days(&self, since: DateTime<Utc>) -> Result<Option<f64>> {
        let state = self.state.read().await;
        Ok(average_whole_days(
            state
                .grievances
                .values()
                .filter(|g| g.created_at >= since && g.status == GrievanceStatus::Resolved)
                .filter_map(|g| g.resolved_at.map(|r| whole_days_between(g.created_at, r))),
        ))
    }

    async fn count_pending_before(&self, cutoff: DateTime<Utc>) -> Result<i64> {
        let state = self.state.read().await;
        Ok(state
            .grievances
            .values()
            .filter(|g| !g.status.is_settled() && g.created_at < cutoff)
            .count() as i64)
    }

    async fn attach_image(
        &self,
        grievance_id: i64,
        image_ref: &str,
        uploaded_by: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<GrievanceImage> {
        let mut state = self.state.write().await;
        if !state.grievances.contains_key(&grievance_id) {
            return Err(GrievanceError::grievance_not_found(grievance_id));
        }
        let image = GrievanceImage {
            id: state.next_row_id(),
            grievance_id,
            image_ref: image_ref.to_string(),
            uploaded_by,
            uploaded_at: now,
        };
        state.images.push(image.clone());
        Ok(image)
    }
}

#[async_trait]
impl ReferenceData for MemoryStore {
    async fn categories(&self) -> Result<Vec<ReferenceItem>> {
        let state = self.state.read().await;
        Ok(sorted_by_name(&state.categories))
    }

    async fn priorities(&self) -> Result<Vec<ReferenceItem>> {
        let state = self.state.read().await;
        Ok(state
            .priorities
            .iter()
            .map(|(id, name)| ReferenceItem {
                id: *id,
                name: name.clone(),
            })
            .collect())
    }

    async fn departments(&self) -> Result<Vec<ReferenceItem>> {
        let state = self.state.read().await;
        Ok(sorted_by_name(&state.departments))
    }
}

fn sorted_by_name(table: &BTreeMap<i64, String>) -> Vec<ReferenceItem> {
    let mut items: Vec<ReferenceItem> = table
        .iter()
        .map(|(id, name)| ReferenceItem {
            id: *id,
            name: name.clone(),
        })
        .collect();
    items.sort_by(|a, b| a.name.cmp(&b.name));
    items
}

#[async_trait]
impl ActivityLog for MemoryStore {
    async fn record(&self, entry: &NewActivity, now: DateTime<Utc>) -> Result<()> {
        if self.fail_activity.load(Ordering::SeqCst) {
            return Err(GrievanceError::Unexpected(anyhow!("activity sink unavailable")));
        }
        let mut state = self.state.write().await;
        let row = ActivityLogEntry {
            id: state.next_row_id(),
            actor_id: entry.actor_id,
            kind: entry.kind,
            details: entry.details.clone(),
            created_at: now,
        };
        state.activity.push(row);
        Ok(())
    }

    async fn recent(&self, limit: i64) -> Result<Vec<ActivityLogEntry>> {
        let state = self.state.read().await;
        Ok(state
            .activity
            .iter()
            .rev()
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }
}
