//! Postgres implementations of the grievance port traits.
//!
//! Each adapter is a newtype wrapping PgPool. All SQL is runtime-checked
//! (sqlx::query, not sqlx::query!) to avoid a compile-time DB requirement.

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;

use grievance_core::analytics::{CategoryCount, StatusCount};
use grievance_core::error::GrievanceError;
use grievance_core::ports::{
    ActivityLog, AssignCommand, GrievanceStore, ReferenceData, Result, TransitionCommand,
};
use grievance_core::query::{DashboardFilter, DashboardRow, PageRequest};
use grievance_core::types::*;

use crate::rows::{PgActivityRow, PgDashboardRow, PgGrievanceRow, PgTimelineRow};

const GRIEVANCE_COLUMNS: &str = r#"
    g.grievance_id, g.user_id, g.category_id, g.priority_id, g.description,
    g.status, g.assigned_department, g.assigned_to_user_id,
    g.created_at, g.updated_at, g.resolved_at
"#;

/// Shared WHERE clause for the dashboard page and count queries.
/// `$1` status, `$2` department, `$3` reporter; each NULL means "any".
const DASHBOARD_WHERE: &str = r#"
    WHERE ($1::text IS NULL OR g.status = $1)
      AND ($2::bigint IS NULL OR g.assigned_department = $2)
      AND ($3::bigint IS NULL OR g.user_id = $3)
"#;

fn decode<T, R>(row: R) -> Result<T>
where
    R: TryInto<T, Error = String>,
{
    row.try_into()
        .map_err(|e: String| GrievanceError::Unexpected(anyhow!(e)))
}

async fn exists(
    tx: &mut Transaction<'_, Postgres>,
    sql: &str,
    id: i64,
) -> std::result::Result<bool, GrievanceError> {
    let found = sqlx::query_scalar::<_, bool>(sql)
        .bind(id)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| anyhow!(e))?;
    Ok(found)
}

/// Lock the grievance row for the rest of the transaction.
async fn lock_grievance(
    tx: &mut Transaction<'_, Postgres>,
    grievance_id: i64,
) -> std::result::Result<Grievance, GrievanceError> {
    let sql = format!("SELECT {GRIEVANCE_COLUMNS} FROM grievances g WHERE g.grievance_id = $1 FOR UPDATE");
    let row = sqlx::query_as::<_, PgGrievanceRow>(&sql)
        .bind(grievance_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| anyhow!(e))?
        .ok_or_else(|| GrievanceError::grievance_not_found(grievance_id))?;
    decode::<Grievance, _>(row)
}

// ── PgGrievanceStore ──────────────────────────────────────────

pub struct PgGrievanceStore {
    pool: PgPool,
}

impl PgGrievanceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GrievanceStore for PgGrievanceStore {
    async fn create_grievance(&self, new: &NewGrievance, now: DateTime<Utc>) -> Result<Grievance> {
        let mut tx = self.pool.begin().await.map_err(|e| anyhow!(e))?;

        if !exists(
            &mut tx,
            "SELECT EXISTS (SELECT 1 FROM grievance_category WHERE category_id = $1)",
            new.category_id,
        )
        .await?
        {
            return Err(GrievanceError::NotFound(format!(
                "category {} not found",
                new.category_id
            )));
        }
        if !exists(
            &mut tx,
            "SELECT EXISTS (SELECT 1 FROM grievance_priority WHERE priority_id = $1)",
            new.priority_id,
        )
        .await?
        {
            return Err(GrievanceError::NotFound(format!(
                "priority {} not found",
                new.priority_id
            )));
        }

        let sql = format!(
            r#"
            INSERT INTO grievances AS g (
                user_id, category_id, priority_id, description,
                status, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, 'submitted', $5, $5)
            RETURNING {GRIEVANCE_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, PgGrievanceRow>(&sql)
            .bind(new.reporter_id)
            .bind(new.category_id)
            .bind(new.priority_id)
            .bind(&new.description)
            .bind(now)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| anyhow!(e))?;
        let grievance = decode::<Grievance, _>(row)?;

        sqlx::query(
            r#"
            INSERT INTO grievance_timeline (grievance_id, status, remark_id, created_at)
            VALUES ($1, 'submitted', NULL, $2)
            "#,
        )
        .bind(grievance.id)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| anyhow!(e))?;

        tx.commit().await.map_err(|e| anyhow!(e))?;
        Ok(grievance)
    }

    async fn load_grievance(&self, id: i64) -> Result<Option<Grievance>> {
        let sql = format!("SELECT {GRIEVANCE_COLUMNS} FROM grievances g WHERE g.grievance_id = $1");
        let row = sqlx::query_as::<_, PgGrievanceRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| anyhow!(e))?;
        row.map(decode::<Grievance, _>).transpose()
    }

    async fn assign(&self, cmd: &AssignCommand) -> Result<Grievance> {
        let mut tx = self.pool.begin().await.map_err(|e| anyhow!(e))?;
        let current = lock_grievance(&mut tx, cmd.grievance_id).await?;

        if !exists(
            &mut tx,
            "SELECT EXISTS (SELECT 1 FROM departments WHERE department_id = $1)",
            cmd.department_id,
        )
        .await?
        {
            return Err(GrievanceError::NotFound(format!(
                "department {} not found",
                cmd.department_id
            )));
        }
        if let Some(officer) = cmd.officer_id {
            if !exists(
                &mut tx,
                "SELECT EXISTS (SELECT 1 FROM users WHERE user_id = $1)",
                officer,
            )
            .await?
            {
                return Err(GrievanceError::NotFound(format!(
                    "officer {officer} not found"
                )));
            }
        }

        let officer = cmd.officer_id.or(current.assigned_officer);
        if current.assigned_department == Some(cmd.department_id)
            && current.assigned_officer == officer
        {
            tx.commit().await.map_err(|e| anyhow!(e))?;
            return Ok(current);
        }

        let sql = format!(
            r#"
            UPDATE grievances AS g
            SET assigned_department = $2,
                assigned_to_user_id = $3,
                updated_at = $4
            WHERE g.grievance_id = $1
            RETURNING {GRIEVANCE_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, PgGrievanceRow>(&sql)
            .bind(cmd.grievance_id)
            .bind(cmd.department_id)
            .bind(officer)
            .bind(cmd.now)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| anyhow!(e))?;

        tx.commit().await.map_err(|e| anyhow!(e))?;
        decode::<Grievance, _>(row)
    }

    async fn apply_transition(&self, cmd: &TransitionCommand) -> Result<TransitionRecord> {
        let mut tx = self.pool.begin().await.map_err(|e| anyhow!(e))?;

        // Row lock serializes concurrent transitions on the same grievance.
        let current = lock_grievance(&mut tx, cmd.grievance_id).await?;
        cmd.policy.check(current.status, cmd.to)?;

        let mut updated = current.clone();
        updated.apply_status(cmd.to, cmd.now);

        sqlx::query(
            r#"
            UPDATE grievances
            SET status = $2, updated_at = $3, resolved_at = $4
            WHERE grievance_id = $1
            "#,
        )
        .bind(updated.id)
        .bind(updated.status.as_str())
        .bind(updated.updated_at)
        .bind(updated.resolved_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| anyhow!(e))?;

        let remark_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO grievance_remarks (grievance_id, user_id, remark_text, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING remark_id
            "#,
        )
        .bind(cmd.grievance_id)
        .bind(cmd.author_id)
        .bind(&cmd.remark)
        .bind(cmd.now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| anyhow!(e))?;

        let timeline_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO grievance_timeline (grievance_id, status, remark_id, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING timeline_id
            "#,
        )
        .bind(cmd.grievance_id)
        .bind(cmd.to.as_str())
        .bind(remark_id)
        .bind(cmd.now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| anyhow!(e))?;

        tx.commit().await.map_err(|e| anyhow!(e))?;
        debug!(grievance_id = cmd.grievance_id, remark_id, timeline_id, "transition committed");

        Ok(TransitionRecord {
            grievance: updated,
            previous_status: current.status,
            remark: Remark {
                id: remark_id,
                grievance_id: cmd.grievance_id,
                author_id: cmd.author_id,
                text: cmd.remark.clone(),
                created_at: cmd.now,
            },
            timeline: TimelineEntry {
                id: timeline_id,
                grievance_id: cmd.grievance_id,
                status: cmd.to,
                recorded_at: cmd.now,
                remark_id: Some(remark_id),
            },
        })
    }

    async fn list_dashboard(
        &self,
        filter: &DashboardFilter,
        page: PageRequest,
    ) -> Result<Vec<DashboardRow>> {
        let sql = format!(
            r#"
            SELECT {GRIEVANCE_COLUMNS},
                   c.category_name,
                   p.priority_name,
                   u.full_name AS reporter_name,
                   u.institute_email AS reporter_email,
                   d.department_name AS assigned_dept_name
            FROM grievances g
            LEFT JOIN grievance_category c ON c.category_id = g.category_id
            LEFT JOIN grievance_priority p ON p.priority_id = g.priority_id
            LEFT JOIN users u ON u.user_id = g.user_id
            LEFT JOIN departments d ON d.department_id = g.assigned_department
            {DASHBOARD_WHERE}
            ORDER BY g.priority_id DESC, g.created_at DESC, g.grievance_id ASC
            LIMIT $4 OFFSET $5
            "#
        );
        let rows = sqlx::query_as::<_, PgDashboardRow>(&sql)
            .bind(filter.status.map(|s| s.as_str()))
            .bind(filter.department_id)
            .bind(filter.reporter_id)
            .bind(page.limit)
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| anyhow!(e))?;
        rows.into_iter().map(decode::<DashboardRow, _>).collect()
    }

    async fn count_dashboard(&self, filter: &DashboardFilter) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM grievances g {DASHBOARD_WHERE}");
        let total = sqlx::query_scalar::<_, i64>(&sql)
            .bind(filter.status.map(|s| s.as_str()))
            .bind(filter.department_id)
            .bind(filter.reporter_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| anyhow!(e))?;
        Ok(total)
    }

    async fn timeline(&self, grievance_id: i64) -> Result<Vec<TimelineItem>> {
        let rows = sqlx::query_as::<_, PgTimelineRow>(
            r#"
            SELECT t.status,
                   t.created_at AS recorded_at,
                   r.remark_text,
                   u.full_name AS author_name
            FROM grievance_timeline t
            LEFT JOIN grievance_remarks r ON r.remark_id = t.remark_id
            LEFT JOIN users u ON u.user_id = r.user_id
            WHERE t.grievance_id = $1
            ORDER BY t.created_at DESC, t.timeline_id DESC
            "#,
        )
        .bind(grievance_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;
        rows.into_iter().map(decode::<TimelineItem, _>).collect()
    }

    async fn count_by_status(&self, since: DateTime<Utc>) -> Result<Vec<StatusCount>> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT status, COUNT(*)
            FROM grievances
            WHERE created_at >= $1
            GROUP BY status
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;

        let mut counts = rows
            .into_iter()
            .map(|(status, count)| {
                Ok(StatusCount {
                    status: status.parse()?,
                    count,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        counts.sort_by_key(|c| c.status);
        Ok(counts)
    }

    async fn count_by_category(&self, since: DateTime<Utc>) -> Result<Vec<CategoryCount>> {
        let rows = sqlx::query_as::<_, (Option<String>, i64)>(
            r#"
            SELECT c.category_name, COUNT(*) AS count
            FROM grievances g
            LEFT JOIN grievance_category c ON c.category_id = g.category_id
            WHERE g.created_at >= $1
            GROUP BY c.category_name
            ORDER BY count DESC, c.category_name ASC
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;
        Ok(rows
            .into_iter()
            .map(|(category_name, count)| CategoryCount {
                category_name,
                count,
            })
            .collect())
    }

    async fn avg_resolution_days(&self, since: DateTime<Utc>) -> Result<Option<f64>> {
        // EXTRACT(DAY ...) takes the whole-day component of each interval.
        let avg = sqlx::query_scalar::<_, Option<f64>>(
            r#"
            SELECT AVG(EXTRACT(DAY FROM (resolved_at - created_at)))::float8
            FROM grievances
            WHERE status = 'resolved'
              AND resolved_at IS NOT NULL
              AND created_at >= $1
            "#,
        )
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;
        Ok(avg)
    }

    async fn count_pending_before(&self, cutoff: DateTime<Utc>) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM grievances
            WHERE status NOT IN ('resolved', 'closed')
              AND created_at < $1
            "#,
        )
        .bind(cutoff)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;
        Ok(count)
    }

    async fn attach_image(
        &self,
        grievance_id: i64,
        image_ref: &str,
        uploaded_by: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<GrievanceImage> {
        let mut tx = self.pool.begin().await.map_err(|e| anyhow!(e))?;
        if !exists(
            &mut tx,
            "SELECT EXISTS (SELECT 1 FROM grievances WHERE grievance_id = $1)",
            grievance_id,
        )
        .await?
        {
            return Err(GrievanceError::grievance_not_found(grievance_id));
        }

        let image_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO grievance_images (grievance_id, image_path, uploaded_by, uploaded_at)
            VALUES ($1, $2, $3, $4)
            RETURNING image_id
            "#,
        )
        .bind(grievance_id)
        .bind(image_ref)
        .bind(uploaded_by)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| anyhow!(e))?;

        tx.commit().await.map_err(|e| anyhow!(e))?;
        Ok(GrievanceImage {
            id: image_id,
            grievance_id,
            image_ref: image_ref.to_string(),
            uploaded_by,
            uploaded_at: now,
        })
    }
}

// ── PgReferenceData ───────────────────────────────────────────

pub struct PgReferenceData {
    pool: PgPool,
}

impl PgReferenceData {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch(&self, sql: &str) -> Result<Vec<ReferenceItem>> {
        let rows = sqlx::query_as::<_, (i64, String)>(sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| anyhow!(e))?;
        Ok(rows
            .into_iter()
            .map(|(id, name)| ReferenceItem { id, name })
            .collect())
    }
}

#[async_trait]
impl ReferenceData for PgReferenceData {
    async fn categories(&self) -> Result<Vec<ReferenceItem>> {
        self.fetch("SELECT category_id, category_name FROM grievance_category ORDER BY category_name")
            .await
    }

    async fn priorities(&self) -> Result<Vec<ReferenceItem>> {
        self.fetch("SELECT priority_id, priority_name FROM grievance_priority ORDER BY priority_id")
            .await
    }

    async fn departments(&self) -> Result<Vec<ReferenceItem>> {
        self.fetch("SELECT department_id, department_name FROM departments ORDER BY department_name")
            .await
    }
}

// ── PgActivityLog ─────────────────────────────────────────────

pub struct PgActivityLog {
    pool: PgPool,
}

impl PgActivityLog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActivityLog for PgActivityLog {
    async fn record(&self, entry: &NewActivity, now: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO activity_logs (user_id, action, details, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(entry.actor_id)
        .bind(entry.kind.as_str())
        .bind(&entry.details)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;
        Ok(())
    }

    async fn recent(&self, limit: i64) -> Result<Vec<ActivityLogEntry>> {
        let rows = sqlx::query_as::<_, PgActivityRow>(
            r#"
            SELECT log_id, user_id, action, details, created_at
            FROM activity_logs
            ORDER BY created_at DESC, log_id DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;
        rows.into_iter().map(decode::<ActivityLogEntry, _>).collect()
    }
}
