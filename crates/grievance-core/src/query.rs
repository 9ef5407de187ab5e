//! Dashboard query types: filter predicate, pagination clamp, joined rows.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::types::{Grievance, GrievanceStatus};

pub const DEFAULT_PAGE_LIMIT: i64 = 50;
pub const MAX_PAGE_LIMIT: i64 = 100;

/// Raw listing parameters as they arrive from a caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardQuery {
    pub status: Option<String>,
    pub department_id: Option<i64>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
    /// Restrict to grievances reported by the calling actor.
    #[serde(default)]
    pub mine: Option<bool>,
}

/// Resolved filter predicate shared by the page query and the count query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DashboardFilter {
    pub status: Option<GrievanceStatus>,
    pub department_id: Option<i64>,
    pub reporter_id: Option<i64>,
}

impl DashboardFilter {
    pub fn matches(&self, g: &Grievance) -> bool {
        self.status.map_or(true, |s| g.status == s)
            && self
                .department_id
                .map_or(true, |d| g.assigned_department == Some(d))
            && self.reporter_id.map_or(true, |r| g.reporter_id == r)
    }
}

/// Page window after clamping. `limit` in `[1, 100]`, `page >= 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    pub fn clamped(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit
                .unwrap_or(DEFAULT_PAGE_LIMIT)
                .clamp(1, MAX_PAGE_LIMIT),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub pages: i64,
}

impl PageMeta {
    pub fn new(req: PageRequest, total: i64) -> Self {
        Self {
            page: req.page,
            limit: req.limit,
            total,
            pages: (total + req.limit - 1) / req.limit,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

/// Grievance joined with its reference names and reporter identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardRow {
    #[serde(flatten)]
    pub grievance: Grievance,
    pub category_name: Option<String>,
    pub priority_name: Option<String>,
    pub reporter_name: Option<String>,
    pub reporter_email: Option<String>,
    pub assigned_dept_name: Option<String>,
}

/// Dashboard order: priority DESC, created_at DESC, then id ASC.
pub fn dashboard_order(a: &Grievance, b: &Grievance) -> Ordering {
    b.priority_id
        .cmp(&a.priority_id)
        .then_with(|| b.created_at.cmp(&a.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn clamp_defaults() {
        let req = PageRequest::clamped(None, None);
        assert_eq!(req, PageRequest { page: 1, limit: 50 });
        assert_eq!(req.offset(), 0);
    }

    #[test]
    fn clamp_bounds() {
        assert_eq!(PageRequest::clamped(Some(0), Some(0)).limit, 1);
        assert_eq!(PageRequest::clamped(Some(-3), Some(500)).limit, 100);
        assert_eq!(PageRequest::clamped(Some(-3), Some(500)).page, 1);
        assert_eq!(PageRequest::clamped(Some(2), Some(10)).offset(), 10);
    }

    #[test]
    fn meta_pages_is_ceiling() {
        let meta = PageMeta::new(PageRequest::clamped(Some(2), Some(10)), 25);
        assert_eq!(meta.pages, 3);
        assert_eq!(PageMeta::new(PageRequest::clamped(None, Some(10)), 0).pages, 0);
        assert_eq!(PageMeta::new(PageRequest::clamped(None, Some(10)), 30).pages, 3);
    }

    proptest! {
        #[test]
        fn pages_cover_total_exactly(total in 0i64..5_000, limit in 1i64..=100) {
            let req = PageRequest::clamped(None, Some(limit));
            let meta = PageMeta::new(req, total);
            let mut covered = 0i64;
            for page in 1..=meta.pages {
                let offset = PageRequest::clamped(Some(page), Some(limit)).offset();
                covered += (total - offset).clamp(0, limit);
            }
            prop_assert_eq!(covered, total);
            prop_assert_eq!(meta.pages, (total as f64 / limit as f64).ceil() as i64);
        }
    }
}
