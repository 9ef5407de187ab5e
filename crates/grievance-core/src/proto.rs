//! Request and response shapes of the service operations.
//!
//! Request fields are optional so that a missing value surfaces as
//! `InvalidArgument` from the service instead of a decoding failure.

use serde::{Deserialize, Serialize};

use crate::error::GrievanceError;
use crate::types::Grievance;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub category_id: Option<i64>,
    pub priority_id: Option<i64>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssignRequest {
    pub grievance_id: Option<i64>,
    pub department_id: Option<i64>,
    pub assigned_to_user_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransitionRequest {
    pub grievance_id: Option<i64>,
    pub status: Option<String>,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttachImageRequest {
    pub grievance_id: Option<i64>,
    pub image_ref: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyticsQuery {
    pub days: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivityQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionResponse {
    pub success: bool,
    pub grievance: Grievance,
}

/// Result of a mutating operation plus any non-fatal audit failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Audited<T> {
    #[serde(flatten)]
    pub value: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit_warning: Option<String>,
}

impl<T> Audited<T> {
    pub fn into_inner(self) -> T {
        self.value
    }
}

/// A positive id or `InvalidArgument` naming the field.
pub fn required_id(value: Option<i64>, field: &str) -> Result<i64, GrievanceError> {
    match value {
        Some(id) if id > 0 => Ok(id),
        Some(id) => Err(GrievanceError::InvalidArgument(format!(
            "{field} must be positive, got {id}"
        ))),
        None => Err(GrievanceError::InvalidArgument(format!("{field} required"))),
    }
}

/// A non-blank string (trimmed) or `InvalidArgument` naming the field.
pub fn required_text(value: Option<&str>, field: &str) -> Result<String, GrievanceError> {
    match value.map(str::trim) {
        Some(text) if !text.is_empty() => Ok(text.to_string()),
        _ => Err(GrievanceError::InvalidArgument(format!("{field} required"))),
    }
}
