//! Reference lookups for form dropdowns.
//!
//! GET /categories   - ordered by name
//! GET /priorities   - ordered by id
//! GET /departments  - ordered by name

use std::sync::Arc;

use axum::{Extension, Json};
use grievance_core::{types::ReferenceItem, GrievanceService};

use crate::error::AppError;

pub async fn categories(
    Extension(service): Extension<Arc<dyn GrievanceService>>,
) -> Result<Json<Vec<ReferenceItem>>, AppError> {
    Ok(Json(service.categories().await?))
}

pub async fn priorities(
    Extension(service): Extension<Arc<dyn GrievanceService>>,
) -> Result<Json<Vec<ReferenceItem>>, AppError> {
    Ok(Json(service.priorities().await?))
}

pub async fn departments(
    Extension(service): Extension<Arc<dyn GrievanceService>>,
) -> Result<Json<Vec<ReferenceItem>>, AppError> {
    Ok(Json(service.departments().await?))
}
