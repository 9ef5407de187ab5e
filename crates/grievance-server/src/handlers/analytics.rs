//! GET /analytics?days=N - windowed rollups (admin, authority).

use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Query},
    Extension, Json,
};
use grievance_core::{analytics::AnalyticsReport, proto::AnalyticsQuery, Actor, GrievanceService};

use crate::error::AppError;

pub async fn analytics(
    Extension(actor): Extension<Actor>,
    Extension(service): Extension<Arc<dyn GrievanceService>>,
    query: Result<Query<AnalyticsQuery>, QueryRejection>,
) -> Result<Json<AnalyticsReport>, AppError> {
    let Query(query) = query?;
    let report = service.analytics(&actor, query).await?;
    Ok(Json(report))
}
