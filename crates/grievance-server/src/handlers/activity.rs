//! GET /activity?limit=N - recent audit entries, newest first (admin, authority).

use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Query},
    Extension, Json,
};
use grievance_core::{proto::ActivityQuery, types::ActivityLogEntry, Actor, GrievanceService};

use crate::error::AppError;

pub async fn recent(
    Extension(actor): Extension<Actor>,
    Extension(service): Extension<Arc<dyn GrievanceService>>,
    query: Result<Query<ActivityQuery>, QueryRejection>,
) -> Result<Json<Vec<ActivityLogEntry>>, AppError> {
    let Query(query) = query?;
    let entries = service.recent_activity(&actor, query).await?;
    Ok(Json(entries))
}
