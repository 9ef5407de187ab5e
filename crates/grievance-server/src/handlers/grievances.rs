//! Grievance lifecycle handlers.
//!
//! POST /grievances                - submit a grievance (any role)
//! GET  /grievances                - dashboard listing (status, department_id, page, limit, mine)
//! PUT  /grievances/assign         - route to department/officer (admin, authority)
//! PUT  /grievances/status         - status transition with remark (admin, authority)
//! GET  /grievances/:id/timeline   - status history, newest first
//! POST /grievances/:id/images     - attach an uploaded image reference

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query,
    },
    http::StatusCode,
    Extension, Json,
};
use grievance_core::{
    proto::{AssignRequest, AttachImageRequest, Audited, SubmitRequest, TransitionRequest, TransitionResponse},
    query::{DashboardQuery, DashboardRow, Page},
    types::{Grievance, GrievanceImage, TimelineItem},
    Actor, GrievanceService,
};
use serde::Deserialize;

use crate::error::AppError;

pub async fn submit(
    Extension(actor): Extension<Actor>,
    Extension(service): Extension<Arc<dyn GrievanceService>>,
    payload: Result<Json<SubmitRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Audited<Grievance>>), AppError> {
    let Json(req) = payload?;
    let resp = service.submit(&actor, req).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

pub async fn list(
    Extension(actor): Extension<Actor>,
    Extension(service): Extension<Arc<dyn GrievanceService>>,
    query: Result<Query<DashboardQuery>, QueryRejection>,
) -> Result<Json<Page<DashboardRow>>, AppError> {
    let Query(query) = query?;
    let page = service.list(&actor, query).await?;
    Ok(Json(page))
}

pub async fn assign(
    Extension(actor): Extension<Actor>,
    Extension(service): Extension<Arc<dyn GrievanceService>>,
    payload: Result<Json<AssignRequest>, JsonRejection>,
) -> Result<Json<Audited<Grievance>>, AppError> {
    let Json(req) = payload?;
    let resp = service.assign(&actor, req).await?;
    Ok(Json(resp))
}

pub async fn update_status(
    Extension(actor): Extension<Actor>,
    Extension(service): Extension<Arc<dyn GrievanceService>>,
    payload: Result<Json<TransitionRequest>, JsonRejection>,
) -> Result<Json<Audited<TransitionResponse>>, AppError> {
    let Json(req) = payload?;
    let resp = service.transition(&actor, req).await?;
    Ok(Json(resp))
}

pub async fn timeline(
    Extension(service): Extension<Arc<dyn GrievanceService>>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Vec<TimelineItem>>, AppError> {
    let Path(id) = id?;
    let items = service.timeline(id).await?;
    Ok(Json(items))
}

#[derive(Debug, Deserialize)]
pub struct AttachImageBody {
    pub image_ref: Option<String>,
}

pub async fn attach_image(
    Extension(actor): Extension<Actor>,
    Extension(service): Extension<Arc<dyn GrievanceService>>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<AttachImageBody>, JsonRejection>,
) -> Result<(StatusCode, Json<Audited<GrievanceImage>>), AppError> {
    let Path(id) = id?;
    let Json(body) = payload?;
    let req = AttachImageRequest {
        grievance_id: Some(id),
        image_ref: body.image_ref,
    };
    let resp = service.attach_image(&actor, req).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}
