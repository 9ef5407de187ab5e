//! Router construction for the grievance server.

use std::sync::Arc;

use axum::{
    middleware as axum_mw,
    routing::{get, post, put},
    Extension, Router,
};
use grievance_core::GrievanceService;

use crate::handlers;
use crate::middleware::actor::actor_auth;

/// Build the full axum router with all routes and middleware.
pub fn build_router(service: Arc<dyn GrievanceService>) -> Router {
    // Routes that require an actor
    let protected = Router::new()
        .route(
            "/grievances",
            get(handlers::grievances::list).post(handlers::grievances::submit),
        )
        .route("/grievances/assign", put(handlers::grievances::assign))
        .route("/grievances/status", put(handlers::grievances::update_status))
        .route(
            "/grievances/:id/timeline",
            get(handlers::grievances::timeline),
        )
        .route(
            "/grievances/:id/images",
            post(handlers::grievances::attach_image),
        )
        .route("/analytics", get(handlers::analytics::analytics))
        .route("/activity", get(handlers::activity::recent))
        .route("/categories", get(handlers::reference::categories))
        .route("/priorities", get(handlers::reference::priorities))
        .route("/departments", get(handlers::reference::departments))
        .layer(axum_mw::from_fn(actor_auth));

    // Public routes (no actor)
    let public = Router::new().route("/health", get(handlers::health::health));

    public.merge(protected).layer(Extension(service))
}
