//! Actor extraction from gateway headers.
//!
//! The upstream gateway authenticates the caller and forwards its identity as
//! `x-actor-id` and `x-actor-role`. Handlers read the resulting
//! `Extension<Actor>`; requests without a usable identity never reach them.

use axum::{extract::Request, http::HeaderMap, middleware::Next, response::Response};
use grievance_core::{Actor, Role};

use crate::error::AppError;

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, AppError> {
    headers
        .get(name)
        .ok_or_else(|| AppError::Unauthorized(format!("missing {name} header")))?
        .to_str()
        .map(str::trim)
        .map_err(|_| AppError::Unauthorized(format!("malformed {name} header")))
}

pub fn actor_from_headers(headers: &HeaderMap) -> Result<Actor, AppError> {
    let id = header(headers, ACTOR_ID_HEADER)?
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::Unauthorized(format!("malformed {ACTOR_ID_HEADER} header")))?;
    let role = header(headers, ACTOR_ROLE_HEADER)?
        .parse::<Role>()
        .map_err(|_| AppError::Unauthorized(format!("malformed {ACTOR_ROLE_HEADER} header")))?;
    Ok(Actor::new(id, role))
}

/// Resolve the actor and attach it as a request extension.
pub async fn actor_auth(mut req: Request, next: Next) -> Result<Response, AppError> {
    let actor = actor_from_headers(req.headers())?;
    tracing::debug!(actor_id = actor.id, role = %actor.role, "actor resolved");
    req.extensions_mut().insert(actor);
    Ok(next.run(req).await)
}
