//! grievance-server - REST surface over the grievance core service.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
